//! Wiki page renderer.
//!
//! Pages are templates: raw text interleaved with `{{DIRECTIVE ...}}`,
//! `[[links]]` and `<wiklet class='...'/>` tags. Rendering resolves those
//! directives against the page's notebook (the folder it lives in), its
//! parent notebooks and shared template accounts, and caches the results.
//!
//! | Module | Role |
//! |--------|------|
//! | [`template`] | tokenizer and parsed templates |
//! | [`wiklet`] | directive table and implementations |
//! | [`compose`] | template rendering and chrome composition |
//! | [`notebook`] | per-folder page tables |
//! | [`wiki`] | the engine: lookup, render caches, writes |
//! | [`services`] | collaborator traits (store, directory, transport) |
//! | [`memory`] | in-memory collaborators |
//! | [`config`] | `wiklet.toml` |

pub mod cache;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod logger;
pub mod memory;
pub mod notebook;
pub mod page;
pub mod services;
pub mod template;
pub mod url;
pub mod wiki;
pub mod wiklet;

#[cfg(test)]
mod fixture;

pub use config::WikiConfig;
pub use context::{Context, Request};
pub use error::{Result, WikiError};
pub use memory::MemoryStore;
pub use notebook::ScopeKey;
pub use page::Page;
pub use template::Template;
pub use url::WikiUrl;
pub use wiki::{PageEdit, Wiki};
pub use wiklet::{Wiklet, WikletTable};
