//! Engine configuration from `wiklet.toml`.
//!
//! # Sections
//!
//! | Section          | Purpose                                          |
//! |------------------|--------------------------------------------------|
//! | `[cache]`        | Cache sizes and entry lifetime                   |
//! | `[render]`       | Inclusion depth, chrome template, default locale |
//! | `[templates]`    | Fallback template account and folder             |
//! | `[server]`       | This server's name and REST url prefix           |
//! | `[accounts.*]`   | Per-account locale, domain and server            |
//! | `[domains.*]`    | Per-domain template account                      |
//! | `[messages.*]`   | Message catalog, one table per locale            |
//!
//! # Example
//!
//! ```toml
//! [cache]
//! ttl_secs = 600
//!
//! [render]
//! chrome = "_Template"
//!
//! [templates]
//! account = "templates@example.com"
//!
//! [accounts."alice@example.com"]
//! locale = "fr_FR"
//!
//! [messages.default]
//! notebook = "Notebook"
//!
//! [messages.fr_FR]
//! notebook = "Carnet"
//! ```

mod accounts;
mod cache;
pub mod defaults;
mod error;
mod render;
mod server;
mod templates;

pub use accounts::{AccountConfig, DomainConfig};
pub use cache::CacheConfig;
pub use error::ConfigError;
pub use render::RenderConfig;
pub use server::ServerConfig;
pub use templates::TemplatesConfig;

use crate::memory::MemoryStore;
use crate::services::{AccountBy, Directory, NOTEBOOK_ACCOUNT_ATTR};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// `[messages.default]` holds the entries used when no locale matches.
pub const DEFAULT_MESSAGES: &str = "default";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing wiklet.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Keyed by account name.
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,

    /// Keyed by domain name.
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,

    /// Locale → message key → text.
    #[serde(default)]
    pub messages: BTreeMap<String, BTreeMap<String, String>>,
}

impl WikiConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: WikiConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("[cache.notebooks]", self.cache.notebooks),
            ("[cache.pages]", self.cache.pages),
            ("[cache.renders]", self.cache.renders),
            ("[cache.compositions]", self.cache.compositions),
        ];
        for (field, size) in sizes {
            if size == 0 {
                bail!(ConfigError::Validation(format!("{field} must be positive")));
            }
        }

        if self.cache.ttl_secs == 0 {
            bail!(ConfigError::Validation(
                "[cache.ttl_secs] must be positive".into()
            ));
        }

        if self.render.max_depth == 0 {
            bail!(ConfigError::Validation(
                "[render.max_depth] must be at least 1".into()
            ));
        }

        if !self.templates.folder.starts_with('/') {
            bail!(ConfigError::Validation(
                "[templates.folder] must be an absolute path".into()
            ));
        }

        if self.server.name.trim().is_empty() {
            bail!(ConfigError::Validation("[server.name] must not be empty".into()));
        }

        let base = &self.server.rest_base;
        if !(base.starts_with('/') || base.starts_with("http://") || base.starts_with("https://")) {
            bail!(ConfigError::Validation(
                "[server.rest_base] must start with /, http:// or https://".into()
            ));
        }

        if self.accounts.keys().any(|name| name.trim().is_empty()) {
            bail!(ConfigError::Validation(
                "[accounts] keys must be account names".into()
            ));
        }

        Ok(())
    }

    /// Push the directory data of this file into `store`.
    pub fn apply(&self, store: &MemoryStore) -> Result<()> {
        store.set_rest_base(&self.server.rest_base);

        for (name, settings) in &self.accounts {
            let Some(account) = store.account(AccountBy::Name(name))? else {
                bail!(ConfigError::UnknownAccount(name.clone()));
            };
            if let Some(locale) = &settings.locale {
                store.set_locale(&account.id, locale)?;
            }
            if let Some(domain) = &settings.domain {
                store.set_domain(&account.id, domain);
            }
            if let Some(server) = &settings.server {
                store.set_server(&account.id, server)?;
            }
        }

        if let Some(account) = &self.templates.account {
            store.set_attr(None, NOTEBOOK_ACCOUNT_ATTR, account);
        }
        for (domain, settings) in &self.domains {
            if let Some(account) = &settings.notebook_account {
                store.set_attr(Some(domain), NOTEBOOK_ACCOUNT_ATTR, account);
            }
        }

        for (locale, messages) in &self.messages {
            let locale = (locale != DEFAULT_MESSAGES).then_some(locale.as_str());
            for (key, text) in messages {
                store.set_message(key, locale, text);
            }
        }
        Ok(())
    }
}
