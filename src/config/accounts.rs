//! `[accounts.*]` and `[domains.*]` tables.
//!
//! Directory data the on-disk account tree cannot express: locales, domain
//! overrides, remote placement, and per-domain template accounts.

use serde::{Deserialize, Serialize};

/// One `[accounts."name"]` table, keyed by account name.
///
/// # Example
/// ```toml
/// [accounts."alice@example.com"]
/// locale = "fr_FR"
/// domain = "example.com"
/// server = "mail2"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Locale for messages and dates rendered from this account's pages.
    #[serde(default)]
    pub locale: Option<String>,

    /// Domain override; defaults to the part after `@`.
    #[serde(default)]
    pub domain: Option<String>,

    /// Server hosting the mailbox.
    #[serde(default)]
    pub server: Option<String>,
}

/// One `[domains."name"]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    /// Account holding the domain's fallback templates.
    #[serde(default)]
    pub notebook_account: Option<String>,
}
