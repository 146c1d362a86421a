//! `[cache]` section configuration.
//!
//! Sizes of the three render caches and the lifetime of their entries.

use std::time::Duration;

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[cache]` section in wiklet.toml.
///
/// # Example
/// ```toml
/// [cache]
/// ttl_secs = 300
/// notebooks = 512
/// pages = 128
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Lifetime of notebooks and rendered pages, in seconds.
    #[serde(default = "defaults::cache::ttl_secs")]
    #[educe(Default = defaults::cache::ttl_secs())]
    pub ttl_secs: u64,

    /// Notebooks kept across all accounts.
    #[serde(default = "defaults::cache::notebooks")]
    #[educe(Default = defaults::cache::notebooks())]
    pub notebooks: usize,

    /// Page entries kept per notebook. A folder with more documents than
    /// this is looked up name by name.
    #[serde(default = "defaults::cache::pages")]
    #[educe(Default = defaults::cache::pages())]
    pub pages: usize,

    /// Rendered pages, keyed by requestor and item.
    #[serde(default = "defaults::cache::renders")]
    #[educe(Default = defaults::cache::renders())]
    pub renders: usize,

    /// Composed chrome + item renders, keyed by the templates involved.
    #[serde(default = "defaults::cache::compositions")]
    #[educe(Default = defaults::cache::compositions())]
    pub compositions: usize,
}

impl CacheConfig {
    #[inline]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
