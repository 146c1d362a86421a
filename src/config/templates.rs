//! `[templates]` section configuration.
//!
//! Where `_`-prefixed templates are looked up once the page's own notebook
//! chain has nothing to offer.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[templates]` section in wiklet.toml.
///
/// # Example
/// ```toml
/// [templates]
/// account = "templates@example.com"
/// folder = "/Template"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Server-wide template account. Per-domain accounts are set under
    /// `[domains.*]` and win over this one.
    #[serde(default = "defaults::templates::account")]
    #[educe(Default = defaults::templates::account())]
    pub account: Option<String>,

    /// Folder inside a template account that holds the templates.
    #[serde(default = "defaults::templates::folder")]
    #[educe(Default = defaults::templates::folder())]
    pub folder: String,
}
