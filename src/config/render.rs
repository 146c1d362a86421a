//! `[render]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[render]` section in wiklet.toml.
///
/// # Example
/// ```toml
/// [render]
/// max_depth = 8
/// chrome = "_Template"
/// locale = "en_US"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// How deeply templates may include each other before the composer
    /// gives up on that branch.
    #[serde(default = "defaults::render::max_depth")]
    #[educe(Default = defaults::render::max_depth())]
    pub max_depth: usize,

    /// Chrome template wrapped around rendered pages, e.g. `_Template`.
    /// Pages render bare when unset.
    #[serde(default = "defaults::render::chrome")]
    #[educe(Default = defaults::render::chrome())]
    pub chrome: Option<String>,

    /// Locale for date directives when the request carries none.
    #[serde(default = "defaults::render::locale")]
    #[educe(Default = defaults::render::locale())]
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::WikiConfig;

    #[test]
    fn test_render_config() {
        let config = r#"
            [render]
            max_depth = 4
            chrome = "_Template"
            locale = "fr_FR"
        "#;
        let config: WikiConfig = toml::from_str(config).unwrap();

        assert_eq!(config.render.max_depth, 4);
        assert_eq!(config.render.chrome.as_deref(), Some("_Template"));
        assert_eq!(config.render.locale.as_deref(), Some("fr_FR"));
    }

    #[test]
    fn test_render_config_defaults() {
        let config: WikiConfig = toml::from_str("[render]").unwrap();

        assert_eq!(config.render.max_depth, 16);
        assert!(config.render.chrome.is_none());
        assert!(config.render.locale.is_none());
    }
}
