//! `[server]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[server]` section in wiklet.toml - identity of this process.
///
/// Accounts whose `server` differs from `name` are served through the
/// remote transport.
///
/// # Example
/// ```toml
/// [server]
/// name = "mail1.example.com"
/// rest_base = "https://mail1.example.com/home"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "defaults::server::name")]
    #[educe(Default = defaults::server::name())]
    pub name: String,

    /// Prefix of item urls; the account name and item path follow it.
    #[serde(default = "defaults::server::rest_base")]
    #[educe(Default = defaults::server::rest_base())]
    pub rest_base: String,
}

#[cfg(test)]
mod tests {
    use super::super::WikiConfig;

    #[test]
    fn test_server_config() {
        let config = r#"
            [server]
            name = "mail1"
            rest_base = "https://mail1/home"
        "#;
        let config: WikiConfig = toml::from_str(config).unwrap();

        assert_eq!(config.server.name, "mail1");
        assert_eq!(config.server.rest_base, "https://mail1/home");
    }

    #[test]
    fn test_server_config_defaults() {
        let config: WikiConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.name, "localhost");
        assert_eq!(config.server.rest_base, "/home");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [server]
            port = 80
        "#;
        let result: Result<WikiConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
