//! TOML file configuration structures.
//!
//! These structs directly map to the `tiffin-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub gateway: GatewayFileConfig,
    pub app: AppConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Payment gateway credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFileConfig {
    /// Gateway API host, may carry a path prefix.
    pub host_url: Url,
    /// Merchant id issued by the gateway.
    pub merchant_id: String,
    /// Shared salt used to sign every request.
    pub salt_key: String,
    /// Which salt the gateway should verify against.
    #[serde(default = "default_salt_index")]
    pub salt_index: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_salt_index() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    10
}

/// Application section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Our own public base URL; the gateway redirects browsers back to
    /// `{base_url}/payment/validate/{merchant_transaction_id}`.
    pub base_url: Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[gateway]
host_url = "https://api.gateway.test/apis/hermes"
merchant_id = "MERCHANTUAT"
salt_key = "099eb0cd-02cf-4e2a-8aca-3e6c6aff0399"
salt_index = 1

[app]
base_url = "https://food.campus.test"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.gateway.merchant_id, "MERCHANTUAT");
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.app.base_url.as_str(), "https://food.campus.test/");
    }

    #[test]
    fn test_defaults_apply() {
        let toml_str = r#"
[server]

[gateway]
host_url = "https://api.gateway.test"
merchant_id = "M"
salt_key = "s"

[app]
base_url = "https://food.campus.test"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.gateway.salt_index, 1);
    }
}
