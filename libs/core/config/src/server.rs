use crate::{env_or_default, env_parse, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// Bind address for a listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Read host and port from the given variables, falling back to
    /// `0.0.0.0` and `default_port`.
    pub fn from_env_keys(
        host_key: &str,
        port_key: &str,
        default_port: u16,
    ) -> Result<Self, ConfigError> {
        let host = env_or_default(host_key, &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse(port_key, &default_port.to_string())?;

        Ok(Self { host, port })
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// HTTP listener address from `HOST` (default 0.0.0.0) and `PORT` (default 8080).
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_keys("HOST", "PORT", 8080)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 8080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars([("HOST", None::<&str>), ("PORT", None::<&str>)], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
        });
    }

    #[test]
    fn test_server_config_from_env_with_custom_values() {
        temp_env::with_vars(
            [("HOST", Some("127.0.0.1")), ("PORT", Some("3000"))],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config, ServerConfig::new("127.0.0.1", 3000));
            },
        );
    }

    #[test]
    fn test_server_config_custom_keys() {
        temp_env::with_vars(
            [("RPC_HOST", None::<&str>), ("RPC_PORT", Some("9090"))],
            || {
                let config = ServerConfig::from_env_keys("RPC_HOST", "RPC_PORT", 50051).unwrap();
                assert_eq!(config.address(), "0.0.0.0:9090");
            },
        );
    }

    #[test]
    fn test_server_config_from_env_port_out_of_range() {
        temp_env::with_var("PORT", Some("99999"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }
}
