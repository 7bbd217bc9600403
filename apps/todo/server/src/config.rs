use std::time::Duration;

use core_config::tracing::LogConfig;
use core_config::{Environment, FromEnv, env_duration_secs};
use database::sql::DatabaseConfig;

/// Settings for one server process, composed from the shared config types.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub log: LogConfig,
    /// RPC listener (`GRPC_HOST` / `GRPC_PORT`).
    pub grpc: grpc_helpers::ServerConfig,
    /// Gateway listener (`HOST` / `PORT`).
    pub http: core_config::server::ServerConfig,
    pub database: DatabaseConfig,
    /// How long in-flight calls may run after an interrupt (`SHUTDOWN_TIMEOUT_SECS`).
    pub drain_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let log = LogConfig::from_env()?;
        let grpc = grpc_helpers::ServerConfig::from_env()?;
        let http = core_config::server::ServerConfig::from_env()?;
        let database = DatabaseConfig::from_env()?; // DATABASE_URL is required
        let drain_timeout = env_duration_secs("SHUTDOWN_TIMEOUT_SECS", 5)?;

        Ok(Self {
            environment,
            log,
            grpc,
            http,
            database,
            drain_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("APP_ENV", None),
                ("GRPC_HOST", None),
                ("GRPC_PORT", None),
                ("HOST", None),
                ("PORT", None),
                ("SHUTDOWN_TIMEOUT_SECS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.grpc.addr_string(), "0.0.0.0:50051");
                assert_eq!(config.http.address(), "0.0.0.0:8080");
                assert_eq!(config.drain_timeout, Duration::from_secs(5));
                assert_eq!(config.database.url(), "sqlite::memory:");
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://todo@localhost/todo")),
                ("APP_ENV", Some("production")),
                ("GRPC_PORT", Some("9090")),
                ("PORT", Some("9091")),
                ("SHUTDOWN_TIMEOUT_SECS", Some("30")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment.is_production());
                assert_eq!(config.grpc.port, 9090);
                assert_eq!(config.http.port, 9091);
                assert_eq!(config.drain_timeout, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_bad_drain_timeout_names_the_key() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("sqlite::memory:")),
                ("SHUTDOWN_TIMEOUT_SECS", Some("soon")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("SHUTDOWN_TIMEOUT_SECS"));
            },
        );
    }
}
