use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a single request, including its database work.
    pub request_timeout: Duration,
    /// Origins allowed by CORS. Empty means the router default.
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables with sensible defaults:
    /// - HOST: 0.0.0.0
    /// - PORT: 8080
    /// - REQUEST_TIMEOUT_SECS: 30
    /// - CORS_ALLOWED_ORIGIN: comma separated, defaults to http://localhost:3000
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse_or("PORT", 8080u16)?;
        let timeout_secs = env_parse_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let cors_allowed_origins = env_or_default("CORS_ALLOWED_ORIGIN", DEFAULT_CORS_ORIGIN)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            cors_allowed_origins,
        })
    }
}

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = ["HOST", "PORT", "REQUEST_TIMEOUT_SECS", "CORS_ALLOWED_ORIGIN"];

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars(VARS.map(|k| (k, None::<&str>)), || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
            assert_eq!(config.request_timeout, Duration::from_secs(30));
            assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        });
    }

    #[test]
    fn test_server_config_from_env_with_custom_values() {
        temp_env::with_vars(
            [
                ("HOST", Some("127.0.0.1")),
                ("PORT", Some("3000")),
                ("REQUEST_TIMEOUT_SECS", Some("5")),
                ("CORS_ALLOWED_ORIGIN", Some("https://a.test, https://b.test,")),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.address(), "127.0.0.1:3000");
                assert_eq!(config.request_timeout, Duration::from_secs(5));
                assert_eq!(
                    config.cors_allowed_origins,
                    vec!["https://a.test", "https://b.test"]
                );
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

    #[test]
    fn test_server_config_new_keeps_defaults() {
        let config = ServerConfig::new("localhost".to_string(), 5000);
        assert_eq!(config.address(), "localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
