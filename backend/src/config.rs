//! Server configuration from the environment.
//!
//! | Variable                | Default | Meaning                             |
//! |-------------------------|---------|-------------------------------------|
//! | `EVALBOARD_PORT`        | `3000`  | HTTP port                           |
//! | `EVALBOARD_DATA`        | unset   | CSV loaded before serving           |
//! | `EVALBOARD_CORS_ORIGIN` | unset   | Allowed origin (any when unset)     |
//!
//! A `.env` file in the working directory is read first. CLI flags override
//! whatever is found here.

use std::env;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

pub const PORT_VAR: &str = "EVALBOARD_PORT";
pub const DATA_VAR: &str = "EVALBOARD_DATA";
pub const CORS_ORIGIN_VAR: &str = "EVALBOARD_CORS_ORIGIN";

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// CSV preloaded at start
    pub data: Option<PathBuf>,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data: None,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(PORT_VAR) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { name: PORT_VAR, value })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            data: get(DATA_VAR).map(PathBuf::from),
            cors_origin: get(CORS_ORIGIN_VAR),
        })
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_data(mut self, data: Option<PathBuf>) -> Self {
        if data.is_some() {
            self.data = data;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_VAR, "8080"),
            (DATA_VAR, "data/evaluations.csv"),
            (CORS_ORIGIN_VAR, "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.data, Some(PathBuf::from("data/evaluations.csv")));
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config =
            ServerConfig::from_lookup(lookup(&[(PORT_VAR, " "), (DATA_VAR, "")])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "http")])).unwrap_err();
        assert!(err.to_string().contains(PORT_VAR));
    }

    #[test]
    fn test_cli_overrides() {
        let config = ServerConfig::default()
            .with_port(Some(9000))
            .with_data(None)
            .with_data(Some(PathBuf::from("a.csv")));

        assert_eq!(config.port, 9000);
        assert_eq!(config.data, Some(PathBuf::from("a.csv")));
    }
}
