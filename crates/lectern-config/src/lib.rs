//! Declarative configuration shared by the Lectern daemon and its tooling.
//!
//! Configuration resolves in two layers: built-in defaults, then named
//! `LECTERN_*` environment variables. CLI overrides are applied by the
//! binary after loading. All parse failures surface as structured
//! [`ConfigError`] values; loading never panics.

mod defaults;
mod logging;
mod socket;
mod tokens;

use std::env;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, default_socket_endpoint};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};
pub use tokens::{
    DEFAULT_ACCESS_EXPIRY_SECS, DEFAULT_GUEST_EXPIRY_SECS, DEFAULT_REFRESH_EXPIRY_SECS,
    TokenConfig,
};

/// Environment variable naming the daemon socket (`unix://` or `tcp://` URL).
pub const ENV_SOCKET: &str = "LECTERN_SOCKET";
/// Environment variable holding the tracing filter expression.
pub const ENV_LOG_FILTER: &str = "LECTERN_LOG_FILTER";
/// Environment variable selecting the log format (`json` or `compact`).
pub const ENV_LOG_FORMAT: &str = "LECTERN_LOG_FORMAT";
/// Environment variable overriding the access-token secret.
pub const ENV_ACCESS_SECRET: &str = "LECTERN_JWT_ACCESS_SECRET";
/// Environment variable overriding the guest-token secret.
pub const ENV_GUEST_SECRET: &str = "LECTERN_JWT_GUEST_SECRET";
/// Environment variable overriding the refresh-token secret.
pub const ENV_REFRESH_SECRET: &str = "LECTERN_JWT_REFRESH_SECRET";
/// Environment variable overriding the access-token expiry (seconds).
pub const ENV_ACCESS_EXPIRY: &str = "LECTERN_JWT_ACCESS_EXPIRY_SECS";
/// Environment variable overriding the guest-token expiry (seconds).
pub const ENV_GUEST_EXPIRY: &str = "LECTERN_JWT_GUEST_EXPIRY_SECS";
/// Environment variable overriding the refresh-token expiry (seconds).
pub const ENV_REFRESH_EXPIRY: &str = "LECTERN_JWT_REFRESH_EXPIRY_SECS";

/// Resolved daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Endpoint the daemon listens on.
    pub socket: SocketEndpoint,
    /// Tracing filter expression.
    pub log_filter: String,
    /// Logging output format.
    pub log_format: LogFormat,
    /// Token signing secrets and expiries.
    pub tokens: TokenConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: default_socket_endpoint(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            tokens: TokenConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults overlaid with the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| env::var(name).ok())
    }

    /// Loads configuration from defaults overlaid with the supplied
    /// environment source. Exposed so tests can inject variables without
    /// mutating the process environment.
    pub fn load_with(
        env_var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = env_var(ENV_SOCKET) {
            config.socket = value
                .parse()
                .map_err(|source| ConfigError::InvalidSocket { value, source })?;
        }
        if let Some(value) = env_var(ENV_LOG_FILTER) {
            config.log_filter = value;
        }
        if let Some(value) = env_var(ENV_LOG_FORMAT) {
            config.log_format = value
                .parse()
                .map_err(|source| ConfigError::InvalidLogFormat { value, source })?;
        }

        if let Some(value) = env_var(ENV_ACCESS_SECRET) {
            config.tokens.access_secret = value;
        }
        if let Some(value) = env_var(ENV_GUEST_SECRET) {
            config.tokens.guest_secret = value;
        }
        if let Some(value) = env_var(ENV_REFRESH_SECRET) {
            config.tokens.refresh_secret = value;
        }
        config.tokens.access_expiry_secs =
            parse_expiry(&env_var, ENV_ACCESS_EXPIRY, config.tokens.access_expiry_secs)?;
        config.tokens.guest_expiry_secs =
            parse_expiry(&env_var, ENV_GUEST_EXPIRY, config.tokens.guest_expiry_secs)?;
        config.tokens.refresh_expiry_secs =
            parse_expiry(&env_var, ENV_REFRESH_EXPIRY, config.tokens.refresh_expiry_secs)?;

        Ok(config)
    }
}

fn parse_expiry(
    env_var: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match env_var(name) {
        Some(value) => value.parse().map_err(|source| ConfigError::InvalidExpiry {
            name,
            value,
            source,
        }),
        None => Ok(default),
    }
}

/// Errors surfaced while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The socket environment variable did not parse as an endpoint URL.
    #[error("invalid socket endpoint '{value}': {source}")]
    InvalidSocket {
        value: String,
        #[source]
        source: SocketParseError,
    },
    /// The log format variable named no known format.
    #[error("invalid log format '{value}': {source}")]
    InvalidLogFormat {
        value: String,
        #[source]
        source: LogFormatParseError,
    },
    /// An expiry variable did not parse as a number of seconds.
    #[error("invalid value '{value}' for {name}: {source}")]
    InvalidExpiry {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = env_from(pairs);
        Config::load_with(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = load(&[]).expect("load defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn environment_overrides_socket_and_logging() {
        let config = load(&[
            (ENV_SOCKET, "tcp://127.0.0.1:9000"),
            (ENV_LOG_FILTER, "debug"),
            (ENV_LOG_FORMAT, "compact"),
        ])
        .expect("load overrides");
        assert_eq!(config.socket, SocketEndpoint::tcp("127.0.0.1", 9000));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn environment_overrides_token_settings() {
        let config = load(&[
            (ENV_ACCESS_SECRET, "a"),
            (ENV_GUEST_SECRET, "g"),
            (ENV_REFRESH_SECRET, "r"),
            (ENV_ACCESS_EXPIRY, "60"),
            (ENV_GUEST_EXPIRY, "120"),
            (ENV_REFRESH_EXPIRY, "180"),
        ])
        .expect("load token overrides");
        assert_eq!(config.tokens.access_secret, "a");
        assert_eq!(config.tokens.guest_secret, "g");
        assert_eq!(config.tokens.refresh_secret, "r");
        assert_eq!(config.tokens.access_expiry_secs, 60);
        assert_eq!(config.tokens.guest_expiry_secs, 120);
        assert_eq!(config.tokens.refresh_expiry_secs, 180);
    }

    #[rstest]
    #[case(ENV_SOCKET, "not-a-url")]
    #[case(ENV_LOG_FORMAT, "yaml")]
    #[case(ENV_ACCESS_EXPIRY, "soon")]
    fn invalid_values_fail_fast(#[case] name: &'static str, #[case] value: &str) {
        let error = load(&[(name, value)]).expect_err("load must fail");
        let message = error.to_string();
        assert!(message.contains(value), "unexpected message: {message}");
    }
}
