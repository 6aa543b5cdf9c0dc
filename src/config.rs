use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::build_info::DEFAULT_CLIENT_ID;
use crate::connection::transport::{Resolver, TlsConfig};

/// Poll interval and discovery cooldown unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 100MB
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("No seed brokers configured")]
    NoSeedBrokers,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Everything the monitor needs to reach a cluster and pace its polling.
#[derive(Clone)]
pub struct Config {
    /// Tried in order during discovery; the first one that answers wins.
    pub seed_brokers: Vec<String>,

    pub client_id: Arc<str>,

    /// Time between two poll cycles.
    pub interval: Duration,

    /// Wait before rediscovering after a failed discovery or poll.
    pub cooldown: Duration,

    pub connect_timeout: Duration,

    /// Bounds one request/response round trip.
    pub request_timeout: Duration,

    /// Largest response frame accepted from a broker.
    pub max_message_size: usize,

    pub tls_config: TlsConfig,

    /// Name resolution hook, see [`Resolver`].
    pub resolver: Option<Arc<dyn Resolver>>,
}

impl Config {
    pub fn new(seed_brokers: Vec<String>) -> Self {
        Self {
            seed_brokers,
            client_id: Arc::from(DEFAULT_CLIENT_ID),
            interval: DEFAULT_INTERVAL,
            cooldown: DEFAULT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            tls_config: TlsConfig::default(),
            resolver: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_brokers.is_empty() {
            return Err(ConfigError::NoSeedBrokers);
        }

        if self.interval.is_zero() {
            return Err(ConfigError::Zero("interval"));
        }

        if self.cooldown.is_zero() {
            return Err(ConfigError::Zero("cooldown"));
        }

        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Zero("connect_timeout"));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("request_timeout"));
        }

        if self.max_message_size == 0 {
            return Err(ConfigError::Zero("max_message_size"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("seed_brokers", &self.seed_brokers)
            .field("client_id", &self.client_id)
            .field("interval", &self.interval)
            .field("cooldown", &self.cooldown)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("max_message_size", &self.max_message_size)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(vec!["localhost:9092".to_string()]);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert!(config.client_id.starts_with("kafka-lag/"));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            Config::new(vec![]).validate(),
            Err(ConfigError::NoSeedBrokers)
        );

        let mut config = Config::new(vec!["localhost:9092".to_string()]);
        config.interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::Zero("interval")));
    }

    #[test]
    fn test_validate_zero_durations() {
        let valid = Config::new(vec!["localhost:9092".to_string()]);

        let mut config = valid.clone();
        config.cooldown = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::Zero("cooldown")));

        let mut config = valid.clone();
        config.connect_timeout = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::Zero("connect_timeout")));

        let mut config = valid.clone();
        config.request_timeout = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::Zero("request_timeout")));

        let mut config = valid;
        config.max_message_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("max_message_size")));
    }
}
