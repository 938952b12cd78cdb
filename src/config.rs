use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning parameters for the commit coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Upper bound on a single ask round-trip.
    pub ask_timeout: Duration,
    /// Total send attempts for one `can_commit` call (at least 1).
    pub max_ask_attempts: u32,
    /// Pause between consecutive ask attempts.
    pub retry_interval: Duration,
    /// Depth of the dispatcher mailbox.
    pub mailbox_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ask_timeout: Duration::from_secs(30),
            max_ask_attempts: 3,
            retry_interval: Duration::from_secs(3),
            mailbox_capacity: 1024,
        }
    }
}

impl CoordinatorConfig {
    /// Create a new builder for CoordinatorConfig
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_ask_attempts == 0 {
            return Err("max_ask_attempts must be at least 1".to_string());
        }
        if self.ask_timeout.is_zero() {
            return Err("ask_timeout must be non-zero".to_string());
        }
        if self.mailbox_capacity == 0 {
            return Err("mailbox_capacity must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Short timeouts and intervals, suitable for tests and local runs.
    pub fn development() -> Self {
        Self {
            ask_timeout: Duration::from_millis(200),
            max_ask_attempts: 3,
            retry_interval: Duration::from_millis(10),
            mailbox_capacity: 64,
        }
    }
}

/// Builder for CoordinatorConfig
pub struct CoordinatorConfigBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    /// Set the per-attempt ask timeout
    pub fn ask_timeout(mut self, timeout: Duration) -> Self {
        self.config.ask_timeout = timeout;
        self
    }

    /// Set the number of send attempts
    pub fn max_ask_attempts(mut self, attempts: u32) -> Self {
        self.config.max_ask_attempts = attempts;
        self
    }

    /// Set the pause between attempts
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Set the dispatcher mailbox depth
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CoordinatorConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for CoordinatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = CoordinatorConfig::development();
        assert!(config.validate().is_ok());
        assert!(config.ask_timeout < Duration::from_secs(1));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = CoordinatorConfig::default();

        config.max_ask_attempts = 0;
        assert!(config.validate().is_err());
        config.max_ask_attempts = 3;

        config.ask_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.ask_timeout = Duration::from_secs(1);

        config.mailbox_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = CoordinatorConfig::builder()
            .ask_timeout(Duration::from_secs(5))
            .max_ask_attempts(5)
            .retry_interval(Duration::from_millis(500))
            .mailbox_capacity(256)
            .build()
            .unwrap();

        assert_eq!(config.ask_timeout, Duration::from_secs(5));
        assert_eq!(config.max_ask_attempts, 5);
        assert_eq!(config.retry_interval, Duration::from_millis(500));
        assert_eq!(config.mailbox_capacity, 256);
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = CoordinatorConfig::builder().max_ask_attempts(0).build();
        assert!(result.is_err());
    }
}
