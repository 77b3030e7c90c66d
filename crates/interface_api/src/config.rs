//! API configuration

use std::time::Duration;

use serde::Deserialize;

use core_kernel::{CoreError, Currency, Timezone};
use domain_levy::RetryPolicy;
use infra_db::DatabaseConfig;

/// API configuration
///
/// Loaded from `LEVY_`-prefixed environment variables, e.g. `LEVY_PORT=9090`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL URL; empty runs against the in-memory store
    pub database_url: String,
    pub db_min_connections: u32,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Zero keeps idle connections open
    pub db_idle_timeout_secs: u64,
    /// Zero disables connection recycling
    pub db_max_lifetime_secs: u64,
    /// Log level
    pub log_level: String,
    /// Timezone that decides the current billing period
    pub timezone: Timezone,
    /// Currency used for display amounts
    pub currency: Currency,
    /// Attempts at persisting a payment before giving up
    pub commit_max_attempts: u32,
    /// Delay before the second attempt; grows linearly
    pub commit_retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: String::new(),
            db_min_connections: 2,
            db_max_connections: 10,
            db_acquire_timeout_secs: 30,
            db_idle_timeout_secs: 600,
            db_max_lifetime_secs: 1800,
            log_level: "info".to_string(),
            timezone: Timezone::default(),
            currency: Currency::NGN,
            commit_max_attempts: 3,
            commit_retry_backoff_ms: 200,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, CoreError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("LEVY").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.commit_max_attempts == 0 {
            return Err(CoreError::configuration(
                "commit_max_attempts must be at least 1",
            ));
        }
        self.database_config()
            .validate()
            .map_err(|e| CoreError::configuration(e.to_string()))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_database(&self) -> bool {
        !self.database_url.trim().is_empty()
    }

    /// Pool settings for [`infra_db::create_pool`]
    pub fn database_config(&self) -> DatabaseConfig {
        let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        DatabaseConfig::new(self.database_url.clone())
            .connections(self.db_min_connections, self.db_max_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
            .idle_timeout(optional(self.db_idle_timeout_secs))
            .max_lifetime(optional(self.db_max_lifetime_secs))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.commit_max_attempts,
            Duration::from_millis(self.commit_retry_backoff_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.timezone.name(), "Africa/Lagos");
        assert_eq!(config.currency, Currency::NGN);
        assert!(!config.uses_database());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = ApiConfig {
            commit_max_attempts: 5,
            commit_retry_backoff_ms: 50,
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ApiConfig {
            commit_max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let config: ApiConfig = serde_json::from_str(
            r#"{"port": 9090, "timezone": "Africa/Nairobi", "currency": "KES"}"#,
        )
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.timezone.name(), "Africa/Nairobi");
        assert_eq!(config.currency, Currency::KES);
        assert_eq!(config.commit_max_attempts, 3);
    }

    #[test]
    fn test_database_settings_reach_the_pool() {
        let config: ApiConfig = serde_json::from_str(
            r#"{"database_url": "postgres://db/levy", "db_max_connections": 4,
                "db_min_connections": 1, "db_idle_timeout_secs": 0}"#,
        )
        .unwrap();
        let db = config.database_config();

        assert_eq!(db.url, "postgres://db/levy");
        assert_eq!((db.min_connections, db.max_connections), (1, 4));
        assert_eq!(db.acquire_timeout, Duration::from_secs(30));
        assert_eq!(db.idle_timeout, None);
        assert_eq!(db.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_inverted_pool_limits_rejected() {
        let config = ApiConfig {
            db_min_connections: 8,
            db_max_connections: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }
}
