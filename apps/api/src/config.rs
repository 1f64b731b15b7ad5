//! API configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sensorapi_shared_config::{
    get_required_env, parse_env, CommonConfig, DatabaseConfig, Environment,
};
use sensorapi_store::RequestContext;

/// Default per-request deadline for store calls, in seconds
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// API configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the store layer
    pub common: CommonConfig,

    /// Deadline applied to each request context (0 disables it)
    pub query_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode `DATABASE_URL` must be set explicitly. In
    /// development/staging mode the local default database is used.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();

        if environment.is_production() {
            Self::validate_database_url()?;
        }

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let query_timeout_secs = parse_env("QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)
            .map_err(|e| anyhow::anyhow!("Invalid QUERY_TIMEOUT_SECS value: {}", e))?;

        Ok(Self {
            common,
            query_timeout_secs,
        })
    }

    /// Validate that DATABASE_URL is explicitly set in production
    fn validate_database_url() -> Result<()> {
        const REQUIRED: &str = "DATABASE_URL environment variable is required in production. \
                                Please set your PostgreSQL connection string.";

        let url = get_required_env("DATABASE_URL").context(REQUIRED)?;
        if url.is_empty() {
            bail!(REQUIRED);
        }
        Ok(())
    }

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Log filter directives from `RUST_LOG` or `LOG_LEVEL`
    pub fn log_level(&self) -> Option<&str> {
        self.common.log_level.as_deref()
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }

    /// Fresh context carrying the configured deadline
    pub fn request_context(&self) -> RequestContext {
        let ctx = RequestContext::background();
        match self.query_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_required_in_production() {
        temp_env::with_vars(
            [("ENVIRONMENT", Some("production")), ("DATABASE_URL", None)],
            || {
                let err = Config::from_env().unwrap_err().to_string();
                assert!(err.contains("DATABASE_URL"));
                assert!(err.contains("required in production"));
            },
        );
    }

    #[test]
    fn test_missing_database_url_keeps_variable_cause() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::validate_database_url().unwrap_err();
            assert!(err.to_string().contains("required in production"));
            assert!(format!("{:#}", err).contains("missing required environment variable"));
        });
    }

    #[test]
    fn test_empty_database_url_fails() {
        temp_env::with_var("DATABASE_URL", Some(""), || {
            assert!(Config::validate_database_url().is_err());
        });
    }

    #[test]
    fn test_production_with_database_url() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", Some("production")),
                ("DATABASE_URL", Some("postgres://prod:secret@db:5432/sensorapi")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment().is_production());
                assert_eq!(
                    config.database().url,
                    "postgres://prod:secret@db:5432/sensorapi"
                );
            },
        );
    }

    #[test]
    fn test_development_defaults() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", None::<&str>),
                ("DATABASE_URL", None),
                ("QUERY_TIMEOUT_SECS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.environment().is_development());
                assert_eq!(config.query_timeout_secs, DEFAULT_QUERY_TIMEOUT_SECS);
                assert!(config.request_context().deadline().is_some());
            },
        );
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        temp_env::with_vars(
            [("ENVIRONMENT", None), ("QUERY_TIMEOUT_SECS", Some("0"))],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.query_timeout(), None);
                assert!(config.request_context().deadline().is_none());
            },
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        temp_env::with_vars(
            [("ENVIRONMENT", None), ("QUERY_TIMEOUT_SECS", Some("soon"))],
            || {
                let err = Config::from_env().unwrap_err().to_string();
                assert!(err.contains("QUERY_TIMEOUT_SECS"));
            },
        );
    }
}
