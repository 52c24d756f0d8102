//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size, thresholds, intervals > 0)
//! - Check API identity (non-empty, unique) and check targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("uptime_tests.config.{0} must be greater than zero")]
    Zero(&'static str),

    #[error("poller_lease_secs ({lease}) must exceed poller_tick_secs ({tick})")]
    LeaseTooShort { lease: u64, tick: u64 },

    #[error("events.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("api at index {0} has an empty api_id")]
    EmptyApiId(usize),

    #[error("duplicate api_id: {0}")]
    DuplicateApiId(String),

    #[error("api {0} has a check target with an empty url")]
    EmptyCheckUrl(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let settings = &config.uptime_tests.config;

    if settings.checker_pool_size == 0 {
        errors.push(ValidationError::Zero("checker_pool_size"));
    }
    if settings.failure_trigger_sample_size == 0 {
        errors.push(ValidationError::Zero("failure_trigger_sample_size"));
    }
    if settings.time_wait == 0 {
        errors.push(ValidationError::Zero("time_wait"));
    }
    if settings.poller_tick_secs == 0 {
        errors.push(ValidationError::Zero("poller_tick_secs"));
    }
    if settings.poller_lease_secs == 0 {
        errors.push(ValidationError::Zero("poller_lease_secs"));
    } else if settings.poller_lease_secs <= settings.poller_tick_secs {
        // The leader must renew before its lease lapses.
        errors.push(ValidationError::LeaseTooShort {
            lease: settings.poller_lease_secs,
            tick: settings.poller_tick_secs,
        });
    }
    if config.events.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    let mut seen = HashSet::new();
    for (index, api) in config.apis.iter().enumerate() {
        if api.api_id.is_empty() {
            errors.push(ValidationError::EmptyApiId(index));
            continue;
        }
        if !seen.insert(api.api_id.as_str()) {
            errors.push(ValidationError::DuplicateApiId(api.api_id.clone()));
        }
        if api.uptime_tests.check_list.iter().any(|check| check.url.trim().is_empty()) {
            errors.push(ValidationError::EmptyCheckUrl(api.api_id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ApiDefinition, HostCheckObject, UptimeTests};

    fn api(id: &str, urls: &[&str]) -> ApiDefinition {
        ApiDefinition {
            api_id: id.to_string(),
            name: id.to_string(),
            uptime_tests: UptimeTests {
                check_list: urls.iter().map(|u| HostCheckObject::new(*u)).collect(),
            },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.uptime_tests.config.checker_pool_size = 0;
        config.uptime_tests.config.poller_lease_secs = 5;
        config.apis = vec![
            api("a", &["http://a.test/"]),
            api("a", &[""]),
            api("", &[]),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::Zero("checker_pool_size")));
        assert!(errors.contains(&ValidationError::LeaseTooShort { lease: 5, tick: 10 }));
        assert!(errors.contains(&ValidationError::DuplicateApiId("a".into())));
        assert!(errors.contains(&ValidationError::EmptyCheckUrl("a".into())));
        assert!(errors.contains(&ValidationError::EmptyApiId(2)));
        assert_eq!(errors.len(), 5);
    }
}
