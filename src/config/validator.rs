//! Config validation.

use crate::error::ConfigError;
use crate::models::ClusterConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static CLUSTER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][-a-z0-9]{0,16}[a-z0-9]$").expect("cluster name pattern is valid")
});

/// Validate a cluster name: lowercase start, alphanumeric end, at most 18 chars.
pub fn validate_cluster_name(name: &str) -> Result<(), ConfigError> {
    if CLUSTER_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_string()))
    }
}

/// Reject values that are empty or still hold their placeholder.
///
/// Every task that reads the configuration runs this before any tool.
pub fn ensure_values_set(config: &ClusterConfig) -> Result<(), ConfigError> {
    for (key, value, sentinel) in config.fields() {
        if value.trim().is_empty() || value == sentinel {
            return Err(ConfigError::Unset {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Human readable diagnostics for every invalid value; empty when valid.
pub fn diagnose(config: &ClusterConfig) -> Vec<String> {
    let mut problems = Vec::new();
    if let Err(e) = validate_cluster_name(&config.name) {
        problems.push(e.to_string());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["mgmt1", "ab", "a-b", "management-cluster", "a1234567890123456"] {
            assert!(validate_cluster_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "",
            "a",
            "1mgmt",
            "Mgmt",
            "mgmt-",
            "mgmt_1",
            "this-name-is-way-too-long-1",
            "abcdefghijklmnopqrs",
        ] {
            assert!(validate_cluster_name(name).is_err(), "{} should be invalid", name);
        }
    }

    #[test]
    fn test_eighteen_chars_is_the_limit() {
        assert!(validate_cluster_name("abcdefghijklmnopqr").is_ok());
        assert!(validate_cluster_name("abcdefghijklmnopqrs").is_err());
    }

    #[test]
    fn test_sentinels_are_rejected() {
        let config = ClusterConfig::new("NAME", "LOCATION", "PROJECT");
        match ensure_values_set(&config) {
            Err(ConfigError::Unset { key, value }) => {
                assert_eq!(key, "name");
                assert_eq!(value, "NAME");
            }
            other => panic!("expected Unset, got {:?}", other),
        }

        let config = ClusterConfig::new("mgmt1", "us-central1", "PROJECT");
        assert!(matches!(
            ensure_values_set(&config),
            Err(ConfigError::Unset { .. })
        ));

        let config = ClusterConfig::new("mgmt1", "  ", "my-proj");
        assert!(ensure_values_set(&config).is_err());
    }

    #[test]
    fn test_diagnose() {
        let good = ClusterConfig::new("mgmt1", "us-central1", "my-proj");
        assert!(diagnose(&good).is_empty());
        assert!(ensure_values_set(&good).is_ok());

        let bad = ClusterConfig::new("this-name-is-way-too-long-1", "us-central1", "my-proj");
        let problems = diagnose(&bad);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("this-name-is-way-too-long-1"));
    }
}
