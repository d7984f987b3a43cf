//! Cluster configuration loader.
//!
//! Reads `name`, `location` and `gcloud.core.project` from a YAML document.
//! Each key is looked up as a Kptfile setter first, then as a flat key at the
//! document root, then as a dotted path of nested mappings.

use crate::error::ConfigError;
use crate::models::{ClusterConfig, KEY_LOCATION, KEY_NAME, KEY_PROJECT};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

const SETTER_PREFIX: &str = "io.k8s.cli.setters.";

/// Load the cluster configuration from a YAML file.
pub fn load_cluster_config(path: &Path) -> Result<ClusterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config = parse_cluster_config(&content)?;
    log::debug!(
        "[Config] Loaded {} from {}",
        describe(&config),
        path.display()
    );
    Ok(config)
}

/// Parse a cluster configuration from YAML text.
pub fn parse_cluster_config(content: &str) -> Result<ClusterConfig, ConfigError> {
    let doc: Value = serde_yaml::from_str(content)?;

    Ok(ClusterConfig {
        name: lookup_value(&doc, KEY_NAME)?,
        location: lookup_value(&doc, KEY_LOCATION)?,
        project: lookup_value(&doc, KEY_PROJECT)?,
    })
}

/// Resolve a single key in the three supported layouts.
pub fn lookup_value(doc: &Value, key: &str) -> Result<String, ConfigError> {
    let found = setter_value(doc, key)
        .or_else(|| doc.get(key).filter(|v| !v.is_mapping()))
        .or_else(|| nested_value(doc, key));

    found
        .and_then(scalar_to_string)
        .ok_or_else(|| ConfigError::MissingValue(key.to_string()))
}

fn setter_value<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    doc.get("openAPI")?
        .get("definitions")?
        .get(format!("{}{}", SETTER_PREFIX, key).as_str())?
        .get("x-k8s-cli")?
        .get("setter")?
        .get("value")
}

fn nested_value<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(doc, |node, segment| node.get(segment))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(config: &ClusterConfig) -> String {
    format!(
        "name={} location={} project={}",
        config.name, config.location, config.project
    )
}
