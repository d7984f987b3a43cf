//! Management Cluster Orchestrator
//!
//! Provisions a Kubernetes management cluster from a declarative config
//! document and installs Config Connector into it, by driving external
//! tools (`kustomize`, `anthoscli`, `kubectl`, `gcloud`) in dependency order.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy and exit codes
//! - **models**: Cluster config, manifest groups and task names
//! - **config**: Cluster config loading, validation and orchestrator settings
//! - **system**: Build output layout
//! - **orchestrator**: Task graph, command execution, readiness polling and the task phases
//! - **log_collector**: Decoupled logging to stderr and session files
//! - **cli**: Command-line flags and environment overrides

// Core foundational modules
pub mod error;
pub mod models;

// Configuration: cluster document, validation, settings
pub mod config;

// Build output layout and logging macros
pub mod system;

// Task planning and execution
pub mod orchestrator;

// Robust, decoupled logging system
pub mod log_collector;

pub mod cli;

// Scripted command runner shared by unit and integration tests
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{ConfigError, Result, TaskError};

pub use models::{ClusterConfig, ManifestGroup, TaskName};

pub use config::Settings;

pub use orchestrator::{
    CommandRunner, DryRunRunner, Orchestrator, ProcessRunner, RunReport, TaskGraph, TaskState,
    ToolCommand,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_error_reexport() {
        let _: Result<i32> = Ok(42);
        let err = TaskError::from(ConfigError::MissingValue("name".into()));
        assert_eq!(err.exit_code(), error::EXIT_USAGE);
    }

    #[test]
    fn test_models_reexport() {
        assert_eq!(TaskName::Clean.as_str(), "clean");
        assert_eq!(ManifestGroup::Cluster.dir_name(), "cluster");
    }
}
