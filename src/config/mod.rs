//! Configuration module.
//!
//! # Module Structure
//!
//! - `loader`: reads the cluster configuration document (name, location, project)
//! - `validator`: cluster name pattern and unset-value checks
//! - `settings`: orchestrator settings (directories, tools, context, timings)
//!
//! # Configuration Flow
//!
//! 1. `Settings` are resolved once from defaults, the settings file, env and flags
//! 2. The orchestrator plans the requested tasks
//! 3. If any planned task needs it, `ClusterConfig` is loaded once and checked
//!    for placeholders before the first tool runs
//! 4. The immutable config is handed to every task

pub mod loader;
pub mod settings;
pub mod validator;

pub use loader::{load_cluster_config, parse_cluster_config};
pub use settings::{
    load_settings_file, ReadinessSettings, Settings, SettingsFile, SettingsOverrides, ToolOverrides,
    ToolPaths,
};
pub use validator::{diagnose, ensure_values_set, validate_cluster_name};
