//! Unified error type hierarchy for the management cluster orchestrator
//!
//! Provides structured error handling with ConfigError for everything that
//! happens before a tool is invoked, and TaskError for task execution.

use std::io;
use thiserror::Error;

/// Exit code used for configuration, usage, workspace and planning failures.
pub const EXIT_USAGE: i32 = 2;

/// Exit code used when a sub-process was terminated by a signal.
pub const EXIT_SIGNAL: i32 = 1;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid YAML in cluster configuration: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Invalid settings file: {0}")]
    InvalidSettings(#[from] toml::de::Error),

    #[error("Configuration value '{0}' is missing")]
    MissingValue(String),

    #[error("Configuration value '{key}' is unset (still '{value}'); set it before running this task")]
    Unset { key: String, value: String },

    #[error("Invalid cluster name '{0}': must match ^[a-z][-a-z0-9]{{0,16}}[a-z0-9]$ (at most 18 characters)")]
    InvalidName(String),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Task execution errors.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Task '{task}' failed: '{command}' {}", describe_exit(.code))]
    CommandFailed {
        task: String,
        command: String,
        code: Option<i32>,
    },

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Timed out waiting for {what}")]
    Timeout { what: String },

    #[error("Task graph contains a cycle through '{0}'")]
    CycleDetected(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl TaskError {
    /// Process exit code for this failure.
    ///
    /// A failed sub-process propagates its own exit code; everything that
    /// never reached a sub-process maps to [`EXIT_USAGE`].
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::CommandFailed { code: Some(code), .. } => *code,
            TaskError::CommandFailed { code: None, .. } => EXIT_SIGNAL,
            TaskError::Timeout { .. } => EXIT_SIGNAL,
            TaskError::Config(_)
            | TaskError::Spawn { .. }
            | TaskError::Workspace(_)
            | TaskError::CycleDetected(_) => EXIT_USAGE,
        }
    }
}

impl From<io::Error> for TaskError {
    fn from(e: io::Error) -> Self {
        TaskError::Workspace(e.to_string())
    }
}

/// Result type for task execution.
pub type Result<T> = std::result::Result<T, TaskError>;
