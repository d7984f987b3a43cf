//! `validate-values`: report cluster name problems.
//!
//! Informational by default: diagnostics are printed and the run continues.
//! With strict validation the first problem fails the task.

use crate::config::validator::{diagnose, validate_cluster_name};
use crate::error::Result;
use crate::models::ClusterConfig;
use crate::orchestrator::phases::TaskContext;

pub fn validate_values(ctx: &TaskContext<'_>, config: &ClusterConfig) -> Result<()> {
    let problems = diagnose(config);
    if problems.is_empty() {
        log::info!(
            "[validate-values] name={} location={} project={}: OK",
            config.name,
            config.location,
            config.project
        );
        return Ok(());
    }

    for problem in &problems {
        log::error!("[validate-values] {}", problem);
    }

    if ctx.settings.strict_validation {
        validate_cluster_name(&config.name)?;
    } else {
        log::warn!("[validate-values] Continuing; pass --strict-validation to stop on invalid values");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::{ConfigError, TaskError};
    use crate::system::BuildLayout;
    use crate::test_support::RecordingRunner;

    #[test]
    fn test_invalid_name_is_informational_unless_strict() {
        let mut settings = Settings::with_workdir("/work");
        let layout = BuildLayout::new(&settings.build_dir);
        let runner = RecordingRunner::new();
        let config = ClusterConfig::new("this-name-is-way-too-long-1", "us-central1", "my-proj");

        let ctx = TaskContext {
            settings: &settings,
            layout: &layout,
            runner: &runner,
        };
        assert!(validate_values(&ctx, &config).is_ok());

        settings.strict_validation = true;
        let ctx = TaskContext {
            settings: &settings,
            layout: &layout,
            runner: &runner,
        };
        assert!(matches!(
            validate_values(&ctx, &config),
            Err(TaskError::Config(ConfigError::InvalidName(_)))
        ));
        assert!(runner.commands().is_empty());
    }
}
