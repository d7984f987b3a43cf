use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use mgmt_cluster::cli::Cli;
use mgmt_cluster::config::{load_settings_file, Settings, SettingsFile};
use mgmt_cluster::error::EXIT_USAGE;
use mgmt_cluster::log_collector::level_for;
use mgmt_cluster::{
    CommandRunner, DryRunRunner, LogCollector, Orchestrator, ProcessRunner, TaskGraph,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging first so settings errors are reported through it.
    let logger = match LogCollector::new(level_for(cli.verbose, cli.quiet), cli.log_dir.as_deref())
        .and_then(LogCollector::install)
    {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("[Main] Logging initialization failed: {}", e);
            std::process::exit(EXIT_USAGE);
        }
    };
    if let Some(session) = logger.session() {
        log::debug!("[Main] Session log: {}", session.full.display());
    }

    let code = match run(&cli, &logger).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("[Main] {:#}", e);
            EXIT_USAGE
        }
    };

    let _ = logger.wait_for_empty();
    std::process::exit(code);
}

async fn run(cli: &Cli, logger: &LogCollector) -> anyhow::Result<i32> {
    if cli.list_tasks {
        for (task, deps) in TaskGraph::default().describe() {
            let deps = if deps.is_empty() {
                "-".to_string()
            } else {
                deps.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
            };
            println!("{:<16} {}", task.as_str(), deps);
        }
        return Ok(0);
    }

    let file = match &cli.settings {
        Some(path) => load_settings_file(path)
            .with_context(|| format!("Failed to load settings file {}", path.display()))?,
        None => SettingsFile::default(),
    };
    let settings = Settings::resolve(file, cli.overrides());
    log::debug!(
        "[Main] Settings: {}",
        serde_json::to_string(&settings).context("Failed to render settings")?
    );

    let runner: Arc<dyn CommandRunner> = if settings.dry_run {
        log::info!("[Main] Dry run: commands are logged, not executed");
        Arc::new(DryRunRunner)
    } else {
        Arc::new(ProcessRunner)
    };

    let orchestrator = Orchestrator::new(settings, runner);
    let report = orchestrator.run(&cli.tasks).await;

    // Let pending log lines land before the summary goes to stdout.
    let _ = logger.wait_for_empty();
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to render run report")?
        );
    } else {
        for line in report.summary_lines() {
            println!("{}", line);
        }
    }
    Ok(report.exit_code)
}
