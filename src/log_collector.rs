//! Decoupled logging pipeline for orchestrator runs.
//!
//! Every `log::*!` call is turned into a [`LogLine`] and pushed down an
//! unbounded channel to a dedicated writer thread, so tool output streamed
//! from child processes never blocks on terminal or disk I/O.
//!
//! ```text
//! log::info!() / log_parsed!()
//!     |
//! [LogCollector] (crossbeam unbounded channel)
//!     |
//! [writer thread]
//!     |-- stderr
//!     |-- <log-dir>/full/<ts>_full.log      (every line, when a log dir is set)
//!     `-- <log-dir>/parsed/<ts>_parsed.log  (target "parsed" only)
//! ```

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log target for high-level milestones.
pub const PARSED_TARGET: &str = "parsed";

enum LogMessage {
    Line(LogLine),
    /// Flush marker; the writer acknowledges once everything before it is written.
    Flush(std::sync::mpsc::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// High-level milestone, also written to the parsed log.
    pub parsed: bool,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            parsed: false,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(level: Level, message: String) -> Self {
        LogLine {
            parsed: true,
            ..LogLine::new(level, message)
        }
    }

    fn formatted(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }
}

/// Session log files, present only when a log directory was configured.
#[derive(Clone, Debug)]
pub struct SessionFiles {
    pub full: PathBuf,
    pub parsed: PathBuf,
}

/// `log::Log` implementation backed by a writer thread.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    level: LevelFilter,
    session: Option<SessionFiles>,
}

impl LogCollector {
    /// Start the writer thread. With `log_dir` set, the `full/` and `parsed/`
    /// directories are created and a timestamped session file opened in each.
    pub fn new(level: LevelFilter, log_dir: Option<&Path>) -> Result<Self, String> {
        let (session, files) = match log_dir {
            Some(dir) => {
                let (session, full, parsed) = open_session(dir)?;
                (Some(session), Some((full, parsed)))
            }
            None => (None, None),
        };

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut files = files;
                let stderr = std::io::stderr();
                while let Ok(msg) = rx.recv() {
                    match msg {
                        LogMessage::Line(line) => {
                            let formatted = line.formatted();
                            let _ = stderr.lock().write_all(formatted.as_bytes());
                            if let Some((full, parsed)) = files.as_mut() {
                                let _ = full.write_all(formatted.as_bytes());
                                if line.parsed {
                                    let _ = parsed.write_all(formatted.as_bytes());
                                }
                            }
                        }
                        LogMessage::Flush(ack) => {
                            let _ = stderr.lock().flush();
                            if let Some((full, parsed)) = files.as_mut() {
                                let _ = full.flush();
                                let _ = parsed.flush();
                            }
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .map_err(|e| format!("Failed to spawn log writer: {}", e))?;

        Ok(LogCollector { tx, level, session })
    }

    /// Install as the global logger.
    pub fn install(self) -> Result<LogCollector, String> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self.clone()))
            .map_err(|e| format!("Failed to set logger: {}", e))?;
        log::set_max_level(level);
        Ok(self)
    }

    pub fn session(&self) -> Option<&SessionFiles> {
        self.session.as_ref()
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Queue a line; never blocks.
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every line queued before this call has been written.
    pub fn wait_for_empty(&self) -> Result<(), String> {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(ack_tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        ack_rx
            .recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        if record.target() == PARSED_TARGET {
            self.log_line(LogLine::parsed(record.level(), message));
        } else {
            self.log_line(LogLine::new(record.level(), message));
        }
    }

    fn flush(&self) {
        let _ = self.wait_for_empty();
    }
}

/// Verbosity flags to a level filter: quiet wins, then each `-v` steps down.
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn open_session(log_dir: &Path) -> Result<(SessionFiles, File, File), String> {
    let full_dir = log_dir.join("full");
    let parsed_dir = log_dir.join("parsed");
    std::fs::create_dir_all(&full_dir)
        .map_err(|e| format!("Failed to create full log dir: {}", e))?;
    std::fs::create_dir_all(&parsed_dir)
        .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let session = SessionFiles {
        full: full_dir.join(format!("{}_full.log", timestamp)),
        parsed: parsed_dir.join(format!("{}_parsed.log", timestamp)),
    };
    let open = |path: &Path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))
    };
    let full = open(&session.full)?;
    let parsed = open(&session.parsed)?;
    Ok((session, full, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record<'a>(
        level: Level,
        target: &'a str,
        args: std::fmt::Arguments<'a>,
    ) -> Record<'a> {
        Record::builder().level(level).target(target).args(args).build()
    }

    #[test]
    fn test_log_collector_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = LogCollector::new(LevelFilter::Info, Some(tmp.path())).unwrap();

        assert!(tmp.path().join("full").is_dir());
        assert!(tmp.path().join("parsed").is_dir());
        let session = collector.session().unwrap();
        assert!(session.full.exists());
        assert!(session.parsed.exists());
    }

    #[test]
    fn test_parsed_target_routing() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = LogCollector::new(LevelFilter::Info, Some(tmp.path())).unwrap();

        collector.log(&record(Level::Info, "mgmt_cluster", format_args!("tool output")));
        collector.log(&record(Level::Info, PARSED_TARGET, format_args!("TASK DONE: clean")));
        collector.wait_for_empty().unwrap();

        let session = collector.session().unwrap();
        let full = fs::read_to_string(&session.full).unwrap();
        let parsed = fs::read_to_string(&session.parsed).unwrap();
        assert!(full.contains("tool output"));
        assert!(full.contains("TASK DONE: clean"));
        assert!(!parsed.contains("tool output"));
        assert!(parsed.contains("[INFO] TASK DONE: clean"));
    }

    #[test]
    fn test_level_filter_drops_debug() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = LogCollector::new(LevelFilter::Info, Some(tmp.path())).unwrap();

        collector.log(&record(Level::Debug, "x", format_args!("hidden")));
        collector.log(&record(Level::Warn, "x", format_args!("shown")));
        collector.wait_for_empty().unwrap();

        let full = fs::read_to_string(&collector.session().unwrap().full).unwrap();
        assert!(!full.contains("hidden"));
        assert!(full.contains("[WARN] shown"));
    }

    #[test]
    fn test_non_blocking_burst_is_fully_flushed() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = LogCollector::new(LevelFilter::Info, Some(tmp.path())).unwrap();

        for i in 0..1000 {
            collector.log_line(LogLine::new(Level::Info, format!("Log message {}", i)));
        }
        collector.wait_for_empty().unwrap();

        let full = fs::read_to_string(&collector.session().unwrap().full).unwrap();
        assert_eq!(full.lines().count(), 1000);
        assert!(full.contains("Log message 999"));
    }

    #[test]
    fn test_no_log_dir_means_no_session() {
        let collector = LogCollector::new(LevelFilter::Warn, None).unwrap();
        assert!(collector.session().is_none());
        assert!(collector.wait_for_empty().is_ok());
    }

    #[test]
    fn test_install_registers_global_logger_once() {
        let tmp = tempfile::tempdir().unwrap();
        let collector = LogCollector::new(LevelFilter::Info, Some(tmp.path()))
            .unwrap()
            .install()
            .unwrap();
        assert_eq!(log::max_level(), LevelFilter::Info);

        log::info!(target: PARSED_TARGET, "TASK DONE: installed");
        collector.wait_for_empty().unwrap();
        let parsed = fs::read_to_string(&collector.session().unwrap().parsed).unwrap();
        assert!(parsed.contains("TASK DONE: installed"));

        let second = LogCollector::new(LevelFilter::Info, None).unwrap().install();
        assert!(second.is_err());
    }

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(0, false), LevelFilter::Info);
        assert_eq!(level_for(1, false), LevelFilter::Debug);
        assert_eq!(level_for(3, false), LevelFilter::Trace);
        assert_eq!(level_for(2, true), LevelFilter::Warn);
    }
}
