/// System module: build workspace layout and logging macros

pub mod paths;

pub use paths::BuildLayout;

/// Task milestones: routed to the parsed log as well as the full log.
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::info!(target: "parsed", "{}", msg);
    }}
}
