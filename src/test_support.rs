//! Test harness utilities for integration & unit tests.
//! Provides a command runner that records every invocation instead of
//! spawning processes, with scripted failures and side effects.

use crate::error::Result;
use crate::orchestrator::executor::{CommandOutcome, CommandRunner, ToolCommand};
use async_trait::async_trait;
use std::sync::Mutex;

type Effect = Box<dyn Fn(&ToolCommand) + Send + Sync>;

struct FailureRule {
    pattern: String,
    remaining: u32,
    code: i32,
}

/// Records commands; succeeds unless a failure rule matches.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<ToolCommand>>,
    rules: Mutex<Vec<FailureRule>>,
    effects: Mutex<Vec<Effect>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose rendered form contains `pattern` exit with `code`
    /// for the next `times` invocations.
    pub fn fail_times(&self, pattern: &str, times: u32, code: i32) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(FailureRule {
                pattern: pattern.to_string(),
                remaining: times,
                code,
            });
        }
    }

    /// Commands whose rendered form contains `pattern` always exit with `code`.
    pub fn fail_always(&self, pattern: &str, code: i32) {
        self.fail_times(pattern, u32::MAX, code);
    }

    /// Run `effect` for every command before its outcome is decided.
    pub fn on_run(&self, effect: impl Fn(&ToolCommand) + Send + Sync + 'static) {
        if let Ok(mut effects) = self.effects.lock() {
            effects.push(Box::new(effect));
        }
    }

    /// Everything run so far, in order.
    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Rendered command lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.commands().iter().map(ToString::to_string).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutcome> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(cmd.clone());
        }
        if let Ok(effects) = self.effects.lock() {
            for effect in effects.iter() {
                effect(cmd);
            }
        }

        let rendered = cmd.to_string();
        if let Ok(mut rules) = self.rules.lock() {
            for rule in rules.iter_mut() {
                if rule.remaining > 0 && rendered.contains(&rule.pattern) {
                    if rule.remaining != u32::MAX {
                        rule.remaining -= 1;
                    }
                    return Ok(CommandOutcome::from_code(rule.code));
                }
            }
        }
        Ok(CommandOutcome::SUCCESS)
    }
}

/// Simulated `kustomize build`: writes the given files into the `-o` directory.
pub fn fake_kustomize_output(
    files: &'static [&'static str],
) -> impl Fn(&ToolCommand) + Send + Sync + 'static {
    move |cmd: &ToolCommand| {
        if cmd.args.first().map(String::as_str) != Some("build") {
            return;
        }
        let out = cmd
            .args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| cmd.args.get(i + 1));
        if let Some(out) = out {
            for file in files {
                let _ = std::fs::write(std::path::Path::new(out).join(file), "---\n");
            }
        }
    }
}
