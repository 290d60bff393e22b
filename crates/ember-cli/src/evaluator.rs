//! Evaluator that reports what would run instead of running it

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use ember_core::{Evaluator, Outcome, ResolvedConfig, RunMode};
use serde_json::json;

/// Exit status for a script that cannot be opened
const CANNOT_OPEN_EXIT_CODE: i32 = 2;

/// Writes the selected entry point and the resolved configuration as JSON
pub struct ReportEvaluator<W: Write> {
    out: W,
}

impl<W: Write> ReportEvaluator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn report(&mut self, mode: RunMode<'_>, config: &ResolvedConfig) -> std::io::Result<()> {
        let (kind, target) = match mode {
            RunMode::Command(command) => ("command", Some(command)),
            RunMode::Module(module) => ("module", Some(module)),
            RunMode::Script(script) => ("script", Some(script)),
            RunMode::Interactive => ("interactive", None),
        };
        let report = json!({
            "mode": { "kind": kind, "target": target },
            "config": config.to_json()?,
        });
        serde_json::to_writer_pretty(&mut self.out, &report)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> Evaluator for ReportEvaluator<W> {
    fn evaluate(&mut self, mode: RunMode<'_>, config: &ResolvedConfig) -> Outcome {
        if let RunMode::Script(script) = mode {
            if !Path::new(script).is_file() {
                eprintln!(
                    "{}: {}: can't open file {:?}: no such file",
                    "error".red().bold(),
                    config.program_name,
                    script
                );
                return Outcome::ExitRequested(CANNOT_OPEN_EXIT_CODE);
            }
        }

        tracing::debug!(?mode, "reporting entry point");
        match self.report(mode, config) {
            Ok(()) => Outcome::Completed,
            Err(err) => Outcome::UncaughtError(format!("could not write report: {}", err)),
        }
    }
}
