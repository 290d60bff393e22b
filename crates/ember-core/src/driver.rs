//! Program driver
//!
//! Picks the entry point from the reference configuration, hands it to an
//! [`Evaluator`] and turns the outcome into a process exit status. Once a
//! program has started, the runtime is finalized before the driver returns.

use crate::config::{ConfigView, ResolvedConfig, RunMode};
use crate::lifecycle::Transition;
use crate::runtime::Runtime;
use crate::signal::FAILURE_EXIT_CODE;
use crate::Signal;

/// How an evaluation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The program raised an error nobody handled
    UncaughtError(String),
    /// The program asked to exit with this status
    ExitRequested(i32),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::UncaughtError(_) => FAILURE_EXIT_CODE,
            Self::ExitRequested(code) => *code,
        }
    }
}

/// Executes programs; the bootstrap never looks inside
pub trait Evaluator {
    fn evaluate(&mut self, mode: RunMode<'_>, config: &ResolvedConfig) -> Outcome;
}

/// Run the program selected by an initialized runtime.
///
/// Returns the exit status. With `inspect` set, the interactive loop runs
/// after a command, module or script that completed or raised. A runtime
/// that is not initialized is rejected untouched; once the program has
/// started the runtime is finalized whatever the outcome.
pub fn run(runtime: &mut Runtime, evaluator: &mut dyn Evaluator) -> Signal<i32> {
    let config = runtime.begin_run()?;
    let code = run_selected(config, evaluator);
    if runtime.finalize() == Transition::Applied {
        tracing::debug!("runtime finalized after run");
    }
    Ok(code)
}

/// Initialize from `partial`, then [`run`].
///
/// The runtime is finalized when initialization fails, too.
pub fn run_main(
    runtime: &mut Runtime,
    partial: &dyn ConfigView,
    evaluator: &mut dyn Evaluator,
) -> Signal<i32> {
    if let Err(status) = runtime.initialize(partial) {
        runtime.finalize();
        return Err(status);
    }
    run(runtime, evaluator)
}

fn run_selected(config: &ResolvedConfig, evaluator: &mut dyn Evaluator) -> i32 {
    let mode = config.run_mode();
    tracing::debug!(?mode, "running program");

    let mut outcome = evaluator.evaluate(mode, config);
    if config.inspect && mode != RunMode::Interactive {
        match outcome {
            Outcome::ExitRequested(_) => {}
            _ => {
                tracing::debug!(previous = ?outcome, "inspect requested, entering interactive mode");
                outcome = evaluator.evaluate(RunMode::Interactive, config);
            }
        }
    }

    if let Outcome::UncaughtError(message) = &outcome {
        tracing::debug!(%message, "program raised an uncaught error");
    }
    outcome.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(Outcome::Completed.exit_code(), 0);
        assert_eq!(Outcome::UncaughtError("boom".into()).exit_code(), 1);
        assert_eq!(Outcome::ExitRequested(3).exit_code(), 3);
    }
}
