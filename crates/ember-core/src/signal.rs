//! Tri-state outcome of every bootstrap operation
//!
//! A fallible operation either succeeds, fails with an [`Error`], or asks the
//! process to stop cleanly with an exit code (help, version). The last two
//! are carried on the error side of a plain `Result` so `?` propagates both:
//!
//! ```text
//! Signal<T> = Result<T, Status>
//!                        |
//!              +---------+---------+
//!              |                   |
//!        Status::Error       Status::Exit { code }
//! ```
//!
//! [`resolve_or_exit`] is the only function in the workspace that terminates
//! the process.

use std::io::Write;

use crate::Error;

/// Exit status used when a failure is an [`Error`] rather than an exit request
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Result type for bootstrap operations
pub type Signal<T> = std::result::Result<T, Status>;

/// The non-success side of a [`Signal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The operation failed
    Error(Error),
    /// The operation asks for a clean process exit with this code
    Exit { code: i32 },
}

impl Status {
    pub fn exit(code: i32) -> Self {
        Self::Exit { code }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }

    /// The error, if this status carries one
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Error(error) => Some(error),
            Self::Exit { .. } => None,
        }
    }

    /// Process exit status this outcome maps to
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Error(_) => FAILURE_EXIT_CODE,
            Self::Exit { code } => *code,
        }
    }

    /// Write the diagnostic line for this outcome.
    ///
    /// Exit requests produce no output.
    pub fn report(&self, out: &mut dyn Write) -> std::io::Result<()> {
        match self {
            Self::Error(error) => writeln!(out, "fatal error: {}", error),
            Self::Exit { .. } => Ok(()),
        }
    }
}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        Self::Error(error)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error(error) => write!(f, "{}", error),
            Self::Exit { code } => write!(f, "exit requested with status {}", code),
        }
    }
}

/// Predicates on a whole [`Signal`]
pub trait SignalExt {
    fn is_error(&self) -> bool;
    fn is_exit(&self) -> bool;

    /// `is_error() || is_exit()`
    fn failed(&self) -> bool {
        self.is_error() || self.is_exit()
    }
}

impl<T> SignalExt for Signal<T> {
    fn is_error(&self) -> bool {
        matches!(self, Err(status) if status.is_error())
    }

    fn is_exit(&self) -> bool {
        matches!(self, Err(status) if status.is_exit())
    }
}

/// Terminate the process for a failed signal.
///
/// `Exit` terminates silently with its code; `Error` writes one diagnostic
/// line to stderr and terminates with [`FAILURE_EXIT_CODE`].
pub fn resolve_or_exit(status: Status) -> ! {
    if let Status::Error(ref error) = status {
        tracing::error!(origin = error.origin(), %error, "bootstrap failed");
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = status.report(&mut handle);
        let _ = handle.flush();
    }
    std::process::exit(status.exit_code())
}
