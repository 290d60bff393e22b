//! Error types for ember-core

use crate::lifecycle::LifecycleState;

/// Errors raised by bootstrap operations.
///
/// Every variant names the operation that raised it (`origin`) so a single
/// diagnostic line is enough to locate the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Storage for text or list data could not be obtained
    #[error("{origin}: memory allocation failed")]
    Allocation { origin: &'static str },

    /// Malformed, conflicting or out-of-range configuration
    #[error("{origin}: {message}")]
    Config {
        origin: &'static str,
        message: String,
    },

    /// Operation invoked in the wrong lifecycle state
    #[error("{origin}: not allowed in {state} state (requires {expected})")]
    State {
        origin: &'static str,
        state: LifecycleState,
        expected: &'static str,
    },
}

impl Error {
    pub fn allocation(origin: &'static str) -> Self {
        Self::Allocation { origin }
    }

    pub fn config(origin: &'static str, message: impl Into<String>) -> Self {
        Self::Config {
            origin,
            message: message.into(),
        }
    }

    pub fn state(origin: &'static str, state: LifecycleState, expected: &'static str) -> Self {
        Self::State {
            origin,
            state,
            expected,
        }
    }

    /// The operation that raised this error
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Allocation { origin } | Self::Config { origin, .. } | Self::State { origin, .. } => {
                origin
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_origin_and_message() {
        let error = Error::config("resolve config", "unknown option -Z");
        assert_eq!(error.to_string(), "resolve config: unknown option -Z");
        assert_eq!(error.origin(), "resolve config");
    }

    #[test]
    fn state_error_names_current_and_expected_state() {
        let error = Error::state("run", LifecycleState::PreInitialized, "initialized");
        let display = error.to_string();
        assert!(display.starts_with("run:"), "got: {}", display);
        assert!(display.contains("pre-initialized"), "got: {}", display);
        assert!(display.contains("requires initialized"), "got: {}", display);
    }
}
