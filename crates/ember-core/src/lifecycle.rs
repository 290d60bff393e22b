//! Lifecycle state machine
//!
//! ```text
//! Unconfigured -> PreInitialized -> Initialized -> Running -> Finalized
//!       ^                                                        |
//!       +-------------------- reinitialize ----------------------+
//! ```
//!
//! Transitions are monotonic apart from the explicit re-initialization edge.

use serde::{Deserialize, Serialize};

use crate::{Error, Signal};

/// Phase of a runtime handle
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    #[default]
    Unconfigured,
    PreInitialized,
    Initialized,
    Running,
    Finalized,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::PreInitialized => "pre-initialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Outcome of a guarded transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state changed
    Applied,
    /// The request was already satisfied; nothing changed
    Unchanged,
}

/// Guards every state change of a runtime handle
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether pre-initialization effects are in force
    pub fn is_pre_initialized(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::PreInitialized | LifecycleState::Initialized | LifecycleState::Running
        )
    }

    /// Fail with a state error unless pre-initialization effects are in force
    pub fn require_pre_initialized(&self, origin: &'static str) -> Signal<()> {
        if self.is_pre_initialized() {
            Ok(())
        } else {
            Err(Error::state(origin, self.state, "pre-initialized").into())
        }
    }

    /// Unconfigured -> PreInitialized. Already pre-initialized is a no-op.
    pub fn pre_initialize(&mut self) -> Signal<Transition> {
        match self.state {
            LifecycleState::Unconfigured => Ok(self.apply(LifecycleState::PreInitialized)),
            LifecycleState::PreInitialized
            | LifecycleState::Initialized
            | LifecycleState::Running => Ok(Transition::Unchanged),
            LifecycleState::Finalized => {
                Err(Error::state("pre-initialize", self.state, "unconfigured").into())
            }
        }
    }

    /// PreInitialized -> Initialized. Initialized again is a reconfiguration.
    pub fn initialize(&mut self) -> Signal<Transition> {
        match self.state {
            LifecycleState::PreInitialized => Ok(self.apply(LifecycleState::Initialized)),
            LifecycleState::Initialized => Ok(Transition::Unchanged),
            state => Err(Error::state("initialize", state, "pre-initialized").into()),
        }
    }

    /// Initialized -> Running
    pub fn run(&mut self) -> Signal<Transition> {
        match self.state {
            LifecycleState::Initialized => Ok(self.apply(LifecycleState::Running)),
            state => Err(Error::state("run", state, "initialized").into()),
        }
    }

    /// Any configured state -> Finalized. Returns `Unchanged` when there was
    /// nothing to release.
    pub fn finalize(&mut self) -> Transition {
        match self.state {
            LifecycleState::Unconfigured | LifecycleState::Finalized => Transition::Unchanged,
            _ => self.apply(LifecycleState::Finalized),
        }
    }

    /// Finalized -> Unconfigured
    pub fn reinitialize(&mut self) -> Signal<Transition> {
        match self.state {
            LifecycleState::Finalized => Ok(self.apply(LifecycleState::Unconfigured)),
            LifecycleState::Unconfigured => Ok(Transition::Unchanged),
            state => Err(Error::state("reinitialize", state, "finalized").into()),
        }
    }

    fn apply(&mut self, next: LifecycleState) -> Transition {
        tracing::debug!(from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
        Transition::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalExt;

    #[test]
    fn full_cycle_reaches_finalized_and_back() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.pre_initialize().unwrap(), Transition::Applied);
        assert_eq!(lifecycle.initialize().unwrap(), Transition::Applied);
        assert_eq!(lifecycle.run().unwrap(), Transition::Applied);
        assert_eq!(lifecycle.finalize(), Transition::Applied);
        assert_eq!(lifecycle.state(), LifecycleState::Finalized);
        assert_eq!(lifecycle.reinitialize().unwrap(), Transition::Applied);
        assert_eq!(lifecycle.state(), LifecycleState::Unconfigured);
    }

    #[test]
    fn pre_initialize_twice_is_a_no_op() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.pre_initialize().unwrap();
        assert_eq!(lifecycle.pre_initialize().unwrap(), Transition::Unchanged);
        assert_eq!(lifecycle.state(), LifecycleState::PreInitialized);
    }

    #[test]
    fn run_before_initialize_is_a_state_error() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.run().is_error());
        lifecycle.pre_initialize().unwrap();
        assert!(lifecycle.run().is_error());
    }

    #[test]
    fn initialize_from_running_or_finalized_fails() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.pre_initialize().unwrap();
        lifecycle.initialize().unwrap();
        lifecycle.run().unwrap();
        assert!(lifecycle.initialize().is_error());
        lifecycle.finalize();
        assert!(lifecycle.initialize().is_error());
        assert!(lifecycle.pre_initialize().is_error());
    }

    #[test]
    fn finalize_from_unconfigured_changes_nothing() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.finalize(), Transition::Unchanged);
        assert_eq!(lifecycle.state(), LifecycleState::Unconfigured);
    }

    #[test]
    fn reinitialize_requires_finalized() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.pre_initialize().unwrap();
        assert!(lifecycle.reinitialize().is_error());
    }
}
