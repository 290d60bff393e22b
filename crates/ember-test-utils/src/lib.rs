//! Shared test utilities for the Ember workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fakes`]: in-memory collaborators with call counters
//! - [`host`]: [`TestHost`] builder wiring the fakes into a runtime
//! - [`layout`]: temporary directories holding an `ember.toml`

pub mod fakes;
pub mod host;
pub mod layout;

pub use fakes::{
    EntryPoint, FakeLocale, FixedPaths, MapEnv, MapLayoutFile, RecordingEvaluator, SharedBuffer,
};
pub use host::TestHost;
pub use layout::LayoutDir;
