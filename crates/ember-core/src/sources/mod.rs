//! Raw configuration sources
//!
//! Each source feeds one precedence tier:
//!
//! | tier | source |
//! |------|--------|
//! | command line | [`CommandLine`] parsed from argv |
//! | environment | [`EnvSource`] through an [`Environment`] view |
//! | configuration file | [`ConfigFileProvider`], e.g. [`LayoutFile`] |
//!
//! Explicit fields and compiled-in defaults live with the records themselves.

mod command_line;
mod env;
mod layout_file;

pub use command_line::{CommandLine, EarlyExit, usage, version_text};
pub use env::{EnvSource, Environment, OsEnvironment, vars};
pub(crate) use env::PATH_LIST_SEPARATOR;
pub use layout_file::{ConfigFileProvider, FileEntries, LayoutFile, NoLayoutFile};
