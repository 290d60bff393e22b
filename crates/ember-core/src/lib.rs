//! Bootstrap layer for the Ember embeddable runtime
//!
//! This crate decides how an Ember runtime is configured before any user
//! code runs:
//!
//! - **Pre-initialization**: allocator, locale coercion and UTF-8 mode,
//!   resolved before any other text is decoded
//! - **Configuration resolution**: per-field merge of explicit values, the
//!   command line, the environment and a layout file
//! - **Lifecycle**: which operations are legal when
//! - **Signals**: every fallible operation returns Ok, an error, or a
//!   request to exit
//!
//! # Architecture
//!
//! ```text
//!                   host / ember-cli
//!                          |
//!                  Runtime + driver
//!                          |
//!        +--------+--------+---------+---------+
//!        |        |        |         |         |
//!    preconfig  config  lifecycle  sources    host
//! ```
//!
//! # Example
//!
//! ```
//! use ember_core::config::{Config, TextField};
//! use ember_core::{Runtime, Signal};
//!
//! fn configure(runtime: &mut Runtime) -> Signal<()> {
//!     let mut config = Config::isolated();
//!     config.set_text(TextField::ProgramName, "embedded")?;
//!     runtime.initialize(&config)
//! }
//!
//! let mut runtime = Runtime::new();
//! configure(&mut runtime).unwrap();
//! assert_eq!(runtime.config().unwrap().program_name, "embedded");
//! ```

pub mod config;
pub mod decode;
pub mod driver;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod preconfig;
pub mod runtime;
pub mod signal;
pub mod sources;
pub mod strlist;

pub use config::{Config, ConfigView, ResolvedConfig, RunMode, StaticConfig};
pub use decode::Decoder;
pub use driver::{Evaluator, Outcome, run, run_main};
pub use error::Error;
pub use lifecycle::{LifecycleState, Transition};
pub use preconfig::{PreConfig, ResolvedPreConfig};
pub use runtime::{Collaborators, Runtime};
pub use signal::{Signal, SignalExt, Status, resolve_or_exit};
pub use strlist::StringList;
