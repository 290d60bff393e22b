//! Host collaborators the bootstrap delegates to
//!
//! - [`LocaleProbe`]: what the current locale is (consulted once during
//!   pre-initialization)
//! - [`PathCalculator`]: installation layout and module search paths
//!   (called at most once per configuration resolution)
//!
//! The environment and configuration-file collaborators live in
//! [`sources`](crate::sources); the evaluator lives in [`driver`](crate::driver).

mod locale;
mod paths;

pub use locale::{LocaleInfo, LocaleProbe, SystemLocale};
pub use paths::{InstallLayout, PathCalculator, PathInput, PathLayout};
