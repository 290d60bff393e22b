//! Pre-initialization settings
//!
//! Everything that must be decided before any other text is decoded:
//! allocator, locale coercion, UTF-8 mode, and the flags that decide
//! whether the environment is consulted at all.
//!
//! # Example
//!
//! ```
//! use ember_core::host::SystemLocale;
//! use ember_core::preconfig::{Allocator, PreConfig, PreConfigResolver};
//! use ember_core::sources::OsEnvironment;
//!
//! let explicit = PreConfig {
//!     allocator: Some(Allocator::Malloc),
//!     ..PreConfig::isolated()
//! };
//! let resolved = PreConfigResolver::new(&OsEnvironment, &SystemLocale)
//!     .resolve::<&[u8]>(&explicit, None)
//!     .unwrap();
//! assert_eq!(resolved.allocator, Allocator::Malloc);
//! assert!(!resolved.use_environment);
//! ```

mod resolver;
mod types;

pub use resolver::PreConfigResolver;
pub use types::{Allocator, LocaleCoercion, PreConfig, ResolvedPreConfig, Utf8Mode};
