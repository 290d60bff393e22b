//! Runtime configuration
//!
//! A partial configuration comes in two ownership flavours:
//!
//! - [`Config`] owns copies of everything it holds and must be released
//!   with [`Config::clear`] (dropping it works too)
//! - [`StaticConfig`] borrows caller-provided text and is never released
//!
//! Both expose the same [`ConfigView`], which is all the
//! [`ConfigResolver`] needs to produce a [`ResolvedConfig`].

mod resolved;
mod resolver;
mod types;

pub use resolved::{ResolvedConfig, RunMode};
pub use resolver::ConfigResolver;
pub use types::{
    Config, ConfigFlags, ConfigView, HashSeed, ListField, ListView, StaticConfig, TextField,
};
