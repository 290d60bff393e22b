//! The fully resolved configuration record

use serde::{Deserialize, Serialize};

use super::types::HashSeed;
use crate::StringList;

/// Entry point selected by the run-mode selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode<'a> {
    Command(&'a str),
    Module(&'a str),
    Script(&'a str),
    /// No selector set: interactive loop (or stdin when not a terminal)
    Interactive,
}

/// Effective configuration after merging every source.
///
/// Invariants established by the resolver:
/// - at most one of `run_command`, `run_module`, `run_filename` is set
/// - `isolated` implies `!use_environment && !user_site`
/// - `dev_mode` implies `faulthandler` unless it was explicitly disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub quiet: bool,
    pub verbose: u32,
    pub interactive: bool,
    pub inspect: bool,
    pub optimization_level: u32,
    pub write_bytecode: bool,
    pub buffered_stdio: bool,
    pub hash_seed: HashSeed,
    pub dev_mode: bool,
    pub isolated: bool,
    pub use_environment: bool,
    pub user_site: bool,
    pub site_import: bool,
    pub faulthandler: bool,
    pub tracemalloc: u32,
    pub import_time: bool,
    pub bytes_warning: u32,
    pub parser_debug: u32,
    pub skip_source_first_line: bool,
    pub parse_argv: bool,

    pub program_name: String,
    pub executable: String,
    pub home: Option<String>,
    pub prefix: String,
    pub exec_prefix: String,
    pub filesystem_encoding: String,
    pub filesystem_errors: String,
    pub stdio_encoding: String,
    pub stdio_errors: String,
    pub cache_prefix: Option<String>,
    pub run_command: Option<String>,
    pub run_module: Option<String>,
    pub run_filename: Option<String>,

    pub argv: StringList,
    pub module_search_paths: StringList,
    pub warn_options: StringList,
    pub x_options: StringList,
}

impl ResolvedConfig {
    /// The entry point this configuration selects
    pub fn run_mode(&self) -> RunMode<'_> {
        if let Some(command) = &self.run_command {
            RunMode::Command(command)
        } else if let Some(module) = &self.run_module {
            RunMode::Module(module)
        } else if let Some(script) = &self.run_filename {
            RunMode::Script(script)
        } else {
            RunMode::Interactive
        }
    }

    /// Serialize for diagnostics
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
