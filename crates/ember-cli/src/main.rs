//! Ember launcher
//!
//! Bootstraps a runtime from the process arguments, the environment and an
//! `ember.toml` beside the executable, then reports the selected entry point
//! and the resolved configuration.

mod evaluator;

use std::ffi::OsString;
use std::path::PathBuf;

use ember_core::config::TextField;
use ember_core::sources::LayoutFile;
use ember_core::{Collaborators, Config, PreConfig, Runtime, Signal, Status, resolve_or_exit, run_main};
use tracing_subscriber::EnvFilter;

use evaluator::ReportEvaluator;

/// Filter directives for the launcher's own diagnostics
const LOG_VAR: &str = "EMBER_LOG";

fn main() {
    init_tracing();

    let args: Vec<OsString> = std::env::args_os().collect();
    let status = match launch(&args) {
        Ok(code) => Status::exit(code),
        Err(status) => status,
    };
    resolve_or_exit(status)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn launch(args: &[OsString]) -> Signal<i32> {
    let executable = std::env::current_exe().ok().map(canonical_executable);
    let layout_file = match &executable {
        Some(executable) => LayoutFile::beside(executable),
        None => LayoutFile::new(LayoutFile::FILE_NAME),
    };
    tracing::debug!(path = %layout_file.path().display(), "layout file location");

    let mut runtime = Runtime::with_collaborators(Collaborators {
        layout_file: Box::new(layout_file),
        ..Collaborators::default()
    });

    let bytes: Vec<&[u8]> = args.iter().map(|arg| arg.as_encoded_bytes()).collect();
    runtime.pre_initialize(&PreConfig::new(), Some(&bytes[..]))?;

    let decoder = runtime.decoder()?;
    let mut config = Config::new();
    config.set_argv_bytes(&decoder, &bytes)?;
    if let Some(executable) = executable.as_deref().and_then(|path| path.to_str()) {
        config.set_text(TextField::Executable, executable)?;
    }

    let mut evaluator = ReportEvaluator::new(std::io::stdout());
    let result = run_main(&mut runtime, &config, &mut evaluator);
    config.clear();
    result
}

/// Resolve symlinks so the layout file is looked up beside the real binary
fn canonical_executable(path: PathBuf) -> PathBuf {
    dunce::canonicalize(&path).unwrap_or(path)
}
