//! In-memory collaborators.
//!
//! Every fake is `Clone`; clones share their counters, so a test can keep a
//! handle after moving the fake into a runtime and still observe calls.

use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ember_core::config::{ResolvedConfig, RunMode};
use ember_core::host::{LocaleInfo, LocaleProbe, PathCalculator, PathInput, PathLayout};
use ember_core::sources::{ConfigFileProvider, EnvSource, FileEntries};
use ember_core::{Error, Evaluator, Outcome, Signal, StringList};

/// Environment backed by a map
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: BTreeMap<String, OsString>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<OsString>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.set(name, value);
        self
    }
}

impl EnvSource for MapEnv {
    fn var_os(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }
}

/// Locale probe with a fixed answer and a call counter
#[derive(Debug, Clone)]
pub struct FakeLocale {
    info: LocaleInfo,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeLocale {
    /// A UTF-8 locale
    pub fn utf8() -> Self {
        Self::with_info(LocaleInfo::fallback())
    }

    /// The legacy "C" locale
    pub fn legacy() -> Self {
        Self::with_info(LocaleInfo {
            legacy: true,
            encoding: "ascii".to_string(),
        })
    }

    /// A probe that always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::utf8()
        }
    }

    pub fn with_info(info: LocaleInfo) -> Self {
        Self {
            info,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `probe` calls so far, across clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LocaleProbe for FakeLocale {
    fn probe(&self) -> Signal<LocaleInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::config("locale probe", "locale unavailable").into());
        }
        Ok(self.info.clone())
    }
}

/// Layout file served from memory
#[derive(Debug, Clone, Default)]
pub struct MapLayoutFile {
    entries: FileEntries,
    loads: Arc<AtomicUsize>,
}

impl MapLayoutFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ConfigFileProvider for MapLayoutFile {
    fn load(&self) -> Signal<FileEntries> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

/// Path calculator returning a fixed layout rooted at `prefix`.
///
/// Extra search paths are placed in front of `<prefix>/lib/ember`, and the
/// program name and home of the last call are recorded.
#[derive(Debug, Clone)]
pub struct FixedPaths {
    prefix: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(String, Option<String>)>>>,
}

impl FixedPaths {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// A calculator whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("/unused")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(program_name, home)` seen by the last call
    pub fn last_request(&self) -> Option<(String, Option<String>)> {
        self.last_request.lock().unwrap().clone()
    }
}

impl PathCalculator for FixedPaths {
    fn calculate(&self, input: &PathInput<'_>) -> Signal<PathLayout> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            input.program_name.to_string(),
            input.home.map(str::to_string),
        ));
        if self.fail {
            return Err(Error::config("path calculation", "layout unavailable").into());
        }

        let prefix = input.prefix.or(input.home).unwrap_or(&self.prefix);
        let mut module_search_paths = StringList::new();
        module_search_paths.extend(input.extra_paths)?;
        module_search_paths.append(&format!("{prefix}/lib/ember"))?;
        Ok(PathLayout {
            executable: input
                .executable
                .map(str::to_string)
                .unwrap_or_else(|| format!("{prefix}/bin/{}", input.program_name)),
            prefix: prefix.to_string(),
            exec_prefix: input.exec_prefix.unwrap_or(prefix).to_string(),
            module_search_paths,
        })
    }
}

/// Console sink whose contents stay readable after it is moved
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Owned copy of a [`RunMode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    Command(String),
    Module(String),
    Script(String),
    Interactive,
}

impl From<RunMode<'_>> for EntryPoint {
    fn from(mode: RunMode<'_>) -> Self {
        match mode {
            RunMode::Command(command) => Self::Command(command.to_string()),
            RunMode::Module(module) => Self::Module(module.to_string()),
            RunMode::Script(script) => Self::Script(script.to_string()),
            RunMode::Interactive => Self::Interactive,
        }
    }
}

/// Evaluator that records every entry point and replays scripted outcomes.
///
/// Once the scripted outcomes run out every call completes.
#[derive(Debug, Default)]
pub struct RecordingEvaluator {
    pub runs: Vec<EntryPoint>,
    pub argv_seen: Vec<StringList>,
    outcomes: VecDeque<Outcome>,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Evaluator for RecordingEvaluator {
    fn evaluate(&mut self, mode: RunMode<'_>, config: &ResolvedConfig) -> Outcome {
        self.runs.push(mode.into());
        self.argv_seen.push(config.argv.clone());
        self.outcomes.pop_front().unwrap_or(Outcome::Completed)
    }
}
