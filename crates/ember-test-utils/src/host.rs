//! [`TestHost`] builder for runtime scenarios.

use std::ffi::OsString;

use ember_core::{Collaborators, Runtime};

use crate::fakes::{FakeLocale, FixedPaths, MapEnv, MapLayoutFile, SharedBuffer};

/// A fully faked host: environment, locale, layout file, path calculator
/// and console.
///
/// # Example
///
/// ```rust
/// use ember_core::Config;
/// use ember_test_utils::TestHost;
///
/// let host = TestHost::new().env("EMBER_VERBOSE", "2");
/// let mut runtime = host.runtime();
/// runtime.initialize(&Config::new()).unwrap();
///
/// assert_eq!(runtime.config().unwrap().verbose, 2);
/// assert_eq!(host.paths.calls(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TestHost {
    pub env: MapEnv,
    pub locale: FakeLocale,
    pub layout_file: MapLayoutFile,
    pub paths: FixedPaths,
    pub console: SharedBuffer,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    /// Empty environment, UTF-8 locale, no layout entries, prefix `/opt/ember`
    pub fn new() -> Self {
        Self {
            env: MapEnv::new(),
            locale: FakeLocale::utf8(),
            layout_file: MapLayoutFile::new(),
            paths: FixedPaths::new("/opt/ember"),
            console: SharedBuffer::new(),
        }
    }

    pub fn env(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.env.set(name, value);
        self
    }

    pub fn locale(mut self, locale: FakeLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn file_entry(mut self, key: &str, value: &str) -> Self {
        self.layout_file.set(key, value);
        self
    }

    pub fn paths(mut self, paths: FixedPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Collaborators sharing this host's counters and console
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            env: Box::new(self.env.clone()),
            locale: Box::new(self.locale.clone()),
            layout_file: Box::new(self.layout_file.clone()),
            paths: Box::new(self.paths.clone()),
            console: Box::new(self.console.clone()),
        }
    }

    pub fn runtime(&self) -> Runtime {
        Runtime::with_collaborators(self.collaborators())
    }
}
