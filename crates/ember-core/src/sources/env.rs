//! Environment-variable tier

use std::ffi::OsString;

use crate::decode::Decoder;
use crate::{Error, Signal, StringList};

/// Names of every environment variable the bootstrap reads
pub mod vars {
    pub const MALLOC: &str = "EMBER_MALLOC";
    pub const COERCE_C_LOCALE: &str = "EMBER_COERCE_C_LOCALE";
    pub const DEVMODE: &str = "EMBER_DEVMODE";
    pub const ISOLATED: &str = "EMBER_ISOLATED";
    pub const UTF8: &str = "EMBER_UTF8";
    pub const LEGACY_WINDOWS_FS_ENCODING: &str = "EMBER_LEGACY_WINDOWS_FS_ENCODING";

    pub const HOME: &str = "EMBER_HOME";
    pub const PATH: &str = "EMBER_PATH";
    pub const WARNINGS: &str = "EMBER_WARNINGS";
    pub const HASHSEED: &str = "EMBER_HASHSEED";
    pub const OPTIMIZE: &str = "EMBER_OPTIMIZE";
    pub const VERBOSE: &str = "EMBER_VERBOSE";
    pub const DEBUG: &str = "EMBER_DEBUG";
    pub const INSPECT: &str = "EMBER_INSPECT";
    pub const UNBUFFERED: &str = "EMBER_UNBUFFERED";
    pub const DONT_WRITE_BYTECODE: &str = "EMBER_DONT_WRITE_BYTECODE";
    pub const NO_USER_SITE: &str = "EMBER_NO_USER_SITE";
    pub const FAULTHANDLER: &str = "EMBER_FAULTHANDLER";
    pub const TRACEMALLOC: &str = "EMBER_TRACEMALLOC";
    pub const PROFILE_IMPORT_TIME: &str = "EMBER_PROFILE_IMPORT_TIME";
    pub const CACHE_PREFIX: &str = "EMBER_CACHE_PREFIX";
    pub const IO_ENCODING: &str = "EMBER_IO_ENCODING";
    pub const RUN_COMMAND: &str = "EMBER_RUN_COMMAND";
    pub const RUN_MODULE: &str = "EMBER_RUN_MODULE";
    pub const RUN_FILE: &str = "EMBER_RUN_FILE";
}

/// Read access to process environment variables
pub trait EnvSource: Send {
    fn var_os(&self, name: &str) -> Option<OsString>;
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnvironment;

impl EnvSource for OsEnvironment {
    fn var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

/// Environment tier as seen by a resolver.
///
/// When the environment is disabled (`-E`, isolated mode) every lookup
/// reports the variable as unset.
pub struct Environment<'a> {
    source: &'a dyn EnvSource,
    enabled: bool,
}

impl<'a> Environment<'a> {
    pub fn new(source: &'a dyn EnvSource, enabled: bool) -> Self {
        Self { source, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Raw value; empty values count as unset
    fn raw(&self, name: &str) -> Option<OsString> {
        if !self.enabled {
            return None;
        }
        self.source.var_os(name).filter(|value| !value.is_empty())
    }

    /// Value for ASCII-only variables, readable before any decoder exists
    pub fn ascii(&self, name: &str) -> Option<String> {
        self.raw(name)
            .map(|value| value.to_string_lossy().trim().to_string())
    }

    /// Whether the variable is set to a non-empty value
    pub fn flag(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// Level-style variable: an integer gives that level, anything else
    /// non-empty counts as 1
    pub fn level(&self, name: &str) -> Option<u32> {
        let value = self.ascii(name)?;
        let level = match value.parse::<i64>() {
            Ok(n) if n >= 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => 1,
        };
        Some(level)
    }

    /// Level-style variable read as a switch; level 0 switches it off
    pub fn enabled_flag(&self, name: &str) -> Option<bool> {
        self.level(name).map(|level| level > 0)
    }

    /// Decode a text variable with the pre-initialized decoder
    pub fn text(&self, name: &str, decoder: &Decoder) -> Signal<Option<String>> {
        match self.raw(name) {
            Some(value) => decoder.decode(value.as_encoded_bytes()).map(Some),
            None => Ok(None),
        }
    }

    /// Decode a variable and split it on `separator`, dropping empty items
    pub fn list(&self, name: &str, separator: char, decoder: &Decoder) -> Signal<Option<StringList>> {
        let Some(text) = self.text(name, decoder)? else {
            return Ok(None);
        };
        let mut list = StringList::new();
        for item in text.split(separator).map(str::trim).filter(|item| !item.is_empty()) {
            list.append(item)?;
        }
        Ok(Some(list))
    }

    /// Unsigned integer variable where a bad value is a configuration error
    pub fn strict_u32(&self, name: &str, origin: &'static str) -> Signal<Option<u32>> {
        match self.ascii(name) {
            Some(value) => value.parse::<u32>().map(Some).map_err(|_| {
                Error::config(origin, format!("{} must be a non-negative integer, got {:?}", name, value))
                    .into()
            }),
            None => Ok(None),
        }
    }
}

/// Separator used by list-style path variables
pub(crate) const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, &'static str>);

    impl EnvSource for MapSource {
        fn var_os(&self, name: &str) -> Option<OsString> {
            self.0.get(name).map(|value| OsString::from(*value))
        }
    }

    fn source(pairs: &[(&'static str, &'static str)]) -> MapSource {
        MapSource(pairs.iter().copied().collect())
    }

    #[test]
    fn level_parses_integers_and_defaults_to_one() {
        let env = source(&[("A", "3"), ("B", "yes"), ("C", "0"), ("D", ""), ("E", "-4")]);
        let view = Environment::new(&env, true);

        assert_eq!(view.level("A"), Some(3));
        assert_eq!(view.level("B"), Some(1));
        assert_eq!(view.level("C"), Some(0));
        assert_eq!(view.level("D"), None);
        assert_eq!(view.level("E"), Some(1));
        assert_eq!(view.level("MISSING"), None);
    }

    #[test]
    fn zero_level_switches_flag_off() {
        let env = source(&[("ON", "2"), ("OFF", "0")]);
        let view = Environment::new(&env, true);

        assert_eq!(view.enabled_flag("ON"), Some(true));
        assert_eq!(view.enabled_flag("OFF"), Some(false));
        assert_eq!(view.enabled_flag("MISSING"), None);
    }

    #[test]
    fn disabled_environment_reports_everything_unset() {
        let env = source(&[(vars::DEVMODE, "1")]);
        let view = Environment::new(&env, false);
        assert!(!view.flag(vars::DEVMODE));
        assert_eq!(view.ascii(vars::DEVMODE), None);
    }

    #[test]
    fn list_splits_and_drops_empty_items() {
        let env = source(&[(vars::WARNINGS, "error, ,ignore::DeprecationWarning")]);
        let view = Environment::new(&env, true);
        let decoder = Decoder::new(true);

        let list = view.list(vars::WARNINGS, ',', &decoder).unwrap().unwrap();
        assert_eq!(list.as_slice(), &["error", "ignore::DeprecationWarning"]);
    }

    #[test]
    fn strict_u32_rejects_garbage() {
        let env = source(&[(vars::TRACEMALLOC, "many")]);
        let view = Environment::new(&env, true);
        let status = view.strict_u32(vars::TRACEMALLOC, "resolve config").unwrap_err();
        assert!(status.to_string().contains("EMBER_TRACEMALLOC"));
    }
}
