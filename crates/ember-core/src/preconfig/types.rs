//! Pre-configuration records

use serde::{Deserialize, Serialize};

use crate::host::LocaleInfo;

/// Memory allocator selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Allocator {
    #[default]
    Default,
    DebugChecked,
    Malloc,
    MallocDebug,
    Pool,
    PoolDebug,
}

impl Allocator {
    pub const ALL: [Allocator; 6] = [
        Self::Default,
        Self::DebugChecked,
        Self::Malloc,
        Self::MallocDebug,
        Self::Pool,
        Self::PoolDebug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::DebugChecked => "debug-checked",
            Self::Malloc => "malloc",
            Self::MallocDebug => "malloc-debug",
            Self::Pool => "pool",
            Self::PoolDebug => "pool-debug",
        }
    }

    /// Look up an allocator by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|allocator| allocator.name() == name)
    }
}

impl std::fmt::Display for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Legacy C locale coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocaleCoercion {
    Off,
    /// Coerce only if the probe reports the legacy locale
    Auto,
    Forced,
}

/// UTF-8 mode request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Utf8Mode {
    Off,
    On,
    /// Enable only under the legacy locale
    Auto,
}

/// Explicit pre-configuration. `None` means "not specified".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreConfig {
    pub allocator: Option<Allocator>,
    pub coerce_c_locale: Option<LocaleCoercion>,
    pub coerce_c_locale_warn: Option<bool>,
    pub dev_mode: Option<bool>,
    pub isolated: Option<bool>,
    pub use_environment: Option<bool>,
    pub utf8_mode: Option<Utf8Mode>,
    /// Only honoured from the environment on Windows
    pub legacy_windows_fs_encoding: Option<bool>,
    /// Scan argv for pseudo-options
    pub parse_argv: Option<bool>,
}

impl PreConfig {
    /// Everything unset: environment and argv are consulted
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for embedders that want no outside influence
    pub fn isolated() -> Self {
        Self {
            coerce_c_locale: Some(LocaleCoercion::Off),
            coerce_c_locale_warn: Some(false),
            isolated: Some(true),
            use_environment: Some(false),
            utf8_mode: Some(Utf8Mode::Off),
            parse_argv: Some(false),
            ..Self::default()
        }
    }
}

/// Frozen result of pre-initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPreConfig {
    pub allocator: Allocator,
    /// Never `Auto` once resolved
    pub coerce_c_locale: LocaleCoercion,
    pub coerce_c_locale_warn: bool,
    pub dev_mode: bool,
    pub isolated: bool,
    pub use_environment: bool,
    pub utf8_mode: bool,
    pub legacy_windows_fs_encoding: bool,
    pub parse_argv: bool,
    /// Probed locale facts, used later for encoding defaults
    pub locale: LocaleInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_names_round_trip() {
        for allocator in Allocator::ALL {
            assert_eq!(Allocator::from_name(allocator.name()), Some(allocator));
        }
        assert_eq!(Allocator::from_name("jemalloc"), None);
    }

    #[test]
    fn isolated_profile_disables_outside_influence() {
        let pre = PreConfig::isolated();
        assert_eq!(pre.isolated, Some(true));
        assert_eq!(pre.use_environment, Some(false));
        assert_eq!(pre.parse_argv, Some(false));
        assert_eq!(pre.allocator, None);
    }
}
