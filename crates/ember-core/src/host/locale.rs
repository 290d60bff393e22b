//! Locale probing

use serde::{Deserialize, Serialize};

use crate::Signal;

/// What the probe found out about the current locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleInfo {
    /// The locale is the legacy "C" / "POSIX" locale
    pub legacy: bool,
    /// Normalized encoding name, e.g. `utf-8`, `ascii`, `iso8859-1`
    pub encoding: String,
}

impl LocaleInfo {
    /// Assumed locale when probing fails
    pub fn fallback() -> Self {
        Self {
            legacy: false,
            encoding: "utf-8".to_string(),
        }
    }
}

/// Queries the current locale
pub trait LocaleProbe: Send {
    fn probe(&self) -> Signal<LocaleInfo>;
}

/// Locale derived from `LC_ALL`, `LC_CTYPE` and `LANG`, in that order
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLocale;

impl LocaleProbe for SystemLocale {
    fn probe(&self) -> Signal<LocaleInfo> {
        if cfg!(windows) {
            return Ok(LocaleInfo::fallback());
        }
        let name = ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());
        Ok(parse_locale_name(name.as_deref()))
    }
}

/// Interpret a POSIX locale name such as `de_DE.ISO-8859-1@euro`
pub(crate) fn parse_locale_name(name: Option<&str>) -> LocaleInfo {
    let name = name.unwrap_or("C");
    if name == "C" || name == "POSIX" {
        return LocaleInfo {
            legacy: true,
            encoding: "ascii".to_string(),
        };
    }

    let encoding = name
        .split_once('.')
        .map(|(_, rest)| rest.split('@').next().unwrap_or(rest))
        .map(normalize_encoding)
        .unwrap_or_else(|| "ascii".to_string());

    LocaleInfo {
        legacy: false,
        encoding,
    }
}

fn normalize_encoding(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "utf8" | "utf-8" => "utf-8".to_string(),
        "iso-8859-1" | "iso8859-1" | "latin1" => "iso8859-1".to_string(),
        _ => lower,
    }
}
