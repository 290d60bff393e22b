//! Pre-configuration resolution
//!
//! Runs before any text is decoded, so it only reads ASCII-valued
//! environment variables and scans argv bytes for ASCII options.
//! Precedence, highest first: explicit field, argv pseudo-option,
//! environment variable, compiled-in default.

use super::types::{Allocator, LocaleCoercion, PreConfig, ResolvedPreConfig, Utf8Mode};
use crate::host::{LocaleInfo, LocaleProbe};
use crate::sources::{CommandLine, EnvSource, Environment, vars};
use crate::{Error, Signal};

const ORIGIN: &str = "pre-initialize";

/// Resolves a [`PreConfig`] into a frozen [`ResolvedPreConfig`]
pub struct PreConfigResolver<'a> {
    env: &'a dyn EnvSource,
    locale: &'a dyn LocaleProbe,
}

impl<'a> PreConfigResolver<'a> {
    pub fn new(env: &'a dyn EnvSource, locale: &'a dyn LocaleProbe) -> Self {
        Self { env, locale }
    }

    /// Resolve `explicit` against argv and the environment.
    ///
    /// Deterministic: identical inputs, environment and locale give an
    /// identical result. The locale probe is consulted exactly once.
    pub fn resolve<B: AsRef<[u8]>>(
        &self,
        explicit: &PreConfig,
        args: Option<&[B]>,
    ) -> Signal<ResolvedPreConfig> {
        let parse_argv = explicit.parse_argv.unwrap_or(true);
        let cmdline = match args {
            Some(args) if parse_argv => scan_args(args)?,
            _ => CommandLine::default(),
        };

        // -E / -I gate the environment tier before it is read
        let isolated = explicit.isolated.or(cmdline.isolated);
        let use_environment = explicit.use_environment.or(cmdline.use_environment);
        let env_enabled = use_environment.unwrap_or(true) && !isolated.unwrap_or(false);
        let isolated = isolated
            .or_else(|| Environment::new(self.env, env_enabled).flag(vars::ISOLATED).then_some(true))
            .unwrap_or(false);
        let use_environment = use_environment.unwrap_or(true) && !isolated;
        let env = Environment::new(self.env, use_environment);
        tracing::trace!(isolated, use_environment, "environment tier gate");

        let dev_mode = explicit
            .dev_mode
            .or(cmdline.x_option("dev").map(|_| true))
            .or(env.flag(vars::DEVMODE).then_some(true))
            .unwrap_or(false);

        let allocator = match explicit.allocator {
            Some(allocator) => allocator,
            None if dev_mode => Allocator::DebugChecked,
            None => env_allocator(&env)?.unwrap_or_default(),
        };

        let (env_coercion, env_coercion_warn) = env_coercion(&env);
        let coerce_request = explicit
            .coerce_c_locale
            .or(env_coercion)
            .unwrap_or(LocaleCoercion::Auto);
        let coerce_c_locale_warn = explicit
            .coerce_c_locale_warn
            .or(env_coercion_warn)
            .unwrap_or(false);

        let utf8_request = match explicit.utf8_mode {
            Some(mode) => mode,
            None => match argv_utf8(&cmdline)? {
                Some(mode) => mode,
                None => env_utf8(&env)?.unwrap_or(Utf8Mode::Auto),
            },
        };

        let legacy_windows_fs_encoding = explicit
            .legacy_windows_fs_encoding
            .or_else(|| {
                (cfg!(windows) && env.flag(vars::LEGACY_WINDOWS_FS_ENCODING)).then_some(true)
            })
            .unwrap_or(false);

        let locale = match self.locale.probe() {
            Ok(info) => info,
            Err(status) => {
                tracing::warn!(%status, "locale probe failed, assuming a non-legacy locale");
                LocaleInfo::fallback()
            }
        };

        let utf8_mode = if legacy_windows_fs_encoding {
            if explicit.utf8_mode == Some(Utf8Mode::On) {
                tracing::warn!(
                    "legacy filesystem encoding conflicts with explicit UTF-8 mode; keeping UTF-8 mode"
                );
                true
            } else {
                false
            }
        } else {
            match utf8_request {
                Utf8Mode::On => true,
                Utf8Mode::Off => false,
                Utf8Mode::Auto => locale.legacy,
            }
        };

        let coerce_c_locale = match coerce_request {
            LocaleCoercion::Auto if locale.legacy => LocaleCoercion::Forced,
            LocaleCoercion::Auto => LocaleCoercion::Off,
            resolved => resolved,
        };

        let resolved = ResolvedPreConfig {
            allocator,
            coerce_c_locale,
            coerce_c_locale_warn,
            dev_mode,
            isolated,
            use_environment,
            utf8_mode,
            legacy_windows_fs_encoding,
            parse_argv,
            locale,
        };
        tracing::debug!(
            allocator = %resolved.allocator,
            utf8_mode = resolved.utf8_mode,
            dev_mode = resolved.dev_mode,
            isolated = resolved.isolated,
            coerce_c_locale = ?resolved.coerce_c_locale,
            "pre-configuration resolved"
        );
        Ok(resolved)
    }
}

/// Scan raw argv bytes. Options are ASCII, so lossy conversion is enough
/// to recognise them without deciding on an encoding first.
fn scan_args<B: AsRef<[u8]>>(args: &[B]) -> Signal<CommandLine> {
    let tokens: Vec<String> = args
        .iter()
        .map(|arg| String::from_utf8_lossy(arg.as_ref()).into_owned())
        .collect();
    CommandLine::parse_lenient(&tokens)
}

fn env_allocator(env: &Environment<'_>) -> Signal<Option<Allocator>> {
    match env.ascii(vars::MALLOC) {
        Some(name) => Allocator::from_name(&name).map(Some).ok_or_else(|| {
            Error::config(ORIGIN, format!("{}: unknown allocator {:?}", vars::MALLOC, name)).into()
        }),
        None => Ok(None),
    }
}

/// `0` disables coercion, `warn` only sets the warning flag, anything else
/// forces coercion
fn env_coercion(env: &Environment<'_>) -> (Option<LocaleCoercion>, Option<bool>) {
    match env.ascii(vars::COERCE_C_LOCALE).as_deref() {
        None => (None, None),
        Some("0") => (Some(LocaleCoercion::Off), None),
        Some("warn") => (None, Some(true)),
        Some(_) => (Some(LocaleCoercion::Forced), None),
    }
}

fn argv_utf8(cmdline: &CommandLine) -> Signal<Option<Utf8Mode>> {
    match cmdline.x_option("utf8") {
        None => Ok(None),
        Some(None) | Some(Some("1")) => Ok(Some(Utf8Mode::On)),
        Some(Some("0")) => Ok(Some(Utf8Mode::Off)),
        Some(Some(other)) => {
            Err(Error::config(ORIGIN, format!("invalid -X utf8 option value: {:?}", other)).into())
        }
    }
}

fn env_utf8(env: &Environment<'_>) -> Signal<Option<Utf8Mode>> {
    match env.ascii(vars::UTF8).as_deref() {
        None => Ok(None),
        Some("1") => Ok(Some(Utf8Mode::On)),
        Some("0") => Ok(Some(Utf8Mode::Off)),
        Some(other) => Err(Error::config(
            ORIGIN,
            format!("invalid {} environment variable value: {:?}", vars::UTF8, other),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    struct NoEnv;

    impl EnvSource for NoEnv {
        fn var_os(&self, _name: &str) -> Option<OsString> {
            None
        }
    }

    struct Locale(bool);

    impl LocaleProbe for Locale {
        fn probe(&self) -> Signal<LocaleInfo> {
            Ok(LocaleInfo {
                legacy: self.0,
                encoding: if self.0 { "ascii" } else { "utf-8" }.to_string(),
            })
        }
    }

    #[test]
    fn defaults_without_any_source() {
        let resolver = PreConfigResolver::new(&NoEnv, &Locale(false));
        let resolved = resolver.resolve::<&[u8]>(&PreConfig::new(), None).unwrap();

        assert_eq!(resolved.allocator, Allocator::Default);
        assert_eq!(resolved.coerce_c_locale, LocaleCoercion::Off);
        assert!(!resolved.utf8_mode);
        assert!(resolved.use_environment);
        assert!(!resolved.isolated);
    }

    #[test]
    fn legacy_locale_turns_auto_settings_on() {
        let resolver = PreConfigResolver::new(&NoEnv, &Locale(true));
        let resolved = resolver.resolve::<&[u8]>(&PreConfig::new(), None).unwrap();

        assert!(resolved.utf8_mode);
        assert_eq!(resolved.coerce_c_locale, LocaleCoercion::Forced);
    }

    #[test]
    fn argv_pseudo_options_are_read_from_bytes() {
        let resolver = PreConfigResolver::new(&NoEnv, &Locale(false));
        let args: [&[u8]; 4] = [b"ember", b"-X", b"dev", b"-Xutf8"];
        let resolved = resolver.resolve(&PreConfig::new(), Some(&args[..])).unwrap();

        assert!(resolved.dev_mode);
        assert!(resolved.utf8_mode);
        assert_eq!(resolved.allocator, Allocator::DebugChecked);
    }

    #[test]
    fn bad_utf8_option_value_is_a_config_error() {
        let resolver = PreConfigResolver::new(&NoEnv, &Locale(false));
        let args = ["ember", "-X", "utf8=yes"];
        let status = resolver.resolve(&PreConfig::new(), Some(&args[..])).unwrap_err();
        assert!(status.is_error());
        assert!(status.to_string().contains("-X utf8"));
    }

    #[test]
    fn legacy_fs_encoding_disables_utf8_unless_explicit() {
        let resolver = PreConfigResolver::new(&NoEnv, &Locale(true));
        let pre = PreConfig {
            legacy_windows_fs_encoding: Some(true),
            ..PreConfig::new()
        };
        assert!(!resolver.resolve::<&[u8]>(&pre, None).unwrap().utf8_mode);

        let pre = PreConfig {
            utf8_mode: Some(Utf8Mode::On),
            ..pre
        };
        assert!(resolver.resolve::<&[u8]>(&pre, None).unwrap().utf8_mode);
    }
}
