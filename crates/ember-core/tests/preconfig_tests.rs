//! Tests for pre-initialization through a runtime handle

use ember_core::preconfig::{Allocator, LocaleCoercion, PreConfig, Utf8Mode};
use ember_core::sources::vars;
use ember_core::{Config, LifecycleState, ResolvedPreConfig, SignalExt};
use ember_test_utils::{FakeLocale, TestHost};
use rstest::rstest;

fn pre_initialized(host: &TestHost, explicit: &PreConfig, args: &[&str]) -> ResolvedPreConfig {
    let mut runtime = host.runtime();
    let args: Vec<&[u8]> = args.iter().map(|arg| arg.as_bytes()).collect();
    runtime
        .pre_initialize(explicit, Some(&args[..]))
        .expect("Should pre-initialize");
    runtime.preconfig().cloned().expect("Should hold a pre-configuration")
}

mod allocator_tests {
    use super::*;

    #[test]
    fn test_dev_mode_selects_debug_allocator() {
        let host = TestHost::new();

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember", "-X", "dev"]);

        assert!(pre.dev_mode);
        assert_eq!(pre.allocator, Allocator::DebugChecked);
    }

    #[test]
    fn test_explicit_allocator_beats_dev_mode() {
        let host = TestHost::new().env(vars::DEVMODE, "1");
        let explicit = PreConfig {
            allocator: Some(Allocator::Pool),
            ..PreConfig::new()
        };

        let pre = pre_initialized(&host, &explicit, &["ember"]);

        assert!(pre.dev_mode);
        assert_eq!(pre.allocator, Allocator::Pool);
    }

    #[test]
    fn test_dev_mode_config_outranks_allocator_variable() {
        let host = TestHost::new().env(vars::MALLOC, "malloc");
        let mut runtime = host.runtime();
        let mut config = Config::new();
        config.flags.dev_mode = Some(true);

        runtime.initialize(&config).unwrap();

        let pre = runtime.preconfig().expect("Should hold a pre-configuration");
        assert!(pre.dev_mode);
        assert_eq!(pre.allocator, Allocator::DebugChecked);
    }

    #[rstest]
    #[case("malloc", Allocator::Malloc)]
    #[case("malloc-debug", Allocator::MallocDebug)]
    #[case("pool-debug", Allocator::PoolDebug)]
    fn test_allocator_from_environment(#[case] name: &str, #[case] expected: Allocator) {
        let host = TestHost::new().env(vars::MALLOC, name);

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember"]);

        assert_eq!(pre.allocator, expected);
    }

    #[test]
    fn test_unknown_allocator_is_a_config_error() {
        let host = TestHost::new().env(vars::MALLOC, "jemalloc");
        let mut runtime = host.runtime();

        let result = runtime.pre_initialize::<&[u8]>(&PreConfig::new(), None);

        assert!(result.is_error());
        assert_eq!(runtime.state(), LifecycleState::Unconfigured);
    }
}

mod environment_gate_tests {
    use super::*;

    #[test]
    fn test_isolated_mode_ignores_environment() {
        let host = TestHost::new()
            .env(vars::MALLOC, "malloc")
            .env(vars::UTF8, "1")
            .env(vars::DEVMODE, "1");

        let pre = pre_initialized(&host, &PreConfig::isolated(), &["ember"]);

        assert!(pre.isolated);
        assert!(!pre.use_environment);
        assert!(!pre.dev_mode);
        assert_eq!(pre.allocator, Allocator::Default);
        assert!(!pre.utf8_mode);
    }

    #[rstest]
    #[case::ignore_environment("-E")]
    #[case::isolated("-I")]
    fn test_command_line_gates_environment(#[case] option: &str) {
        let host = TestHost::new().env(vars::MALLOC, "malloc");

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember", option]);

        assert!(!pre.use_environment);
        assert_eq!(pre.allocator, Allocator::Default);
    }

    #[test]
    fn test_isolated_variable_sets_isolated_mode() {
        let host = TestHost::new().env(vars::ISOLATED, "1");

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember"]);

        assert!(pre.isolated);
        assert!(!pre.use_environment);
    }
}

mod locale_tests {
    use super::*;

    #[test]
    fn test_locale_probe_runs_exactly_once() {
        let host = TestHost::new().locale(FakeLocale::legacy());
        let mut runtime = host.runtime();

        runtime.initialize(&Config::new()).unwrap();
        runtime.initialize(&Config::new()).unwrap();

        assert_eq!(host.locale.calls(), 1);
    }

    #[test]
    fn test_probe_failure_falls_back_to_non_legacy() {
        let host = TestHost::new().locale(FakeLocale::failing());

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember"]);

        assert!(!pre.utf8_mode);
        assert_eq!(pre.coerce_c_locale, LocaleCoercion::Off);
        assert_eq!(pre.locale.encoding, "utf-8");
    }

    #[rstest]
    #[case::off("0", LocaleCoercion::Off, false)]
    #[case::warn("warn", LocaleCoercion::Forced, true)]
    #[case::forced("1", LocaleCoercion::Forced, false)]
    fn test_coercion_variable_under_legacy_locale(
        #[case] value: &str,
        #[case] expected: LocaleCoercion,
        #[case] warn: bool,
    ) {
        let host = TestHost::new()
            .locale(FakeLocale::legacy())
            .env(vars::COERCE_C_LOCALE, value);

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember"]);

        assert_eq!(pre.coerce_c_locale, expected);
        assert_eq!(pre.coerce_c_locale_warn, warn);
    }

    #[test]
    fn test_utf8_option_beats_environment() {
        let host = TestHost::new().env(vars::UTF8, "1");

        let pre = pre_initialized(&host, &PreConfig::new(), &["ember", "-X", "utf8=0"]);

        assert!(!pre.utf8_mode);
    }

    #[test]
    fn test_bad_utf8_variable_is_a_config_error() {
        let host = TestHost::new().env(vars::UTF8, "2");

        let result = host.runtime().pre_initialize::<&[u8]>(&PreConfig::new(), None);

        assert!(result.is_error());
    }

    #[test]
    fn test_explicit_utf8_off_beats_legacy_locale() {
        let host = TestHost::new().locale(FakeLocale::legacy());
        let explicit = PreConfig {
            utf8_mode: Some(Utf8Mode::Off),
            ..PreConfig::new()
        };

        let pre = pre_initialized(&host, &explicit, &["ember"]);

        assert!(!pre.utf8_mode);
    }
}

mod idempotence_tests {
    use super::*;

    #[test]
    fn test_second_pre_initialization_is_a_no_op() {
        let host = TestHost::new();
        let mut runtime = host.runtime();
        let first = PreConfig {
            allocator: Some(Allocator::Malloc),
            ..PreConfig::new()
        };
        let second = PreConfig {
            allocator: Some(Allocator::Pool),
            ..PreConfig::new()
        };

        runtime.pre_initialize::<&[u8]>(&first, None).unwrap();
        runtime.pre_initialize::<&[u8]>(&second, None).unwrap();

        assert_eq!(runtime.preconfig().unwrap().allocator, Allocator::Malloc);
        assert_eq!(host.locale.calls(), 1);
    }

    #[test]
    fn test_separate_handles_resolve_identically() {
        let host = TestHost::new().env(vars::MALLOC, "pool").env(vars::UTF8, "1");

        let first = pre_initialized(&host, &PreConfig::new(), &["ember", "-X", "dev"]);
        let second = pre_initialized(&host, &PreConfig::new(), &["ember", "-X", "dev"]);

        assert_eq!(first, second);
    }
}
