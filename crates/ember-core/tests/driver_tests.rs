//! Tests for the program driver

use ember_core::config::{ListField, TextField};
use ember_core::{Config, LifecycleState, Outcome, PreConfig, SignalExt, run, run_main};
use ember_test_utils::{EntryPoint, RecordingEvaluator, TestHost};
use rstest::rstest;

fn argv_config(argv: &[&str]) -> Config {
    let mut config = Config::new();
    config.set_list(ListField::Argv, argv).unwrap();
    config
}

#[rstest]
#[case::command(&["ember", "-c", "pass"], EntryPoint::Command("pass".into()))]
#[case::module(&["ember", "-m", "pkg.main"], EntryPoint::Module("pkg.main".into()))]
#[case::script(&["ember", "main.em"], EntryPoint::Script("main.em".into()))]
#[case::interactive(&["ember"], EntryPoint::Interactive)]
fn test_selects_exactly_one_entry_point(#[case] argv: &[&str], #[case] expected: EntryPoint) {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::new();

    let code = run_main(&mut runtime, &argv_config(argv), &mut evaluator).unwrap();

    assert_eq!(code, 0);
    assert_eq!(evaluator.runs, vec![expected]);
}

#[rstest]
#[case::completed(Outcome::Completed, 0)]
#[case::uncaught(Outcome::UncaughtError("boom".into()), 1)]
#[case::exit_request(Outcome::ExitRequested(7), 7)]
fn test_outcome_maps_to_exit_status(#[case] outcome: Outcome, #[case] expected: i32) {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::with_outcomes([outcome]);

    let code = run_main(&mut runtime, &argv_config(&["ember", "-c", "pass"]), &mut evaluator).unwrap();

    assert_eq!(code, expected);
}

#[test]
fn test_run_always_finalizes() {
    let mut runtime = TestHost::new().runtime();
    runtime.initialize(&Config::new()).unwrap();
    let mut evaluator = RecordingEvaluator::with_outcomes([Outcome::UncaughtError("boom".into())]);

    run(&mut runtime, &mut evaluator).unwrap();

    assert_eq!(runtime.state(), LifecycleState::Finalized);
    assert!(runtime.config().is_none());
}

#[test]
fn test_run_before_initialize_is_a_state_error() {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::new();

    let result = run(&mut runtime, &mut evaluator);

    assert!(result.is_error());
    assert!(evaluator.runs.is_empty());
    assert_eq!(runtime.state(), LifecycleState::Unconfigured);
}

#[test]
fn test_rejected_run_keeps_pre_configuration() {
    let mut runtime = TestHost::new().runtime();
    runtime
        .pre_initialize::<&[u8]>(&PreConfig::new(), None)
        .unwrap();
    let mut evaluator = RecordingEvaluator::new();

    let result = run(&mut runtime, &mut evaluator);

    assert!(result.is_error());
    assert!(evaluator.runs.is_empty());
    assert_eq!(runtime.state(), LifecycleState::PreInitialized);
    assert!(runtime.preconfig().is_some());
}

#[test]
fn test_inspect_enters_interactive_mode_afterwards() {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::new();

    run_main(&mut runtime, &argv_config(&["ember", "-i", "main.em"]), &mut evaluator).unwrap();

    assert_eq!(
        evaluator.runs,
        vec![EntryPoint::Script("main.em".into()), EntryPoint::Interactive]
    );
}

#[test]
fn test_inspect_is_skipped_after_exit_request() {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::with_outcomes([Outcome::ExitRequested(3)]);

    let code = run_main(&mut runtime, &argv_config(&["ember", "-i", "-c", "pass"]), &mut evaluator).unwrap();

    assert_eq!(code, 3);
    assert_eq!(evaluator.runs.len(), 1);
}

#[test]
fn test_run_main_finalizes_when_initialization_fails() {
    let mut runtime = TestHost::new().runtime();
    let mut config = Config::new();
    config.set_text(TextField::RunCommand, "pass").unwrap();
    config.set_text(TextField::RunModule, "pkg").unwrap();
    let mut evaluator = RecordingEvaluator::new();

    let result = run_main(&mut runtime, &config, &mut evaluator);

    assert!(result.is_error());
    assert_eq!(runtime.state(), LifecycleState::Finalized);
    assert!(evaluator.runs.is_empty());
}

#[test]
fn test_version_request_exits_without_running() {
    let host = TestHost::new();
    let mut runtime = host.runtime();
    let mut evaluator = RecordingEvaluator::new();

    let status = run_main(&mut runtime, &argv_config(&["ember", "--version"]), &mut evaluator)
        .unwrap_err();

    assert_eq!(status.exit_code(), 0);
    assert!(status.is_exit());
    assert!(evaluator.runs.is_empty());
    assert!(host.console.contents().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_evaluator_sees_final_argv() {
    let mut runtime = TestHost::new().runtime();
    let mut evaluator = RecordingEvaluator::new();

    run_main(&mut runtime, &argv_config(&["ember", "-m", "pkg", "--flag"]), &mut evaluator).unwrap();

    assert_eq!(
        evaluator.argv_seen[0].iter().collect::<Vec<_>>(),
        ["-m", "--flag"]
    );
}
