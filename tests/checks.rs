// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assertion macros and the fatal path they route through.

use logfan::{MemorySink, Verbosity};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

static TEST_GUARD: Mutex<()> = Mutex::new(());

fn guard() -> std::sync::MutexGuard<'static, ()> {
    match TEST_GUARD.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Sets up a capturing sink plus a diverting fatal handler and runs `f`,
/// returning what the sink saw and whether the fatal path fired.
fn with_diverting_fatal(f: impl FnOnce()) -> (String, bool) {
    logfan::remove_all_sinks();
    logfan::set_stderr_verbosity(Verbosity::OFF);
    let sink = Arc::new(MemorySink::new());
    logfan::add_sink("checks", Box::new(sink.clone()), Verbosity::MAX);
    logfan::set_fatal_handler(|_message| panic!("diverted"));

    let diverted = catch_unwind(AssertUnwindSafe(f)).is_err();

    logfan::clear_fatal_handler();
    let captured = sink.drain();
    logfan::remove_all_sinks();
    logfan::set_stderr_verbosity(Verbosity::INFO);
    (captured, diverted)
}

#[test]
fn passing_checks_are_silent() {
    let _guard = guard();
    let (captured, diverted) = with_diverting_fatal(|| {
        logfan::check!(1 + 1 == 2);
        logfan::check_eq!("a", "a");
        logfan::check_ne!(1, 2);
        logfan::check_lt!(1, 2);
        logfan::check_le!(2, 2);
        logfan::check_gt!(3, 2);
        logfan::check_ge!(3, 3);
    });
    assert!(!diverted);
    assert!(!captured.contains("CHECK FAILED"));
}

#[test]
fn failed_boolean_check_reports_the_expression() {
    let _guard = guard();
    let connected = false;
    let (captured, diverted) = with_diverting_fatal(|| {
        logfan::check!(connected, "lost the connection");
    });
    assert!(diverted);
    assert!(captured.contains("CHECK FAILED:  connected  "));
    assert!(captured.contains("lost the connection"));
}

#[test]
fn failed_binary_check_reports_both_sides() {
    let _guard = guard();
    let expected = 4;
    let actual = 5;
    let (captured, diverted) = with_diverting_fatal(|| {
        logfan::check_eq!(expected, actual, "tally mismatch");
    });
    assert!(diverted);
    // Source text of both operands...
    assert!(captured.contains("expected == actual"));
    // ...and their evaluated values.
    assert!(captured.contains("(4 vs 5)"));
    assert!(captured.contains("tally mismatch"));
}

#[test]
fn abort_fires_regardless_of_configuration() {
    let _guard = guard();
    logfan::remove_all_sinks();
    // Every threshold off and FATAL itself disabled: an ordinary
    // log!(FATAL, ...) would be filtered, but abort! must still terminate.
    logfan::set_stderr_verbosity(Verbosity::OFF);
    logfan::set_severity_enabled(Verbosity::FATAL, false);

    let seen = Arc::new(Mutex::new(String::new()));
    let capture = seen.clone();
    logfan::set_fatal_handler(move |message| {
        *capture.lock().unwrap() = message.text.to_string();
        panic!("diverted")
    });
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        logfan::abort!("giving up on shard {}", 7);
    }));
    assert!(outcome.is_err(), "the fatal handler should have diverted");

    logfan::clear_fatal_handler();
    logfan::set_severity_enabled(Verbosity::FATAL, true);
    logfan::set_stderr_verbosity(Verbosity::INFO);

    assert_eq!(seen.lock().unwrap().as_str(), "giving up on shard 7");
}

#[test]
fn disabled_fatal_severity_filters_ordinary_logs_but_not_checks() {
    let _guard = guard();
    logfan::set_severity_enabled(Verbosity::FATAL, false);
    let (captured, diverted) = with_diverting_fatal(|| {
        logfan::log!(FATAL, "filtered away");
        logfan::check!(false, "still fatal");
    });
    logfan::set_severity_enabled(Verbosity::FATAL, true);
    assert!(diverted);
    assert!(!captured.contains("filtered away"));
    assert!(captured.contains("still fatal"));
}

#[test]
fn fatal_reports_error_context_and_stack_trace() {
    let _guard = guard();
    let (captured, diverted) = with_diverting_fatal(|| {
        logfan::error_context!("Processing request", 91);
        logfan::log!(FATAL, "cannot continue");
    });
    assert!(diverted);
    assert!(captured.contains("Stack trace:"));
    assert!(captured.contains("[ErrorContext]"));
    assert!(captured.contains("Processing request"));
    assert!(captured.contains("91"));
    assert!(captured.contains("cannot continue"));
}

#[test]
fn duplicate_sink_id_is_a_check_failure() {
    let _guard = guard();
    logfan::remove_all_sinks();
    logfan::set_stderr_verbosity(Verbosity::OFF);
    let sink = Arc::new(MemorySink::new());
    logfan::add_sink("twice", Box::new(sink.clone()), Verbosity::MAX);
    logfan::set_fatal_handler(|_message| panic!("diverted"));

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        logfan::add_sink("twice", Box::new(MemorySink::new()), Verbosity::MAX);
    }));
    assert!(outcome.is_err());
    logfan::clear_fatal_handler();

    let captured = sink.drain();
    assert!(captured.contains("CHECK FAILED"));
    assert!(captured.contains("'twice'"));
    // The failed registration must not have mutated the registry: the
    // original sink is still the one receiving messages.
    logfan::log!(INFO, "still here");
    assert!(sink.drain().contains("still here"));

    logfan::remove_all_sinks();
    logfan::set_stderr_verbosity(Verbosity::INFO);
}
