//! Integration tests for compensation failure scenarios.

use std::sync::{Arc, Mutex};

use saga::{CompensationPolicy, Saga, SagaConfig, SagaError, SagaState, Step, StepError};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Clone, Copy)]
enum Outcome {
    Succeed,
    Fail,
}

fn tracked(
    log: &Log,
    name: &'static str,
    execute: Outcome,
    compensate: Outcome,
) -> Step<(), TestError> {
    let exec_log = Arc::clone(log);
    let comp_log = Arc::clone(log);
    Step::new(
        name,
        move |_| {
            exec_log.lock().expect("log lock").push(format!("execute {name}"));
            match execute {
                Outcome::Succeed => Ok(()),
                Outcome::Fail => Err(TestError(format!("error {name}"))),
            }
        },
        move |_| {
            comp_log
                .lock()
                .expect("log lock")
                .push(format!("compensate {name}"));
            match compensate {
                Outcome::Succeed => Ok(()),
                Outcome::Fail => Err(TestError(format!("error compensate {name}"))),
            }
        },
    )
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

#[test]
fn compensation_failure_halts_rollback() {
    let log = Log::default();
    let saga: Saga<(), TestError> = Saga::new();
    saga.add_step(tracked(&log, "step_a", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(tracked(&log, "step_b", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "step_c", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(tracked(&log, "trigger", Outcome::Fail, Outcome::Succeed));

    let result = saga.execute(&());

    assert!(result.is_err());
    assert_eq!(
        entries(&log),
        vec![
            "execute step_a",
            "execute step_b",
            "execute step_c",
            "execute trigger",
            "compensate step_c",
            "compensate step_b",
        ]
    );
    assert_eq!(saga.state(), SagaState::RollbackFailed);
}

#[test]
fn compensation_failed_error_contains_correct_information() {
    let log = Log::default();
    let saga: Saga<(), TestError> = Saga::new();
    saga.add_step(tracked(&log, "step_a", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(tracked(&log, "step_b", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "trigger", Outcome::Fail, Outcome::Succeed));

    let err = saga.execute(&()).expect_err("should be an error");

    match err {
        SagaError::RollbackFailed {
            step,
            error,
            rollback,
        } => {
            assert_eq!(step, "trigger");
            assert_eq!(error.to_string(), "error trigger");
            assert_eq!(rollback.failures().len(), 1);
            assert_eq!(rollback.failures()[0].step, "step_b");
            assert_eq!(rollback.failures()[0].index, 1);
            assert_eq!(
                rollback.failures()[0].error.to_string(),
                "error compensate step_b"
            );
        }
        SagaError::RolledBack { .. } => {
            panic!("expected RollbackFailed, got RolledBack");
        }
        _ => panic!("unexpected error variant"),
    }
}

#[test]
fn only_the_first_compensation_failure_is_reported() {
    let log = Log::default();
    let saga: Saga<(), TestError> = Saga::new();
    saga.add_step(tracked(&log, "fail_comp_a", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "fail_comp_b", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "trigger", Outcome::Fail, Outcome::Succeed));

    let err = saga.execute(&()).expect_err("should be an error");

    let rollback = err.rollback_error().expect("rollback should have failed");
    assert_eq!(rollback.failures().len(), 1);
    assert_eq!(rollback.failures()[0].step, "fail_comp_b");
    assert!(!entries(&log).contains(&"compensate fail_comp_a".to_string()));
}

#[test]
fn best_effort_reports_every_failure() {
    let log = Log::default();
    let config = SagaConfig::default().with_compensation(CompensationPolicy::BestEffort);
    let saga: Saga<(), TestError> = Saga::with_config(config);
    saga.add_step(tracked(&log, "fail_comp_a", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "success_b", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(tracked(&log, "fail_comp_c", Outcome::Succeed, Outcome::Fail));
    saga.add_step(tracked(&log, "trigger", Outcome::Fail, Outcome::Succeed));

    let err = saga.execute(&()).expect_err("should be an error");

    let rollback = err.rollback_error().expect("rollback should have failed");
    let failed: Vec<&str> = rollback
        .failures()
        .iter()
        .map(|failure| failure.step.as_str())
        .collect();
    assert_eq!(failed, vec!["fail_comp_c", "fail_comp_a"]);
    assert_eq!(
        entries(&log)
            .iter()
            .filter(|entry| entry.starts_with("compensate"))
            .count(),
        3
    );
}

#[test]
fn missing_compensation_is_reported_as_rollback_failure() {
    let log = Log::default();
    let saga: Saga<(), TestError> = Saga::new();
    saga.add_step(tracked(&log, "step1", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(Step::named("no_undo").with_execute(|_| Ok(())));
    saga.add_step(tracked(&log, "step3", Outcome::Fail, Outcome::Succeed));

    let err = saga.execute(&()).expect_err("should be an error");

    assert_eq!(
        err.to_string(),
        "execute failed: error step3, rollback failed: compensation failed for step no_undo: step no_undo has no compensate action"
    );
    assert!(!entries(&log).contains(&"compensate step1".to_string()));
}

#[test]
fn missing_execute_fails_the_step() {
    let log = Log::default();
    let saga: Saga<(), TestError> = Saga::new();
    saga.add_step(tracked(&log, "step1", Outcome::Succeed, Outcome::Succeed));
    saga.add_step(Step::named("no_forward").with_compensate(|_| Ok(())));

    let err = saga.execute(&()).expect_err("should be an error");

    assert!(matches!(err.step_error(), StepError::MissingAction { .. }));
    assert_eq!(
        err.to_string(),
        "execute failed: step no_forward has no execute action, rollback successful"
    );
    assert_eq!(entries(&log), vec!["execute step1", "compensate step1"]);
}
