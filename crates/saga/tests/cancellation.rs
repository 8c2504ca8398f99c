//! Integration tests for execution context passthrough.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use saga::{BoxError, ContextError, ExecutionContext, Saga, Step, StepError};

fn honours_context(ctx: &ExecutionContext) -> Result<(), BoxError> {
    ctx.check()?;
    Ok(())
}

fn succeed(_ctx: &ExecutionContext) -> Result<(), BoxError> {
    Ok(())
}

#[test]
fn cancelled_context_is_still_passed_to_the_next_step() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    let saga: Saga = Saga::new();
    saga.add_step(Step::new(
        "counts",
        move |_ctx: &ExecutionContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        succeed,
    ));

    let ctx = ExecutionContext::background();
    ctx.cancel();

    assert!(saga.execute(&ctx).is_ok());
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
}

#[test]
fn cancellation_mid_run_is_reported_by_the_step() {
    let saga: Saga = Saga::new();
    let compensated = Arc::new(Mutex::new(Vec::new()));
    let undo_log = Arc::clone(&compensated);

    saga.add_step(Step::new(
        "cancels",
        |ctx: &ExecutionContext| {
            ctx.cancel();
            Ok(())
        },
        move |_ctx: &ExecutionContext| {
            undo_log.lock().expect("undo lock").push("cancels");
            Ok(())
        },
    ));
    saga.add_step(Step::new("checks", honours_context, succeed));

    let err = saga
        .execute(&ExecutionContext::background())
        .expect_err("second step sees cancellation");

    assert_eq!(err.to_string(), "execute failed: context canceled, rollback successful");
    assert_eq!(*compensated.lock().expect("undo lock"), vec!["cancels"]);

    let StepError::Failed(source) = err.step_error() else {
        panic!("expected a step failure");
    };
    assert_eq!(
        source.downcast_ref::<ContextError>(),
        Some(&ContextError::Canceled)
    );
}

#[test]
fn compensations_receive_the_same_context() {
    let saga: Saga = Saga::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_undo = Arc::clone(&seen);
    saga.add_step(Step::new("a", succeed, move |ctx: &ExecutionContext| {
        seen_by_undo
            .lock()
            .expect("seen lock")
            .push(ctx.deadline());
        Ok(())
    }));
    saga.add_step(Step::new("b", honours_context, succeed));

    let deadline = Instant::now() + Duration::from_millis(5);
    let ctx = ExecutionContext::background().with_deadline(deadline);
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }

    let err = saga.execute(&ctx).expect_err("deadline has passed");

    assert_eq!(
        err.to_string(),
        "execute failed: context deadline exceeded, rollback successful"
    );
    assert_eq!(*seen.lock().expect("seen lock"), vec![Some(deadline)]);
}
