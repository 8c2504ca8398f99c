use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::audit::SagaAuditLog;
use crate::config::SagaConfig;
use crate::context::ExecutionContext;
use crate::error::{BoxError, RollbackError, SagaError};
use crate::ledger::Ledger;
use crate::rollback;
use crate::state::SagaState;
use crate::step::{Step, StepAction};

type RollbackHook<Ctx, E> = Arc<dyn Fn(&Ctx, Option<&RollbackError<E>>) + Send + Sync>;

struct Inner<Ctx, E> {
    steps: Vec<Step<Ctx, E>>,
    ledger: Ledger<Ctx, E>,
    on_rollback: Option<RollbackHook<Ctx, E>>,
    state: SagaState,
}

/// An ordered list of reversible steps.
///
/// Steps run one at a time in registration order. If one fails, every step
/// that already succeeded is compensated in reverse order (LIFO) and the
/// rollback hook, if any, is told how that went.
///
/// Registration takes `&self` and may happen from several threads. The
/// internal lock is never held while a step, a compensation or the hook runs.
pub struct Saga<Ctx = ExecutionContext, E = BoxError> {
    config: SagaConfig,
    inner: Mutex<Inner<Ctx, E>>,
}

impl<Ctx, E> Saga<Ctx, E> {
    /// Create an empty saga with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SagaConfig::default())
    }

    /// Create an empty saga that compensates according to `config`.
    #[must_use]
    pub fn with_config(config: SagaConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                steps: Vec::new(),
                ledger: Ledger::new(),
                on_rollback: None,
                state: SagaState::Building,
            }),
        }
    }

    /// The configuration this saga was built with.
    #[must_use]
    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Append a step. It runs after every step registered before it.
    pub fn add_step(&self, step: Step<Ctx, E>) {
        self.lock().steps.push(step);
    }

    /// Install the rollback observer, replacing any previous one.
    ///
    /// The observer runs once per rollback, after the last compensation was
    /// attempted and the terminal state was set, and receives the rollback
    /// error or `None` when every executed step was compensated.
    pub fn on_rollback<F>(&self, hook: F)
    where
        F: Fn(&Ctx, Option<&RollbackError<E>>) + Send + Sync + 'static,
    {
        self.lock().on_rollback = Some(Arc::new(hook));
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().steps.len()
    }

    /// Whether no step has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().steps.is_empty()
    }

    /// Where the saga is in its lifecycle.
    #[must_use]
    pub fn state(&self) -> SagaState {
        self.lock().state
    }

    /// Names of the steps whose forward action succeeded in the latest run.
    #[must_use]
    pub fn executed_steps(&self) -> Vec<String> {
        self.lock().ledger.names()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<Ctx, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SagaState) {
        self.lock().state = state;
    }
}

impl<Ctx, E> Saga<Ctx, E>
where
    E: Display,
{
    /// Run every step in order.
    ///
    /// On failure, compensates all previously completed steps in reverse
    /// order before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SagaError::RolledBack`] if a step fails and rollback
    /// succeeds, and [`SagaError::RollbackFailed`] if a compensation fails as
    /// well.
    pub fn execute(&self, ctx: &Ctx) -> Result<(), SagaError<E>> {
        let (result, _audit_log) = self.execute_internal(ctx);
        result
    }

    /// Run the saga and return both the result and an audit log.
    pub fn execute_with_audit(&self, ctx: &Ctx) -> (Result<(), SagaError<E>>, SagaAuditLog) {
        self.execute_internal(ctx)
    }

    fn execute_internal(&self, ctx: &Ctx) -> (Result<(), SagaError<E>>, SagaAuditLog) {
        let steps = {
            let mut inner = self.lock();
            inner.ledger.clear();
            inner.state = SagaState::Running;
            inner.steps.clone()
        };
        debug!(steps = steps.len(), "executing saga");

        let mut audit_log = SagaAuditLog::new();

        for (index, step) in steps.iter().enumerate() {
            audit_log.record_start(index, step.name());

            match step.run(StepAction::Execute, ctx) {
                Ok(()) => {
                    audit_log.record_success();
                    self.lock().ledger.record(index, step.clone());
                    debug!(step = step.name(), index, "step executed");
                }
                Err(error) => {
                    audit_log.record_failure();
                    warn!(
                        step = step.name(),
                        index,
                        error = %error,
                        "step failed, rolling back"
                    );

                    let saga_error = match self.rollback(ctx, &mut audit_log) {
                        Ok(()) => SagaError::RolledBack {
                            step: step.name().to_string(),
                            error,
                        },
                        Err(rollback) => SagaError::RollbackFailed {
                            step: step.name().to_string(),
                            error,
                            rollback,
                        },
                    };
                    return (Err(saga_error), audit_log);
                }
            }
        }

        self.set_state(SagaState::Committed);
        debug!(steps = steps.len(), "saga committed");
        (Ok(()), audit_log)
    }

    fn rollback(&self, ctx: &Ctx, audit_log: &mut SagaAuditLog) -> Result<(), RollbackError<E>> {
        let (executed, hook) = {
            let inner = self.lock();
            (inner.ledger.entries().to_vec(), inner.on_rollback.clone())
        };

        let result = rollback::compensate(&executed, ctx, self.config.compensation(), audit_log);
        self.set_state(if result.is_ok() {
            SagaState::RolledBack
        } else {
            SagaState::RollbackFailed
        });

        if let Some(hook) = hook {
            hook(ctx, result.as_ref().err());
        }
        result
    }
}

impl<Ctx, E> Default for Saga<Ctx, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx, E> fmt::Debug for Saga<Ctx, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Saga")
            .field("config", &self.config)
            .field("steps", &inner.steps)
            .field("executed", &inner.ledger.names())
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}
