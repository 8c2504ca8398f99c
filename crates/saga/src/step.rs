use std::fmt;
use std::sync::Arc;

use crate::error::StepError;

type Action<Ctx, E> = Arc<dyn Fn(&Ctx) -> Result<(), E> + Send + Sync>;

/// One of the two operations a step carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// The forward action.
    Execute,
    /// The compensating action.
    Compensate,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execute => f.write_str("execute"),
            Self::Compensate => f.write_str("compensate"),
        }
    }
}

/// A step that can be executed and compensated, implemented as a type.
///
/// Register implementors through [`Step::from_saga_step`].
pub trait SagaStep: Send + Sync {
    /// Execution context handed to both actions.
    type Context;

    /// Error type for step failures.
    type Error;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Run the forward action.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    fn execute(&self, ctx: &Self::Context) -> Result<(), Self::Error>;

    /// Undo the effects of a successful [`execute`](Self::execute).
    ///
    /// Called during rollback when a later step fails.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    fn compensate(&self, ctx: &Self::Context) -> Result<(), Self::Error>;
}

/// A named pair of forward and compensating actions.
///
/// Steps are immutable once registered. Either action may be absent; the
/// saga reports [`StepError::MissingAction`] when it needs an action that was
/// never supplied.
pub struct Step<Ctx, E> {
    name: String,
    execute: Option<Action<Ctx, E>>,
    compensate: Option<Action<Ctx, E>>,
}

impl<Ctx, E> Step<Ctx, E> {
    /// Create a step with both actions.
    #[must_use]
    pub fn new<F, C>(name: impl Into<String>, execute: F, compensate: C) -> Self
    where
        F: Fn(&Ctx) -> Result<(), E> + Send + Sync + 'static,
        C: Fn(&Ctx) -> Result<(), E> + Send + Sync + 'static,
    {
        Self::named(name)
            .with_execute(execute)
            .with_compensate(compensate)
    }

    /// Create a step with a name and no actions.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            execute: None,
            compensate: None,
        }
    }

    /// Set the forward action, replacing any previous one.
    #[must_use]
    pub fn with_execute<F>(mut self, execute: F) -> Self
    where
        F: Fn(&Ctx) -> Result<(), E> + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(execute));
        self
    }

    /// Set the compensating action, replacing any previous one.
    #[must_use]
    pub fn with_compensate<C>(mut self, compensate: C) -> Self
    where
        C: Fn(&Ctx) -> Result<(), E> + Send + Sync + 'static,
    {
        self.compensate = Some(Arc::new(compensate));
        self
    }

    /// Wrap a [`SagaStep`] implementation.
    #[must_use]
    pub fn from_saga_step<S>(step: S) -> Self
    where
        S: SagaStep<Context = Ctx, Error = E> + 'static,
        Ctx: 'static,
        E: 'static,
    {
        let step = Arc::new(step);
        let forward = Arc::clone(&step);
        Self::new(
            step.name().to_string(),
            move |ctx: &Ctx| forward.execute(ctx),
            move |ctx: &Ctx| step.compensate(ctx),
        )
    }

    /// The step's name, as used in logs and error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the given action was supplied.
    #[must_use]
    pub fn has_action(&self, action: StepAction) -> bool {
        match action {
            StepAction::Execute => self.execute.is_some(),
            StepAction::Compensate => self.compensate.is_some(),
        }
    }

    pub(crate) fn run(&self, action: StepAction, ctx: &Ctx) -> Result<(), StepError<E>> {
        let handler = match action {
            StepAction::Execute => self.execute.as_ref(),
            StepAction::Compensate => self.compensate.as_ref(),
        };
        match handler {
            Some(handler) => handler(ctx).map_err(StepError::Failed),
            None => Err(StepError::MissingAction {
                step: self.name.clone(),
                action,
            }),
        }
    }
}

impl<Ctx, E> Clone for Step<Ctx, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            execute: self.execute.clone(),
            compensate: self.compensate.clone(),
        }
    }
}

impl<Ctx, E> fmt::Debug for Step<Ctx, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("execute", &self.execute.is_some())
            .field("compensate", &self.compensate.is_some())
            .finish()
    }
}
