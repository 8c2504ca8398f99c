use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::step::StepAction;

/// Error type for steps that don't bring their own.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure of a single step action.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepError<E> {
    /// The action ran and reported an error.
    #[error("{0}")]
    Failed(E),

    /// The step was registered without this action.
    #[error("step {step} has no {action} action")]
    MissingAction {
        /// Name of the step.
        step: String,
        /// The action that was missing.
        action: StepAction,
    },
}

impl<E> StepError<E> {
    /// The caller's error, if the action ran at all.
    #[must_use]
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            Self::MissingAction { .. } => None,
        }
    }
}

/// Error from a failed compensation operation.
#[derive(Debug, Error)]
#[error("compensation failed for step {step}: {error}")]
pub struct CompensationError<E> {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Registration index of the step.
    pub index: usize,
    /// The underlying error, already part of the message.
    pub error: StepError<E>,
}

/// Outcome of a rollback that did not compensate every executed step.
///
/// With the fail-fast policy this always holds exactly one failure. With
/// best-effort compensation it holds one entry per failed compensation, in the
/// order they were attempted (most recently executed step first).
#[derive(Debug)]
pub struct RollbackError<E> {
    failures: Vec<CompensationError<E>>,
}

impl<E> RollbackError<E> {
    pub(crate) fn new(failures: Vec<CompensationError<E>>) -> Self {
        debug_assert!(!failures.is_empty());
        Self { failures }
    }

    /// Every compensation failure observed during the rollback.
    #[must_use]
    pub fn failures(&self) -> &[CompensationError<E>] {
        &self.failures
    }

    /// Take ownership of the failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<CompensationError<E>> {
        self.failures
    }
}

impl<E: Display> Display for RollbackError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, failure) in self.failures.iter().enumerate() {
            if position > 0 {
                f.write_str("; ")?;
            }
            Display::fmt(failure, f)?;
        }
        Ok(())
    }
}

impl<E> StdError for RollbackError<E> where E: Debug + Display {}

/// Error from saga execution.
///
/// The step error and the rollback error are rendered into the message, so
/// neither is exposed again through `source()`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E> {
    /// A step failed and every executed step was compensated.
    #[error("execute failed: {error}, rollback successful")]
    RolledBack {
        /// Name of the step that failed.
        step: String,
        /// The error that caused the step to fail.
        error: StepError<E>,
    },

    /// A step failed and the rollback failed as well.
    #[error("execute failed: {error}, rollback failed: {rollback}")]
    RollbackFailed {
        /// Name of the step that originally failed.
        step: String,
        /// The error from the failed step.
        error: StepError<E>,
        /// What went wrong while compensating.
        rollback: RollbackError<E>,
    },
}

impl<E> SagaError<E> {
    /// Name of the step whose forward action failed.
    #[must_use]
    pub fn failed_step(&self) -> &str {
        match self {
            Self::RolledBack { step, .. } | Self::RollbackFailed { step, .. } => step,
        }
    }

    /// The error returned by the failed step's forward action.
    #[must_use]
    pub fn step_error(&self) -> &StepError<E> {
        match self {
            Self::RolledBack { error, .. } | Self::RollbackFailed { error, .. } => error,
        }
    }

    /// The rollback failure, if compensation did not complete.
    #[must_use]
    pub fn rollback_error(&self) -> Option<&RollbackError<E>> {
        match self {
            Self::RolledBack { .. } => None,
            Self::RollbackFailed { rollback, .. } => Some(rollback),
        }
    }
}

/// Reason an [`ExecutionContext`](crate::ExecutionContext) is no longer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was cancelled.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Failure to load a [`SagaConfig`](crate::SagaConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest could not be read.
    #[error("failed to read saga configuration at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or has a malformed `saga` table.
    #[error("failed to parse saga configuration at '{path}'")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A standalone configuration document could not be parsed.
    #[error("failed to parse saga configuration")]
    Parse(#[from] toml::de::Error),
}
