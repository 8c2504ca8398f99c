//! Saga pattern for in-process multi-step operations.
//!
//! A [`Saga`] runs an ordered list of [`Step`]s, each a forward action paired
//! with a compensating action. When a step fails, the steps that already
//! succeeded are compensated in reverse order and a single combined
//! [`SagaError`] is returned.
//!
//! ```
//! use saga::{ExecutionContext, Saga, Step};
//!
//! let saga: Saga = Saga::new();
//! saga.add_step(Step::new(
//!     "reserve",
//!     |_ctx: &ExecutionContext| Ok(()),
//!     |_ctx: &ExecutionContext| Ok(()),
//! ));
//! saga.add_step(Step::new(
//!     "charge",
//!     |_ctx: &ExecutionContext| Err("card declined".into()),
//!     |_ctx: &ExecutionContext| Ok(()),
//! ));
//!
//! let err = saga
//!     .execute(&ExecutionContext::background())
//!     .expect_err("charge fails");
//! assert_eq!(
//!     err.to_string(),
//!     "execute failed: card declined, rollback successful"
//! );
//! ```

mod audit;
mod config;
mod context;
mod error;
mod ledger;
mod rollback;
mod saga;
mod state;
mod step;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use config::{CompensationPolicy, SagaConfig};
pub use context::ExecutionContext;
pub use error::{
    BoxError, CompensationError, ConfigError, ContextError, RollbackError, SagaError, StepError,
};
pub use saga::Saga;
pub use state::SagaState;
pub use step::{SagaStep, Step, StepAction};
