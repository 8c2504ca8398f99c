use std::fmt::Display;

use tracing::{debug, warn};

use crate::audit::SagaAuditLog;
use crate::config::CompensationPolicy;
use crate::error::{CompensationError, RollbackError};
use crate::ledger::LedgerEntry;
use crate::step::StepAction;

/// Compensate `executed` in reverse order.
///
/// Under [`CompensationPolicy::FailFast`] the walk stops at the first failed
/// compensation and every earlier entry is left uncompensated.
pub(crate) fn compensate<Ctx, E>(
    executed: &[LedgerEntry<Ctx, E>],
    ctx: &Ctx,
    policy: CompensationPolicy,
    audit_log: &mut SagaAuditLog,
) -> Result<(), RollbackError<E>>
where
    E: Display,
{
    let mut failures = Vec::new();

    for (position, entry) in executed.iter().enumerate().rev() {
        let step_name = entry.step.name();

        match entry.step.run(StepAction::Compensate, ctx) {
            Ok(()) => {
                audit_log.record_compensated(entry.index);
                debug!(step = step_name, index = entry.index, "step compensated");
            }
            Err(error) => {
                audit_log.record_compensation_failed(entry.index);
                warn!(
                    step = step_name,
                    index = entry.index,
                    error = %error,
                    "compensation failed"
                );
                failures.push(CompensationError {
                    step: step_name.to_string(),
                    index: entry.index,
                    error,
                });

                if policy == CompensationPolicy::FailFast {
                    for skipped in &executed[..position] {
                        audit_log.record_uncompensated(skipped.index);
                    }
                    if position > 0 {
                        warn!(
                            remaining = position,
                            "rollback halted, earlier steps left uncompensated"
                        );
                    }
                    break;
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(RollbackError::new(failures))
    }
}
