use std::time::Instant;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Step executed successfully.
    Executed,
    /// Step failed during execution.
    Failed,
    /// Step was compensated successfully.
    Compensated,
    /// Step compensation failed.
    CompensationFailed,
    /// Step executed but rollback halted before reaching it.
    Uncompensated,
}

/// Record of a step's execution in the saga.
#[derive(Debug)]
pub struct StepRecord {
    /// Name of the step.
    pub name: String,
    /// Registration index of the step.
    pub index: usize,
    /// Current status.
    pub status: StepStatus,
    /// When the step started executing.
    pub started_at: Instant,
    /// When the step last changed status.
    pub completed_at: Option<Instant>,
}

/// Audit log tracking every step attempted during one saga run.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            name: name.to_string(),
            index,
            status: StepStatus::Executed,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    pub(crate) fn record_failure(&mut self) {
        self.finish_last(StepStatus::Failed);
    }

    pub(crate) fn record_success(&mut self) {
        self.finish_last(StepStatus::Executed);
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.update(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.update(index, StepStatus::CompensationFailed);
    }

    pub(crate) fn record_uncompensated(&mut self, index: usize) {
        self.update(index, StepStatus::Uncompensated);
    }

    fn finish_last(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    fn update(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|record| record.index == index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Get all records in the audit log, in execution order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Status of the step registered at `index`, if it was attempted.
    #[must_use]
    pub fn status_of(&self, index: usize) -> Option<StepStatus> {
        self.records
            .iter()
            .find(|record| record.index == index)
            .map(|record| record.status)
    }

    /// Get a summary of the saga execution for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationFailed => "⚠",
                StepStatus::Uncompensated => "○",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
