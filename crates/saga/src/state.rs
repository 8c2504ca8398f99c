/// Lifecycle of a saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SagaState {
    /// Steps are being registered; nothing has run yet.
    #[default]
    Building,
    /// `execute` is in progress.
    Running,
    /// Every step succeeded.
    Committed,
    /// A step failed and every executed step was compensated.
    RolledBack,
    /// A step failed and compensation failed too.
    RollbackFailed,
}

impl SagaState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Committed | Self::RolledBack | Self::RollbackFailed
        )
    }
}
