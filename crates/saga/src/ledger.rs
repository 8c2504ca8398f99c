use crate::step::Step;

/// A step whose forward action succeeded during the current run.
pub(crate) struct LedgerEntry<Ctx, E> {
    pub(crate) index: usize,
    pub(crate) step: Step<Ctx, E>,
}

impl<Ctx, E> Clone for LedgerEntry<Ctx, E> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            step: self.step.clone(),
        }
    }
}

/// Append-only record of executed steps, in execution order.
pub(crate) struct Ledger<Ctx, E> {
    entries: Vec<LedgerEntry<Ctx, E>>,
}

impl<Ctx, E> Ledger<Ctx, E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, index: usize, step: Step<Ctx, E>) {
        debug_assert!(
            self.entries.last().is_none_or(|last| last.index < index),
            "ledger entries must follow registration order"
        );
        self.entries.push(LedgerEntry { index, step });
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn entries(&self) -> &[LedgerEntry<Ctx, E>] {
        &self.entries
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.step.name().to_string())
            .collect()
    }
}
