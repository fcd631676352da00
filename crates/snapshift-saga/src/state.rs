/// Outcome of a recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepOutcome {
    /// The step started but has not reported back yet.
    Pending,
    /// The step created its resource.
    Succeeded,
    /// The step failed; its resource does not exist.
    Failed,
    /// The step's call was abandoned before it answered; its resource may
    /// exist.
    Unconfirmed,
}

impl StepOutcome {
    /// Whether rollback has to undo the step's resource.
    #[must_use]
    pub fn needs_compensation(self) -> bool {
        matches!(self, Self::Succeeded | Self::Unconfirmed)
    }
}

/// Record of one resource-creating step.
#[derive(Debug)]
pub struct StepRecord<R> {
    /// Name of the step.
    pub step: &'static str,
    /// Identity of the resource the step creates.
    pub resource: R,
    pub outcome: StepOutcome,
}

/// Append-only ledger of the resources a saga has created.
///
/// Only the forward pass writes to it; compensation consumes it by value.
#[derive(Debug)]
pub struct SagaState<R> {
    records: Vec<StepRecord<R>>,
}

impl<R> Default for SagaState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R> SagaState<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `step` is about to create `resource`.
    pub fn begin(&mut self, step: &'static str, resource: R) {
        self.records.push(StepRecord {
            step,
            resource,
            outcome: StepOutcome::Pending,
        });
    }

    /// Mark the most recently started step as succeeded.
    pub fn succeed(&mut self) {
        self.complete_last(StepOutcome::Succeeded);
    }

    /// Mark the most recently started step as failed.
    pub fn fail(&mut self) {
        self.complete_last(StepOutcome::Failed);
    }

    /// Mark the most recently started step as abandoned mid-call.
    pub fn abandon(&mut self) {
        self.complete_last(StepOutcome::Unconfirmed);
    }

    fn complete_last(&mut self, outcome: StepOutcome) {
        if let Some(record) = self
            .records
            .last_mut()
            .filter(|r| r.outcome == StepOutcome::Pending)
        {
            record.outcome = outcome;
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord<R>] {
        &self.records
    }

    /// Resources that were actually created, in creation order.
    pub fn created(&self) -> impl DoubleEndedIterator<Item = &R> {
        self.records
            .iter()
            .filter(|r| r.outcome == StepOutcome::Succeeded)
            .map(|r| &r.resource)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn into_records(self) -> Vec<StepRecord<R>> {
        self.records
    }
}
