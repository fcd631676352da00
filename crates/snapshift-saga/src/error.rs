use std::fmt::{Debug, Display};

use thiserror::Error;

use crate::report::CompensationReport;

/// A saga that stopped at `failed_step` and was rolled back.
///
/// `error` is the root cause exactly as the failing step returned it;
/// failures during compensation live only in `compensation` and never
/// replace it.
#[derive(Debug, Error)]
#[error("step '{failed_step}' failed")]
pub struct SagaFailure<R: Debug, E: Debug> {
    pub failed_step: &'static str,
    #[source]
    pub error: E,
    pub compensation: CompensationReport<R, E>,
}

impl<R: Debug, E: Debug> SagaFailure<R, E> {
    #[must_use]
    pub fn new(failed_step: &'static str, error: E, compensation: CompensationReport<R, E>) -> Self {
        Self {
            failed_step,
            error,
            compensation,
        }
    }

    #[must_use]
    pub fn into_error(self) -> E {
        self.error
    }
}

impl<R: Debug, E: Debug + Display> SagaFailure<R, E> {
    /// The cleanup that did not happen, if any.
    #[must_use]
    pub fn partial_compensation(&self) -> Option<PartialCompensationError> {
        let pending: Vec<String> = self
            .compensation
            .failures()
            .map(|entry| match entry.error() {
                Some(error) => format!("{} ({error})", entry.description),
                None => entry.description.clone(),
            })
            .collect();

        if pending.is_empty() {
            None
        } else {
            Some(PartialCompensationError { pending })
        }
    }
}

/// Some compensations failed and need manual cleanup.
#[derive(Debug, Error)]
#[error("{} compensation(s) failed and need manual cleanup: {}", pending.len(), pending.join("; "))]
pub struct PartialCompensationError {
    pub pending: Vec<String>,
}
