//! Saga primitives for multi-step operations that span independent systems.
//!
//! The forward pass records every resource it creates in a [`SagaState`].
//! When a step fails, the state is handed by value to [`rollback`], which
//! undoes the recorded resources in reverse creation order through a
//! [`Compensator`] and returns a [`CompensationReport`]. Compensation is
//! single-pass and best-effort: a failed undo is reported, never retried,
//! and never stops the remaining undos.

mod compensation;
mod error;
mod report;
mod state;

pub use compensation::{Compensator, rollback};
pub use error::{PartialCompensationError, SagaFailure};
pub use report::{CompensationEntry, CompensationOutcome, CompensationReport};
pub use state::{SagaState, StepOutcome, StepRecord};
