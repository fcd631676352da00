use async_trait::async_trait;

use crate::report::{CompensationEntry, CompensationOutcome, CompensationReport};
use crate::state::SagaState;

/// Undoes the effect of one recorded resource.
#[async_trait]
pub trait Compensator<R: Send + Sync>: Send + Sync {
    type Error: Send;

    /// Undo `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource could not be undone. The error is
    /// reported and the pass moves on to the next resource.
    async fn compensate(&self, resource: &R) -> Result<(), Self::Error>;

    /// Human-readable description of what compensating `resource` does.
    fn describe(&self, resource: &R) -> String;
}

/// Undo every resource the saga created, newest first.
///
/// Pending and failed records are skipped because their resource was never
/// created. Unconfirmed records are undone like succeeded ones. Each undo is attempted exactly once, and a failure does not
/// prevent the remaining undos.
pub async fn rollback<R, C>(state: SagaState<R>, compensator: &C) -> CompensationReport<R, C::Error>
where
    R: Send + Sync,
    C: Compensator<R>,
{
    let mut report = CompensationReport::new();

    for record in state
        .into_records()
        .into_iter()
        .rev()
        .filter(|r| r.outcome.needs_compensation())
    {
        let description = compensator.describe(&record.resource);
        let outcome = match compensator.compensate(&record.resource).await {
            Ok(()) => CompensationOutcome::Compensated,
            Err(error) => CompensationOutcome::Failed(error),
        };
        report.push(CompensationEntry {
            step: record.step,
            resource: record.resource,
            description,
            outcome,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recorder {
        undone: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Compensator<String> for Recorder {
        type Error = String;

        async fn compensate(&self, resource: &String) -> Result<(), Self::Error> {
            self.undone.lock().expect("lock poisoned").push(resource.clone());
            Ok(())
        }

        fn describe(&self, resource: &String) -> String {
            format!("undo {resource}")
        }
    }

    #[tokio::test]
    async fn rollback_of_empty_state_does_nothing() {
        let recorder = Recorder {
            undone: Mutex::new(Vec::new()),
        };

        let report = rollback(SagaState::<String>::new(), &recorder).await;

        assert!(report.is_empty());
        assert!(recorder.undone.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn rollback_skips_failed_step() {
        let recorder = Recorder {
            undone: Mutex::new(Vec::new()),
        };
        let mut state = SagaState::new();
        state.begin("create_a", "a".to_string());
        state.succeed();
        state.begin("create_b", "b".to_string());
        state.fail();

        let report = rollback(state, &recorder).await;

        assert_eq!(report.entries().len(), 1);
        assert_eq!(report.entries()[0].step, "create_a");
        assert_eq!(report.entries()[0].description, "undo a");
        assert_eq!(*recorder.undone.lock().expect("lock poisoned"), vec!["a"]);
    }

    #[tokio::test]
    async fn rollback_undoes_unconfirmed_step() {
        let recorder = Recorder {
            undone: Mutex::new(Vec::new()),
        };
        let mut state = SagaState::new();
        state.begin("create_a", "a".to_string());
        state.succeed();
        state.begin("create_b", "b".to_string());
        state.abandon();

        let report = rollback(state, &recorder).await;

        assert_eq!(report.entries().len(), 2);
        assert_eq!(*recorder.undone.lock().expect("lock poisoned"), vec!["b", "a"]);
    }
}
