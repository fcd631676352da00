use std::fmt::Display;

/// Result of undoing one recorded resource.
#[derive(Debug)]
pub enum CompensationOutcome<E> {
    Compensated,
    Failed(E),
}

/// One line of a compensation pass.
#[derive(Debug)]
pub struct CompensationEntry<R, E> {
    /// Step that created the resource.
    pub step: &'static str,
    pub resource: R,
    /// Human-readable description of the undo action.
    pub description: String,
    pub outcome: CompensationOutcome<E>,
}

impl<R, E> CompensationEntry<R, E> {
    #[must_use]
    pub fn is_compensated(&self) -> bool {
        matches!(self.outcome, CompensationOutcome::Compensated)
    }

    #[must_use]
    pub fn error(&self) -> Option<&E> {
        match &self.outcome {
            CompensationOutcome::Compensated => None,
            CompensationOutcome::Failed(e) => Some(e),
        }
    }
}

/// What a compensation pass did, in the order it did it.
#[derive(Debug)]
pub struct CompensationReport<R, E> {
    entries: Vec<CompensationEntry<R, E>>,
}

impl<R, E> Default for CompensationReport<R, E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R, E> FromIterator<CompensationEntry<R, E>> for CompensationReport<R, E> {
    fn from_iter<I: IntoIterator<Item = CompensationEntry<R, E>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<R, E> CompensationReport<R, E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: CompensationEntry<R, E>) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[CompensationEntry<R, E>] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when every recorded resource was undone.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(CompensationEntry::is_compensated)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CompensationEntry<R, E>> {
        self.entries.iter().filter(|e| !e.is_compensated())
    }
}

impl<R, E: Display> CompensationReport<R, E> {
    /// One line per entry, marked `✓` when undone and `✗` when not.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return "nothing to compensate".to_string();
        }

        let mut lines = Vec::new();
        for entry in &self.entries {
            match &entry.outcome {
                CompensationOutcome::Compensated => {
                    lines.push(format!("✓ {}", entry.description));
                }
                CompensationOutcome::Failed(error) => {
                    lines.push(format!("✗ {}: {error}", entry.description));
                }
            }
        }
        lines.join("\n")
    }
}
