use snapshift_operations::operations::{MigrationFailure, MigrationOutput};

pub(crate) trait OutputFormatter {
    fn format_success(&self, output: &MigrationOutput) -> String;
    fn format_failure(&self, failure: &MigrationFailure) -> String;
}
