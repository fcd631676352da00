use snapshift_operations::operations::{MigrationFailure, MigrationOutput};

use super::OutputFormatter;

pub(crate) struct PlainTextFormatter;

impl PlainTextFormatter {
    fn push_field(output: &mut String, label: &str, value: &str) {
        output.push_str(&format!("  {label:<22}{value}\n"));
    }
}

impl OutputFormatter for PlainTextFormatter {
    fn format_success(&self, result: &MigrationOutput) -> String {
        let mut output = String::from("✓ Successfully completed snapshot migration!\n\n");
        Self::push_field(
            &mut output,
            "Origin snapshot:",
            &result.origin_snapshot.to_string(),
        );
        Self::push_field(
            &mut output,
            "Destination snapshot:",
            &result.destination_snapshot.to_string(),
        );
        Self::push_field(&mut output, "Snapshot content:", &result.destination_content);
        Self::push_field(&mut output, "Snapshot handle:", result.handle.as_str());
        if let Some(size) = &result.restore_size {
            Self::push_field(&mut output, "Restore size:", size);
        }
        if let Some(claim) = &result.destination_claim {
            Self::push_field(&mut output, "Destination PVC:", &claim.to_string());
        }
        output
    }

    fn format_failure(&self, failure: &MigrationFailure) -> String {
        let mut output = format!("Compensation after '{}':\n", failure.failed_step);
        for line in failure.compensation.summary().lines() {
            output.push_str(&format!("  {line}\n"));
        }
        if let Some(partial) = failure.partial_compensation() {
            output.push_str(&format!("\nwarning: {partial}\n"));
        }
        output
    }
}
