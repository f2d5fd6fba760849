//! CLI output formatting.
//!
//! One progress entry per record, printed as it completes, followed by a
//! tally once the batch is done:
//!
//! ```text
//! [1/3] uploads/albums/dawn.jpg
//!     → thumbs/thumb-albums/dawn.jpg (300x200, 18432 bytes)
//!     Source: jpeg 3000x2000
//! [2/3] uploads/thumb-dawn.jpg
//!     skipped: already a thumbnail
//! [3/3] uploads/missing.jpg
//!     failed: cannot read uploads/missing.jpg: object not found: uploads/missing.jpg
//!
//! Derived 1, skipped 1, failed 1
//! ```
//!
//! Records complete in any order when the batch runs in parallel, so the
//! bracketed position is the record's place in the notification, not the
//! print order.
//!
//! # Architecture
//!
//! Each entity has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::classify::Decision;
use crate::dispatch::{InvocationResult, RecordEvent, RecordStatus};
use crate::storage::ObjectLocator;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a 1-based batch position as `[n/total]`.
fn position(index: usize, total: usize) -> String {
    format!("[{}/{}]", index + 1, total)
}

// ============================================================================
// Per-record progress
// ============================================================================

pub fn format_record_event(event: &RecordEvent) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        position(event.index, event.total),
        event.locator
    )];

    match &event.status {
        RecordStatus::Derived(summary) => {
            lines.push(format!(
                "{}→ {} ({}x{}, {} bytes)",
                indent(1),
                summary.derived,
                summary.width,
                summary.height,
                summary.bytes
            ));
            lines.push(format!(
                "{}Source: {} {}x{}",
                indent(1),
                summary.source_format,
                summary.source_width,
                summary.source_height
            ));
        }
        RecordStatus::Skipped(reason) => {
            lines.push(format!("{}skipped: {}", indent(1), reason));
        }
        RecordStatus::Failed(error) => {
            lines.push(format!("{}failed: {}", indent(1), error));
        }
    }
    lines
}

pub fn print_record_event(event: &RecordEvent) {
    for line in format_record_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Running count of record outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub derived: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchTally {
    pub fn record(&mut self, status: &RecordStatus) {
        match status {
            RecordStatus::Derived(_) => self.derived += 1,
            RecordStatus::Skipped(_) => self.skipped += 1,
            RecordStatus::Failed(_) => self.failed += 1,
        }
    }
}

pub fn format_tally(tally: &BatchTally) -> String {
    format!(
        "Derived {}, skipped {}, failed {}",
        tally.derived, tally.skipped, tally.failed
    )
}

/// The result as the invoking platform receives it, pretty-printed.
pub fn format_invocation_result(result: &InvocationResult) -> Vec<String> {
    match serde_json::to_string_pretty(result) {
        Ok(json) => json.lines().map(str::to_string).collect(),
        Err(_) => vec![format!(
            "{{\"statusCode\": {}, \"body\": {:?}}}",
            result.status_code, result.body
        )],
    }
}

pub fn print_invocation_result(result: &InvocationResult) {
    for line in format_invocation_result(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Classification
// ============================================================================

pub fn format_decision(source: &ObjectLocator, decision: &Decision) -> Vec<String> {
    let mut lines = vec![source.to_string()];
    match decision {
        Decision::Process { derived } => {
            lines.push(format!("{}process → {}", indent(1), derived));
        }
        Decision::Skip(reason) => {
            lines.push(format!("{}skip: {}", indent(1), reason));
        }
    }
    lines
}

pub fn print_decision(source: &ObjectLocator, decision: &Decision) {
    for line in format_decision(source, decision) {
        println!("{}", line);
    }
}
