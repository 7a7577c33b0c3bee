//! The final result of a cascade run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::outcome::Outcome;

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Certificate name.
    pub name: String,
    /// Terminal outcome.
    pub outcome: Outcome,
    /// Human-readable context for failures (error message, rejected edge).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportEntry {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.outcome)
    }
}

/// Aggregate counts over all entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl OutcomeCounts {
    /// Count one more outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::SkippedParentFailed => self.skipped += 1,
            Outcome::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.cancelled
    }
}

impl fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded: {}, failed: {}, skipped: {}, cancelled: {}",
            self.succeeded, self.failed, self.skipped, self.cancelled
        )
    }
}

/// Overall command status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Success,
    Failure,
}

impl CommandStatus {
    /// Process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::Failure => 1,
        }
    }
}

/// Ordered outcomes of one cascade run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the root CA the cascade started from.
    pub root: String,
    /// Entries in discovery order.
    pub entries: Vec<ReportEntry>,
    pub counts: OutcomeCounts,
    pub status: CommandStatus,
}

impl Report {
    /// Build a report from entries already in discovery order.
    ///
    /// Status is `Success` only if every entry succeeded.
    pub fn from_entries(root: impl Into<String>, entries: Vec<ReportEntry>) -> Self {
        let mut counts = OutcomeCounts::default();
        for entry in &entries {
            counts.record(&entry.outcome);
        }

        let status = if !entries.is_empty() && counts.succeeded == entries.len() {
            CommandStatus::Success
        } else {
            CommandStatus::Failure
        };

        Self {
            root: root.into(),
            entries,
            counts,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// Find the outcome recorded for a certificate name (first match).
    pub fn outcome_of(&self, name: &str) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.outcome)
    }

    /// The `<name>: <outcome>` lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        write!(f, "{}", self.counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::FailureReason;

    #[test]
    fn test_all_succeeded_is_success() {
        let report = Report::from_entries(
            "ca",
            vec![
                ReportEntry::new("ca", Outcome::Succeeded),
                ReportEntry::new("leaf", Outcome::Succeeded),
            ],
        );
        assert!(report.is_success());
        assert_eq!(report.counts.succeeded, 2);
        assert_eq!(report.status.exit_code(), 0);
    }

    #[test]
    fn test_any_non_success_is_failure() {
        let report = Report::from_entries(
            "ca",
            vec![
                ReportEntry::new("ca", Outcome::Succeeded),
                ReportEntry::new("mid", Outcome::Failed(FailureReason::NetworkError)),
                ReportEntry::new("leaf", Outcome::SkippedParentFailed),
                ReportEntry::new("other", Outcome::Cancelled),
            ],
        );
        assert_eq!(report.status, CommandStatus::Failure);
        assert_ne!(report.status.exit_code(), 0);
        assert_eq!(
            report.counts,
            OutcomeCounts {
                succeeded: 1,
                failed: 1,
                skipped: 1,
                cancelled: 1,
            }
        );
        assert_eq!(report.counts.total(), 4);
    }

    #[test]
    fn test_rendering() {
        let report = Report::from_entries(
            "ca",
            vec![
                ReportEntry::new("ca", Outcome::Succeeded),
                ReportEntry::new("leaf1", Outcome::Failed(FailureReason::NotFound))
                    .with_detail("credential not found: leaf1"),
            ],
        );
        assert_eq!(
            report.lines(),
            vec!["ca: Succeeded".to_string(), "leaf1: Failed(NotFound)".to_string()]
        );
        assert_eq!(
            report.to_string(),
            "ca: Succeeded\nleaf1: Failed(NotFound)\nsucceeded: 1, failed: 1, skipped: 0, cancelled: 0"
        );
    }

    #[test]
    fn test_json_shape() {
        let report = Report::from_entries(
            "ca",
            vec![ReportEntry::new("ca", Outcome::Failed(FailureReason::Timeout))],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["name"], "ca");
        assert_eq!(json["entries"][0]["outcome"]["Failed"], "Timeout");
        assert_eq!(json["status"], "Failure");
        assert!(json["entries"][0].get("detail").is_none());
    }
}
