//! Deploy job lifecycle types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Options sent with a deploy submit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Validate only: the deploy is checked but not committed.
    pub check_only: bool,
}

/// Handle returned by a successful submit.
#[derive(Debug, Clone)]
pub struct DeployJob {
    pub job_id: String,
    pub submitted_at: SystemTime,
}

/// Lifecycle state of a deploy job.
///
/// `Timeout` is local only: the platform keeps running the job, we just
/// stopped waiting. `Aborted` maps from the platform's "Canceled";
/// "Canceling" is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    Pending,
    InProgress,
    Succeeded,
    SucceededPartial,
    Failed,
    Canceling,
    Aborted,
    Timeout,
}

impl DeployStatus {
    /// Map a platform status string to a lifecycle state.
    ///
    /// Unknown labels are treated as still in progress so the poller
    /// keeps asking rather than failing on a new platform status.
    pub fn from_api(status: &str) -> Self {
        match status {
            "Pending" => DeployStatus::Pending,
            "InProgress" => DeployStatus::InProgress,
            "Succeeded" => DeployStatus::Succeeded,
            "SucceededPartial" => DeployStatus::SucceededPartial,
            "Failed" => DeployStatus::Failed,
            "Canceling" => DeployStatus::Canceling,
            "Canceled" => DeployStatus::Aborted,
            _ => DeployStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeployStatus::Succeeded
                | DeployStatus::SucceededPartial
                | DeployStatus::Failed
                | DeployStatus::Aborted
                | DeployStatus::Timeout
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeployStatus::Succeeded | DeployStatus::SucceededPartial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStatus::Pending => "Pending",
            DeployStatus::InProgress => "InProgress",
            DeployStatus::Succeeded => "Succeeded",
            DeployStatus::SucceededPartial => "SucceededPartial",
            DeployStatus::Failed => "Failed",
            DeployStatus::Canceling => "Canceling",
            DeployStatus::Aborted => "Aborted",
            DeployStatus::Timeout => "Timeout",
        }
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a deploy, as seen by the caller.
///
/// A deploy that reached a terminal state is an `Ok` outcome even when
/// the platform reports failure; errors are reserved for the pipeline
/// itself breaking.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub job_id: String,
    pub status: DeployStatus,
    pub success: bool,
    /// Component-level details as returned by the platform, when the
    /// status endpoint included them.
    pub details: Option<serde_json::Value>,
}

impl DeployOutcome {
    pub fn new(job_id: impl Into<String>, status: DeployStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            success: status.is_success(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DeployStatus::from_api("Succeeded"), DeployStatus::Succeeded);
        assert_eq!(DeployStatus::from_api("Canceled"), DeployStatus::Aborted);
        assert_eq!(DeployStatus::from_api("Canceling"), DeployStatus::Canceling);
        assert_eq!(
            DeployStatus::from_api("SomethingNew"),
            DeployStatus::InProgress
        );
    }

    #[test]
    fn test_terminal_and_success_sets() {
        assert!(DeployStatus::Succeeded.is_terminal());
        assert!(DeployStatus::SucceededPartial.is_terminal());
        assert!(DeployStatus::Failed.is_terminal());
        assert!(DeployStatus::Aborted.is_terminal());
        assert!(DeployStatus::Timeout.is_terminal());
        assert!(!DeployStatus::Pending.is_terminal());
        assert!(!DeployStatus::InProgress.is_terminal());
        assert!(!DeployStatus::Canceling.is_terminal());

        assert!(DeployStatus::Succeeded.is_success());
        assert!(DeployStatus::SucceededPartial.is_success());
        assert!(!DeployStatus::Failed.is_success());
        assert!(!DeployStatus::Timeout.is_success());
    }

    #[test]
    fn test_outcome_success_follows_status() {
        let outcome = DeployOutcome::new("0Af000000000001", DeployStatus::SucceededPartial);
        assert!(outcome.success);
        let outcome = DeployOutcome::new("0Af000000000001", DeployStatus::Timeout);
        assert!(!outcome.success);
    }
}
