//! Types for the Bulk API 2.0 ingest pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize an API version that may arrive as a float (62.0) or a
/// string ("62.0").
pub(crate) fn deserialize_api_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API 2.0 job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting data
    Open,
    /// Upload is complete, job is queued for processing
    UploadComplete,
    /// Job is processing
    InProgress,
    /// Job was aborted
    Aborted,
    /// Job completed successfully
    JobComplete,
    /// Job failed
    Failed,
}

impl JobState {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Aborted | JobState::JobComplete | JobState::Failed
        )
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::JobComplete)
    }
}

/// Record-level operation for an ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestOperation {
    /// Insert new records
    Insert,
    /// Update existing records
    Update,
    /// Upsert based on external ID
    Upsert,
    /// Delete records (soft delete)
    Delete,
}

impl IngestOperation {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            IngestOperation::Insert => "insert",
            IngestOperation::Update => "update",
            IngestOperation::Upsert => "upsert",
            IngestOperation::Delete => "delete",
        }
    }
}

/// Line ending style for uploaded CSV data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    /// Unix-style (LF)
    #[default]
    #[serde(rename = "LF")]
    Lf,
    /// Windows-style (CRLF)
    #[serde(rename = "CRLF")]
    Crlf,
}

impl LineEnding {
    pub fn api_name(&self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::Crlf => "CRLF",
        }
    }
}

/// Request to create an ingest job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    /// SObject API name
    pub object: String,
    /// Operation type
    pub operation: String,
    /// External ID field for upsert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    /// Content type; only CSV is supported by the platform
    pub content_type: String,
    /// Line ending
    pub line_ending: String,
}

impl CreateIngestJobRequest {
    pub fn new(sobject: impl Into<String>, operation: IngestOperation) -> Self {
        Self {
            object: sobject.into(),
            operation: operation.api_name().to_string(),
            external_id_field_name: None,
            content_type: "CSV".to_string(),
            line_ending: LineEnding::default().api_name().to_string(),
        }
    }

    /// Set the external ID field for upsert operations.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    /// Set the line ending of the CSV data to be uploaded.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending.api_name().to_string();
        self
    }
}

/// Request to move a job to a new state.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateJobStateRequest {
    pub state: String,
}

impl UpdateJobStateRequest {
    /// Mark a job's upload as complete so processing can start.
    pub fn upload_complete() -> Self {
        Self {
            state: "UploadComplete".to_string(),
        }
    }

    /// Abort a job.
    pub fn abort() -> Self {
        Self {
            state: "Aborted".to_string(),
        }
    }
}

/// Ingest job as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJob {
    /// Job ID
    pub id: String,
    /// Current state
    pub state: JobState,
    /// SObject API name
    pub object: String,
    /// Operation type
    pub operation: String,
    /// Number of records processed
    #[serde(default)]
    pub number_records_processed: i64,
    /// Number of records failed
    #[serde(default)]
    pub number_records_failed: i64,
    /// Job creation time
    #[serde(default)]
    pub created_date: Option<String>,
    /// Last modification time
    #[serde(default)]
    pub system_modstamp: Option<String>,
    /// Total processing time in milliseconds
    #[serde(default)]
    pub total_processing_time: Option<i64>,
    /// API version (can be float like 62.0 or string like "62.0")
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    /// Error message if failed
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result of a completed ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestJobResult {
    /// The job in its terminal state
    pub job: IngestJob,
    /// Failed records CSV, fetched when any records failed
    pub failed_results: Option<String>,
}

impl IngestJobResult {
    /// Check if the job succeeded.
    pub fn is_success(&self) -> bool {
        self.job.state.is_success()
    }

    /// Check if any records failed.
    pub fn has_failures(&self) -> bool {
        self.job.number_records_failed > 0
    }

    /// Fraction of records that processed successfully.
    pub fn success_rate(&self) -> f64 {
        let total = self.job.number_records_processed + self.job.number_records_failed;
        if total == 0 {
            return 1.0;
        }
        self.job.number_records_processed as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Open.is_terminal());
        assert!(!JobState::UploadComplete.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
        assert!(JobState::JobComplete.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Aborted.is_terminal());
    }

    #[test]
    fn test_create_ingest_job_request_defaults() {
        let request = CreateIngestJobRequest::new("Account", IngestOperation::Insert);
        assert_eq!(request.object, "Account");
        assert_eq!(request.operation, "insert");
        assert_eq!(request.content_type, "CSV");
        assert_eq!(request.line_ending, "LF");
        assert!(request.external_id_field_name.is_none());
    }

    #[test]
    fn test_upsert_request_carries_external_id() {
        let request = CreateIngestJobRequest::new("Contact", IngestOperation::Upsert)
            .with_external_id_field("External_Key__c");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["operation"], "upsert");
        assert_eq!(json["externalIdFieldName"], "External_Key__c");
    }

    #[test]
    fn test_ingest_job_api_version_float_or_string() {
        let from_float: IngestJob = serde_json::from_value(serde_json::json!({
            "id": "750A", "state": "Open", "object": "Account",
            "operation": "insert", "apiVersion": 62.0
        }))
        .unwrap();
        assert_eq!(from_float.api_version.as_deref(), Some("62.0"));

        let from_string: IngestJob = serde_json::from_value(serde_json::json!({
            "id": "750B", "state": "Open", "object": "Account",
            "operation": "insert", "apiVersion": "62.0"
        }))
        .unwrap();
        assert_eq!(from_string.api_version.as_deref(), Some("62.0"));
    }

    #[test]
    fn test_success_rate() {
        let job: IngestJob = serde_json::from_value(serde_json::json!({
            "id": "750C", "state": "JobComplete", "object": "Account",
            "operation": "insert",
            "numberRecordsProcessed": 8, "numberRecordsFailed": 2
        }))
        .unwrap();
        let result = IngestJobResult {
            job,
            failed_results: None,
        };
        assert!(result.has_failures());
        assert!((result.success_rate() - 0.8).abs() < f64::EPSILON);
    }
}
