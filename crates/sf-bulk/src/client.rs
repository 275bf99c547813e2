//! Bulk API 2.0 ingest client.
//!
//! Drives the ingest pipeline: create a job, upload CSV data, close
//! the job, poll until it reaches a terminal state, and fetch failed
//! records.

use std::time::Duration;
use tokio::time::sleep;
use tracing::instrument;

use forcebridge_sf_client::{ClientConfig, Connection};

use crate::error::{Error, ErrorKind, Result};
use crate::types::*;

/// Default polling interval for job status checks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum wait time for job completion.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// Salesforce Bulk API 2.0 ingest client.
///
/// # Example
///
/// ```rust,ignore
/// use forcebridge_sf_bulk::{BulkClient, IngestOperation};
///
/// let client = BulkClient::new(
///     "https://myorg.my.salesforce.com",
///     "access_token_here",
/// )?;
///
/// let csv_data = "Name\nTest Account 1\nTest Account 2";
/// let result = client
///     .execute_ingest("Account", IngestOperation::Insert, csv_data, None)
///     .await?;
/// ```
#[derive(Debug)]
pub struct BulkClient {
    conn: Connection,
    poll_interval: Duration,
    max_wait: Duration,
}

impl BulkClient {
    /// Create a new bulk client.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let conn = Connection::new(instance_url, access_token)?;
        Ok(Self::from_connection(conn))
    }

    /// Create a bulk client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let conn = Connection::with_config(instance_url, access_token, config)?;
        Ok(Self::from_connection(conn))
    }

    /// Create a bulk client from an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Set the polling interval for job status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum wait time for job completion.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    // =========================================================================
    // Job operations
    // =========================================================================

    /// Create a new ingest job.
    #[instrument(skip(self, request))]
    pub async fn create_ingest_job(&self, request: CreateIngestJobRequest) -> Result<IngestJob> {
        let url = self.conn.bulk_url("ingest");
        let job: IngestJob = self.conn.post_json(&url, &request).await?;
        Ok(job)
    }

    /// Upload CSV data to an open ingest job.
    #[instrument(skip(self, csv_data))]
    pub async fn upload_job_data(&self, job_id: &str, csv_data: &str) -> Result<()> {
        let url = format!("{}/{}/batches", self.conn.bulk_url("ingest"), job_id);

        let request = self.conn.put(&url).csv(csv_data);
        let response = self.conn.execute(request).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::Upload(format!(
                "Failed to upload job data: status {}",
                response.status()
            ))));
        }

        Ok(())
    }

    /// Close an ingest job (mark as UploadComplete) so processing can
    /// start.
    #[instrument(skip(self))]
    pub async fn close_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.set_job_state(job_id, UpdateJobStateRequest::upload_complete())
            .await
    }

    /// Abort an ingest job.
    #[instrument(skip(self))]
    pub async fn abort_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.set_job_state(job_id, UpdateJobStateRequest::abort())
            .await
    }

    async fn set_job_state(&self, job_id: &str, request: UpdateJobStateRequest) -> Result<IngestJob> {
        let url = format!("{}/{}", self.conn.bulk_url("ingest"), job_id);

        let req = self.conn.patch(&url).json(&request)?;
        let response = self.conn.execute(req).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::Api(format!(
                "Failed to move job to {}: status {}",
                request.state,
                response.status()
            ))));
        }

        let job: IngestJob = response.json().await?;
        Ok(job)
    }

    /// Get the current state of an ingest job.
    #[instrument(skip(self))]
    pub async fn get_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        let url = format!("{}/{}", self.conn.bulk_url("ingest"), job_id);
        let job: IngestJob = self.conn.get_json(&url).await?;
        Ok(job)
    }

    /// Wait for an ingest job to reach a terminal state.
    #[instrument(skip(self))]
    pub async fn wait_for_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        let start = std::time::Instant::now();

        loop {
            let job = self.get_ingest_job(job_id).await?;

            if job.state.is_terminal() {
                return Ok(job);
            }

            if start.elapsed() > self.max_wait {
                return Err(Error::new(ErrorKind::Timeout(format!(
                    "Job {} did not complete within {:?}",
                    job_id, self.max_wait
                ))));
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Get failed records from an ingest job (CSV format).
    #[instrument(skip(self))]
    pub async fn get_failed_results(&self, job_id: &str) -> Result<String> {
        self.get_results_csv(job_id, "failedResults").await
    }

    /// Get successfully processed records from an ingest job (CSV
    /// format).
    #[instrument(skip(self))]
    pub async fn get_successful_results(&self, job_id: &str) -> Result<String> {
        self.get_results_csv(job_id, "successfulResults").await
    }

    async fn get_results_csv(&self, job_id: &str, resource: &str) -> Result<String> {
        let url = format!("{}/{}/{}", self.conn.bulk_url("ingest"), job_id, resource);

        let request = self.conn.get(&url).header("Accept", "text/csv");
        let response = self.conn.execute(request).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::Api(format!(
                "Failed to get {}: status {}",
                resource,
                response.status()
            ))));
        }

        response.text().await.map_err(Into::into)
    }

    /// Delete a terminal ingest job.
    #[instrument(skip(self))]
    pub async fn delete_ingest_job(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.conn.bulk_url("ingest"), job_id);

        let request = self.conn.delete(&url);
        let response = self.conn.execute(request).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::Api(format!(
                "Failed to delete ingest job: status {}",
                response.status()
            ))));
        }

        Ok(())
    }

    // =========================================================================
    // High-level pipeline
    // =========================================================================

    /// Execute a complete ingest operation.
    ///
    /// Validates the CSV locally, then creates the job, uploads the
    /// data, closes the job, waits for a terminal state, and fetches
    /// failed records when any records failed.
    #[instrument(skip(self, csv_data))]
    pub async fn execute_ingest(
        &self,
        sobject: &str,
        operation: IngestOperation,
        csv_data: &str,
        external_id_field: Option<&str>,
    ) -> Result<IngestJobResult> {
        let record_count = validate_csv(csv_data)?;
        tracing::debug!(sobject, records = record_count, "starting bulk ingest");

        let mut request = CreateIngestJobRequest::new(sobject, operation);
        if let Some(ext_id) = external_id_field {
            request = request.with_external_id_field(ext_id);
        }

        let job = self.create_ingest_job(request).await?;

        self.upload_job_data(&job.id, csv_data).await?;
        self.close_ingest_job(&job.id).await?;

        let completed_job = self.wait_for_ingest_job(&job.id).await?;

        let failed_results = if completed_job.number_records_failed > 0 {
            self.get_failed_results(&job.id).await.ok()
        } else {
            None
        };

        Ok(IngestJobResult {
            job: completed_job,
            failed_results,
        })
    }
}

/// Validate CSV data before any network traffic: a header row, at
/// least one data row, and consistent column counts. Returns the
/// number of data rows.
fn validate_csv(data: &str) -> Result<usize> {
    if data.trim().is_empty() {
        return Err(Error::new(ErrorKind::Csv(
            "CSV data must not be empty".to_string(),
        )));
    }

    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }

    if count == 0 {
        return Err(Error::new(ErrorKind::Csv(
            "CSV data has a header but no data rows".to_string(),
        )));
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str) -> BulkClient {
        let config = ClientConfig::builder().without_retry().build();
        BulkClient::with_config(uri, "test-token", config)
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_wait(Duration::from_millis(500))
    }

    #[test]
    fn test_validate_csv_counts_data_rows() {
        let count = validate_csv("Name,Industry\nAcme,Tech\nGlobal,Finance").unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_validate_csv_rejects_empty_input() {
        let err = validate_csv("  \n ").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
    }

    #[test]
    fn test_validate_csv_rejects_header_only() {
        let err = validate_csv("Name,Industry\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
    }

    #[test]
    fn test_validate_csv_rejects_ragged_rows() {
        let err = validate_csv("Name,Industry\nAcme,Tech,Extra").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
    }

    #[tokio::test]
    async fn test_invalid_csv_makes_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client
            .execute_ingest("Account", IngestOperation::Insert, "", None)
            .await;

        assert!(matches!(result.unwrap_err().kind, ErrorKind::Csv(_)));
    }

    #[tokio::test]
    async fn test_execute_ingest_full_pipeline() {
        let server = MockServer::start().await;
        let job_id = "750xx000000001AAA";

        Mock::given(method("POST"))
            .and(path("/services/data/v59.0/jobs/ingest"))
            .and(body_string_contains("\"operation\":\"insert\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "Open",
                "object": "Account", "operation": "insert"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!(
                "/services/data/v59.0/jobs/ingest/{job_id}/batches"
            )))
            .and(header("Content-Type", "text/csv"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "UploadComplete",
                "object": "Account", "operation": "insert"
            })))
            .expect(1)
            .mount(&server)
            .await;

        // First poll sees the job processing; second sees it complete.
        let polls = Arc::new(AtomicU32::new(0));
        let polls_clone = polls.clone();
        Mock::given(method("GET"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .respond_with(move |_req: &wiremock::Request| {
                let n = polls_clone.fetch_add(1, Ordering::SeqCst);
                let state = if n == 0 { "InProgress" } else { "JobComplete" };
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": job_id, "state": state,
                    "object": "Account", "operation": "insert",
                    "numberRecordsProcessed": 2, "numberRecordsFailed": 0
                }))
            })
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client
            .execute_ingest(
                "Account",
                IngestOperation::Insert,
                "Name\nAcme Corp\nGlobal Inc",
                None,
            )
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.job.number_records_processed, 2);
        assert!(result.failed_results.is_none());
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_ingest_fetches_failed_records() {
        let server = MockServer::start().await;
        let job_id = "750xx000000002AAA";

        Mock::given(method("POST"))
            .and(path("/services/data/v59.0/jobs/ingest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "Open",
                "object": "Contact", "operation": "upsert"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!(
                "/services/data/v59.0/jobs/ingest/{job_id}/batches"
            )))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .and(body_string_contains("UploadComplete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "UploadComplete",
                "object": "Contact", "operation": "upsert"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "JobComplete",
                "object": "Contact", "operation": "upsert",
                "numberRecordsProcessed": 1, "numberRecordsFailed": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!(
                "/services/data/v59.0/jobs/ingest/{job_id}/failedResults"
            )))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("sf__Error,Email\nREQUIRED_FIELD_MISSING,bad@example.com"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let result = client
            .execute_ingest(
                "Contact",
                IngestOperation::Upsert,
                "Email\ngood@example.com\nbad@example.com",
                Some("Email"),
            )
            .await
            .unwrap();

        assert!(result.has_failures());
        assert!(result
            .failed_results
            .unwrap()
            .contains("REQUIRED_FIELD_MISSING"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_an_upload_error() {
        let server = MockServer::start().await;
        let job_id = "750xx000000003AAA";

        Mock::given(method("PUT"))
            .and(path(format!(
                "/services/data/v59.0/jobs/ingest/{job_id}/batches"
            )))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .upload_job_data(job_id, "Name\nAcme")
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Upload(_)));
    }

    #[tokio::test]
    async fn test_wait_times_out_on_stuck_job() {
        let server = MockServer::start().await;
        let job_id = "750xx000000004AAA";

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "InProgress",
                "object": "Account", "operation": "insert"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server.uri()).with_max_wait(Duration::from_millis(50));
        let err = client.wait_for_ingest_job(job_id).await.unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Timeout(_)));
    }

    #[tokio::test]
    async fn test_abort_moves_job_to_aborted() {
        let server = MockServer::start().await;
        let job_id = "750xx000000005AAA";

        Mock::given(method("PATCH"))
            .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
            .and(body_string_contains("Aborted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": job_id, "state": "Aborted",
                "object": "Account", "operation": "insert"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let job = client.abort_ingest_job(job_id).await.unwrap();

        assert_eq!(job.state, JobState::Aborted);
    }
}
