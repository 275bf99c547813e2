use std::time::Duration;

use tokio::time::sleep;

use crate::deploy::{DeployOutcome, DeployStatus};
use crate::error::{Error, ErrorKind, Result};
use crate::package::DeployRequest;

/// One observation of a deploy job's state.
#[derive(Debug, Clone)]
pub struct DeployStatusReport {
    pub job_id: String,
    pub done: bool,
    pub status: DeployStatus,
    /// Platform's raw status label, kept for display alongside the
    /// mapped lifecycle state.
    pub raw_status: String,
    pub details: Option<serde_json::Value>,
}

impl super::MetadataClient {
    /// Fetch the current state of a deploy job, including component
    /// details.
    pub async fn check_status(&self, job_id: &str) -> Result<DeployStatusReport> {
        let response = self
            .http_client
            .get(self.deploy_url(Some(job_id)))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .query(&[("includeDetails", "true")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::new(ErrorKind::Http(format!(
                "status check failed with HTTP {}: {body}",
                status.as_u16()
            ))));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)?;
        let deploy_result = parsed.get("deployResult").ok_or_else(|| {
            Error::new(ErrorKind::MalformedSubmitResponse(
                "status response has no deployResult".to_string(),
            ))
        })?;

        let done = deploy_result
            .get("done")
            .and_then(|d| d.as_bool())
            .unwrap_or(false);
        let raw_status = deploy_result
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("InProgress")
            .to_string();

        Ok(DeployStatusReport {
            job_id: job_id.to_string(),
            done,
            status: DeployStatus::from_api(&raw_status),
            raw_status,
            details: deploy_result.get("details").cloned(),
        })
    }

    /// Poll a deploy job until it reaches a terminal state or the local
    /// timeout elapses.
    ///
    /// Timing out is an `Ok` outcome with [`DeployStatus::Timeout`]; the
    /// platform keeps running the job, and `check_status` can observe it
    /// later. Errors are reserved for the polling itself failing.
    pub async fn poll(
        &self,
        job_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<DeployOutcome> {
        let start = tokio::time::Instant::now();

        loop {
            let report = self.check_status(job_id).await?;

            if report.done {
                tracing::info!(job_id, status = %report.status, "deploy finished");
                return Ok(
                    DeployOutcome::new(job_id, report.status).with_details(report.details)
                );
            }

            if start.elapsed() >= timeout {
                tracing::warn!(job_id, timeout_secs = timeout.as_secs(), "deploy poll timed out");
                return Ok(
                    DeployOutcome::new(job_id, DeployStatus::Timeout).with_details(report.details)
                );
            }

            sleep(poll_interval).await;
        }
    }

    /// Assemble, submit, and wait for a deploy request.
    pub async fn deploy_and_wait(
        &self,
        request: &DeployRequest,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<DeployOutcome> {
        let job = self.submit_request(request).await?;
        self.poll(&job.job_id, timeout, poll_interval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetadataClient;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn status_body(done: bool, status: &str) -> serde_json::Value {
        serde_json::json!({
            "deployResult": {
                "done": done,
                "status": status,
                "details": {"componentFailures": []}
            }
        })
    }

    #[tokio::test]
    async fn test_check_status_maps_platform_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/services/data/v59.0/metadata/deployRequest/0Af000000000001",
            ))
            .and(query_param("includeDetails", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true, "Canceled")))
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let report = client.check_status("0Af000000000001").await.unwrap();
        assert!(report.done);
        assert_eq!(report.status, DeployStatus::Aborted);
        assert_eq!(report.raw_status, "Canceled");
    }

    #[tokio::test]
    async fn test_poll_until_terminal() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        Mock::given(method("GET"))
            .respond_with(move |_req: &Request| {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    ResponseTemplate::new(200).set_body_json(status_body(false, "InProgress"))
                } else {
                    ResponseTemplate::new(200).set_body_json(status_body(true, "Succeeded"))
                }
            })
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let outcome = client
            .poll(
                "0Af000000000001",
                Duration::from_secs(10),
                Duration::from_millis(10),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, DeployStatus::Succeeded);
        assert!(outcome.success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_timeout_is_ok_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(status_body(false, "InProgress")),
            )
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let outcome = client
            .poll(
                "0Af000000000001",
                Duration::from_millis(30),
                Duration::from_millis(10),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, DeployStatus::Timeout);
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_poll_canceling_keeps_waiting() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        Mock::given(method("GET"))
            .respond_with(move |_req: &Request| {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    ResponseTemplate::new(200).set_body_json(status_body(false, "Canceling"))
                } else {
                    ResponseTemplate::new(200).set_body_json(status_body(true, "Canceled"))
                }
            })
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let outcome = client
            .poll(
                "0Af000000000001",
                Duration::from_secs(10),
                Duration::from_millis(10),
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, DeployStatus::Aborted);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
