use reqwest::multipart::{Form, Part};
use std::time::SystemTime;

use crate::deploy::{DeployJob, DeployOptions};
use crate::error::{Error, ErrorKind, Result};
use crate::package::DeployRequest;

impl super::MetadataClient {
    /// Submit an assembled package to the deploy endpoint.
    ///
    /// Submits are never retried: a deploy is not idempotent, and a
    /// retry after an ambiguous failure could start the same deploy
    /// twice.
    pub async fn submit(&self, zip_bytes: Vec<u8>, options: DeployOptions) -> Result<DeployJob> {
        let entity_content = serde_json::json!({
            "deployOptions": {
                "checkOnly": options.check_only,
                "testLevel": "NoTestRun",
                "singlePackage": true,
                "rollbackOnError": true,
            }
        });

        let form = Form::new()
            .part(
                "entity_content",
                Part::text(entity_content.to_string()).mime_str("application/json")?,
            )
            .part(
                "file",
                Part::bytes(zip_bytes)
                    .file_name("deploymentPackage.zip")
                    .mime_str("application/zip")?,
            );

        let response = self
            .http_client
            .post(self.deploy_url(None))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::new(ErrorKind::SubmitFailure {
                status: status.as_u16(),
                body,
            }));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Error::with_source(ErrorKind::MalformedSubmitResponse(body.clone()), e))?;

        let job_id = parsed
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| Error::new(ErrorKind::MalformedSubmitResponse(body.clone())))?;

        tracing::info!(job_id, check_only = options.check_only, "deploy submitted");

        Ok(DeployJob {
            job_id: job_id.to_string(),
            submitted_at: SystemTime::now(),
        })
    }

    /// Assemble a deploy request and submit the resulting archive.
    pub async fn submit_request(&self, request: &DeployRequest) -> Result<DeployJob> {
        let zip_bytes = request.assemble()?;
        self.submit(
            zip_bytes,
            DeployOptions {
                check_only: request.check_only,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetadataClient;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_submit_returns_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/v59.0/metadata/deployRequest"))
            .and(header("authorization", "Bearer token123"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": "0Af000000000001AAA"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let job = client
            .submit(b"PK\x03\x04fake".to_vec(), DeployOptions::default())
            .await
            .unwrap();
        assert_eq!(job.job_id, "0Af000000000001AAA");
    }

    #[tokio::test]
    async fn test_submit_without_id_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"ok": true})),
            )
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let err = client
            .submit(Vec::new(), DeployOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedSubmitResponse(_)));
    }

    #[tokio::test]
    async fn test_submit_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad package"))
            .expect(1)
            .mount(&server)
            .await;

        let client = MetadataClient::from_parts(server.uri(), "token123");
        let err = client
            .submit(Vec::new(), DeployOptions::default())
            .await
            .unwrap_err();
        match err.kind {
            ErrorKind::SubmitFailure { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad package");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }
}
