//! Cross-crate integration tests driving the public `forcebridge`
//! surface against a mock org.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forcebridge::client::{retry_with_backoff, ClientConfig, RetryConfig};
use forcebridge::{BulkClient, Connection, OrgOps};

fn connection_for(uri: &str) -> Connection {
    let config = ClientConfig::builder().without_retry().build();
    Connection::with_config(uri, "test-token", config).unwrap()
}

fn ops_for(uri: &str) -> OrgOps {
    OrgOps::new(connection_for(uri))
        .with_deploy_timeout(Duration::from_millis(500))
        .with_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn create_apex_class_then_fetch_it_back() {
    let server = MockServer::start().await;

    // The create-side guard queries Id/ApiVersion and must see nothing;
    // the later fetch queries Body and must see the deployed class.
    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/tooling/query"))
        .respond_with(move |req: &wiremock::Request| {
            let q = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "q")
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            if q.contains("Body") {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "totalSize": 1, "done": true,
                    "records": [{
                        "attributes": {"type": "ApexClass"},
                        "Id": "01p000000000001",
                        "Name": "InvoiceService",
                        "Body": "public class InvoiceService {}",
                        "ApiVersion": 59.0,
                        "Status": "Active"
                    }]
                }))
            } else {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "totalSize": 0, "done": true, "records": []
                }))
            }
        })
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/data/v59.0/metadata/deployRequest"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "0Af1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/metadata/deployRequest/0Af1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployResult": {"done": true, "status": "Succeeded"}
        })))
        .mount(&server)
        .await;

    let ops = ops_for(&server.uri());

    let created = ops
        .create_apex_class("InvoiceService", "public class InvoiceService {}", None)
        .await;
    assert!(created.success, "create failed: {:?}", created.error);
    assert_eq!(created.job_id.as_deref(), Some("0Af1"));
    assert_eq!(created.status.as_deref(), Some("Succeeded"));

    let fetched = ops.fetch_apex_class("InvoiceService").await;
    assert!(fetched.success);
    let data = fetched.data.unwrap();
    assert_eq!(data["Name"], "InvoiceService");
    // Bookkeeping fields are stripped from fetched records.
    assert!(data.get("attributes").is_none());
}

#[tokio::test]
async fn upsert_dispatch_falls_back_to_create_when_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/tooling/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalSize": 0, "done": true, "records": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/data/v59.0/metadata/deployRequest"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "0Af2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/metadata/deployRequest/0Af2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployResult": {"done": true, "status": "Succeeded"}
        })))
        .mount(&server)
        .await;

    let ops = ops_for(&server.uri());
    let response = ops
        .deploy_metadata(
            "apex",
            "Ping",
            r#"{"body": "public class Ping {}"}"#,
            forcebridge::ops::Operation::Upsert,
        )
        .await;

    assert!(response.success, "upsert failed: {:?}", response.error);
    assert_eq!(response.operation.as_deref(), Some("create_apex_class"));
}

#[tokio::test]
async fn deploy_timeout_then_status_check_finds_job_still_running() {
    let server = MockServer::start().await;
    let job_id = "0Af5e000001abcdEAA";

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/tooling/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalSize": 0, "done": true, "records": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/data/v59.0/metadata/deployRequest"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": job_id})),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The job never finishes within the local deadline.
    Mock::given(method("GET"))
        .and(path(format!(
            "/services/data/v59.0/metadata/deployRequest/{job_id}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deployResult": {"done": false, "status": "InProgress"}
        })))
        .mount(&server)
        .await;

    let ops = ops_for(&server.uri()).with_deploy_timeout(Duration::from_millis(50));

    let created = ops
        .create_apex_class("SlowClass", "public class SlowClass {}", None)
        .await;
    assert!(!created.success);
    assert_eq!(created.status.as_deref(), Some("Timeout"));
    assert!(created.hint.unwrap().contains("get_deploy_status"));

    let status = ops.get_deploy_status(job_id).await;
    assert!(status.success);
    assert_eq!(status.status.as_deref(), Some("InProgress"));
    assert_eq!(status.extra["done"], false);
}

#[tokio::test]
async fn retry_combinator_recovers_idempotent_reads() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .respond_with(move |_req: &wiremock::Request| {
            if calls_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "totalSize": 1, "done": true,
                    "records": [{"Id": "001A"}]
                }))
            }
        })
        .mount(&server)
        .await;

    let conn = connection_for(&server.uri());
    let config = RetryConfig::default()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(10));

    let result = retry_with_backoff(&config, || {
        conn.query::<serde_json::Value>("SELECT Id FROM Account LIMIT 1")
    })
    .await
    .unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn bulk_ingest_pipeline_end_to_end() {
    let server = MockServer::start().await;
    let job_id = "750xx000000010AAA";

    Mock::given(method("POST"))
        .and(path("/services/data/v59.0/jobs/ingest"))
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
    Mock::given(method("GET"))
        .and(path(format!("/services/data/v59.0/jobs/ingest/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": job_id, "state": "JobComplete",
            "object": "Account", "operation": "insert",
            "numberRecordsProcessed": 2, "numberRecordsFailed": 0
        })))
        .mount(&server)
        .await;

    let client = BulkClient::from_connection(connection_for(&server.uri()))
        .with_poll_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_millis(500));

    let result = client
        .execute_ingest(
            "Account",
            forcebridge::bulk::IngestOperation::Insert,
            "Name\nAcme Corp\nGlobal Inc",
            None,
        )
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.job.number_records_processed, 2);
}
