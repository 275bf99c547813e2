//! The metadata operation facade.
//!
//! [`OrgOps`] owns a connection and a metadata deploy client for one
//! org, and exposes per-kind create/update/fetch operations. Impl
//! blocks are split by kind group across the sibling modules.

use std::time::Duration;

use serde_json::Value;

use forcebridge_sf_client::{security::soql, Connection};
use forcebridge_sf_metadata::{
    DeployRequest, DeployStatus, MetadataClient, MetadataKind, MetadataPayload,
};

use crate::error::{Error, ErrorKind, Result};
use crate::response::ToolResponse;

mod admin;
mod apex;
mod automation;
mod bundles;
mod objects;

pub use objects::FlsGrant;

/// Default local deadline for one deploy's poll loop.
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(300);
/// Default pause between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Operations against one org: per-kind metadata create/update/fetch,
/// plus the query and admin tools.
#[derive(Debug)]
pub struct OrgOps {
    pub(crate) conn: Connection,
    pub(crate) metadata: MetadataClient,
    pub(crate) deploy_timeout: Duration,
    pub(crate) poll_interval: Duration,
}

impl OrgOps {
    pub fn new(conn: Connection) -> Self {
        let metadata = MetadataClient::from_connection(&conn);
        Self {
            conn,
            metadata,
            deploy_timeout: DEFAULT_DEPLOY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_deploy_timeout(mut self, timeout: Duration) -> Self {
        self.deploy_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Run a query expecting at most one record, with bookkeeping
    /// fields stripped.
    pub(crate) async fn query_one(&self, soql: &str, tooling: bool) -> Result<Option<Value>> {
        let result = if tooling {
            self.conn.tooling_query::<Value>(soql).await?
        } else {
            self.conn.query::<Value>(soql).await?
        };
        Ok(result.records.into_iter().next().map(|mut record| {
            if let Some(obj) = record.as_object_mut() {
                obj.remove("attributes");
            }
            record
        }))
    }

    /// Create-side guard: the component must not exist yet.
    pub(crate) async fn ensure_absent(
        &self,
        kind: MetadataKind,
        name: &str,
        soql: &str,
        tooling: bool,
    ) -> Result<()> {
        if self.query_one(soql, tooling).await?.is_some() {
            return Err(Error::new(ErrorKind::AlreadyExists {
                kind: kind.api_name().to_string(),
                name: name.to_string(),
            }));
        }
        Ok(())
    }

    /// Update-side guard: the component must exist; returns the
    /// existing record so callers can reuse fields like ApiVersion.
    pub(crate) async fn ensure_present(
        &self,
        kind: MetadataKind,
        name: &str,
        soql: &str,
        tooling: bool,
    ) -> Result<Value> {
        self.query_one(soql, tooling).await?.ok_or_else(|| {
            Error::new(ErrorKind::NotFound {
                kind: kind.api_name().to_string(),
                name: name.to_string(),
            })
        })
    }

    /// Assemble, submit, and poll one deploy, shaping the terminal
    /// outcome into a tool response.
    pub(crate) async fn deploy_op(
        &self,
        op: &str,
        kind: MetadataKind,
        name: &str,
        payload: &MetadataPayload,
        api_version: &str,
    ) -> Result<ToolResponse> {
        let request = DeployRequest::build(kind, name, payload, api_version)?;
        let outcome = self
            .metadata
            .deploy_and_wait(&request, self.deploy_timeout, self.poll_interval)
            .await?;

        let response = if outcome.success {
            ToolResponse::success(op)
                .with_job(&outcome.job_id, outcome.status.as_str())
                .with_message(format!("{kind} '{name}' deployed successfully"))
        } else if outcome.status == DeployStatus::Timeout {
            ToolResponse::failure(op, format!("Deploy of {kind} '{name}' timed out locally"))
                .with_job(&outcome.job_id, outcome.status.as_str())
                .with_hint("The job may still be running; check it later with get_deploy_status")
        } else {
            ToolResponse::failure(op, format!("Deploy of {kind} '{name}' failed"))
                .with_job(&outcome.job_id, outcome.status.as_str())
                .with_errors(outcome.details.clone())
        };
        Ok(response)
    }

    /// Collapse an internal error into the uniform failure response.
    pub(crate) fn finish(op: &str, result: Result<ToolResponse>) -> ToolResponse {
        result.unwrap_or_else(|err| {
            tracing::warn!(operation = op, error = %err, "operation failed");
            ToolResponse::from_error(op, &err)
        })
    }

    /// Escape a user-supplied value for embedding in a SOQL literal.
    pub(crate) fn soql_str(value: &str) -> String {
        soql::escape_string(value)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use forcebridge_sf_client::ClientConfig;

    /// An OrgOps pointed at a wiremock server, with retries disabled
    /// and fast polling.
    pub(crate) fn ops_for(uri: &str) -> OrgOps {
        let config = ClientConfig::builder().without_retry().build();
        let conn = Connection::with_config(uri, "test-token", config).unwrap();
        OrgOps::new(conn)
            .with_deploy_timeout(Duration::from_millis(500))
            .with_poll_interval(Duration::from_millis(10))
    }
}
