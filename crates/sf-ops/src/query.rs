//! Query, diagnostics, and deploy status tools.

use serde_json::Value;

use forcebridge_sf_client::security::url;

use crate::error::{Error, ErrorKind};
use crate::ops::OrgOps;
use crate::response::ToolResponse;
use crate::validate;

impl OrgOps {
    /// Execute a read-only SOQL query against the data or Tooling API.
    ///
    /// Only `SELECT` statements pass the guard; anything resembling a
    /// mutation is rejected before the query reaches the org.
    pub async fn execute_soql_query(&self, query: &str, use_tooling: bool) -> ToolResponse {
        const OP: &str = "execute_soql_query";
        let result = async {
            validate::soql_query(query)?;
            let result = if use_tooling {
                self.conn.tooling_query::<Value>(query).await?
            } else {
                self.conn.query::<Value>(query).await?
            };
            Ok(ToolResponse::success(OP)
                .with_field("total_size", Value::from(result.total_size))
                .with_field("done", Value::Bool(result.done))
                .with_field("records", Value::Array(result.records)))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch the org's API usage limits.
    pub async fn org_limits(&self) -> ToolResponse {
        const OP: &str = "org_limits";
        let result = async {
            let limits = self.conn.limits().await?;
            Ok(ToolResponse::success(OP).with_data(limits))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Describe an sObject's fields and child relationships.
    pub async fn describe_object(&self, object_name: &str) -> ToolResponse {
        const OP: &str = "describe_object";
        let result = async {
            validate::object_name(object_name)?;
            let describe = self.conn.describe(object_name).await?;
            Ok(ToolResponse::success(OP).with_data(describe))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Run anonymous Apex through the Tooling API.
    pub async fn execute_anonymous(&self, code: &str) -> ToolResponse {
        const OP: &str = "execute_anonymous";
        let result = async {
            if code.trim().is_empty() {
                return Err(Error::new(ErrorKind::InvalidContent(
                    "Apex code must not be empty".to_string(),
                )));
            }
            let outcome = self.conn.execute_anonymous(code).await?;
            let compiled = outcome
                .get("compiled")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let succeeded = outcome
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let response = if succeeded {
                ToolResponse::success(OP).with_data(outcome)
            } else {
                let problem = if compiled {
                    outcome
                        .get("exceptionMessage")
                        .and_then(Value::as_str)
                        .unwrap_or("Apex execution failed")
                } else {
                    outcome
                        .get("compileProblem")
                        .and_then(Value::as_str)
                        .unwrap_or("Apex compilation failed")
                };
                ToolResponse::failure(OP, problem.to_string()).with_data(outcome.clone())
            };
            Ok(response)
        }
        .await;
        Self::finish(OP, result)
    }

    /// Check on a previously submitted deploy, by job id. Useful after
    /// a deploy timed out locally.
    pub async fn get_deploy_status(&self, job_id: &str) -> ToolResponse {
        const OP: &str = "get_deploy_status";
        let result = async {
            if !url::is_valid_salesforce_id(job_id) {
                return Err(Error::new(ErrorKind::InvalidContent(format!(
                    "'{job_id}' is not a valid deploy job id"
                ))));
            }
            let report = self.metadata.check_status(job_id).await?;
            let response = if report.done && !report.status.is_success() {
                ToolResponse::failure(OP, format!("Deploy {} failed", report.job_id))
            } else {
                ToolResponse::success(OP)
            };
            Ok(response
                .with_job(&report.job_id, report.status.as_str())
                .with_field("done", Value::Bool(report.done))
                .with_field("raw_status", Value::String(report.raw_status))
                .with_errors(report.details))
        }
        .await;
        Self::finish(OP, result)
    }
}
