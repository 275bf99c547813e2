//! Uniform tool response shape.
//!
//! Every facade operation returns a [`ToolResponse`], including on
//! failure. Exceptions never cross the tool boundary.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ErrorKind};

/// JSON response returned by every tool operation.
///
/// Always carries `success`; on failure an `error` string (plus an
/// optional `hint`); on success the operation name and any
/// kind-specific fields.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Component-level deploy diagnostics, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ToolResponse {
    pub fn success(operation: impl Into<String>) -> Self {
        Self {
            success: true,
            operation: Some(operation.into()),
            ..Self::default()
        }
    }

    pub fn failure(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            operation: Some(operation.into()),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Convert an internal error into a failure response, attaching a
    /// corrective hint where one is known.
    pub fn from_error(operation: impl Into<String>, err: &Error) -> Self {
        let hint = match &err.kind {
            ErrorKind::AlreadyExists { .. } => {
                Some("Use operation=\"update\" to modify the existing component".to_string())
            }
            ErrorKind::NotFound { .. } => {
                Some("Use operation=\"create\" to create it first".to_string())
            }
            ErrorKind::InvalidName(_) => Some(
                "Names must start with a letter and contain only letters, digits, and underscores"
                    .to_string(),
            ),
            _ => None,
        };
        let mut response = Self::failure(operation, err.to_string());
        response.hint = hint;
        response
    }

    pub fn with_job(mut self, job_id: impl Into<String>, status: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self.status = Some(status.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_errors(mut self, errors: Option<Value>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a kind-specific top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Serialize to the JSON string handed back to the calling agent.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            "{\"success\": false, \"error\": \"response serialization failed\"}".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_failure_fields_skipped_on_success() {
        let response = ToolResponse::success("create_apex_class")
            .with_job("0Af1", "Succeeded")
            .with_field("class_name", Value::String("Ping".to_string()));
        let json: Value = serde_json::from_str(&response.to_json_string()).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["job_id"], "0Af1");
        assert_eq!(json["class_name"], "Ping");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_already_exists_carries_hint() {
        let err = Error::new(ErrorKind::AlreadyExists {
            kind: "ApexClass".to_string(),
            name: "Ping".to_string(),
        });
        let response = ToolResponse::from_error("create_apex_class", &err);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("already exists"));
        assert!(response.hint.unwrap().contains("update"));
    }
}
