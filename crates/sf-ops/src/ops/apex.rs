//! Apex class and trigger operations.

use serde_json::Value;

use forcebridge_sf_metadata::{MetadataKind, MetadataPayload, DEFAULT_API_VERSION};

use crate::response::ToolResponse;
use crate::validate;

use super::OrgOps;

impl OrgOps {
    fn class_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, ApiVersion FROM ApexClass WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new Apex class. Fails if a class with the name exists.
    pub async fn create_apex_class(
        &self,
        name: &str,
        body: &str,
        api_version: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_apex_class";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.class_lookup(name);
            self.ensure_absent(MetadataKind::ApexClass, name, &lookup, true)
                .await?;

            let version = api_version.unwrap_or(DEFAULT_API_VERSION).to_string();
            let payload = MetadataPayload::ApexClass {
                body: body.to_string(),
                api_version: version.clone(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::ApexClass, name, &payload, &version)
                .await?;
            Ok(response.with_field("class_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing Apex class. Fails if it does not exist.
    /// Reuses the deployed ApiVersion when the caller does not override
    /// it.
    pub async fn update_apex_class(
        &self,
        name: &str,
        body: &str,
        api_version: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_apex_class";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.class_lookup(name);
            let existing = self
                .ensure_present(MetadataKind::ApexClass, name, &lookup, true)
                .await?;

            let version = match api_version {
                Some(v) => v.to_string(),
                None => existing
                    .get("ApiVersion")
                    .map(format_api_version)
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            };
            let payload = MetadataPayload::ApexClass {
                body: body.to_string(),
                api_version: version.clone(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::ApexClass, name, &payload, &version)
                .await?;
            Ok(response.with_field("class_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an Apex class definition through the Tooling API.
    pub async fn fetch_apex_class(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_apex_class";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, Body, ApiVersion, Status, LengthWithoutComments, \
                 CreatedDate, LastModifiedDate FROM ApexClass WHERE Name = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::ApexClass, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn trigger_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, ApiVersion, TableEnumOrId FROM ApexTrigger WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new Apex trigger. The trigger body names its target
    /// object, so no separate object argument is needed.
    pub async fn create_apex_trigger(
        &self,
        name: &str,
        body: &str,
        api_version: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_apex_trigger";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.trigger_lookup(name);
            self.ensure_absent(MetadataKind::ApexTrigger, name, &lookup, true)
                .await?;

            let version = api_version.unwrap_or(DEFAULT_API_VERSION).to_string();
            let payload = MetadataPayload::ApexTrigger {
                body: body.to_string(),
                api_version: version.clone(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::ApexTrigger, name, &payload, &version)
                .await?;
            Ok(response.with_field("trigger_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing Apex trigger.
    pub async fn update_apex_trigger(
        &self,
        name: &str,
        body: &str,
        api_version: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_apex_trigger";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.trigger_lookup(name);
            let existing = self
                .ensure_present(MetadataKind::ApexTrigger, name, &lookup, true)
                .await?;

            let version = match api_version {
                Some(v) => v.to_string(),
                None => existing
                    .get("ApiVersion")
                    .map(format_api_version)
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            };
            let payload = MetadataPayload::ApexTrigger {
                body: body.to_string(),
                api_version: version.clone(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::ApexTrigger, name, &payload, &version)
                .await?;
            Ok(response.with_field("trigger_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an Apex trigger definition through the Tooling API.
    pub async fn fetch_apex_trigger(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_apex_trigger";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, Body, ApiVersion, Status, TableEnumOrId, \
                 CreatedDate, LastModifiedDate FROM ApexTrigger WHERE Name = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::ApexTrigger, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }
}

/// The Tooling API reports ApiVersion as a number (59.0); package.xml
/// wants the same text form.
fn format_api_version(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{:.1}", n.as_f64().unwrap_or(59.0)),
        Value::String(s) => s.clone(),
        _ => forcebridge_sf_metadata::DEFAULT_API_VERSION.to_string(),
    }
}
