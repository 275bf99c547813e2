//! Flow, quick action, and custom tab operations.

use serde_json::Value;

use forcebridge_sf_metadata::{MetadataKind, MetadataPayload, DEFAULT_API_VERSION};

use crate::response::ToolResponse;
use crate::validate;

use super::OrgOps;

impl OrgOps {
    fn flow_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, ApiName, Label FROM FlowDefinitionView WHERE ApiName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new flow in Draft status.
    pub async fn create_flow(
        &self,
        name: &str,
        label: &str,
        description: Option<&str>,
        process_type: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_flow";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.flow_lookup(name);
            self.ensure_absent(MetadataKind::Flow, name, &lookup, false)
                .await?;
            let payload = flow_payload(label, description, process_type);
            let response = self
                .deploy_op(OP, MetadataKind::Flow, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("flow_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing flow's skeleton metadata.
    pub async fn update_flow(
        &self,
        name: &str,
        label: &str,
        description: Option<&str>,
        process_type: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_flow";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.flow_lookup(name);
            self.ensure_present(MetadataKind::Flow, name, &lookup, false)
                .await?;
            let payload = flow_payload(label, description, process_type);
            let response = self
                .deploy_op(OP, MetadataKind::Flow, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("flow_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a flow definition summary.
    pub async fn fetch_flow(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_flow";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, ApiName, Label, ProcessType, TriggerType, IsActive, Description \
                 FROM FlowDefinitionView WHERE ApiName = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::Flow, name, &soql, false)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn quick_action_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, DeveloperName FROM QuickActionDefinition WHERE DeveloperName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new global or object quick action.
    pub async fn create_quick_action(
        &self,
        name: &str,
        label: &str,
        action_type: &str,
        target_object: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_quick_action";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.quick_action_lookup(name);
            self.ensure_absent(MetadataKind::QuickAction, name, &lookup, true)
                .await?;
            let payload = quick_action_payload(label, action_type, target_object);
            let response = self
                .deploy_op(OP, MetadataKind::QuickAction, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("action_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing quick action.
    pub async fn update_quick_action(
        &self,
        name: &str,
        label: &str,
        action_type: &str,
        target_object: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_quick_action";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.quick_action_lookup(name);
            self.ensure_present(MetadataKind::QuickAction, name, &lookup, true)
                .await?;
            let payload = quick_action_payload(label, action_type, target_object);
            let response = self
                .deploy_op(OP, MetadataKind::QuickAction, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("action_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a quick action definition.
    pub async fn fetch_quick_action(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_quick_action";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, DeveloperName, Label, Type, SobjectType \
                 FROM QuickActionDefinition WHERE DeveloperName = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::QuickAction, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn tab_lookup(&self, name: &str) -> String {
        format!(
            "SELECT DurableId, Name, Label FROM TabDefinition WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a custom tab for an object or web resource.
    pub async fn create_custom_tab(
        &self,
        name: &str,
        label: &str,
        motif: &str,
        url: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_custom_tab";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.tab_lookup(name);
            self.ensure_absent(MetadataKind::CustomTab, name, &lookup, false)
                .await?;
            let payload = tab_payload(name, label, motif, url);
            let response = self
                .deploy_op(OP, MetadataKind::CustomTab, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("tab_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing custom tab.
    pub async fn update_custom_tab(
        &self,
        name: &str,
        label: &str,
        motif: &str,
        url: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_custom_tab";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.tab_lookup(name);
            self.ensure_present(MetadataKind::CustomTab, name, &lookup, false)
                .await?;
            let payload = tab_payload(name, label, motif, url);
            let response = self
                .deploy_op(OP, MetadataKind::CustomTab, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("tab_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a tab definition.
    pub async fn fetch_custom_tab(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_custom_tab";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.tab_lookup(name);
            let record = self
                .ensure_present(MetadataKind::CustomTab, name, &lookup, false)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }
}

fn flow_payload(
    label: &str,
    description: Option<&str>,
    process_type: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::Flow {
        label: label.to_string(),
        description: description.map(str::to_string),
        process_type: process_type.unwrap_or("AutoLaunchedFlow").to_string(),
    }
}

fn quick_action_payload(
    label: &str,
    action_type: &str,
    target_object: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::QuickAction {
        label: label.to_string(),
        action_type: action_type.to_string(),
        target_object: target_object.map(str::to_string),
        description: None,
        icon: "feedItem".to_string(),
    }
}

fn tab_payload(name: &str, label: &str, motif: &str, url: Option<&str>) -> MetadataPayload {
    MetadataPayload::CustomTab {
        label: label.to_string(),
        motif: motif.to_string(),
        // An object tab points at a custom object of the same name; a
        // web tab carries a URL instead.
        custom_object: url.is_none() && name.ends_with("__c"),
        url: url.map(str::to_string),
        description: None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ops_for;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_flow_defaults_to_autolaunched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"totalSize": 0, "done": true, "records": []}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/services/data/v59.0/metadata/deployRequest"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "0Af7"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/metadata/deployRequest/0Af7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "deployResult": {"done": true, "status": "Succeeded"}
            })))
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops
            .create_flow("Invoice_Followup", "Invoice Followup", None, None)
            .await;

        assert!(response.success);
        assert_eq!(response.extra["flow_name"], "Invoice_Followup");
    }

    #[tokio::test]
    async fn test_deploy_failure_passes_details_through() {
        let server = MockServer::start().await;
        let details = serde_json::json!({
            "componentFailures": [{"problem": "Invalid type"}]
        });

        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"totalSize": 0, "done": true, "records": []}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/services/data/v59.0/metadata/deployRequest"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "0Af8"})),
            )
            .mount(&server)
            .await;
        let details_clone = details.clone();
        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/metadata/deployRequest/0Af8"))
            .respond_with(move |_req: &wiremock::Request| {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "deployResult": {"done": true, "status": "Failed", "details": details_clone}
                }))
            })
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops
            .create_flow("Broken_Flow", "Broken Flow", None, None)
            .await;

        assert!(!response.success);
        assert_eq!(response.status.as_deref(), Some("Failed"));
        assert_eq!(response.errors.unwrap(), details);
    }
}
