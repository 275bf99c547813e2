//! Permission set, email template, custom label, and custom metadata
//! type operations.

use serde_json::Value;

use forcebridge_sf_metadata::{MetadataKind, MetadataPayload, DEFAULT_API_VERSION};

use crate::response::ToolResponse;
use crate::validate;

use super::OrgOps;

impl OrgOps {
    fn permission_set_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, Name, Label FROM PermissionSet WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new permission set.
    pub async fn create_permission_set(
        &self,
        name: &str,
        label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_permission_set";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.permission_set_lookup(name);
            self.ensure_absent(MetadataKind::PermissionSet, name, &lookup, false)
                .await?;
            let payload = MetadataPayload::PermissionSet {
                label: label.to_string(),
                description: description.map(str::to_string),
            };
            let response = self
                .deploy_op(OP, MetadataKind::PermissionSet, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("permission_set_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing permission set's label metadata.
    pub async fn update_permission_set(
        &self,
        name: &str,
        label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_permission_set";
        let result = async {
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.permission_set_lookup(name);
            self.ensure_present(MetadataKind::PermissionSet, name, &lookup, false)
                .await?;
            let payload = MetadataPayload::PermissionSet {
                label: label.to_string(),
                description: description.map(str::to_string),
            };
            let response = self
                .deploy_op(OP, MetadataKind::PermissionSet, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("permission_set_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a permission set record.
    pub async fn fetch_permission_set(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_permission_set";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, Label, Description, IsOwnedByProfile \
                 FROM PermissionSet WHERE Name = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::PermissionSet, name, &soql, false)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn email_template_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, DeveloperName, Name FROM EmailTemplate WHERE DeveloperName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a text email template inside a folder.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_email_template(
        &self,
        folder_name: &str,
        name: &str,
        display_name: &str,
        subject: &str,
        body: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_email_template";
        let result = async {
            validate::api_name(folder_name)?;
            validate::api_name(name)?;
            let lookup = self.email_template_lookup(name);
            self.ensure_absent(MetadataKind::EmailTemplate, name, &lookup, false)
                .await?;
            let payload = email_template_payload(folder_name, display_name, subject, body, description);
            let response = self
                .deploy_op(OP, MetadataKind::EmailTemplate, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response
                .with_field("folder_name", Value::String(folder_name.to_string()))
                .with_field("template_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing email template.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_email_template(
        &self,
        folder_name: &str,
        name: &str,
        display_name: &str,
        subject: &str,
        body: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_email_template";
        let result = async {
            validate::api_name(folder_name)?;
            validate::api_name(name)?;
            let lookup = self.email_template_lookup(name);
            self.ensure_present(MetadataKind::EmailTemplate, name, &lookup, false)
                .await?;
            let payload = email_template_payload(folder_name, display_name, subject, body, description);
            let response = self
                .deploy_op(OP, MetadataKind::EmailTemplate, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response
                .with_field("folder_name", Value::String(folder_name.to_string()))
                .with_field("template_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an email template record.
    pub async fn fetch_email_template(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_email_template";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, DeveloperName, Subject, Body, FolderId, TemplateType, IsActive \
                 FROM EmailTemplate WHERE DeveloperName = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::EmailTemplate, name, &soql, false)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn label_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, Name, Value FROM ExternalString WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a custom label.
    pub async fn create_custom_label(
        &self,
        name: &str,
        value: &str,
        category: Option<&str>,
        protected: bool,
    ) -> ToolResponse {
        const OP: &str = "create_custom_label";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.label_lookup(name);
            self.ensure_absent(MetadataKind::CustomLabel, name, &lookup, true)
                .await?;
            let payload = label_payload(value, category, protected);
            let response = self
                .deploy_op(OP, MetadataKind::CustomLabel, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("label_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing custom label's value.
    pub async fn update_custom_label(
        &self,
        name: &str,
        value: &str,
        category: Option<&str>,
        protected: bool,
    ) -> ToolResponse {
        const OP: &str = "update_custom_label";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.label_lookup(name);
            self.ensure_present(MetadataKind::CustomLabel, name, &lookup, true)
                .await?;
            let payload = label_payload(value, category, protected);
            let response = self
                .deploy_op(OP, MetadataKind::CustomLabel, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("label_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a custom label through the Tooling API.
    pub async fn fetch_custom_label(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_custom_label";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, Value, Category, Language, IsProtected \
                 FROM ExternalString WHERE Name = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::CustomLabel, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn metadata_type_lookup(&self, name: &str) -> String {
        format!(
            "SELECT DurableId, QualifiedApiName, Label FROM EntityDefinition \
             WHERE QualifiedApiName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a custom metadata type (`__mdt` suffix required).
    pub async fn create_custom_metadata_type(
        &self,
        name: &str,
        label: &str,
        plural_label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_custom_metadata_type";
        let result = async {
            validate::custom_api_name(name, "__mdt")?;
            validate::label(label)?;
            let lookup = self.metadata_type_lookup(name);
            self.ensure_absent(MetadataKind::CustomMetadataType, name, &lookup, true)
                .await?;
            let payload = metadata_type_payload(label, plural_label, description);
            let response = self
                .deploy_op(OP, MetadataKind::CustomMetadataType, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("type_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing custom metadata type.
    pub async fn update_custom_metadata_type(
        &self,
        name: &str,
        label: &str,
        plural_label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_custom_metadata_type";
        let result = async {
            validate::custom_api_name(name, "__mdt")?;
            validate::label(label)?;
            let lookup = self.metadata_type_lookup(name);
            self.ensure_present(MetadataKind::CustomMetadataType, name, &lookup, true)
                .await?;
            let payload = metadata_type_payload(label, plural_label, description);
            let response = self
                .deploy_op(OP, MetadataKind::CustomMetadataType, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("type_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a custom metadata type definition.
    pub async fn fetch_custom_metadata_type(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_custom_metadata_type";
        let result = async {
            validate::custom_api_name(name, "__mdt")?;
            let lookup = self.metadata_type_lookup(name);
            let record = self
                .ensure_present(MetadataKind::CustomMetadataType, name, &lookup, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }
}

fn email_template_payload(
    folder_name: &str,
    display_name: &str,
    subject: &str,
    body: &str,
    description: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::EmailTemplate {
        folder_name: folder_name.to_string(),
        display_name: display_name.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        available: true,
        description: description.map(str::to_string),
    }
}

fn label_payload(value: &str, category: Option<&str>, protected: bool) -> MetadataPayload {
    MetadataPayload::CustomLabel {
        value: value.to_string(),
        category: category.map(str::to_string),
        language: "en_US".to_string(),
        protected,
        short_description: None,
    }
}

fn metadata_type_payload(
    label: &str,
    plural_label: &str,
    description: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::CustomMetadataType {
        label: label.to_string(),
        plural_label: plural_label.to_string(),
        description: description.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ops_for;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_metadata_type_requires_mdt_suffix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops
            .create_custom_metadata_type("Config__c", "Config", "Configs", None)
            .await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("__mdt"));
    }

    #[tokio::test]
    async fn test_fetch_permission_set_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"totalSize": 0, "done": true, "records": []}),
            ))
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops.fetch_permission_set("Missing_PS").await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("not found"));
        assert!(response.hint.unwrap().contains("create"));
    }
}
