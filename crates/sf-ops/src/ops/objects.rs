//! Custom object, custom field, validation rule, and record type
//! operations, plus the best-effort FLS grant that follows a field
//! deploy.

use serde::Serialize;
use serde_json::Value;

use forcebridge_sf_metadata::{FieldConfig, MetadataKind, MetadataPayload, DEFAULT_API_VERSION};

use crate::response::ToolResponse;
use crate::validate;

use super::OrgOps;

/// Outcome of the best-effort field visibility grant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlsGrant {
    pub permission_set_id: Option<String>,
    pub assigned_to_me: bool,
    pub field_permissions_id: Option<String>,
}

impl OrgOps {
    fn object_lookup(&self, name: &str) -> String {
        format!(
            "SELECT DurableId, QualifiedApiName, Label FROM EntityDefinition \
             WHERE QualifiedApiName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new custom object (`__c` suffix required).
    pub async fn create_custom_object(
        &self,
        name: &str,
        label: &str,
        plural_label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_custom_object";
        let result = async {
            validate::custom_api_name(name, "__c")?;
            validate::label(label)?;
            let lookup = self.object_lookup(name);
            self.ensure_absent(MetadataKind::CustomObject, name, &lookup, true)
                .await?;

            let payload = MetadataPayload::CustomObject {
                label: label.to_string(),
                plural_label: plural_label.to_string(),
                description: description.map(str::to_string),
                sharing_model: "ReadWrite".to_string(),
                deployment_status: "Deployed".to_string(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::CustomObject, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("object_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing custom object's label metadata.
    pub async fn update_custom_object(
        &self,
        name: &str,
        label: &str,
        plural_label: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_custom_object";
        let result = async {
            validate::object_name(name)?;
            validate::label(label)?;
            let lookup = self.object_lookup(name);
            self.ensure_present(MetadataKind::CustomObject, name, &lookup, true)
                .await?;

            let payload = MetadataPayload::CustomObject {
                label: label.to_string(),
                plural_label: plural_label.to_string(),
                description: description.map(str::to_string),
                sharing_model: "ReadWrite".to_string(),
                deployment_status: "Deployed".to_string(),
            };
            let response = self
                .deploy_op(OP, MetadataKind::CustomObject, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("object_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an object's definition from EntityDefinition.
    pub async fn fetch_object_metadata(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_object_metadata";
        let result = async {
            validate::object_name(name)?;
            let soql = format!(
                "SELECT DurableId, QualifiedApiName, Label, PluralLabel, KeyPrefix, \
                 IsCustomizable FROM EntityDefinition WHERE QualifiedApiName = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::CustomObject, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Create a new custom field and grant read/edit visibility on it.
    ///
    /// The FLS grant is best-effort: its failure is reported as a
    /// warning on an otherwise successful response, never as an overall
    /// failure.
    pub async fn create_custom_field(&self, object_name: &str, field: FieldConfig) -> ToolResponse {
        self.upsert_custom_field("create_custom_field", object_name, field, false)
            .await
    }

    /// Update an existing custom field's definition.
    pub async fn update_custom_field(&self, object_name: &str, field: FieldConfig) -> ToolResponse {
        self.upsert_custom_field("update_custom_field", object_name, field, true)
            .await
    }

    async fn upsert_custom_field(
        &self,
        op: &str,
        object_name: &str,
        field: FieldConfig,
        must_exist: bool,
    ) -> ToolResponse {
        let result = async {
            validate::object_name(object_name)?;
            validate::custom_api_name(&field.full_name, "__c")?;
            validate::label(&field.label)?;

            let lookup = format!(
                "SELECT DurableId FROM FieldDefinition \
                 WHERE EntityDefinition.QualifiedApiName = '{}' AND QualifiedApiName = '{}' LIMIT 1",
                Self::soql_str(object_name),
                Self::soql_str(&field.full_name)
            );
            if must_exist {
                self.ensure_present(MetadataKind::CustomField, &field.full_name, &lookup, true)
                    .await?;
            } else {
                self.ensure_absent(MetadataKind::CustomField, &field.full_name, &lookup, true)
                    .await?;
            }

            let field_name = field.full_name.clone();
            let payload = MetadataPayload::CustomField {
                object_name: object_name.to_string(),
                field,
            };
            let response = self
                .deploy_op(op, MetadataKind::CustomField, &field_name, &payload, DEFAULT_API_VERSION)
                .await?
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_field("field_name", Value::String(field_name.clone()));

            // Skip the FLS grant when the field itself did not deploy.
            if !response.success {
                return Ok(response);
            }

            let response = match self.ensure_field_visibility(object_name, &field_name).await {
                Ok(grant) => response
                    .with_field("fls_grant", serde_json::to_value(&grant)?)
                    .with_message(format!(
                        "Field {field_name} deployed on {object_name} and granted read/edit \
                         via the 'System Admin' permission set"
                    )),
                Err(err) => {
                    tracing::warn!(object_name, field = %field_name, error = %err, "FLS grant failed");
                    response.with_warning(format!(
                        "Field deployed, but the FLS grant step encountered an error: {err}"
                    ))
                }
            };
            Ok(response)
        }
        .await;
        Self::finish(op, result)
    }

    /// Fetch a field definition from FieldDefinition.
    pub async fn fetch_custom_field(&self, object_name: &str, field_name: &str) -> ToolResponse {
        const OP: &str = "fetch_custom_field";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(field_name)?;
            let soql = format!(
                "SELECT DurableId, QualifiedApiName, Label, DataType, Precision, Scale, Length \
                 FROM FieldDefinition WHERE EntityDefinition.QualifiedApiName = '{}' \
                 AND QualifiedApiName = '{}' LIMIT 1",
                Self::soql_str(object_name),
                Self::soql_str(field_name)
            );
            let record = self
                .ensure_present(MetadataKind::CustomField, field_name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP)
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn rule_lookup(&self, object_name: &str, rule_name: &str) -> String {
        format!(
            "SELECT Id FROM ValidationRule WHERE EntityDefinition.QualifiedApiName = '{}' \
             AND ValidationName = '{}' LIMIT 1",
            Self::soql_str(object_name),
            Self::soql_str(rule_name)
        )
    }

    /// Create a validation rule on an object.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_validation_rule(
        &self,
        object_name: &str,
        rule_name: &str,
        formula: &str,
        error_message: &str,
        description: Option<&str>,
        active: bool,
    ) -> ToolResponse {
        const OP: &str = "create_validation_rule";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(rule_name)?;
            let lookup = self.rule_lookup(object_name, rule_name);
            self.ensure_absent(MetadataKind::ValidationRule, rule_name, &lookup, true)
                .await?;
            let payload = validation_rule_payload(
                object_name,
                rule_name,
                formula,
                error_message,
                description,
                active,
            );
            let response = self
                .deploy_op(OP, MetadataKind::ValidationRule, rule_name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_field("rule_name", Value::String(rule_name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing validation rule.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_validation_rule(
        &self,
        object_name: &str,
        rule_name: &str,
        formula: &str,
        error_message: &str,
        description: Option<&str>,
        active: bool,
    ) -> ToolResponse {
        const OP: &str = "update_validation_rule";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(rule_name)?;
            let lookup = self.rule_lookup(object_name, rule_name);
            self.ensure_present(MetadataKind::ValidationRule, rule_name, &lookup, true)
                .await?;
            let payload = validation_rule_payload(
                object_name,
                rule_name,
                formula,
                error_message,
                description,
                active,
            );
            let response = self
                .deploy_op(OP, MetadataKind::ValidationRule, rule_name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_field("rule_name", Value::String(rule_name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a validation rule through the Tooling API.
    pub async fn fetch_validation_rule(&self, object_name: &str, rule_name: &str) -> ToolResponse {
        const OP: &str = "fetch_validation_rule";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(rule_name)?;
            let soql = format!(
                "SELECT Id, ValidationName, Active, ErrorMessage, ErrorDisplayField, Description \
                 FROM ValidationRule WHERE EntityDefinition.QualifiedApiName = '{}' \
                 AND ValidationName = '{}' LIMIT 1",
                Self::soql_str(object_name),
                Self::soql_str(rule_name)
            );
            let record = self
                .ensure_present(MetadataKind::ValidationRule, rule_name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP)
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn record_type_lookup(&self, object_name: &str, name: &str) -> String {
        format!(
            "SELECT Id, DeveloperName, IsActive FROM RecordType \
             WHERE SobjectType = '{}' AND DeveloperName = '{}' LIMIT 1",
            Self::soql_str(object_name),
            Self::soql_str(name)
        )
    }

    /// Create a record type on an object.
    pub async fn create_record_type(
        &self,
        object_name: &str,
        name: &str,
        label: &str,
        description: Option<&str>,
        active: bool,
    ) -> ToolResponse {
        const OP: &str = "create_record_type";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.record_type_lookup(object_name, name);
            self.ensure_absent(MetadataKind::RecordType, name, &lookup, false)
                .await?;
            let payload = MetadataPayload::RecordType {
                object_name: object_name.to_string(),
                label: label.to_string(),
                description: description.map(str::to_string),
                active,
            };
            let response = self
                .deploy_op(OP, MetadataKind::RecordType, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("object_name", Value::String(object_name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing record type.
    pub async fn update_record_type(
        &self,
        object_name: &str,
        name: &str,
        label: &str,
        description: Option<&str>,
        active: bool,
    ) -> ToolResponse {
        const OP: &str = "update_record_type";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(name)?;
            validate::label(label)?;
            let lookup = self.record_type_lookup(object_name, name);
            self.ensure_present(MetadataKind::RecordType, name, &lookup, false)
                .await?;
            let payload = MetadataPayload::RecordType {
                object_name: object_name.to_string(),
                label: label.to_string(),
                description: description.map(str::to_string),
                active,
            };
            let response = self
                .deploy_op(OP, MetadataKind::RecordType, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("object_name", Value::String(object_name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a record type.
    pub async fn fetch_record_type(&self, object_name: &str, name: &str) -> ToolResponse {
        const OP: &str = "fetch_record_type";
        let result = async {
            validate::object_name(object_name)?;
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, DeveloperName, SobjectType, IsActive, Description \
                 FROM RecordType WHERE SobjectType = '{}' AND DeveloperName = '{}' LIMIT 1",
                Self::soql_str(object_name),
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::RecordType, name, &soql, false)
                .await?;
            Ok(ToolResponse::success(OP)
                .with_field("object_name", Value::String(object_name.to_string()))
                .with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    // =========================================================================
    // FLS grant
    // =========================================================================

    /// Ensure a "System Admin" permission set exists, is assigned to
    /// the calling user, and grants read/edit on the field.
    async fn ensure_field_visibility(
        &self,
        object_name: &str,
        field_name: &str,
    ) -> crate::error::Result<FlsGrant> {
        let mut grant = FlsGrant::default();

        // 1) Find or create the permission set.
        let ps = self
            .query_one(
                "SELECT Id, Name, Label FROM PermissionSet \
                 WHERE Label = 'System Admin' OR Name = 'System_Admin' LIMIT 1",
                false,
            )
            .await?;
        let ps_id = match ps.and_then(|r| r.get("Id").and_then(Value::as_str).map(str::to_string)) {
            Some(id) => id,
            None => {
                let created = self
                    .conn
                    .create_record(
                        "PermissionSet",
                        &serde_json::json!({
                            "Name": "System_Admin",
                            "Label": "System Admin",
                            "Description": "Auto-created for field-level access",
                            "HasActivationRequired": false,
                        }),
                    )
                    .await?;
                created.id
            }
        };
        grant.permission_set_id = Some(ps_id.clone());

        // 2) Resolve the calling user, falling back to the most
        // recently active user when the chatter endpoint is missing.
        let me_id = match self
            .conn
            .get_json::<Value>(&self.conn.rest_url("chatter/users/me"))
            .await
        {
            Ok(me) => me.get("id").and_then(Value::as_str).map(str::to_string),
            Err(_) => self
                .query_one(
                    "SELECT Id FROM User WHERE IsActive = true \
                     ORDER BY LastLoginDate DESC NULLS LAST LIMIT 1",
                    false,
                )
                .await?
                .and_then(|r| r.get("Id").and_then(Value::as_str).map(str::to_string)),
        };

        // 3) Assign the permission set to the user if not already.
        if let Some(me_id) = &me_id {
            let check = format!(
                "SELECT Id FROM PermissionSetAssignment \
                 WHERE AssigneeId = '{}' AND PermissionSetId = '{}' LIMIT 1",
                Self::soql_str(me_id),
                Self::soql_str(&ps_id)
            );
            if self.query_one(&check, false).await?.is_none() {
                self.conn
                    .create_record(
                        "PermissionSetAssignment",
                        &serde_json::json!({"AssigneeId": me_id, "PermissionSetId": ps_id}),
                    )
                    .await?;
            }
            grant.assigned_to_me = true;
        }

        // 4) Grant read and edit on the field.
        let field_full = format!("{object_name}.{field_name}");
        let fp_query = format!(
            "SELECT Id, PermissionsRead, PermissionsEdit FROM FieldPermissions \
             WHERE ParentId = '{}' AND SobjectType = '{}' AND Field = '{}' LIMIT 1",
            Self::soql_str(&ps_id),
            Self::soql_str(object_name),
            Self::soql_str(&field_full)
        );
        match self.query_one(&fp_query, false).await? {
            Some(existing) => {
                let fp_id = existing
                    .get("Id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.conn
                    .update_record(
                        "FieldPermissions",
                        &fp_id,
                        &serde_json::json!({"PermissionsRead": true, "PermissionsEdit": true}),
                    )
                    .await?;
                grant.field_permissions_id = Some(fp_id);
            }
            None => {
                let created = self
                    .conn
                    .create_record(
                        "FieldPermissions",
                        &serde_json::json!({
                            "ParentId": ps_id,
                            "SobjectType": object_name,
                            "Field": field_full,
                            "PermissionsRead": true,
                            "PermissionsEdit": true,
                        }),
                    )
                    .await?;
                grant.field_permissions_id = Some(created.id);
            }
        }

        Ok(grant)
    }
}

fn validation_rule_payload(
    object_name: &str,
    rule_name: &str,
    formula: &str,
    error_message: &str,
    description: Option<&str>,
    active: bool,
) -> MetadataPayload {
    MetadataPayload::ValidationRule {
        object_name: object_name.to_string(),
        rule_name: rule_name.to_string(),
        error_condition_formula: formula.to_string(),
        error_message: error_message.to_string(),
        error_display_field: None,
        description: description.map(str::to_string),
        active,
    }
}
