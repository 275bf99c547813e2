//! Unified alias-dispatched entry points.
//!
//! `deploy_metadata`, `fetch_metadata`, and `list_metadata` accept a
//! type string or alias plus a JSON content document, resolve the kind,
//! and route to the typed per-kind operations. This is the surface an
//! agent drives when it does not call the typed operations directly.

use serde_json::Value;

use forcebridge_sf_metadata::{FieldConfig, FieldType, MetadataKind, PicklistValue};

use crate::error::{Error, ErrorKind, Result};
use crate::ops::OrgOps;
use crate::response::ToolResponse;

/// Create/update semantics for a dispatched deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// Fail if the component already exists.
    Create,
    /// Fail if the component does not exist.
    Update,
    /// Update when present, create when absent.
    #[default]
    Upsert,
}

impl Operation {
    pub fn from_str(input: &str) -> Self {
        match input.to_lowercase().as_str() {
            "create" => Operation::Create,
            "update" => Operation::Update,
            _ => Operation::Upsert,
        }
    }
}

impl OrgOps {
    /// Deploy metadata of any supported kind from a JSON content
    /// document. Object-scoped kinds take names in `Object.Member`
    /// form.
    pub async fn deploy_metadata(
        &self,
        metadata_type: &str,
        name: &str,
        content: &str,
        operation: Operation,
    ) -> ToolResponse {
        const OP: &str = "deploy_metadata";

        let kind = match MetadataKind::from_alias(metadata_type) {
            Ok(kind) => kind,
            Err(err) => {
                return ToolResponse::failure(OP, err.to_string())
                    .with_hint(supported_kinds_hint());
            }
        };
        let content: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(err) => {
                return ToolResponse::failure(
                    OP,
                    format!("Invalid JSON in content parameter: {err}"),
                );
            }
        };

        match self.route_deploy(kind, name, &content, operation).await {
            Ok(response) => response,
            Err(err) => ToolResponse::from_error(OP, &err),
        }
    }

    async fn route_deploy(
        &self,
        kind: MetadataKind,
        name: &str,
        content: &Value,
        operation: Operation,
    ) -> Result<ToolResponse> {
        let api_version = opt_str(content, "apiVersion");
        let response = match kind {
            MetadataKind::ApexClass => {
                let body = req_str(content, "body")?;
                self.create_or_update(
                    operation,
                    self.create_apex_class(name, &body, api_version.as_deref()),
                    self.update_apex_class(name, &body, api_version.as_deref()),
                )
                .await
            }
            MetadataKind::ApexTrigger => {
                let body = req_str(content, "body")?;
                self.create_or_update(
                    operation,
                    self.create_apex_trigger(name, &body, api_version.as_deref()),
                    self.update_apex_trigger(name, &body, api_version.as_deref()),
                )
                .await
            }
            MetadataKind::ValidationRule => {
                let (object_name, rule_name) = split_scoped(name, content, "RuleName")?;
                let formula = req_str(content, "formula")?;
                let message = req_str(content, "errorMessage")?;
                let description = opt_str(content, "description");
                let active = content.get("active").and_then(Value::as_bool).unwrap_or(true);
                self.create_or_update(
                    operation,
                    self.create_validation_rule(
                        &object_name,
                        &rule_name,
                        &formula,
                        &message,
                        description.as_deref(),
                        active,
                    ),
                    self.update_validation_rule(
                        &object_name,
                        &rule_name,
                        &formula,
                        &message,
                        description.as_deref(),
                        active,
                    ),
                )
                .await
            }
            MetadataKind::LightningComponentBundle => {
                let html = req_str(content, "html")?;
                let js = req_str(content, "js")?;
                let css = opt_str(content, "css");
                self.create_or_update(
                    operation,
                    self.create_lwc_component(name, &html, &js, css.as_deref()),
                    self.update_lwc_component(name, &html, &js, css.as_deref()),
                )
                .await
            }
            MetadataKind::AuraDefinitionBundle => {
                let description = opt_str(content, "description");
                let controller = opt_str(content, "controller");
                let helper = opt_str(content, "helper");
                self.create_or_update(
                    operation,
                    self.create_aura_component(
                        name,
                        description.as_deref(),
                        controller.as_deref(),
                        helper.as_deref(),
                    ),
                    self.update_aura_component(
                        name,
                        description.as_deref(),
                        controller.as_deref(),
                        helper.as_deref(),
                    ),
                )
                .await
            }
            MetadataKind::CustomObject => {
                let label = req_str(content, "label")?;
                let plural = opt_str(content, "pluralLabel").unwrap_or_else(|| format!("{label}s"));
                let description = opt_str(content, "description");
                self.create_or_update(
                    operation,
                    self.create_custom_object(name, &label, &plural, description.as_deref()),
                    self.update_custom_object(name, &label, &plural, description.as_deref()),
                )
                .await
            }
            MetadataKind::CustomField => {
                let (object_name, field_name) = split_scoped(name, content, "FieldName")?;
                let field = field_from_content(&field_name, content)?;
                self.create_or_update(
                    operation,
                    self.create_custom_field(&object_name, field.clone()),
                    self.update_custom_field(&object_name, field.clone()),
                )
                .await
            }
            MetadataKind::Flow => {
                let label = req_str(content, "label")?;
                let description = opt_str(content, "description");
                let process_type = opt_str(content, "processType");
                self.create_or_update(
                    operation,
                    self.create_flow(name, &label, description.as_deref(), process_type.as_deref()),
                    self.update_flow(name, &label, description.as_deref(), process_type.as_deref()),
                )
                .await
            }
            MetadataKind::EmailTemplate => {
                let (folder, template) = split_slash_scoped(name, content)?;
                let display = opt_str(content, "displayName").unwrap_or_else(|| template.clone());
                let subject = req_str(content, "subject")?;
                let body = req_str(content, "body")?;
                let description = opt_str(content, "description");
                self.create_or_update(
                    operation,
                    self.create_email_template(
                        &folder,
                        &template,
                        &display,
                        &subject,
                        &body,
                        description.as_deref(),
                    ),
                    self.update_email_template(
                        &folder,
                        &template,
                        &display,
                        &subject,
                        &body,
                        description.as_deref(),
                    ),
                )
                .await
            }
            MetadataKind::PermissionSet => {
                let label = req_str(content, "label")?;
                let description = opt_str(content, "description");
                self.create_or_update(
                    operation,
                    self.create_permission_set(name, &label, description.as_deref()),
                    self.update_permission_set(name, &label, description.as_deref()),
                )
                .await
            }
            MetadataKind::StaticResource => {
                let body = req_str(content, "content")?;
                let content_type =
                    opt_str(content, "contentType").unwrap_or_else(|| "text/plain".to_string());
                let description = opt_str(content, "description");
                self.create_or_update(
                    operation,
                    self.create_static_resource(
                        name,
                        body.clone().into_bytes(),
                        &content_type,
                        description.as_deref(),
                    ),
                    self.update_static_resource(
                        name,
                        body.clone().into_bytes(),
                        &content_type,
                        description.as_deref(),
                    ),
                )
                .await
            }
            MetadataKind::CustomMetadataType => {
                let label = req_str(content, "label")?;
                let plural = opt_str(content, "pluralLabel").unwrap_or_else(|| format!("{label}s"));
                let description = opt_str(content, "description");
                self.create_or_update(
                    operation,
                    self.create_custom_metadata_type(name, &label, &plural, description.as_deref()),
                    self.update_custom_metadata_type(name, &label, &plural, description.as_deref()),
                )
                .await
            }
            MetadataKind::CustomLabel => {
                let value = req_str(content, "value")?;
                let category = opt_str(content, "category");
                let protected = content
                    .get("protected")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                self.create_or_update(
                    operation,
                    self.create_custom_label(name, &value, category.as_deref(), protected),
                    self.update_custom_label(name, &value, category.as_deref(), protected),
                )
                .await
            }
            MetadataKind::RecordType => {
                let (object_name, rt_name) = split_scoped(name, content, "RecordTypeName")?;
                let label = req_str(content, "label")?;
                let description = opt_str(content, "description");
                let active = content.get("active").and_then(Value::as_bool).unwrap_or(true);
                self.create_or_update(
                    operation,
                    self.create_record_type(
                        &object_name,
                        &rt_name,
                        &label,
                        description.as_deref(),
                        active,
                    ),
                    self.update_record_type(
                        &object_name,
                        &rt_name,
                        &label,
                        description.as_deref(),
                        active,
                    ),
                )
                .await
            }
            MetadataKind::QuickAction => {
                let label = req_str(content, "label")?;
                let action_type =
                    opt_str(content, "type").unwrap_or_else(|| "Create".to_string());
                let target = opt_str(content, "targetObject");
                self.create_or_update(
                    operation,
                    self.create_quick_action(name, &label, &action_type, target.as_deref()),
                    self.update_quick_action(name, &label, &action_type, target.as_deref()),
                )
                .await
            }
            MetadataKind::CustomTab => {
                let label = req_str(content, "label")?;
                let motif =
                    opt_str(content, "motif").unwrap_or_else(|| "Custom70: Handsaw".to_string());
                let url = opt_str(content, "url");
                self.create_or_update(
                    operation,
                    self.create_custom_tab(name, &label, &motif, url.as_deref()),
                    self.update_custom_tab(name, &label, &motif, url.as_deref()),
                )
                .await
            }
        };
        Ok(response)
    }

    /// Upsert routing: try the update path first and fall back to
    /// create when the component does not exist.
    async fn create_or_update<C, U>(&self, operation: Operation, create: C, update: U) -> ToolResponse
    where
        C: std::future::Future<Output = ToolResponse>,
        U: std::future::Future<Output = ToolResponse>,
    {
        match operation {
            Operation::Create => create.await,
            Operation::Update => update.await,
            Operation::Upsert => {
                let updated = update.await;
                let missing = updated
                    .error
                    .as_deref()
                    .is_some_and(|e| e.contains("not found"));
                if !updated.success && missing {
                    create.await
                } else {
                    updated
                }
            }
        }
    }

    /// Fetch metadata of any supported kind by name.
    pub async fn fetch_metadata(&self, metadata_type: &str, name: &str) -> ToolResponse {
        const OP: &str = "fetch_metadata";

        let kind = match MetadataKind::from_alias(metadata_type) {
            Ok(kind) => kind,
            Err(err) => {
                return ToolResponse::failure(OP, err.to_string())
                    .with_hint(supported_kinds_hint());
            }
        };

        let scoped = |label: &str| -> Result<(String, String)> {
            name.split_once('.')
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .ok_or_else(|| {
                    Error::new(ErrorKind::InvalidContent(format!(
                        "{} name must be in format 'ObjectName.{label}'",
                        kind.api_name()
                    )))
                })
        };

        match kind {
            MetadataKind::ApexClass => self.fetch_apex_class(name).await,
            MetadataKind::ApexTrigger => self.fetch_apex_trigger(name).await,
            MetadataKind::ValidationRule => match scoped("RuleName") {
                Ok((object, rule)) => self.fetch_validation_rule(&object, &rule).await,
                Err(err) => ToolResponse::from_error(OP, &err),
            },
            MetadataKind::LightningComponentBundle => self.fetch_lwc_component(name).await,
            MetadataKind::AuraDefinitionBundle => self.fetch_aura_component(name).await,
            MetadataKind::CustomObject => self.fetch_object_metadata(name).await,
            MetadataKind::CustomField => match scoped("FieldName") {
                Ok((object, field)) => self.fetch_custom_field(&object, &field).await,
                Err(err) => ToolResponse::from_error(OP, &err),
            },
            MetadataKind::Flow => self.fetch_flow(name).await,
            MetadataKind::EmailTemplate => self.fetch_email_template(name).await,
            MetadataKind::PermissionSet => self.fetch_permission_set(name).await,
            MetadataKind::StaticResource => self.fetch_static_resource(name).await,
            MetadataKind::CustomMetadataType => self.fetch_custom_metadata_type(name).await,
            MetadataKind::CustomLabel => self.fetch_custom_label(name).await,
            MetadataKind::RecordType => match scoped("RecordTypeName") {
                Ok((object, rt)) => self.fetch_record_type(&object, &rt).await,
                Err(err) => ToolResponse::from_error(OP, &err),
            },
            MetadataKind::QuickAction => self.fetch_quick_action(name).await,
            MetadataKind::CustomTab => self.fetch_custom_tab(name).await,
        }
    }

    /// List components of a kind, optionally filtered by a `LIKE`
    /// pattern.
    pub async fn list_metadata(
        &self,
        metadata_type: &str,
        pattern: Option<&str>,
        limit: u32,
    ) -> ToolResponse {
        const OP: &str = "list_metadata";

        let kind = match MetadataKind::from_alias(metadata_type) {
            Ok(kind) => kind,
            Err(err) => {
                return ToolResponse::failure(OP, err.to_string())
                    .with_hint(supported_kinds_hint());
            }
        };

        let filter = |column: &str| match pattern {
            Some(p) => format!("{column} LIKE '{}' AND ", Self::soql_str(p)),
            None => String::new(),
        };

        let (soql, tooling) = match kind {
            MetadataKind::ApexClass => (
                format!(
                    "SELECT Id, Name, ApiVersion, Status, LengthWithoutComments FROM ApexClass \
                     WHERE {}NamespacePrefix = null LIMIT {limit}",
                    filter("Name")
                ),
                true,
            ),
            MetadataKind::ApexTrigger => (
                format!(
                    "SELECT Id, Name, TableEnumOrId, Status, ApiVersion FROM ApexTrigger \
                     WHERE {}NamespacePrefix = null LIMIT {limit}",
                    filter("Name")
                ),
                true,
            ),
            MetadataKind::CustomObject => (
                format!(
                    "SELECT QualifiedApiName, Label, PluralLabel FROM EntityDefinition \
                     WHERE {}IsCustomizable = true LIMIT {limit}",
                    filter("QualifiedApiName")
                ),
                true,
            ),
            MetadataKind::Flow => (
                format!(
                    "SELECT Id, ApiName, Label, ProcessType, IsActive FROM FlowDefinitionView \
                     WHERE {}IsTemplate = false LIMIT {limit}",
                    filter("ApiName")
                ),
                false,
            ),
            MetadataKind::PermissionSet => (
                format!(
                    "SELECT Id, Name, Label, Description FROM PermissionSet \
                     WHERE {}IsOwnedByProfile = false LIMIT {limit}",
                    filter("Name")
                ),
                false,
            ),
            MetadataKind::StaticResource => (
                format!(
                    "SELECT Id, Name, ContentType, BodyLength FROM StaticResource \
                     WHERE {}NamespacePrefix = null LIMIT {limit}",
                    filter("Name")
                ),
                false,
            ),
            other => {
                return ToolResponse::failure(
                    OP,
                    format!("Listing is not supported for {other}"),
                )
                .with_hint("Use fetch_metadata with a specific name instead");
            }
        };

        let result = async {
            let records = if tooling {
                self.conn.tooling_query::<Value>(&soql).await?
            } else {
                self.conn.query::<Value>(&soql).await?
            };
            let count = records.records.len();
            Ok(ToolResponse::success(OP)
                .with_field("metadata_type", Value::String(kind.api_name().to_string()))
                .with_field("count", Value::from(count))
                .with_field("records", Value::Array(records.records)))
        }
        .await;
        Self::finish(OP, result)
    }
}

fn supported_kinds_hint() -> String {
    let names: Vec<&str> = MetadataKind::ALL.iter().map(|k| k.api_name()).collect();
    format!("Supported metadata types: {}", names.join(", "))
}

fn req_str(content: &Value, key: &str) -> Result<String> {
    content
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidContent(format!(
                "content is missing required field '{key}'"
            )))
        })
}

fn opt_str(content: &Value, key: &str) -> Option<String> {
    content
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve `Object.Member` names, falling back to an `objectName`
/// content field.
fn split_scoped(name: &str, content: &Value, member_label: &str) -> Result<(String, String)> {
    if let Some((object, member)) = name.split_once('.') {
        return Ok((object.to_string(), member.to_string()));
    }
    match opt_str(content, "objectName") {
        Some(object) => Ok((object, name.to_string())),
        None => Err(Error::new(ErrorKind::InvalidContent(format!(
            "name must be in format 'ObjectName.{member_label}' (or provide objectName in content)"
        )))),
    }
}

/// Resolve `Folder/Name` template names, falling back to a
/// `folderName` content field.
fn split_slash_scoped(name: &str, content: &Value) -> Result<(String, String)> {
    if let Some((folder, template)) = name.split_once('/') {
        return Ok((folder.to_string(), template.to_string()));
    }
    match opt_str(content, "folderName") {
        Some(folder) => Ok((folder, name.to_string())),
        None => Err(Error::new(ErrorKind::InvalidContent(
            "name must be in format 'FolderName/TemplateName' (or provide folderName in content)"
                .to_string(),
        ))),
    }
}

/// Build a field definition from the content document's type and
/// type-specific parameters.
fn field_from_content(field_name: &str, content: &Value) -> Result<FieldConfig> {
    let label = req_str(content, "label")?;
    let type_name = opt_str(content, "type").unwrap_or_else(|| "Text".to_string());

    let num = |key: &str, default: u32| -> u32 {
        content
            .get(key)
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(default)
    };

    let field_type = match type_name.as_str() {
        "Text" => FieldType::Text {
            length: num("length", 255),
        },
        "LongTextArea" => FieldType::LongTextArea {
            length: num("length", 32768),
            visible_lines: num("visibleLines", 3),
        },
        "Number" => FieldType::Number {
            precision: num("precision", 18),
            scale: num("scale", 0),
        },
        "Currency" => FieldType::Currency {
            precision: num("precision", 18),
            scale: num("scale", 2),
        },
        "Percent" => FieldType::Percent {
            precision: num("precision", 5),
            scale: num("scale", 2),
        },
        "Checkbox" => FieldType::Checkbox,
        "Date" => FieldType::Date,
        "DateTime" => FieldType::DateTime,
        "Email" => FieldType::Email,
        "Phone" => FieldType::Phone,
        "Url" => FieldType::Url,
        "Picklist" => {
            let values = content
                .get("picklistValues")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|v| PicklistValue {
                            full_name: v.to_string(),
                            label: None,
                            default: false,
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            if values.is_empty() {
                return Err(Error::new(ErrorKind::InvalidContent(
                    "Picklist fields require a non-empty picklistValues array".to_string(),
                )));
            }
            FieldType::Picklist { values }
        }
        "Lookup" => FieldType::Lookup {
            reference_to: req_str(content, "referenceTo")?,
            relationship_name: opt_str(content, "relationshipName"),
        },
        "MasterDetail" => FieldType::MasterDetail {
            reference_to: req_str(content, "referenceTo")?,
            relationship_name: opt_str(content, "relationshipName"),
        },
        other => {
            return Err(Error::new(ErrorKind::InvalidContent(format!(
                "Unsupported field type: {other}"
            ))));
        }
    };

    let mut field = FieldConfig::new(field_name, label, field_type);
    field.description = opt_str(content, "description");
    field.required = content
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    field.unique = content
        .get("unique")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    field.external_id = content
        .get("externalId")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    field.default_value = opt_str(content, "defaultValue");
    Ok(field)
}
