//! Metadata XML document generators.
//!
//! Each generator is a pure function from payload data to the document
//! the platform expects, with all user-supplied values escaped. Documents
//! carry the metadata namespace on the root element.

use crate::payload::{FieldConfig, FieldType, PicklistValue};
use forcebridge_sf_client::security::xml::escape;

const METADATA_NS: &str = "http://soap.sforce.com/2006/04/metadata";
const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

fn tag(buf: &mut String, indent: usize, name: &str, value: &str) {
    buf.push_str(&" ".repeat(indent));
    buf.push('<');
    buf.push_str(name);
    buf.push('>');
    buf.push_str(&escape(value));
    buf.push_str("</");
    buf.push_str(name);
    buf.push_str(">\n");
}

fn opt_tag(buf: &mut String, indent: usize, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        tag(buf, indent, name, value);
    }
}

fn bool_tag(buf: &mut String, indent: usize, name: &str, value: bool) {
    tag(buf, indent, name, if value { "true" } else { "false" });
}

/// Generate a package.xml with one types block for a single metadata type.
pub fn package_xml(type_name: &str, members: &[String], api_version: &str) -> String {
    let mut buf = format!("{XML_DECL}\n<Package xmlns=\"{METADATA_NS}\">\n");
    buf.push_str("    <types>\n");
    for member in members {
        tag(&mut buf, 8, "members", member);
    }
    tag(&mut buf, 8, "name", type_name);
    buf.push_str("    </types>\n");
    tag(&mut buf, 4, "version", api_version);
    buf.push_str("</Package>\n");
    buf
}

/// Generate the `.cls-meta.xml` / `.trigger-meta.xml` companion document.
pub fn apex_meta_xml(root_element: &str, api_version: &str) -> String {
    let mut buf = format!("{XML_DECL}\n<{root_element} xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "apiVersion", api_version);
    tag(&mut buf, 4, "status", "Active");
    buf.push_str(&format!("</{root_element}>\n"));
    buf
}

/// Generate a standalone ValidationRule document, written at the target
/// object's path.
#[allow(clippy::too_many_arguments)]
pub fn validation_rule_xml(
    rule_name: &str,
    error_condition_formula: &str,
    error_message: &str,
    error_display_field: Option<&str>,
    description: Option<&str>,
    active: bool,
) -> String {
    let mut buf = format!("{XML_DECL}\n<ValidationRule xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "fullName", rule_name);
    bool_tag(&mut buf, 4, "active", active);
    tag(&mut buf, 4, "errorConditionFormula", error_condition_formula);
    tag(&mut buf, 4, "errorMessage", error_message);
    opt_tag(&mut buf, 4, "errorDisplayField", error_display_field);
    opt_tag(&mut buf, 4, "description", description);
    buf.push_str("</ValidationRule>\n");
    buf
}

/// Generate a CustomObject document (no fields block).
pub fn custom_object_xml(
    label: &str,
    plural_label: &str,
    description: Option<&str>,
    sharing_model: &str,
    deployment_status: &str,
) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomObject xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "label", label);
    tag(&mut buf, 4, "pluralLabel", plural_label);
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "sharingModel", sharing_model);
    tag(&mut buf, 4, "deploymentStatus", deployment_status);
    bool_tag(&mut buf, 4, "enableActivities", true);
    bool_tag(&mut buf, 4, "enableReports", true);
    bool_tag(&mut buf, 4, "enableSearch", true);
    buf.push_str("    <nameField>\n");
    tag(&mut buf, 8, "label", &format!("{label} Name"));
    tag(&mut buf, 8, "type", "Text");
    buf.push_str("    </nameField>\n");
    buf.push_str("</CustomObject>\n");
    buf
}

/// Generate a CustomObject document carrying one `<fields>` block, used
/// to deploy a single custom field.
pub fn object_with_field_xml(object_name: &str, field: &FieldConfig) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomObject xmlns=\"{METADATA_NS}\">\n");

    // fullName only appears for custom objects
    if object_name.ends_with("__c") {
        tag(&mut buf, 4, "fullName", object_name);
    }

    buf.push_str("    <fields>\n");
    tag(&mut buf, 8, "fullName", &field.full_name);
    tag(&mut buf, 8, "label", &field.label);
    tag(&mut buf, 8, "type", field.field_type.api_name());
    field_type_attrs(&mut buf, &field.field_type);
    bool_tag(&mut buf, 8, "required", field.required);
    bool_tag(&mut buf, 8, "unique", field.unique);
    bool_tag(&mut buf, 8, "externalId", field.external_id);
    opt_tag(&mut buf, 8, "defaultValue", field.default_value.as_deref());
    opt_tag(&mut buf, 8, "description", field.description.as_deref());
    buf.push_str("    </fields>\n");
    buf.push_str("</CustomObject>\n");
    buf
}

fn field_type_attrs(buf: &mut String, field_type: &FieldType) {
    match field_type {
        FieldType::Text { length } => {
            tag(buf, 8, "length", &length.to_string());
        }
        FieldType::LongTextArea {
            length,
            visible_lines,
        } => {
            tag(buf, 8, "length", &length.to_string());
            tag(buf, 8, "visibleLines", &visible_lines.to_string());
        }
        FieldType::Number { precision, scale }
        | FieldType::Currency { precision, scale }
        | FieldType::Percent { precision, scale } => {
            tag(buf, 8, "precision", &precision.to_string());
            tag(buf, 8, "scale", &scale.to_string());
        }
        FieldType::Picklist { values } => picklist_value_set(buf, values),
        FieldType::Lookup {
            reference_to,
            relationship_name,
        }
        | FieldType::MasterDetail {
            reference_to,
            relationship_name,
        } => {
            tag(buf, 8, "referenceTo", reference_to);
            opt_tag(buf, 8, "relationshipName", relationship_name.as_deref());
        }
        FieldType::Checkbox
        | FieldType::Date
        | FieldType::DateTime
        | FieldType::Email
        | FieldType::Phone
        | FieldType::Url => {}
    }
}

fn picklist_value_set(buf: &mut String, values: &[PicklistValue]) {
    buf.push_str("        <valueSet>\n");
    tag(buf, 12, "restricted", "true");
    buf.push_str("            <valueSetDefinition>\n");
    for value in values {
        buf.push_str("                <value>\n");
        tag(buf, 20, "fullName", &value.full_name);
        tag(buf, 20, "label", value.label.as_deref().unwrap_or(&value.full_name));
        bool_tag(buf, 20, "default", value.default);
        buf.push_str("                </value>\n");
    }
    buf.push_str("            </valueSetDefinition>\n");
    buf.push_str("        </valueSet>\n");
}

/// Generate the `.js-meta.xml` companion for an LWC bundle.
pub fn lwc_meta_xml(description: Option<&str>, api_version: &str) -> String {
    let mut buf = format!("{XML_DECL}\n<LightningComponentBundle xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "apiVersion", api_version);
    bool_tag(&mut buf, 4, "isExposed", false);
    tag(&mut buf, 4, "description", description.unwrap_or_default());
    buf.push_str("    <targets>\n");
    tag(&mut buf, 8, "target", "lightning__RecordPage");
    tag(&mut buf, 8, "target", "lightning__AppPage");
    tag(&mut buf, 8, "target", "lightning__HomePage");
    buf.push_str("    </targets>\n");
    buf.push_str("</LightningComponentBundle>\n");
    buf
}

/// Generate minimal Aura component markup.
pub fn aura_markup(description: Option<&str>) -> String {
    format!(
        "<aura:component description=\"{}\">\n</aura:component>\n",
        escape(description.unwrap_or_default())
    )
}

/// Generate a minimal Flow document in Draft status.
pub fn flow_xml(
    label: &str,
    description: Option<&str>,
    process_type: &str,
    api_version: &str,
) -> String {
    let mut buf = format!("{XML_DECL}\n<Flow xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "apiVersion", api_version);
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "label", label);
    tag(&mut buf, 4, "processType", process_type);
    tag(&mut buf, 4, "status", "Draft");
    buf.push_str("    <decisions>\n");
    tag(&mut buf, 8, "name", "myDecision");
    tag(&mut buf, 8, "label", "My Decision");
    buf.push_str("    </decisions>\n");
    buf.push_str("</Flow>\n");
    buf
}

/// Generate the `.email-meta.xml` companion document.
pub fn email_template_meta_xml(
    folder_name: &str,
    template_name: &str,
    display_name: &str,
    subject: &str,
    available: bool,
    description: Option<&str>,
) -> String {
    let mut buf = format!("{XML_DECL}\n<EmailTemplate xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "fullName", &format!("{folder_name}/{template_name}"));
    tag(&mut buf, 4, "name", display_name);
    bool_tag(&mut buf, 4, "available", available);
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "encodingKey", "UTF-8");
    tag(&mut buf, 4, "subject", subject);
    tag(&mut buf, 4, "type", "text");
    buf.push_str("</EmailTemplate>\n");
    buf
}

/// Generate a PermissionSet document.
pub fn permission_set_xml(label: &str, description: Option<&str>) -> String {
    let mut buf = format!("{XML_DECL}\n<PermissionSet xmlns=\"{METADATA_NS}\">\n");
    opt_tag(&mut buf, 4, "description", description);
    bool_tag(&mut buf, 4, "hasActivationRequired", false);
    tag(&mut buf, 4, "label", label);
    buf.push_str("</PermissionSet>\n");
    buf
}

/// Generate the `.resource-meta.xml` companion document.
pub fn static_resource_meta_xml(
    content_type: &str,
    cache_control: &str,
    description: Option<&str>,
) -> String {
    let mut buf = format!("{XML_DECL}\n<StaticResource xmlns=\"{METADATA_NS}\">\n");
    tag(&mut buf, 4, "cacheControl", cache_control);
    tag(&mut buf, 4, "contentType", content_type);
    opt_tag(&mut buf, 4, "description", description);
    buf.push_str("</StaticResource>\n");
    buf
}

/// File extension for a static resource payload, from its content type.
pub fn static_resource_extension(content_type: &str) -> &'static str {
    match content_type {
        "text/javascript" | "application/javascript" => "js",
        "text/css" => "css",
        "text/html" => "html",
        "application/json" => "json",
        "application/zip" => "zip",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "resource",
    }
}

/// Generate a CustomObject document for a custom metadata type (`__mdt`).
pub fn custom_metadata_type_xml(
    label: &str,
    plural_label: &str,
    description: Option<&str>,
) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomObject xmlns=\"{METADATA_NS}\">\n");
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "label", label);
    tag(&mut buf, 4, "pluralLabel", plural_label);
    buf.push_str("</CustomObject>\n");
    buf
}

/// Generate a CustomLabels document carrying one label.
pub fn custom_labels_xml(
    label_name: &str,
    value: &str,
    category: Option<&str>,
    language: &str,
    protected: bool,
    short_description: Option<&str>,
) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomLabels xmlns=\"{METADATA_NS}\">\n");
    buf.push_str("    <labels>\n");
    tag(&mut buf, 8, "fullName", label_name);
    opt_tag(&mut buf, 8, "categories", category);
    tag(&mut buf, 8, "language", language);
    bool_tag(&mut buf, 8, "protected", protected);
    tag(
        &mut buf,
        8,
        "shortDescription",
        short_description.unwrap_or(label_name),
    );
    tag(&mut buf, 8, "value", value);
    buf.push_str("    </labels>\n");
    buf.push_str("</CustomLabels>\n");
    buf
}

/// Generate a CustomObject document carrying one `<recordTypes>` block.
pub fn record_type_object_xml(
    record_type_name: &str,
    label: &str,
    description: Option<&str>,
    active: bool,
) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomObject xmlns=\"{METADATA_NS}\">\n");
    buf.push_str("    <recordTypes>\n");
    tag(&mut buf, 8, "fullName", record_type_name);
    bool_tag(&mut buf, 8, "active", active);
    opt_tag(&mut buf, 8, "description", description);
    tag(&mut buf, 8, "label", label);
    buf.push_str("    </recordTypes>\n");
    buf.push_str("</CustomObject>\n");
    buf
}

/// Generate a QuickAction document.
pub fn quick_action_xml(
    label: &str,
    action_type: &str,
    target_object: Option<&str>,
    description: Option<&str>,
    icon: &str,
) -> String {
    let mut buf = format!("{XML_DECL}\n<QuickAction xmlns=\"{METADATA_NS}\">\n");
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "icon", icon);
    tag(&mut buf, 4, "label", label);
    tag(&mut buf, 4, "type", action_type);
    opt_tag(&mut buf, 4, "targetObject", target_object);
    buf.push_str("</QuickAction>\n");
    buf
}

/// Generate a CustomTab document.
pub fn custom_tab_xml(
    label: &str,
    motif: &str,
    custom_object: bool,
    url: Option<&str>,
    description: Option<&str>,
) -> String {
    let mut buf = format!("{XML_DECL}\n<CustomTab xmlns=\"{METADATA_NS}\">\n");
    if custom_object {
        bool_tag(&mut buf, 4, "customObject", true);
    }
    opt_tag(&mut buf, 4, "description", description);
    tag(&mut buf, 4, "label", label);
    tag(&mut buf, 4, "motif", motif);
    opt_tag(&mut buf, 4, "url", url);
    buf.push_str("</CustomTab>\n");
    buf
}
