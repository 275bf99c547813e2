//! Per-kind deploy payloads.
//!
//! A [`MetadataPayload`] carries exactly the data one kind's generator
//! needs. The variant shapes mirror the platform's metadata schema and
//! must be preserved for the deploy to be accepted.

/// Variant data describing what to deploy, keyed by metadata kind.
#[derive(Debug, Clone)]
pub enum MetadataPayload {
    ApexClass {
        body: String,
        api_version: String,
    },
    ApexTrigger {
        body: String,
        api_version: String,
    },
    ValidationRule {
        object_name: String,
        rule_name: String,
        error_condition_formula: String,
        error_message: String,
        error_display_field: Option<String>,
        description: Option<String>,
        active: bool,
    },
    LightningComponentBundle {
        html: String,
        js: String,
        css: Option<String>,
        svg: Option<String>,
        description: Option<String>,
    },
    AuraDefinitionBundle {
        description: Option<String>,
        controller_js: Option<String>,
        helper_js: Option<String>,
        style_css: Option<String>,
        documentation: Option<String>,
        renderer_js: Option<String>,
    },
    CustomObject {
        label: String,
        plural_label: String,
        description: Option<String>,
        sharing_model: String,
        deployment_status: String,
    },
    CustomField {
        object_name: String,
        field: FieldConfig,
    },
    Flow {
        label: String,
        description: Option<String>,
        process_type: String,
    },
    EmailTemplate {
        folder_name: String,
        display_name: String,
        subject: String,
        body: String,
        available: bool,
        description: Option<String>,
    },
    PermissionSet {
        label: String,
        description: Option<String>,
    },
    StaticResource {
        content: Vec<u8>,
        content_type: String,
        cache_control: String,
        description: Option<String>,
    },
    CustomMetadataType {
        label: String,
        plural_label: String,
        description: Option<String>,
    },
    CustomLabel {
        value: String,
        category: Option<String>,
        language: String,
        protected: bool,
        short_description: Option<String>,
    },
    RecordType {
        object_name: String,
        label: String,
        description: Option<String>,
        active: bool,
    },
    QuickAction {
        label: String,
        action_type: String,
        target_object: Option<String>,
        description: Option<String>,
        icon: String,
    },
    CustomTab {
        label: String,
        motif: String,
        custom_object: bool,
        url: Option<String>,
        description: Option<String>,
    },
}

/// Configuration for a single custom field.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// Field API name, e.g. `Customer_Code__c`.
    pub full_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub description: Option<String>,
    pub required: bool,
    pub unique: bool,
    pub external_id: bool,
    pub default_value: Option<String>,
}

impl FieldConfig {
    pub fn new(full_name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            full_name: full_name.into(),
            label: label.into(),
            field_type,
            description: None,
            required: false,
            unique: false,
            external_id: false,
            default_value: None,
        }
    }
}

/// Type-specific attributes for a custom field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Text { length: u32 },
    LongTextArea { length: u32, visible_lines: u32 },
    Number { precision: u32, scale: u32 },
    Currency { precision: u32, scale: u32 },
    Percent { precision: u32, scale: u32 },
    Checkbox,
    Date,
    DateTime,
    Email,
    Phone,
    Url,
    Picklist { values: Vec<PicklistValue> },
    Lookup { reference_to: String, relationship_name: Option<String> },
    MasterDetail { reference_to: String, relationship_name: Option<String> },
}

impl FieldType {
    /// The platform's field type name.
    pub fn api_name(&self) -> &'static str {
        match self {
            FieldType::Text { .. } => "Text",
            FieldType::LongTextArea { .. } => "LongTextArea",
            FieldType::Number { .. } => "Number",
            FieldType::Currency { .. } => "Currency",
            FieldType::Percent { .. } => "Percent",
            FieldType::Checkbox => "Checkbox",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
            FieldType::Url => "Url",
            FieldType::Picklist { .. } => "Picklist",
            FieldType::Lookup { .. } => "Lookup",
            FieldType::MasterDetail { .. } => "MasterDetail",
        }
    }
}

/// One entry in a picklist value set.
#[derive(Debug, Clone)]
pub struct PicklistValue {
    pub full_name: String,
    pub label: Option<String>,
    pub default: bool,
}
