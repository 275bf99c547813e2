//! The closed set of deployable metadata kinds.

use crate::error::{Error, ErrorKind, Result};

/// A deployable metadata kind.
///
/// The set is closed: anything not listed here is rejected at alias
/// resolution, before any payload or network work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    ApexClass,
    ApexTrigger,
    ValidationRule,
    LightningComponentBundle,
    AuraDefinitionBundle,
    CustomObject,
    CustomField,
    Flow,
    EmailTemplate,
    PermissionSet,
    StaticResource,
    CustomMetadataType,
    CustomLabel,
    RecordType,
    QuickAction,
    CustomTab,
}

/// Alias table mapping normalized user input to kinds.
///
/// Input is lowercased with spaces, underscores, and hyphens stripped
/// before lookup, so "Apex Class", "apex_class", and "ApexClass" all
/// resolve the same way.
const ALIASES: &[(&str, MetadataKind)] = &[
    ("apex", MetadataKind::ApexClass),
    ("apexclass", MetadataKind::ApexClass),
    ("class", MetadataKind::ApexClass),
    ("trigger", MetadataKind::ApexTrigger),
    ("apextrigger", MetadataKind::ApexTrigger),
    ("validation", MetadataKind::ValidationRule),
    ("validationrule", MetadataKind::ValidationRule),
    ("lwc", MetadataKind::LightningComponentBundle),
    ("lightningwebcomponent", MetadataKind::LightningComponentBundle),
    (
        "lightningcomponentbundle",
        MetadataKind::LightningComponentBundle,
    ),
    ("aura", MetadataKind::AuraDefinitionBundle),
    ("auracomponent", MetadataKind::AuraDefinitionBundle),
    ("auradefinitionbundle", MetadataKind::AuraDefinitionBundle),
    ("object", MetadataKind::CustomObject),
    ("customobject", MetadataKind::CustomObject),
    ("field", MetadataKind::CustomField),
    ("customfield", MetadataKind::CustomField),
    ("flow", MetadataKind::Flow),
    ("email", MetadataKind::EmailTemplate),
    ("emailtemplate", MetadataKind::EmailTemplate),
    ("permset", MetadataKind::PermissionSet),
    ("permissionset", MetadataKind::PermissionSet),
    ("static", MetadataKind::StaticResource),
    ("staticresource", MetadataKind::StaticResource),
    ("custommetadata", MetadataKind::CustomMetadataType),
    ("custommetadatatype", MetadataKind::CustomMetadataType),
    ("label", MetadataKind::CustomLabel),
    ("customlabel", MetadataKind::CustomLabel),
    ("recordtype", MetadataKind::RecordType),
    ("quickaction", MetadataKind::QuickAction),
    ("tab", MetadataKind::CustomTab),
    ("customtab", MetadataKind::CustomTab),
];

impl MetadataKind {
    /// All supported kinds.
    pub const ALL: [MetadataKind; 16] = [
        MetadataKind::ApexClass,
        MetadataKind::ApexTrigger,
        MetadataKind::ValidationRule,
        MetadataKind::LightningComponentBundle,
        MetadataKind::AuraDefinitionBundle,
        MetadataKind::CustomObject,
        MetadataKind::CustomField,
        MetadataKind::Flow,
        MetadataKind::EmailTemplate,
        MetadataKind::PermissionSet,
        MetadataKind::StaticResource,
        MetadataKind::CustomMetadataType,
        MetadataKind::CustomLabel,
        MetadataKind::RecordType,
        MetadataKind::QuickAction,
        MetadataKind::CustomTab,
    ];

    /// Resolve a user-supplied type string or alias to a kind.
    pub fn from_alias(input: &str) -> Result<Self> {
        let normalized: String = input
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();

        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::new(ErrorKind::InvalidMetadataKind(input.to_string())))
    }

    /// The platform's canonical type name, as used in package.xml.
    pub fn api_name(&self) -> &'static str {
        match self {
            MetadataKind::ApexClass => "ApexClass",
            MetadataKind::ApexTrigger => "ApexTrigger",
            MetadataKind::ValidationRule => "ValidationRule",
            MetadataKind::LightningComponentBundle => "LightningComponentBundle",
            MetadataKind::AuraDefinitionBundle => "AuraDefinitionBundle",
            MetadataKind::CustomObject => "CustomObject",
            MetadataKind::CustomField => "CustomField",
            MetadataKind::Flow => "Flow",
            MetadataKind::EmailTemplate => "EmailTemplate",
            MetadataKind::PermissionSet => "PermissionSet",
            MetadataKind::StaticResource => "StaticResource",
            MetadataKind::CustomMetadataType => "CustomMetadataType",
            MetadataKind::CustomLabel => "CustomLabel",
            MetadataKind::RecordType => "RecordType",
            MetadataKind::QuickAction => "QuickAction",
            MetadataKind::CustomTab => "CustomTab",
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}
