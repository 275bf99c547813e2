//! Package assembly: payload to deployable zip archive.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

use crate::error::{Error, ErrorKind, Result};
use crate::kind::MetadataKind;
use crate::payload::MetadataPayload;
use crate::xml;

/// A fully described deploy: which kind, which members, which files.
///
/// Owned per call; nothing here is shared or cached across deploys.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub kind: MetadataKind,
    /// The type name that goes into package.xml. Usually the kind's API
    /// name, but some kinds deploy under a different package type
    /// (record types and custom metadata types ship as CustomObject,
    /// labels as CustomLabels).
    pub package_type: String,
    pub members: Vec<String>,
    pub api_version: String,
    pub check_only: bool,
    /// Archive entries: (path, content).
    pub files: Vec<(String, Vec<u8>)>,
}

impl DeployRequest {
    /// Build a deploy request from a kind, primary name, and payload.
    ///
    /// `name` is the primary API name (class name, bundle name, field
    /// name without the object prefix); object-scoped payloads carry
    /// their object name themselves. Returns `InvalidPayload` when the
    /// payload variant does not match the kind.
    pub fn build(
        kind: MetadataKind,
        name: &str,
        payload: &MetadataPayload,
        api_version: &str,
    ) -> Result<Self> {
        let mut request = DeployRequest {
            kind,
            package_type: kind.api_name().to_string(),
            members: vec![name.to_string()],
            api_version: api_version.to_string(),
            check_only: false,
            files: Vec::new(),
        };

        match (kind, payload) {
            (MetadataKind::ApexClass, MetadataPayload::ApexClass { body, api_version }) => {
                request.api_version = api_version.clone();
                request.push_text(format!("classes/{name}.cls"), body);
                request.push_text(
                    format!("classes/{name}.cls-meta.xml"),
                    &xml::apex_meta_xml("ApexClass", api_version),
                );
            }
            (MetadataKind::ApexTrigger, MetadataPayload::ApexTrigger { body, api_version }) => {
                request.api_version = api_version.clone();
                request.push_text(format!("triggers/{name}.trigger"), body);
                request.push_text(
                    format!("triggers/{name}.trigger-meta.xml"),
                    &xml::apex_meta_xml("ApexTrigger", api_version),
                );
            }
            (
                MetadataKind::ValidationRule,
                MetadataPayload::ValidationRule {
                    object_name,
                    rule_name,
                    error_condition_formula,
                    error_message,
                    error_display_field,
                    description,
                    active,
                },
            ) => {
                request.members = vec![format!("{object_name}.{rule_name}")];
                request.push_text(
                    format!("objects/{object_name}.object"),
                    &xml::validation_rule_xml(
                        rule_name,
                        error_condition_formula,
                        error_message,
                        error_display_field.as_deref(),
                        description.as_deref(),
                        *active,
                    ),
                );
            }
            (
                MetadataKind::LightningComponentBundle,
                MetadataPayload::LightningComponentBundle {
                    html,
                    js,
                    css,
                    svg,
                    description,
                },
            ) => {
                let base = format!("lwc/{name}");
                request.push_text(format!("{base}/{name}.html"), html);
                request.push_text(format!("{base}/{name}.js"), js);
                request.push_text(
                    format!("{base}/{name}.js-meta.xml"),
                    &xml::lwc_meta_xml(description.as_deref(), api_version),
                );
                if let Some(css) = css.as_deref().filter(|c| !c.is_empty()) {
                    request.push_text(format!("{base}/{name}.css"), css);
                }
                if let Some(svg) = svg.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}.svg"), svg);
                }
            }
            (
                MetadataKind::AuraDefinitionBundle,
                MetadataPayload::AuraDefinitionBundle {
                    description,
                    controller_js,
                    helper_js,
                    style_css,
                    documentation,
                    renderer_js,
                },
            ) => {
                let base = format!("aura/{name}");
                request.push_text(
                    format!("{base}/{name}.cmp"),
                    &xml::aura_markup(description.as_deref()),
                );
                if let Some(js) = controller_js.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}Controller.js"), js);
                }
                if let Some(js) = helper_js.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}Helper.js"), js);
                }
                if let Some(css) = style_css.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}.css"), css);
                }
                if let Some(doc) = documentation.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}.auradoc"), doc);
                }
                if let Some(js) = renderer_js.as_deref().filter(|s| !s.is_empty()) {
                    request.push_text(format!("{base}/{name}Renderer.js"), js);
                }
            }
            (
                MetadataKind::CustomObject,
                MetadataPayload::CustomObject {
                    label,
                    plural_label,
                    description,
                    sharing_model,
                    deployment_status,
                },
            ) => {
                request.push_text(
                    format!("objects/{name}.object"),
                    &xml::custom_object_xml(
                        label,
                        plural_label,
                        description.as_deref(),
                        sharing_model,
                        deployment_status,
                    ),
                );
            }
            (MetadataKind::CustomField, MetadataPayload::CustomField { object_name, field }) => {
                request.members = vec![format!("{object_name}.{}", field.full_name)];
                request.push_text(
                    format!("objects/{object_name}.object"),
                    &xml::object_with_field_xml(object_name, field),
                );
            }
            (
                MetadataKind::Flow,
                MetadataPayload::Flow {
                    label,
                    description,
                    process_type,
                },
            ) => {
                request.push_text(
                    format!("flows/{name}.flow-meta.xml"),
                    &xml::flow_xml(label, description.as_deref(), process_type, api_version),
                );
            }
            (
                MetadataKind::EmailTemplate,
                MetadataPayload::EmailTemplate {
                    folder_name,
                    display_name,
                    subject,
                    body,
                    available,
                    description,
                },
            ) => {
                let member = format!("{folder_name}/{name}");
                request.members = vec![member.clone()];
                request.push_text(format!("email/{member}.email"), body);
                request.push_text(
                    format!("email/{member}.email-meta.xml"),
                    &xml::email_template_meta_xml(
                        folder_name,
                        name,
                        display_name,
                        subject,
                        *available,
                        description.as_deref(),
                    ),
                );
            }
            (
                MetadataKind::PermissionSet,
                MetadataPayload::PermissionSet { label, description },
            ) => {
                request.push_text(
                    format!("permissionsets/{name}.permissionset-meta.xml"),
                    &xml::permission_set_xml(label, description.as_deref()),
                );
            }
            (
                MetadataKind::StaticResource,
                MetadataPayload::StaticResource {
                    content,
                    content_type,
                    cache_control,
                    description,
                },
            ) => {
                let ext = xml::static_resource_extension(content_type);
                request
                    .files
                    .push((format!("staticresources/{name}.{ext}"), content.clone()));
                request.push_text(
                    format!("staticresources/{name}.resource-meta.xml"),
                    &xml::static_resource_meta_xml(
                        content_type,
                        cache_control,
                        description.as_deref(),
                    ),
                );
            }
            (
                MetadataKind::CustomMetadataType,
                MetadataPayload::CustomMetadataType {
                    label,
                    plural_label,
                    description,
                },
            ) => {
                // Custom metadata types deploy as CustomObject members
                request.package_type = "CustomObject".to_string();
                request.push_text(
                    format!("objects/{name}.object"),
                    &xml::custom_metadata_type_xml(label, plural_label, description.as_deref()),
                );
            }
            (
                MetadataKind::CustomLabel,
                MetadataPayload::CustomLabel {
                    value,
                    category,
                    language,
                    protected,
                    short_description,
                },
            ) => {
                request.package_type = "CustomLabels".to_string();
                request.members = vec!["CustomLabels".to_string()];
                request.push_text(
                    "labels/CustomLabels.labels".to_string(),
                    &xml::custom_labels_xml(
                        name,
                        value,
                        category.as_deref(),
                        language,
                        *protected,
                        short_description.as_deref(),
                    ),
                );
            }
            (
                MetadataKind::RecordType,
                MetadataPayload::RecordType {
                    object_name,
                    label,
                    description,
                    active,
                },
            ) => {
                // Record types ride along on their object's document
                request.package_type = "CustomObject".to_string();
                request.members = vec![object_name.clone()];
                request.push_text(
                    format!("objects/{object_name}.object"),
                    &xml::record_type_object_xml(name, label, description.as_deref(), *active),
                );
            }
            (
                MetadataKind::QuickAction,
                MetadataPayload::QuickAction {
                    label,
                    action_type,
                    target_object,
                    description,
                    icon,
                },
            ) => {
                request.push_text(
                    format!("quickActions/{name}.quickAction"),
                    &xml::quick_action_xml(
                        label,
                        action_type,
                        target_object.as_deref(),
                        description.as_deref(),
                        icon,
                    ),
                );
            }
            (
                MetadataKind::CustomTab,
                MetadataPayload::CustomTab {
                    label,
                    motif,
                    custom_object,
                    url,
                    description,
                },
            ) => {
                request.push_text(
                    format!("tabs/{name}.tab"),
                    &xml::custom_tab_xml(
                        label,
                        motif,
                        *custom_object,
                        url.as_deref(),
                        description.as_deref(),
                    ),
                );
            }
            (kind, _) => {
                return Err(Error::new(ErrorKind::InvalidPayload(format!(
                    "payload variant does not match metadata kind {kind}"
                ))));
            }
        }

        Ok(request)
    }

    /// Request a validate-only deploy.
    pub fn check_only(mut self) -> Self {
        self.check_only = true;
        self
    }

    fn push_text(&mut self, path: String, content: &str) {
        self.files.push((path, content.as_bytes().to_vec()));
    }

    /// Assemble the archive: package.xml plus every payload file at its
    /// platform path.
    pub fn assemble(&self) -> Result<Vec<u8>> {
        if self.members.is_empty() {
            return Err(Error::new(ErrorKind::EmptyMemberList));
        }

        let package_xml = xml::package_xml(&self.package_type, &self.members, &self.api_version);

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("package.xml", options)?;
        writer
            .write_all(package_xml.as_bytes())
            .map_err(|e| Error::with_source(ErrorKind::Archive(e.to_string()), e))?;

        for (path, content) in &self.files {
            writer.start_file(path.as_str(), options)?;
            writer
                .write_all(content)
                .map_err(|e| Error::with_source(ErrorKind::Archive(e.to_string()), e))?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{FieldConfig, FieldType};
    use std::io::Read;

    fn read_entry(archive_bytes: &[u8], path: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes)).unwrap();
        let mut entry = archive.by_name(path).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_apex_class_round_trip() {
        let body = "public class Foo {}";
        let payload = MetadataPayload::ApexClass {
            body: body.to_string(),
            api_version: "59.0".to_string(),
        };
        let request =
            DeployRequest::build(MetadataKind::ApexClass, "Foo", &payload, "59.0").unwrap();
        let bytes = request.assemble().unwrap();

        let pkg = read_entry(&bytes, "package.xml");
        assert!(pkg.contains("<members>Foo</members>"));
        assert!(pkg.contains("<name>ApexClass</name>"));
        assert_eq!(pkg.matches("<members>").count(), 1);

        assert_eq!(read_entry(&bytes, "classes/Foo.cls"), body);
        assert!(read_entry(&bytes, "classes/Foo.cls-meta.xml").contains("<status>Active</status>"));
    }

    #[test]
    fn test_custom_field_member_is_object_scoped() {
        let payload = MetadataPayload::CustomField {
            object_name: "Invoice__c".to_string(),
            field: FieldConfig::new("Code__c", "Code", FieldType::Text { length: 50 }),
        };
        let request =
            DeployRequest::build(MetadataKind::CustomField, "Code__c", &payload, "59.0").unwrap();

        assert_eq!(request.members, vec!["Invoice__c.Code__c".to_string()]);
        let bytes = request.assemble().unwrap();
        let obj = read_entry(&bytes, "objects/Invoice__c.object");
        assert!(obj.contains("<fullName>Code__c</fullName>"));
    }

    #[test]
    fn test_record_type_packages_as_custom_object() {
        let payload = MetadataPayload::RecordType {
            object_name: "Account".to_string(),
            label: "Partner".to_string(),
            description: None,
            active: true,
        };
        let request =
            DeployRequest::build(MetadataKind::RecordType, "Partner", &payload, "59.0").unwrap();

        assert_eq!(request.package_type, "CustomObject");
        assert_eq!(request.members, vec!["Account".to_string()]);
        let bytes = request.assemble().unwrap();
        assert!(read_entry(&bytes, "objects/Account.object").contains("<recordTypes>"));
    }

    #[test]
    fn test_lwc_bundle_paths() {
        let payload = MetadataPayload::LightningComponentBundle {
            html: "<template></template>".to_string(),
            js: "export default class {}".to_string(),
            css: Some(".x { color: red; }".to_string()),
            svg: None,
            description: None,
        };
        let request = DeployRequest::build(
            MetadataKind::LightningComponentBundle,
            "helloWorld",
            &payload,
            "59.0",
        )
        .unwrap();
        let bytes = request.assemble().unwrap();

        assert!(read_entry(&bytes, "lwc/helloWorld/helloWorld.html").contains("<template>"));
        assert!(
            read_entry(&bytes, "lwc/helloWorld/helloWorld.js-meta.xml").contains("<isExposed>")
        );
        assert!(read_entry(&bytes, "lwc/helloWorld/helloWorld.css").contains("color: red"));
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let payload = MetadataPayload::Flow {
            label: "My Flow".to_string(),
            description: None,
            process_type: "AutoLaunchedFlow".to_string(),
        };
        let err =
            DeployRequest::build(MetadataKind::ApexClass, "Foo", &payload, "59.0").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidPayload(_)));
    }

    #[test]
    fn test_empty_members_rejected() {
        let payload = MetadataPayload::ApexClass {
            body: String::new(),
            api_version: "59.0".to_string(),
        };
        let mut request =
            DeployRequest::build(MetadataKind::ApexClass, "Foo", &payload, "59.0").unwrap();
        request.members.clear();
        let err = request.assemble().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::EmptyMemberList));
    }
}
