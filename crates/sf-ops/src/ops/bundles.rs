//! Component bundle and static resource operations.

use serde_json::Value;

use forcebridge_sf_metadata::{MetadataKind, MetadataPayload, DEFAULT_API_VERSION};

use crate::response::ToolResponse;
use crate::validate;

use super::OrgOps;

impl OrgOps {
    fn lwc_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, DeveloperName FROM LightningComponentBundle WHERE DeveloperName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new Lightning Web Component bundle.
    pub async fn create_lwc_component(
        &self,
        name: &str,
        html: &str,
        js: &str,
        css: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_lwc_component";
        let result = async {
            validate::lwc_name(name)?;
            let lookup = self.lwc_lookup(name);
            self.ensure_absent(MetadataKind::LightningComponentBundle, name, &lookup, true)
                .await?;
            let payload = lwc_payload(html, js, css);
            let response = self
                .deploy_op(
                    OP,
                    MetadataKind::LightningComponentBundle,
                    name,
                    &payload,
                    DEFAULT_API_VERSION,
                )
                .await?;
            Ok(response.with_field("component_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing Lightning Web Component bundle.
    pub async fn update_lwc_component(
        &self,
        name: &str,
        html: &str,
        js: &str,
        css: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_lwc_component";
        let result = async {
            validate::lwc_name(name)?;
            let lookup = self.lwc_lookup(name);
            self.ensure_present(MetadataKind::LightningComponentBundle, name, &lookup, true)
                .await?;
            let payload = lwc_payload(html, js, css);
            let response = self
                .deploy_op(
                    OP,
                    MetadataKind::LightningComponentBundle,
                    name,
                    &payload,
                    DEFAULT_API_VERSION,
                )
                .await?;
            Ok(response.with_field("component_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an LWC bundle and its source files.
    pub async fn fetch_lwc_component(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_lwc_component";
        let result = async {
            validate::lwc_name(name)?;
            let lookup = self.lwc_lookup(name);
            let bundle = self
                .ensure_present(MetadataKind::LightningComponentBundle, name, &lookup, true)
                .await?;
            let bundle_id = bundle.get("Id").and_then(Value::as_str).unwrap_or_default();
            let sources = format!(
                "SELECT Id, FilePath, Format, Source FROM LightningComponentResource \
                 WHERE LightningComponentBundleId = '{}'",
                Self::soql_str(bundle_id)
            );
            let files = self.conn.tooling_query::<Value>(&sources).await?.records;
            Ok(ToolResponse::success(OP)
                .with_data(bundle)
                .with_field("files", Value::Array(files)))
        }
        .await;
        Self::finish(OP, result)
    }

    fn aura_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, DeveloperName FROM AuraDefinitionBundle WHERE DeveloperName = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new Aura component bundle.
    pub async fn create_aura_component(
        &self,
        name: &str,
        description: Option<&str>,
        controller_js: Option<&str>,
        helper_js: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_aura_component";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.aura_lookup(name);
            self.ensure_absent(MetadataKind::AuraDefinitionBundle, name, &lookup, true)
                .await?;
            let payload = aura_payload(description, controller_js, helper_js);
            let response = self
                .deploy_op(
                    OP,
                    MetadataKind::AuraDefinitionBundle,
                    name,
                    &payload,
                    DEFAULT_API_VERSION,
                )
                .await?;
            Ok(response.with_field("component_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing Aura component bundle.
    pub async fn update_aura_component(
        &self,
        name: &str,
        description: Option<&str>,
        controller_js: Option<&str>,
        helper_js: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_aura_component";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.aura_lookup(name);
            self.ensure_present(MetadataKind::AuraDefinitionBundle, name, &lookup, true)
                .await?;
            let payload = aura_payload(description, controller_js, helper_js);
            let response = self
                .deploy_op(
                    OP,
                    MetadataKind::AuraDefinitionBundle,
                    name,
                    &payload,
                    DEFAULT_API_VERSION,
                )
                .await?;
            Ok(response.with_field("component_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch an Aura bundle definition.
    pub async fn fetch_aura_component(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_aura_component";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, DeveloperName, Description, ApiVersion FROM AuraDefinitionBundle \
                 WHERE DeveloperName = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::AuraDefinitionBundle, name, &soql, true)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }

    fn static_resource_lookup(&self, name: &str) -> String {
        format!(
            "SELECT Id, Name, ContentType FROM StaticResource WHERE Name = '{}' LIMIT 1",
            Self::soql_str(name)
        )
    }

    /// Create a new static resource.
    pub async fn create_static_resource(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "create_static_resource";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.static_resource_lookup(name);
            self.ensure_absent(MetadataKind::StaticResource, name, &lookup, false)
                .await?;
            let payload = static_resource_payload(content, content_type, description);
            let response = self
                .deploy_op(OP, MetadataKind::StaticResource, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("resource_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Update an existing static resource's content.
    pub async fn update_static_resource(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
        description: Option<&str>,
    ) -> ToolResponse {
        const OP: &str = "update_static_resource";
        let result = async {
            validate::api_name(name)?;
            let lookup = self.static_resource_lookup(name);
            self.ensure_present(MetadataKind::StaticResource, name, &lookup, false)
                .await?;
            let payload = static_resource_payload(content, content_type, description);
            let response = self
                .deploy_op(OP, MetadataKind::StaticResource, name, &payload, DEFAULT_API_VERSION)
                .await?;
            Ok(response.with_field("resource_name", Value::String(name.to_string())))
        }
        .await;
        Self::finish(OP, result)
    }

    /// Fetch a static resource's record (not its body).
    pub async fn fetch_static_resource(&self, name: &str) -> ToolResponse {
        const OP: &str = "fetch_static_resource";
        let result = async {
            validate::api_name(name)?;
            let soql = format!(
                "SELECT Id, Name, ContentType, BodyLength, CacheControl, Description \
                 FROM StaticResource WHERE Name = '{}' LIMIT 1",
                Self::soql_str(name)
            );
            let record = self
                .ensure_present(MetadataKind::StaticResource, name, &soql, false)
                .await?;
            Ok(ToolResponse::success(OP).with_data(record))
        }
        .await;
        Self::finish(OP, result)
    }
}

fn lwc_payload(html: &str, js: &str, css: Option<&str>) -> MetadataPayload {
    MetadataPayload::LightningComponentBundle {
        html: html.to_string(),
        js: js.to_string(),
        css: css.map(str::to_string),
        svg: None,
        description: None,
    }
}

fn aura_payload(
    description: Option<&str>,
    controller_js: Option<&str>,
    helper_js: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::AuraDefinitionBundle {
        description: description.map(str::to_string),
        controller_js: controller_js.map(str::to_string),
        helper_js: helper_js.map(str::to_string),
        style_css: None,
        documentation: None,
        renderer_js: None,
    }
}

fn static_resource_payload(
    content: Vec<u8>,
    content_type: &str,
    description: Option<&str>,
) -> MetadataPayload {
    MetadataPayload::StaticResource {
        content,
        content_type: content_type.to_string(),
        cache_control: "Public".to_string(),
        description: description.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::ops_for;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_lwc_name_must_start_lowercase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops
            .create_lwc_component("HelloWorld", "<template></template>", "export default {}", None)
            .await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("lowercase"));
    }

    #[tokio::test]
    async fn test_fetch_lwc_collects_bundle_sources() {
        let server = MockServer::start().await;
        let bundle = serde_json::json!({
            "totalSize": 1, "done": true,
            "records": [{"Id": "0Rb1", "DeveloperName": "helloWorld"}]
        });
        let sources = serde_json::json!({
            "totalSize": 1, "done": true,
            "records": [{"Id": "0Rd1", "FilePath": "lwc/helloWorld/helloWorld.js",
                         "Format": "js", "Source": "export default {}"}]
        });

        let bundle_clone = bundle.clone();
        let sources_clone = sources.clone();
        Mock::given(method("GET"))
            .and(path("/services/data/v59.0/tooling/query"))
            .respond_with(move |req: &wiremock::Request| {
                let q = req
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                if q.contains("LightningComponentResource") {
                    ResponseTemplate::new(200).set_body_json(sources_clone.clone())
                } else {
                    ResponseTemplate::new(200).set_body_json(bundle_clone.clone())
                }
            })
            .mount(&server)
            .await;

        let ops = ops_for(&server.uri());
        let response = ops.fetch_lwc_component("helloWorld").await;

        assert!(response.success);
        assert_eq!(response.data.unwrap()["DeveloperName"], "helloWorld");
        assert_eq!(
            response.extra["files"][0]["FilePath"],
            "lwc/helloWorld/helloWorld.js"
        );
    }
}
