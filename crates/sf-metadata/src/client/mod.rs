//! Metadata deploy client.

use crate::DEFAULT_API_VERSION;

mod poll;
mod submit;

pub use poll::DeployStatusReport;

/// Client for the metadata REST deploy endpoint.
#[derive(Debug)]
pub struct MetadataClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl MetadataClient {
    /// Create a client from an instance URL and access token.
    pub fn from_parts(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let instance_url = instance_url.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client sharing an existing connection's endpoint and token.
    pub fn from_connection(conn: &forcebridge_sf_client::Connection) -> Self {
        let mut client = Self::from_parts(conn.instance_url(), conn.access_token());
        client.api_version = conn.api_version().to_string();
        client
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Deploy request collection URL, or a single job's status URL.
    pub(crate) fn deploy_url(&self, job_id: Option<&str>) -> String {
        let base = format!(
            "{}/services/data/v{}/metadata/deployRequest",
            self.instance_url, self.api_version
        );
        match job_id {
            Some(id) => format!("{base}/{}", forcebridge_sf_client::security::url::encode_param(id)),
            None => base,
        }
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = MetadataClient::from_parts("https://test.salesforce.com", "token123");
        assert_eq!(client.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = MetadataClient::from_parts("https://test.salesforce.com/", "token123");
        assert_eq!(client.instance_url, "https://test.salesforce.com");
    }

    #[test]
    fn test_deploy_url_construction() {
        let client = MetadataClient::from_parts("https://na1.salesforce.com", "token")
            .with_api_version("62.0");
        assert_eq!(
            client.deploy_url(None),
            "https://na1.salesforce.com/services/data/v62.0/metadata/deployRequest"
        );
        assert_eq!(
            client.deploy_url(Some("0Af000000000001")),
            "https://na1.salesforce.com/services/data/v62.0/metadata/deployRequest/0Af000000000001"
        );
    }
}
