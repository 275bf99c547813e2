//! Connection model: org identity, credentials, and the authenticated
//! API handle.
//!
//! There is no process-global "active org". Every operation receives the
//! org it targets, either as a ready [`Connection`] or as an [`OrgContext`]
//! resolved through a [`ConnectionFactory`].
//!
//! ## Security
//!
//! Access tokens are redacted in Debug output.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::http::SfHttpClient;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// Identifies the org an operation targets.
///
/// A context is just a value; two calls with different contexts can run
/// against different orgs without any shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrgContext {
    /// Provider-scoped alias for the org (a username, a sandbox name,
    /// whatever the credential provider keys on).
    pub alias: String,
}

impl OrgContext {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }
}

/// An access credential for one org.
#[derive(Clone)]
pub struct Credential {
    /// Instance URL, e.g. `https://myorg.my.salesforce.com`.
    pub instance_url: String,
    /// OAuth access token.
    pub access_token: String,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// How long the token is good for after issue.
    pub lifetime: Duration,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Default session lifetime assumed when the provider does not say.
pub const DEFAULT_CREDENTIAL_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

impl Credential {
    /// Create a credential issued now with the default lifetime.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            issued_at: Utc::now(),
            lifetime: DEFAULT_CREDENTIAL_LIFETIME,
        }
    }

    /// Whether the credential should be refreshed before use.
    ///
    /// Pure function of its inputs: true when `now` is within `threshold`
    /// of the expiry instant, or past it.
    pub fn needs_refresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let expires_at = self.issued_at
            + chrono::TimeDelta::from_std(self.lifetime).unwrap_or(chrono::TimeDelta::MAX);
        let refresh_at = expires_at
            - chrono::TimeDelta::from_std(threshold).unwrap_or(chrono::TimeDelta::zero());
        now >= refresh_at
    }
}

/// Source of credentials for orgs.
///
/// This is the seam to whatever performs the actual OAuth flows; the
/// toolkit only consumes tokens through it.
pub trait CredentialProvider: Send + Sync {
    /// Return the current credential for the org.
    fn credential(
        &self,
        org: &OrgContext,
    ) -> impl std::future::Future<Output = Result<Credential>> + Send;

    /// Obtain a fresh credential for the org, replacing any cached one.
    fn refresh(
        &self,
        org: &OrgContext,
    ) -> impl std::future::Future<Output = Result<Credential>> + Send;
}

/// Provider backed by a fixed set of credentials, keyed by org alias.
///
/// Useful for tests and for environments where tokens are injected from
/// outside. `refresh` re-issues the same stored credential with a new
/// `issued_at`.
#[derive(Debug, Default)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, Credential>,
}

impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential for an org alias.
    pub fn with_credential(mut self, alias: impl Into<String>, credential: Credential) -> Self {
        self.credentials.insert(alias.into(), credential);
        self
    }

    fn lookup(&self, org: &OrgContext) -> Result<Credential> {
        self.credentials.get(&org.alias).cloned().ok_or_else(|| {
            Error::new(ErrorKind::Credential(format!(
                "no credential registered for org '{}'",
                org.alias
            )))
        })
    }
}

impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self, org: &OrgContext) -> Result<Credential> {
        self.lookup(org)
    }

    async fn refresh(&self, org: &OrgContext) -> Result<Credential> {
        let mut credential = self.lookup(org)?;
        credential.issued_at = Utc::now();
        Ok(credential)
    }
}

/// Builds [`Connection`]s through a [`CredentialProvider`], refreshing
/// stale credentials before handing them out.
///
/// Refresh is serialized through an internal lock so concurrent acquires
/// for the same factory do not stampede the provider.
#[derive(Debug)]
pub struct ConnectionFactory<P> {
    provider: P,
    config: ClientConfig,
    api_version: String,
    refresh_threshold: Duration,
    cache: tokio::sync::Mutex<HashMap<String, Credential>>,
}

impl<P: CredentialProvider> ConnectionFactory<P> {
    /// Create a factory with default client config and API version.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: ClientConfig::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            refresh_threshold: Duration::from_secs(5 * 60),
            cache: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Set the HTTP client configuration used for built connections.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API version used for built connections.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set how close to expiry a credential may get before it is
    /// refreshed on acquire.
    pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Acquire a connection to the given org.
    ///
    /// Consults the provider, refreshing first when the cached credential
    /// is stale.
    #[instrument(skip(self), fields(org = %org.alias))]
    pub async fn acquire(&self, org: &OrgContext) -> Result<Connection> {
        // Holding the lock across the refresh serializes it per factory.
        let mut cache = self.cache.lock().await;

        let cached = match cache.get(&org.alias) {
            Some(credential) => credential.clone(),
            None => {
                let credential = self.provider.credential(org).await?;
                cache.insert(org.alias.clone(), credential.clone());
                credential
            }
        };

        let credential = if cached.needs_refresh(Utc::now(), self.refresh_threshold) {
            let fresh = self.provider.refresh(org).await?;
            cache.insert(org.alias.clone(), fresh.clone());
            fresh
        } else {
            cached
        };

        drop(cache);

        Connection::with_config(
            credential.instance_url,
            credential.access_token,
            self.config.clone(),
        )
        .map(|conn| conn.with_api_version(self.api_version.clone()))
    }
}

/// An authenticated handle to one org.
///
/// Combines instance URL, bearer token, and API version with the
/// retry-aware HTTP client, and exposes typed JSON methods plus the
/// SOQL/Tooling query surface.
#[derive(Clone)]
pub struct Connection {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Create a connection with default configuration.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a connection with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g. "59.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build the full URL for a path.
    ///
    /// Absolute URLs pass through; paths are appended to the instance URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build the REST API URL for a path.
    ///
    /// Example: `rest_url("sobjects/Account")` ->
    /// `{instance}/services/data/v59.0/sobjects/Account`
    pub fn rest_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Build the Tooling API URL for a path.
    pub fn tooling_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/tooling/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Build the Bulk API 2.0 URL for a path.
    pub fn bulk_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/jobs/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Build the metadata deploy-request URL, optionally for one job.
    pub fn deploy_request_url(&self, job_id: Option<&str>) -> String {
        match job_id {
            Some(id) => format!(
                "{}/services/data/v{}/metadata/deployRequest/{}",
                self.instance_url,
                self.api_version,
                crate::security::url::encode_param(id)
            ),
            None => format!(
                "{}/services/data/v{}/metadata/deployRequest",
                self.instance_url, self.api_version
            ),
        }
    }

    // =========================================================================
    // Base HTTP methods (with authentication)
    // =========================================================================

    /// Create a GET request builder with authentication.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    /// Create a POST request builder with authentication.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    /// Create a PATCH request builder with authentication.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(url).bearer_auth(&self.access_token)
    }

    /// Create a PUT request builder with authentication.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(url).bearer_auth(&self.access_token)
    }

    /// Create a DELETE request builder with authentication.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(url).bearer_auth(&self.access_token)
    }

    /// Execute a request and return the raw response.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    // =========================================================================
    // Typed JSON methods
    // =========================================================================

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let full_url = self.url(url);
        let response = self.http.execute(self.get(&full_url)).await?;
        response.json().await
    }

    /// POST request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let full_url = self.url(url);
        let request = self.post(&full_url).json(body)?;
        let response = self.http.execute(request).await?;
        response.json().await
    }

    /// PATCH request with JSON body; Salesforce returns 204 on success.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn patch_json<B: Serialize>(&self, url: &str, body: &B) -> Result<()> {
        let full_url = self.url(url);
        let request = self.patch(&full_url).json(body)?;
        self.http.execute(request).await?;
        Ok(())
    }

    // =========================================================================
    // Query surface
    // =========================================================================

    /// Execute a SOQL query against the REST API.
    #[instrument(skip(self, soql))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let request = self.get(&self.rest_url("query")).query("q", soql);
        self.http.send_json(request).await
    }

    /// Execute a SOQL query against the Tooling API.
    #[instrument(skip(self, soql))]
    pub async fn tooling_query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let request = self.get(&self.tooling_url("query")).query("q", soql);
        self.http.send_json(request).await
    }

    /// Execute a SOQL query and follow pagination until all records are
    /// collected.
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let mut result: QueryResult<T> = self.query(soql).await?;
        let mut records = std::mem::take(&mut result.records);

        while let Some(next_url) = result.next_records_url.take() {
            result = self.get_json(&next_url).await?;
            records.append(&mut result.records);
        }

        Ok(records)
    }

    // =========================================================================
    // sObject and org operations
    // =========================================================================

    /// Describe an sObject.
    pub async fn describe(&self, sobject: &str) -> Result<serde_json::Value> {
        self.get_json(&self.rest_url(&format!("sobjects/{}/describe", sobject)))
            .await
    }

    /// Create a record, returning the new ID.
    #[instrument(skip(self, body), fields(sobject = %sobject))]
    pub async fn create_record<B: Serialize>(
        &self,
        sobject: &str,
        body: &B,
    ) -> Result<CreateRecordResult> {
        self.post_json(&self.rest_url(&format!("sobjects/{}", sobject)), body)
            .await
    }

    /// Update a record by ID.
    #[instrument(skip(self, body), fields(sobject = %sobject, id = %id))]
    pub async fn update_record<B: Serialize>(
        &self,
        sobject: &str,
        id: &str,
        body: &B,
    ) -> Result<()> {
        self.patch_json(&self.rest_url(&format!("sobjects/{}/{}", sobject, id)), body)
            .await
    }

    /// Fetch org limits.
    pub async fn limits(&self) -> Result<serde_json::Value> {
        self.get_json(&self.rest_url("limits")).await
    }

    /// Execute anonymous Apex through the Tooling API.
    #[instrument(skip(self, code))]
    pub async fn execute_anonymous(&self, code: &str) -> Result<serde_json::Value> {
        let request = self
            .get(&self.tooling_url("executeAnonymous"))
            .query("anonymousBody", code);
        self.http.send_json(request).await
    }
}

/// Result of a SOQL query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    pub total_size: u64,
    /// Whether all records have been returned.
    pub done: bool,
    /// URL to fetch the next page, when `done` is false.
    #[serde(default)]
    pub next_records_url: Option<String>,
    /// The records in this page.
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

/// Result of creating a record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordResult {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}
