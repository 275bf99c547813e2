//! # forcebridge-sf-client
//!
//! Core HTTP infrastructure for the forcebridge Salesforce toolkit.
//!
//! This crate provides the pieces every API surface builds on:
//!
//! - **`Connection`** - an authenticated handle to one org (instance URL,
//!   bearer token, API version) with typed JSON methods and SOQL/Tooling
//!   query helpers
//! - **`ConnectionFactory`** - acquires connections through a
//!   [`CredentialProvider`], refreshing expired credentials before use
//! - **`SfHttpClient`** - the underlying HTTP client with automatic retry,
//!   rate-limit handling, and Salesforce error parsing
//! - **`retry_with_backoff`** - an explicit retry combinator for wrapping
//!   idempotent operations at the call site
//! - **`security`** - SOQL and XML escaping helpers
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcebridge_sf_client::{Connection, QueryResult};
//!
//! let conn = Connection::new("https://myorg.my.salesforce.com", "token")?;
//! let result: QueryResult<serde_json::Value> =
//!     conn.query("SELECT Id, Name FROM Account LIMIT 10").await?;
//! ```

mod config;
mod connection;
mod error;
mod http;
mod request;
mod response;
mod retry;
pub mod security;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use connection::{
    Connection, ConnectionFactory, CreateRecordResult, Credential, CredentialProvider, OrgContext,
    QueryResult, StaticCredentialProvider,
};
pub use error::{Error, ErrorKind, Result};
pub use http::SfHttpClient;
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;
pub use retry::{retry_with_backoff, BackoffStrategy, RetryConfig, RetryPolicy};

/// Default Salesforce API version used when none is specified.
pub const DEFAULT_API_VERSION: &str = "59.0";

/// User-Agent header sent with every request.
pub const USER_AGENT: &str = concat!("forcebridge/", env!("CARGO_PKG_VERSION"));
