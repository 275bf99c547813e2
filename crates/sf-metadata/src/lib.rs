//! # forcebridge-sf-metadata
//!
//! Metadata deploy pipeline: package assembly, REST deploy submit, and
//! async status polling.
//!
//! ## Pipeline
//!
//! - **[`MetadataKind`]** - the closed set of deployable kinds, with
//!   alias resolution ("lwc", "permset", "Apex Class", ...)
//! - **[`MetadataPayload`]** - per-kind deploy data
//! - **[`DeployRequest`]** - maps a payload to package.xml members and
//!   archive entries, then assembles the zip
//! - **[`MetadataClient`]** - multipart submit to the deploy endpoint
//!   plus status polling until a terminal state
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcebridge_sf_metadata::{
//!     DeployRequest, MetadataClient, MetadataKind, MetadataPayload,
//! };
//! use std::time::Duration;
//!
//! let payload = MetadataPayload::ApexClass {
//!     body: "public class Greeter {}".to_string(),
//!     api_version: "59.0".to_string(),
//! };
//! let request = DeployRequest::build(MetadataKind::ApexClass, "Greeter", &payload, "59.0")?;
//!
//! let client = MetadataClient::from_parts("https://myorg.my.salesforce.com", "token");
//! let outcome = client
//!     .deploy_and_wait(&request, Duration::from_secs(120), Duration::from_secs(2))
//!     .await?;
//! println!("deploy {}: {}", outcome.job_id, outcome.status);
//! ```

mod client;
mod deploy;
mod error;
mod kind;
mod package;
mod payload;
pub mod xml;

pub use client::{DeployStatusReport, MetadataClient};
pub use deploy::{DeployJob, DeployOptions, DeployOutcome, DeployStatus};
pub use error::{Error, ErrorKind, Result};
pub use kind::MetadataKind;
pub use package::DeployRequest;
pub use payload::{FieldConfig, FieldType, MetadataPayload, PicklistValue};

pub use forcebridge_sf_client::DEFAULT_API_VERSION;
