//! # forcebridge
//!
//! A Salesforce metadata deploy and org operations toolkit, built for
//! programmatic (agent-driven) use.
//!
//! ## Crates
//!
//! - **forcebridge-sf-client** - HTTP client, connections, credentials,
//!   retry with backoff, input escaping
//! - **forcebridge-sf-metadata** - Metadata kinds, package assembly,
//!   deploy submit/poll over the Metadata REST API
//! - **forcebridge-sf-ops** - Per-kind create/update/fetch operations,
//!   alias dispatch, FLS grants, SOQL and diagnostics tools with
//!   uniform JSON responses
//! - **forcebridge-sf-bulk** - Bulk API 2.0 ingest pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forcebridge::client::Connection;
//! use forcebridge::ops::OrgOps;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = Connection::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token",
//!     )?;
//!     let ops = OrgOps::new(conn);
//!
//!     let response = ops
//!         .create_apex_class("InvoiceService", "public class InvoiceService {}", None)
//!         .await;
//!     println!("{}", response.to_json_string());
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "bulk")]
pub use forcebridge_sf_bulk as bulk;
#[cfg(feature = "client")]
pub use forcebridge_sf_client as client;
#[cfg(feature = "metadata")]
pub use forcebridge_sf_metadata as metadata;
#[cfg(feature = "ops")]
pub use forcebridge_sf_ops as ops;

// Commonly used types at the top level
#[cfg(feature = "bulk")]
pub use forcebridge_sf_bulk::BulkClient;
#[cfg(feature = "client")]
pub use forcebridge_sf_client::{ClientConfig, Connection, ConnectionFactory, OrgContext};
#[cfg(feature = "metadata")]
pub use forcebridge_sf_metadata::{MetadataClient, MetadataKind};
#[cfg(feature = "ops")]
pub use forcebridge_sf_ops::{OrgOps, ToolResponse};
