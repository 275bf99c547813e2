//! High-level org operations: per-kind metadata tools, unified
//! dispatch, SOQL queries, and diagnostics.
//!
//! Every public operation returns a [`ToolResponse`] rather than a
//! `Result`. Failures are shaped into the response's `error` and
//! `hint` fields so a caller driving these tools programmatically
//! always gets a uniform JSON document back.
//!
//! ```no_run
//! use forcebridge_sf_client::Connection;
//! use forcebridge_sf_ops::OrgOps;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = Connection::new("https://example.my.salesforce.com", "token")?;
//! let ops = OrgOps::new(conn);
//! let response = ops
//!     .create_apex_class("InvoiceService", "public class InvoiceService {}", None)
//!     .await;
//! println!("{}", response.to_json_string());
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
mod ops;
mod query;
mod response;
pub mod validate;

pub use dispatch::Operation;
pub use error::{Error, ErrorKind, Result};
pub use ops::{FlsGrant, OrgOps, DEFAULT_DEPLOY_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use response::ToolResponse;
