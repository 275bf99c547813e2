//! Salesforce Bulk API 2.0 ingest pipeline.
//!
//! Create a job, upload CSV data, close the job, poll it to a terminal
//! state, and fetch failed records. [`BulkClient::execute_ingest`]
//! runs the whole pipeline in one call.
//!
//! ```rust,ignore
//! use forcebridge_sf_bulk::{BulkClient, IngestOperation};
//!
//! let client = BulkClient::new(
//!     "https://myorg.my.salesforce.com",
//!     "access_token",
//! )?;
//!
//! let csv_data = "Name,Industry\nAcme Corp,Technology\nGlobal Inc,Finance";
//! let result = client
//!     .execute_ingest("Account", IngestOperation::Insert, csv_data, None)
//!     .await?;
//!
//! println!("Processed {} records", result.job.number_records_processed);
//! if let Some(failed) = result.failed_results {
//!     println!("Failed rows:\n{failed}");
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::BulkClient;
pub use error::{Error, ErrorKind, Result};
pub use types::*;
