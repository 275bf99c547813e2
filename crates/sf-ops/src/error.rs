//! Error types for sf-ops.
//!
//! These never cross the tool boundary: every public facade operation
//! converts them into a uniform JSON response before returning.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Name fails the kind's naming rule; no network call was made.
    #[error("Invalid name: {0}")]
    InvalidName(String),
    /// Query fails the SOQL guard; no network call was made.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Content does not parse or is missing required fields.
    #[error("Invalid content: {0}")]
    InvalidContent(String),
    /// Create was asked for a component that already exists.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: String, name: String },
    /// Update/fetch was asked for a component that does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },
    /// Error from the metadata deploy pipeline.
    #[error("Metadata error: {0}")]
    Metadata(String),
    /// Error from the underlying client crate.
    #[error("Client error: {0}")]
    Client(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("{0}")]
    Other(String),
}

impl From<forcebridge_sf_client::Error> for Error {
    fn from(err: forcebridge_sf_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<forcebridge_sf_metadata::Error> for Error {
    fn from(err: forcebridge_sf_metadata::Error) -> Self {
        let kind = match &err.kind {
            forcebridge_sf_metadata::ErrorKind::InvalidMetadataKind(t) => {
                ErrorKind::InvalidContent(format!("Unknown metadata type: {t}"))
            }
            _ => ErrorKind::Metadata(err.to_string()),
        };
        Error {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Json(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
