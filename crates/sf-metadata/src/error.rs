//! Error types for sf-metadata.

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
    /// The supplied type string resolves to no supported metadata kind.
    #[error("Unknown metadata type: {0}")]
    InvalidMetadataKind(String),
    /// A package was requested with no members.
    #[error("Cannot assemble a package with no members")]
    EmptyMemberList,
    /// The payload variant does not match what the kind's generator needs.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    /// Zip assembly failed.
    #[error("Archive error: {0}")]
    Archive(String),
    /// The submit endpoint answered 2xx but without a job id.
    #[error("Malformed deploy submit response: {0}")]
    MalformedSubmitResponse(String),
    /// The submit endpoint rejected the deploy outright.
    #[error("Deploy submit failed with HTTP {status}: {body}")]
    SubmitFailure { status: u16, body: String },
    /// Error from the underlying client crate.
    #[error("Client error: {0}")]
    Client(String),
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),
    /// JSON serialization/deserialization failure.
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

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error {
            kind: ErrorKind::Http(err.to_string()),
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

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error {
            kind: ErrorKind::Archive(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
