use thiserror::Error;

/// Failure taxonomy for one ingestion run.
///
/// `Config` is fatal and aborts startup. Every other variant is scoped to a
/// single record: the driver logs it, counts it and moves on.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("graph write failed: {0}")]
    Write(#[from] StoreError),
}

impl IngestError {
    /// Stable label used for the per-kind failure counts in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Config(_) => "config",
            IngestError::MalformedInput(_) | IngestError::MissingField(_) => "malformed_input",
            IngestError::Provider(_) => "provider",
            IngestError::Write(_) => "write",
        }
    }
}

/// Errors raised by a graph store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A MATCH-based step found no Patent to attach to. Not retryable: it means
    /// an earlier step failed or the node was deleted concurrently.
    #[error("no Patent node with application_number {0}")]
    MissingPatent(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http: {0}")]
    Http(String),

    #[error("neo4j {code}: {message}")]
    Neo4j { code: String, message: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("{0}")]
    Config(String),
}
