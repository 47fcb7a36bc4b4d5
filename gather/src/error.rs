use crate::uri::UriType;

/// Errors produced when a source string cannot be classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The source parses as a URI whose scheme no transport understands.
    #[error("unsupported protocol: {scheme}")]
    UnsupportedProtocol { scheme: String },

    /// The source looks like a host name but carries no scheme.
    #[error("got {input}. HTTP(S) URIs require a scheme (http:// or https://)")]
    MissingScheme { input: String },
}

/// The main error enum for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to classify source URI: {0}")]
    Classify(#[from] ClassifyError),

    /// No gatherer is registered for the classified source.
    #[error("unsupported source protocol: {uri_type}")]
    UnsupportedProtocol { uri_type: UriType },

    #[error("destination already exists: {}", path.display())]
    DestinationExists { path: std::path::PathBuf },

    #[error("operation was cancelled")]
    Cancelled,

    #[error("source does not exist: {}", path.display())]
    SourceNotFound { path: std::path::PathBuf },

    #[error("invalid source '{source_uri}': {reason}")]
    InvalidSource { source_uri: String, reason: String },

    #[error("GET '{url}' failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Git2(#[from] git2::Error),
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn invalid_source<S: Into<String>, R: Into<String>>(source: S, reason: R) -> Self {
        Self::InvalidSource {
            source_uri: source.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is the result of the caller cancelling the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
