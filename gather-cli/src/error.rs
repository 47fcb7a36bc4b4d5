use std::process::ExitCode;

use crate::manifest::ManifestError;

/// Categories of application errors that can be matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppErrorKind {
    /// Argument validation errors
    ArgValidation,
    /// A source string could not be classified
    Classify,
    /// The destination already exists and `--no-clobber` was given
    DestinationExists,
    /// General IO errors
    IO,
    /// Manifest file reading errors
    ManifestRead,
    /// Manifest file parsing errors
    ManifestParse,
    /// Gathering errors. When gathering a manifest these are reported as they happen, so this
    /// variant only carries the exit code.
    Gather,
    /// Errors serialising metadata for output
    Output,
}

/// Internal error type that contains all application error variants.
#[derive(Debug, thiserror::Error)]
pub enum AppErrorInner {
    #[error("Argument error: {0}")]
    ArgValidation(String),
    #[error("failed to classify '{input}'")]
    Classify {
        input: String,
        #[source]
        err: gather::ClassifyError,
    },
    #[error("failed to classify {0} input(s)")]
    ClassifyMany(usize),
    #[error(transparent)]
    DestinationExists(gather::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Failed to read manifest file: {manifest}")]
    ManifestRead {
        manifest: String,
        #[source]
        err: std::io::Error,
    },
    #[error("Failed to parse manifest file: {manifest}")]
    ManifestParse {
        manifest: String,
        #[source]
        err: ManifestError,
    },
    #[error("failed to gather '{source_uri}'")]
    GatherOne {
        source_uri: String,
        #[source]
        err: gather::Error,
    },
    #[error("Failed to gather one or more source(s)")]
    Gather,
    #[error("failed to format output")]
    Output(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The main application-level error type. The kind decides the process exit code while the inner
/// error keeps the context of what the application was doing when it failed.
#[derive(Debug)]
pub struct AppError(Box<AppErrorInner>, AppErrorKind);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl AppError {
    pub fn new(inner: AppErrorInner, kind: AppErrorKind) -> Self {
        Self(Box::new(inner), kind)
    }

    pub fn error_kind(&self) -> &AppErrorKind {
        &self.1
    }

    pub fn arg_validation(msg: String) -> Self {
        Self::new(AppErrorInner::ArgValidation(msg), AppErrorKind::ArgValidation)
    }

    pub fn classify(input: String, err: gather::ClassifyError) -> Self {
        Self::new(AppErrorInner::Classify { input, err }, AppErrorKind::Classify)
    }

    pub fn classify_many(failed: usize) -> Self {
        Self::new(AppErrorInner::ClassifyMany(failed), AppErrorKind::Classify)
    }

    pub fn manifest_read(manifest: String, err: std::io::Error) -> Self {
        Self::new(
            AppErrorInner::ManifestRead { manifest, err },
            AppErrorKind::ManifestRead,
        )
    }

    pub fn manifest_parse(manifest: String, err: ManifestError) -> Self {
        Self::new(
            AppErrorInner::ManifestParse { manifest, err },
            AppErrorKind::ManifestParse,
        )
    }

    /// Wrap an error from gathering a single source. Destination validation failures and
    /// classification failures keep their own kinds.
    pub fn gather_one(source_uri: String, err: gather::Error) -> Self {
        match err {
            gather::Error::DestinationExists { .. } => Self::new(
                AppErrorInner::DestinationExists(err),
                AppErrorKind::DestinationExists,
            ),
            gather::Error::Classify(err) => Self::classify(source_uri, err),
            err => Self::new(
                AppErrorInner::GatherOne { source_uri, err },
                AppErrorKind::Gather,
            ),
        }
    }

    pub fn gather() -> Self {
        Self::new(AppErrorInner::Gather, AppErrorKind::Gather)
    }

    pub fn output<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::new(AppErrorInner::Output(Box::new(err)), AppErrorKind::Output)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(AppErrorInner::IO(err), AppErrorKind::IO)
    }
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(match self.error_kind() {
            AppErrorKind::Gather => 1,
            AppErrorKind::ArgValidation
            | AppErrorKind::Classify
            | AppErrorKind::DestinationExists => 2,
            _ => 3,
        })
    }
}

impl From<AppError> for ExitCode {
    fn from(error: AppError) -> Self {
        error.exit_code()
    }
}

#[cfg(test)]
mod test_exit_codes {
    use super::*;

    #[test]
    fn gather_failures_exit_with_one() {
        let err = AppError::gather_one("./x".into(), gather::Error::Cancelled);
        assert_eq!(err.error_kind(), &AppErrorKind::Gather);
        assert_eq!(format!("{:?}", ExitCode::from(err)), format!("{:?}", ExitCode::from(1)));
    }

    #[test]
    fn destination_and_classify_failures_exit_with_two() {
        let err = AppError::gather_one(
            "./x".into(),
            gather::Error::DestinationExists {
                path: "/tmp/x".into(),
            },
        );
        assert_eq!(err.error_kind(), &AppErrorKind::DestinationExists);
        assert!(err.to_string().contains("destination already exists"));

        let err = AppError::gather_one(
            "ftp://host/x".into(),
            gather::Error::Classify(gather::ClassifyError::UnsupportedProtocol {
                scheme: "ftp".into(),
            }),
        );
        assert_eq!(err.error_kind(), &AppErrorKind::Classify);
        assert_eq!(format!("{:?}", err.exit_code()), format!("{:?}", ExitCode::from(2)));
    }

    #[test]
    fn manifest_failures_exit_with_three() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = AppError::manifest_read("Gather.toml".into(), io);
        assert_eq!(err.error_kind(), &AppErrorKind::ManifestRead);
        assert_eq!(format!("{:?}", err.exit_code()), format!("{:?}", ExitCode::from(3)));
    }
}
