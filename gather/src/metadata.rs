//! Records describing what a gatherer retrieved.
//!
//! A [`Metadata`] value is produced once by the gatherer which served the request and is not
//! modified afterwards.

use std::path::{Path, PathBuf};

use crate::uri::UriType;

/// Provenance of a cloned git repository.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GitMetadata {
    /// The remote that was cloned, after shorthand expansion.
    pub url: String,
    /// The branch, tag or revision requested, if any.
    pub reference: Option<String>,
    /// The commit checked out in the working tree.
    pub commit: String,
    /// A subdirectory of the repository selected with `//`.
    pub subdir: Option<PathBuf>,
    pub destination: PathBuf,
}

/// Provenance of an HTTP(S) download.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HttpMetadata {
    /// The URL that was requested.
    pub url: String,
    /// The URL that answered, after following redirects.
    pub final_url: String,
    pub status: u16,
    /// Number of bytes written to `destination`.
    pub content_length: u64,
    pub content_type: Option<String>,
    pub destination: PathBuf,
}

/// Provenance of a local copy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileMetadata {
    /// Absolute path of the copied file or directory.
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Number of regular files copied.
    pub file_count: u64,
    /// Total bytes copied.
    pub size: u64,
}

/// Describes what was gathered. There is one variant per gatherable [`UriType`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Metadata {
    #[serde(rename = "git")]
    Git(GitMetadata),
    #[serde(rename = "http")]
    Http(HttpMetadata),
    #[serde(rename = "file")]
    File(FileMetadata),
}

impl Metadata {
    /// The category of source this record describes.
    pub fn uri_type(&self) -> UriType {
        match self {
            Metadata::Git(_) => UriType::Git,
            Metadata::Http(_) => UriType::Http,
            Metadata::File(_) => UriType::File,
        }
    }

    /// Where the content was materialised.
    pub fn destination(&self) -> &Path {
        match self {
            Metadata::Git(git) => &git.destination,
            Metadata::Http(http) => &http.destination,
            Metadata::File(file) => &file.destination,
        }
    }

    /// A one-line human readable summary.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl AsRef<Path> for Metadata {
    fn as_ref(&self) -> &Path {
        self.destination()
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metadata::Git(git) => {
                write!(f, "cloned {}", git.url)?;
                if let Some(reference) = &git.reference {
                    write!(f, " (ref: {reference})")?;
                }
                write!(f, " at {} into {}", git.commit, git.destination.display())?;
                if let Some(subdir) = &git.subdir {
                    write!(f, " [subdir: {}]", subdir.display())?;
                }
                Ok(())
            }
            Metadata::Http(http) => {
                write!(
                    f,
                    "downloaded {} bytes from {} (status {}) into {}",
                    http.content_length,
                    http.final_url,
                    http.status,
                    http.destination.display()
                )
            }
            Metadata::File(file) => {
                write!(
                    f,
                    "copied {} file(s), {} bytes, from {} into {}",
                    file.file_count,
                    file.size,
                    file.source.display(),
                    file.destination.display()
                )
            }
        }
    }
}
