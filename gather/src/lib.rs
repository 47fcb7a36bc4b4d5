//! Fetch a resource into a destination without caring how it is transported.
//!
//! A source string may name a git repository, an HTTP(S) resource or a local path. This crate
//! decides which of these it is, hands it to the matching [`Gatherer`], and returns [`Metadata`]
//! describing what was retrieved.
//!
//! # Classifying sources
//!
//! ```rust
//! use gather::{UriType, classify};
//!
//! assert_eq!(classify("git@github.com:foo/bar.git")?, UriType::Git);
//! assert_eq!(classify("owner/repo")?, UriType::Git);
//! assert_eq!(classify("https://example.com/data.csv")?, UriType::Http);
//! assert_eq!(classify("./local/dir")?, UriType::File);
//! assert!(classify("ftp://example.com/file").is_err());
//! # Ok::<(), gather::ClassifyError>(())
//! ```
//!
//! A source can be forced into a category with a `git::`, `http::` or `file::` prefix. The full
//! precedence rules are documented in the [`uri`] module.
//!
//! # Gathering
//!
//! ```no_run
//! use gather::{CancellationToken, Dispatcher, Registry, validate_destination};
//!
//! # async fn run() -> Result<(), gather::Error> {
//! let dispatcher = Dispatcher::new(Registry::with_defaults());
//! let cancel = CancellationToken::new();
//!
//! validate_destination("vendor/syn")?;
//! let metadata = dispatcher
//!     .gather(&cancel, "https://github.com/dtolnay/syn.git?ref=1.0.109", "vendor/syn")
//!     .await?;
//! println!("{metadata}");
//! # Ok(())
//! # }
//! ```
//!
//! [`gather()`] does the same with a process-wide dispatcher holding the built-in gatherers.
//!
//! # Transports
//!
//! - **git**: cloned with `git2`. A `//subdir` suffix and `?ref=` query are understood; SSH remotes
//!   use keys from the ssh-agent.
//! - **http**: downloaded with `reqwest`, following redirects.
//! - **file**: copied from the local filesystem.
//!
//! Custom transports implement [`Gatherer`] and are registered with [`Registry::register`].

mod error;
pub mod file;
mod gatherer;
pub mod git;
mod home;
pub mod http;
mod metadata;
pub mod uri;
mod validate;

#[doc(inline)]
pub use crate::error::{ClassifyError, Error};
#[doc(inline)]
pub use crate::gatherer::{Dispatcher, Gatherer, Registry, gather};
#[doc(inline)]
pub use crate::home::{FixedHome, HomeDir, SystemHome, expand_tilde};
#[doc(inline)]
pub use crate::metadata::{FileMetadata, GitMetadata, HttpMetadata, Metadata};
#[doc(inline)]
pub use crate::uri::{UriType, classify, classify_with};
#[doc(inline)]
pub use crate::validate::{validate_destination, validate_destination_with};

pub use tokio_util::sync::CancellationToken;
