//! Support for gathering git repositories.
//!
//! Sources may carry a `//subdir` suffix naming a directory of interest inside the repository and
//! a `?ref=` query selecting a branch, tag or commit:
//!
//! ```text
//! git::https://github.com/owner/repo.git//docs?ref=v1.2.0
//! github.com/owner/repo?ref=main
//! owner/repo
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::gatherer::Gatherer;
use crate::file::remove_created;
use crate::home::{HomeDir, SystemHome, expand_tilde};
use crate::metadata::{GitMetadata, Metadata};

const FORCE_PREFIX: &str = "git::";
const REF_KEY: &str = "ref";
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:word:]\-]+/[[:word:].\-]+$")
        .unwrap_or_else(|e| panic!("invalid shorthand pattern: {e}"))
});

/// A git source split into its remote, requested reference and subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    pub url: String,
    pub reference: Option<String>,
    pub subdir: Option<PathBuf>,
}

impl GitSource {
    /// Split `source` into its parts and expand shorthands into cloneable URLs.
    pub fn parse(source: &str) -> Result<Self, Error> {
        Self::parse_with(source, &SystemHome)
    }

    /// As [`GitSource::parse`], expanding a leading `~/` with `home`.
    pub fn parse_with<H: HomeDir + ?Sized>(source: &str, home: &H) -> Result<Self, Error> {
        let raw = source.strip_prefix(FORCE_PREFIX).unwrap_or(source);

        let (location, query) = match raw.rsplit_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (raw, None),
        };
        let mut reference = None;
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            if key == REF_KEY {
                if value.is_empty() {
                    return Err(Error::invalid_source(source, "empty 'ref' parameter"));
                }
                reference = Some(value.into_owned());
            } else {
                log::debug!("ignoring query parameter '{key}' in git source '{source}'");
            }
        }

        let scheme_end = location.find("://").map(|i| i + 3).unwrap_or(0);
        let (location, subdir) = match location[scheme_end..].find("//") {
            Some(i) => {
                let split = scheme_end + i;
                let subdir = location[split + 2..].trim_matches('/');
                (&location[..split], (!subdir.is_empty()).then(|| PathBuf::from(subdir)))
            }
            None => (location, None),
        };

        if location.is_empty() {
            return Err(Error::invalid_source(source, "no repository given"));
        }

        Ok(Self {
            url: expand_shorthand(location, home),
            reference,
            subdir,
        })
    }
}

fn expand_shorthand<H: HomeDir + ?Sized>(location: &str, home: &H) -> String {
    if location.starts_with("github.com/") || location.starts_with("gitlab.com/") {
        format!("https://{location}")
    } else if location.starts_with("~/") {
        expand_tilde(location, home).to_string_lossy()
            .into_owned()
    } else if SHORTHAND.is_match(location) {
        format!("https://github.com/{location}")
    } else {
        location.to_string()
    }
}

impl std::fmt::Display for GitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)?;
        if let Some(reference) = &self.reference {
            write!(f, " (ref: {reference})")?;
        }
        if let Some(subdir) = &self.subdir {
            write!(f, " [subdir: {}]", subdir.display())?;
        }
        Ok(())
    }
}

/// Clones git repositories with `git2`.
#[derive(Clone)]
pub struct GitGatherer {
    home: Arc<dyn HomeDir>,
}

impl Default for GitGatherer {
    fn default() -> Self {
        Self {
            home: Arc::new(SystemHome),
        }
    }
}

impl std::fmt::Debug for GitGatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitGatherer").finish_non_exhaustive()
    }
}

impl GitGatherer {
    /// Expand `~/` in local remotes and destinations with `home`.
    pub fn with_home<H: HomeDir + 'static>(home: H) -> Self {
        Self {
            home: Arc::new(home),
        }
    }
}

fn agent_credentials(
    attempts: &Cell<usize>,
    username_from_url: Option<&str>,
    credential_type: git2::CredentialType,
) -> Result<git2::Cred, git2::Error> {
    attempts.set(attempts.get() + 1);
    if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
        return Err(git2::Error::from_str("no usable credentials were found"));
    }
    if credential_type.contains(git2::CredentialType::SSH_KEY) {
        git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
    } else if credential_type.contains(git2::CredentialType::DEFAULT) {
        git2::Cred::default()
    } else {
        Err(git2::Error::from_str(
            "unsupported credential type, only ssh-agent keys are supported",
        ))
    }
}

/// Detach HEAD at `reference`, trying it as a remote branch before any other revision.
fn checkout_reference(repo: &git2::Repository, reference: &str) -> Result<(), git2::Error> {
    let object = repo
        .revparse_single(&format!("origin/{reference}"))
        .or_else(|_| repo.revparse_single(reference))?;
    let commit = object.peel_to_commit()?;
    let mut checkout = git2::build::CheckoutBuilder::new();
    checkout.force();
    repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
    repo.set_head_detached(commit.id())
}

fn clone_blocking(
    remote: &GitSource,
    into: &Path,
    cancel: &CancellationToken,
) -> Result<String, Error> {
    let attempts = Cell::new(0);
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_, username, allowed| agent_credentials(&attempts, username, allowed));
    callbacks.transfer_progress(|_| !cancel.is_cancelled());
    let mut fetch_options = git2::FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_options);

    let repo = match builder.clone(&remote.url, into) {
        Ok(repo) => repo,
        Err(_) if cancel.is_cancelled() => return Err(Error::Cancelled),
        Err(err) => return Err(err.into()),
    };
    if let Some(reference) = &remote.reference {
        checkout_reference(&repo, reference)?;
    }
    let commit = repo.head()?.peel_to_commit()?.id().to_string();
    Ok(commit)
}

#[async_trait::async_trait]
impl Gatherer for GitGatherer {
    async fn gather(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &Path,
    ) -> Result<Metadata, Error> {
        let remote = GitSource::parse_with(source, self.home.as_ref())?;
        let destination = expand_tilde(&destination.to_string_lossy(), self.home.as_ref());
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let existed = tokio::fs::try_exists(&destination).await.unwrap_or(true);

        log::info!("cloning {remote} into {}", destination.display());
        let task = {
            let remote = remote.clone();
            let destination = destination.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || clone_blocking(&remote, &destination, &cancel))
        };
        let cloned = tokio::select! {
            joined = task => joined?,
            // The blocking clone may still be writing, so the destination is left alone here.
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };
        let checked = cloned.and_then(|commit| match &remote.subdir {
            Some(subdir) if !destination.join(subdir).is_dir() => Err(Error::invalid_source(
                source,
                format!("subdirectory '{}' not found in repository", subdir.display()),
            )),
            _ => Ok(commit),
        });
        let commit = match checked {
            Ok(commit) => commit,
            Err(err) => {
                if !existed {
                    remove_created(&destination).await;
                }
                return Err(err);
            }
        };
        log::info!("checked out {commit} in {}", destination.display());

        Ok(Metadata::Git(GitMetadata {
            url: remote.url,
            reference: remote.reference,
            commit,
            subdir: remote.subdir,
            destination,
        }))
    }

    fn rehome(&self, home: Arc<dyn HomeDir>) -> Option<Arc<dyn Gatherer>> {
        Some(Arc::new(Self { home }))
    }
}
