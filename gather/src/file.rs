//! Support for gathering files and directories from the local filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::gatherer::Gatherer;
use crate::home::{HomeDir, SystemHome, expand_tilde};
use crate::metadata::{FileMetadata, Metadata};

const FORCE_PREFIX: &str = "file::";
const SCHEME_PREFIX: &str = "file://";

/// Copies a local file or directory tree into the destination.
#[derive(Clone)]
pub struct FileGatherer {
    home: Arc<dyn HomeDir>,
}

impl Default for FileGatherer {
    fn default() -> Self {
        Self {
            home: Arc::new(SystemHome),
        }
    }
}

impl std::fmt::Debug for FileGatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileGatherer").finish_non_exhaustive()
    }
}

impl FileGatherer {
    /// Expand `~/` in sources and destinations with `home`.
    pub fn with_home<H: HomeDir + 'static>(home: H) -> Self {
        Self {
            home: Arc::new(home),
        }
    }
}

/// Strip the forcing prefix and `file://` scheme from `source` and expand `~/`.
pub(crate) fn local_path<H: HomeDir + ?Sized>(source: &str, home: &H) -> PathBuf {
    let source = source.strip_prefix(FORCE_PREFIX).unwrap_or(source);
    let source = source.strip_prefix(SCHEME_PREFIX).unwrap_or(source);
    expand_tilde(source, home)
}

/// Remove `path` after a failed gather created it. Failures are only logged since the gather
/// error is the one worth reporting.
pub(crate) async fn remove_created(path: &Path) {
    let removed = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(_) => return,
    };
    if let Err(err) = removed {
        log::warn!("failed to remove {}: {err}", path.display());
    }
}

/// Canonicalise the longest existing prefix of `path` and append the rest unchanged.
fn resolve(path: &Path) -> Result<PathBuf, Error> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Ok(rest.iter().rev().fold(canonical, |path, name| path.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Copied {
    files: u64,
    bytes: u64,
}

impl std::ops::AddAssign for Copied {
    fn add_assign(&mut self, rhs: Self) {
        self.files += rhs.files;
        self.bytes += rhs.bytes;
    }
}

fn check(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

async fn copy_file(from: &Path, to: &Path) -> Result<Copied, Error> {
    if let Some(parent) = to.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = tokio::fs::copy(from, to).await?;
    Ok(Copied { files: 1, bytes })
}

/// Copy the tree under `from` into `to`, checking for cancellation before every entry. Symlinks
/// are followed; anything which is neither a file nor a directory is skipped. `to` must not lie
/// inside `from`.
async fn copy_tree(cancel: &CancellationToken, from: &Path, to: &Path) -> Result<Copied, Error> {
    let mut copied = Copied::default();
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src_dir, dst_dir)) = pending.pop() {
        check(cancel)?;
        tokio::fs::create_dir_all(&dst_dir).await?;
        let mut entries = tokio::fs::read_dir(&src_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            check(cancel)?;
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            let kind = tokio::fs::metadata(&src).await?;
            if kind.is_dir() {
                pending.push((src, dst));
            } else if kind.is_file() {
                copied += copy_file(&src, &dst).await?;
            } else {
                log::debug!("skipping special file {}", src.display());
            }
        }
    }
    Ok(copied)
}

#[async_trait::async_trait]
impl Gatherer for FileGatherer {
    async fn gather(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &Path,
    ) -> Result<Metadata, Error> {
        let source_path = std::path::absolute(local_path(source, self.home.as_ref()))?;
        let destination = expand_tilde(&destination.to_string_lossy(), self.home.as_ref());
        check(cancel)?;

        let kind = match tokio::fs::metadata(&source_path).await {
            Ok(kind) => kind,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound { path: source_path });
            }
            Err(err) => return Err(err.into()),
        };

        let target = if kind.is_dir() {
            if resolve(&destination)?.starts_with(resolve(&source_path)?) {
                return Err(Error::invalid_source(
                    source,
                    format!(
                        "destination {} is inside the source directory",
                        destination.display()
                    ),
                ));
            }
            destination
        } else {
            match source_path.file_name() {
                Some(name) if destination.is_dir() => destination.join(name),
                _ => destination,
            }
        };
        let existed = tokio::fs::try_exists(&target).await.unwrap_or(true);

        log::info!(
            "copying {} into {}",
            source_path.display(),
            target.display()
        );
        let result = if kind.is_dir() {
            copy_tree(cancel, &source_path, &target).await
        } else {
            copy_file(&source_path, &target).await
        };
        let copied = match result {
            Ok(copied) => copied,
            Err(err) => {
                if !existed {
                    remove_created(&target).await;
                }
                return Err(err);
            }
        };
        log::info!(
            "copied {} file(s) ({} bytes) into {}",
            copied.files,
            copied.bytes,
            target.display()
        );

        Ok(Metadata::File(FileMetadata {
            source: source_path,
            destination: target,
            file_count: copied.files,
            size: copied.bytes,
        }))
    }

    fn rehome(&self, home: Arc<dyn HomeDir>) -> Option<Arc<dyn Gatherer>> {
        Some(Arc::new(Self { home }))
    }
}
