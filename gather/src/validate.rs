//! Pre-flight checks callers may run before gathering.

use std::path::Path;

use crate::error::Error;
use crate::home::{HomeDir, SystemHome, expand_tilde};

/// Fail with [`Error::DestinationExists`] if `destination` (after `~/` expansion) already exists.
///
/// Only a successful probe counts as existing: if the filesystem cannot answer, for example
/// because a parent directory is unreadable, the destination is treated as free.
pub fn validate_destination<P: AsRef<Path>>(destination: P) -> Result<(), Error> {
    validate_destination_with(destination, &SystemHome)
}

/// Like [`validate_destination`], expanding `~/` with the given resolver.
pub fn validate_destination_with<P, H>(destination: P, home: &H) -> Result<(), Error>
where
    P: AsRef<Path>,
    H: HomeDir + ?Sized,
{
    let path = expand_tilde(&destination.as_ref().to_string_lossy(), home);
    match std::fs::metadata(&path) {
        Ok(_) => Err(Error::DestinationExists { path }),
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::debug!("treating {} as free after probe error: {err}", path.display());
            }
            Ok(())
        }
    }
}
