use std::path::Path;

use gather::{CancellationToken, Dispatcher, Metadata};
use indicatif::{MultiProgress, ProgressBar};

use crate::error::AppError;
use crate::manifest::{Entries, Entry};
use crate::progress;

pub type GatherResult = Result<(String, Metadata), AppError>;

/// Gather a single source, validating the destination first when clobbering is not allowed.
pub async fn gather_to(
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    source: &str,
    destination: &Path,
    no_clobber: bool,
) -> Result<Metadata, gather::Error> {
    if no_clobber {
        gather::validate_destination(destination)?;
    }
    dispatcher.gather(cancel, source, destination).await
}

// Gather one manifest entry, reporting progress in the provided progress bar
async fn gather_one(
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    (name, entry): (String, Entry),
    out_dir: &Path,
    no_clobber: bool,
    bar: ProgressBar,
) -> GatherResult {
    let destination = entry.destination_in(&name, out_dir);
    bar.set_message(format!("{name} <- {}", entry.source));
    let result = gather_to(dispatcher, cancel, &entry.source, &destination, no_clobber).await;
    progress::complete_progress_bar(bar, &name, &result);
    match result {
        Ok(metadata) => Ok((name, metadata)),
        Err(err) => Err(AppError::gather_one(entry.source, err)),
    }
}

// Gather every entry concurrently. Each entry gets its own bar, added up front so the bars are
// shown in manifest order whatever order the entries finish in.
pub async fn concurrent_gather(
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    entries: Entries,
    out_dir: &Path,
    no_clobber: bool,
) -> Vec<GatherResult> {
    let count = entries.len();
    let mp = MultiProgress::new();
    let tasks = entries.into_iter().enumerate().map(|(k, entry)| {
        let bar = progress::make_progress_spinner(&mp, format!("[{}/{count}]", k + 1));
        gather_one(dispatcher, cancel, entry, out_dir, no_clobber, bar)
    });
    futures::future::join_all(tasks).await
}
