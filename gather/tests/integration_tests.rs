//! Integration tests for the gather library.
//!
//! These exercise the public dispatch surface against the local filesystem and a local git
//! repository, so they need no network access.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gather::{
    CancellationToken, Dispatcher, Error, FileMetadata, FixedHome, Gatherer, Metadata, Registry,
    UriType, validate_destination,
};

/// Answers every call with the same metadata and counts how often it was called.
struct Canned {
    calls: AtomicUsize,
    saw_cancelled: AtomicUsize,
}

impl Canned {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            saw_cancelled: AtomicUsize::new(0),
        })
    }

    fn metadata() -> Metadata {
        Metadata::File(FileMetadata {
            source: PathBuf::from("/canned"),
            destination: PathBuf::from("/canned-out"),
            file_count: 0,
            size: 0,
        })
    }
}

#[async_trait::async_trait]
impl Gatherer for Canned {
    async fn gather(
        &self,
        cancel: &CancellationToken,
        _source: &str,
        _destination: &Path,
    ) -> Result<Metadata, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            self.saw_cancelled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Self::metadata())
    }
}

fn stub_dispatcher(stub: Arc<Canned>) -> Dispatcher {
    let mut registry = Registry::new();
    registry.register(UriType::File, stub);
    Dispatcher::new(registry).with_home(FixedHome::new("/home/tester"))
}

#[tokio::test]
async fn stub_metadata_is_returned_unmodified() {
    let stub = Canned::new();
    let dispatcher = stub_dispatcher(stub.clone());

    let metadata = dispatcher
        .gather(&CancellationToken::new(), "./local/path", "/tmp/anywhere")
        .await
        .unwrap();

    assert_eq!(metadata, Canned::metadata());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.saw_cancelled.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_token_is_visible_to_the_gatherer() {
    let stub = Canned::new();
    let dispatcher = stub_dispatcher(stub.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    dispatcher
        .gather(&cancel, "./local/path", "/tmp/anywhere")
        .await
        .unwrap();

    assert_eq!(stub.saw_cancelled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_gathers_are_independent() {
    let stub = Canned::new();
    let dispatcher = stub_dispatcher(stub.clone());
    let cancel = CancellationToken::new();

    let results = tokio::join!(
        dispatcher.gather(&cancel, "./a", "/tmp/a"),
        dispatcher.gather(&cancel, "../b", "/tmp/b"),
        dispatcher.gather(&cancel, "~/c", "/tmp/c"),
    );

    assert!(results.0.is_ok() && results.1.is_ok() && results.2.is_ok());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn classification_errors_never_reach_a_gatherer() {
    let stub = Canned::new();
    let dispatcher = stub_dispatcher(stub.clone());
    let cancel = CancellationToken::new();

    for source in ["ftp://host/resource", "example.com/no-scheme"] {
        let err = dispatcher.gather(&cancel, source, "/tmp/x").await.unwrap_err();
        assert!(matches!(err, Error::Classify(_)), "source: {source}");
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn default_dispatcher_copies_local_directories() {
    let src = tempfile::tempdir().unwrap();
    std::fs::create_dir(src.path().join("inner")).unwrap();
    std::fs::write(src.path().join("inner/file.txt"), "contents").unwrap();
    let dst = tempfile::tempdir().unwrap();
    let target = dst.path().join("copied");

    validate_destination(&target).unwrap();
    let metadata = gather::gather(
        &CancellationToken::new(),
        src.path().to_str().unwrap(),
        &target,
    )
    .await
    .unwrap();

    assert_eq!(metadata.uri_type(), UriType::File);
    assert_eq!(
        std::fs::read_to_string(target.join("inner/file.txt")).unwrap(),
        "contents"
    );
    assert!(matches!(
        validate_destination(&target),
        Err(Error::DestinationExists { .. })
    ));
}

#[tokio::test]
async fn default_dispatcher_clones_local_bare_repositories() {
    let work = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(work.path()).unwrap();
    std::fs::write(work.path().join("hello.txt"), "hi").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("hello.txt")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("Tester", "tester@example.com").unwrap();
    let commit = repo
        .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();

    let bare_root = tempfile::tempdir().unwrap();
    let bare = bare_root.path().join("upstream.git");
    let mut builder = git2::build::RepoBuilder::new();
    builder.bare(true);
    builder
        .clone(work.path().to_str().unwrap(), &bare)
        .unwrap();

    let dst = tempfile::tempdir().unwrap();
    let target = dst.path().join("checkout");
    let metadata = gather::gather(&CancellationToken::new(), bare.to_str().unwrap(), &target)
        .await
        .unwrap();

    let Metadata::Git(git) = metadata else {
        panic!("expected git metadata, got {metadata:?}");
    };
    assert_eq!(git.commit, commit.to_string());
    assert!(target.join("hello.txt").is_file());
}
