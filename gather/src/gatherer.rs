//! The contract every transport implements, and the registry and dispatcher which select a
//! transport for a source string.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::home::{HomeDir, SystemHome};
use crate::metadata::Metadata;
use crate::uri::{UriType, classify_with};

/// Retrieves one category of source into a destination.
///
/// Implementations must:
/// - stop promptly with [`Error::Cancelled`] once `cancel` fires,
/// - create whatever intermediate directories `destination` needs,
/// - return the [`Metadata`] variant matching their own category on success, and nothing partial
///   on failure.
///
/// Any retry policy is the implementation's own business.
#[async_trait::async_trait]
pub trait Gatherer: Send + Sync {
    async fn gather(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &Path,
    ) -> Result<Metadata, Error>;

    /// A copy of this gatherer which expands `~/` with `home`.
    ///
    /// Gatherers that never resolve the home directory keep the default, which returns `None` and
    /// leaves them registered as they are.
    fn rehome(&self, _home: Arc<dyn HomeDir>) -> Option<Arc<dyn Gatherer>> {
        None
    }
}

/// Maps the canonical name of a [`UriType`] onto the gatherer serving it.
#[derive(Clone, Default)]
pub struct Registry {
    gatherers: HashMap<String, Arc<dyn Gatherer>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in file, git and HTTP gatherers.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(UriType::File, crate::file::FileGatherer::default())
            .with(UriType::Git, crate::git::GitGatherer::default())
            .with(UriType::Http, crate::http::HttpGatherer::default())
    }

    /// Register `gatherer` for `uri_type`, returning `self` for chaining.
    pub fn with<G: Gatherer + 'static>(mut self, uri_type: UriType, gatherer: G) -> Self {
        self.register(uri_type, Arc::new(gatherer));
        self
    }

    /// Register `gatherer` for `uri_type`, returning the gatherer it replaced, if any.
    pub fn register(
        &mut self,
        uri_type: UriType,
        gatherer: Arc<dyn Gatherer>,
    ) -> Option<Arc<dyn Gatherer>> {
        self.gatherers.insert(uri_type.as_str().to_string(), gatherer)
    }

    /// Swap every gatherer that resolves the home directory for one using `home`.
    fn rehome(&mut self, home: &Arc<dyn HomeDir>) {
        for gatherer in self.gatherers.values_mut() {
            if let Some(rehomed) = gatherer.rehome(home.clone()) {
                *gatherer = rehomed;
            }
        }
    }

    /// The gatherer registered for `uri_type`.
    pub fn get(&self, uri_type: UriType) -> Option<&Arc<dyn Gatherer>> {
        self.gatherers.get(uri_type.as_str())
    }

    /// Gatherable categories which have no gatherer.
    pub fn missing(&self) -> Vec<UriType> {
        UriType::GATHERABLE
            .iter()
            .copied()
            .filter(|t| self.get(*t).is_none())
            .collect()
    }

    /// The canonical names that have a gatherer, in sorted order.
    pub fn protocols(&self) -> Vec<&str> {
        let mut keys = self.gatherers.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("protocols", &self.protocols())
            .finish()
    }
}

/// Classifies a source and forwards it to the gatherer registered for its category.
///
/// The dispatcher adds no retries, timeouts or error rewriting of its own: whatever the selected
/// gatherer returns is handed back unchanged.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Registry,
    home: Arc<dyn HomeDir>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::with_defaults())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// A dispatcher over `registry` which expands `~/` using the system home directory.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            home: Arc::new(SystemHome),
        }
    }

    /// Use `home` to resolve `~/`, both while classifying and in the registered gatherers.
    pub fn with_home<H: HomeDir + 'static>(mut self, home: H) -> Self {
        let home: Arc<dyn HomeDir> = Arc::new(home);
        self.registry.rehome(&home);
        self.home = home;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Classify `source` with this dispatcher's home directory resolver.
    pub fn classify(&self, source: &str) -> Result<UriType, Error> {
        Ok(classify_with(source, self.home.as_ref())?)
    }

    /// Gather `source` into `destination` using the gatherer registered for its category.
    pub async fn gather<P: AsRef<Path>>(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: P,
    ) -> Result<Metadata, Error> {
        let uri_type = self.classify(source)?;
        let Some(gatherer) = self.registry.get(uri_type) else {
            return Err(Error::UnsupportedProtocol { uri_type });
        };
        log::debug!("dispatching '{source}' to the {uri_type} gatherer");
        gatherer.gather(cancel, source, destination.as_ref()).await
    }
}

static DEFAULT_DISPATCHER: LazyLock<Dispatcher> = LazyLock::new(Dispatcher::default);

/// Gather `source` into `destination` with the built-in gatherers.
///
/// ```no_run
/// # async fn run() -> Result<(), gather::Error> {
/// use gather::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let metadata = gather::gather(&cancel, "https://github.com/dtolnay/syn.git", "vendor/syn").await?;
/// println!("{metadata}");
/// # Ok(())
/// # }
/// ```
pub async fn gather<P: AsRef<Path>>(
    cancel: &CancellationToken,
    source: &str,
    destination: P,
) -> Result<Metadata, Error> {
    DEFAULT_DISPATCHER.gather(cancel, source, destination).await
}


#[cfg(test)]
mod test_registry {
    use super::*;

    #[test]
    fn defaults_cover_every_gatherable_category() {
        let registry = Registry::with_defaults();
        assert!(registry.missing().is_empty());
        assert_eq!(registry.protocols(), vec!["FileURI", "GitURI", "HTTPURI"]);
        assert!(registry.get(UriType::Unknown).is_none());
    }

    #[test]
    fn empty_registry_reports_everything_missing() {
        assert_eq!(
            Registry::new().missing(),
            vec![UriType::Git, UriType::Http, UriType::File]
        );
    }

    #[test]
    fn register_replaces_existing_gatherer() {
        let mut registry = Registry::with_defaults();
        let previous = registry.register(UriType::File, Arc::new(crate::file::FileGatherer::default()));
        assert!(previous.is_some());
        assert_eq!(registry.protocols().len(), 3);
    }
}
