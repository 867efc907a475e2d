//! Turning path strings into path items.
//!
//! A [`Registry`] holds an ordered chain of [`PathItemFactory`]s. The first
//! factory that claims a path builds its item. Factories named by extension
//! descriptors join the chain the first time a path goes unclaimed, and a
//! path nobody claims resolves to a [`NullPathItem`].

mod extensions;

pub use extensions::{
    DESCRIPTION, DESCRIPTOR_SUFFIX, DISPLAY_NAME, ExtensionCatalog, ExtensionContext,
    ExtensionDescriptor, FACTORY_NAME, FactoryConstructor, NAME, SFTP_FACTORY, TAR_FACTORY,
};

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;

use crate::archive::ArchiveCachePool;
use crate::config::ResourceConfig;
use crate::error::Result;
use crate::item::{DirectoryPathItemFactory, NullPathItem, PathItem, PathItemExt, Recursion};
use crate::zip::ZipPathItemFactory;

/// Builds path items for the paths it recognizes.
pub trait PathItemFactory: Send + Sync + fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// `Ok(None)` when the path is not for this factory. Errors are reserved
    /// for paths it recognizes but cannot serve, such as a malformed URI or
    /// an archive that does not open.
    fn path_item(&self, path: &str) -> Result<Option<Arc<dyn PathItem>>>;
}

/// Ordered, append-only chain of factories.
///
/// Resolution reads a snapshot of the chain, so factories may be registered
/// while other threads resolve. Extensions are loaded at most once.
pub struct Registry {
    config: ResourceConfig,
    pool: Arc<ArchiveCachePool>,
    factories: ArcSwap<Vec<Arc<dyn PathItemFactory>>>,
    catalog: ExtensionCatalog,
    extensions: OnceCell<Vec<ExtensionDescriptor>>,
}

impl Registry {
    /// Directory and ZIP/JAR factories, in that order, plus the default
    /// extension catalog.
    pub fn new(config: ResourceConfig) -> Self {
        let registry = Self::empty(config);
        registry.register(Arc::new(DirectoryPathItemFactory));
        registry.register(Arc::new(ZipPathItemFactory::new(
            Arc::clone(&registry.pool),
            registry.config.http.clone(),
        )));
        registry
    }

    /// No factories at all; extensions still come from the default catalog.
    pub fn empty(config: ResourceConfig) -> Self {
        let pool = Arc::new(ArchiveCachePool::new(config.pool_capacity));
        Self {
            config,
            pool,
            factories: ArcSwap::from_pointee(Vec::new()),
            catalog: ExtensionCatalog::default(),
            extensions: OnceCell::new(),
        }
    }

    /// Replace the catalog extension descriptors are resolved against.
    pub fn with_catalog(mut self, catalog: ExtensionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Archive caches shared by every archive factory of this registry.
    pub fn pool(&self) -> &Arc<ArchiveCachePool> {
        &self.pool
    }

    /// Append `factory` to the end of the chain.
    pub fn register(&self, factory: Arc<dyn PathItemFactory>) {
        tracing::debug!(factory = factory.name(), "registering path item factory");
        self.factories.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&factory));
            next
        });
    }

    /// Names of the registered factories, in resolution order.
    pub fn factory_names(&self) -> Vec<String> {
        self.factories
            .load()
            .iter()
            .map(|factory| factory.name().to_string())
            .collect()
    }

    /// The item of the first factory that claims `path`, loading extensions
    /// if none does. A path nothing claims gets a [`NullPathItem`].
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn PathItem>> {
        let before = self.factories.load_full();
        if let Some(item) = claim_in(&before, path)? {
            return Ok(item);
        }

        // Blocks while another thread is scanning, so the retry below sees
        // the chain as it stands once loading has finished.
        self.load_extensions();
        let after = self.factories.load_full();
        if !Arc::ptr_eq(&before, &after)
            && let Some(item) = claim_in(&after, path)?
        {
            return Ok(item);
        }

        tracing::debug!(path, "no factory claims path");
        Ok(Arc::new(NullPathItem::new(path)))
    }

    /// Scan for extension descriptors and register their factories. Only
    /// the first call scans; every call returns the descriptors loaded.
    pub fn load_extensions(&self) -> &[ExtensionDescriptor] {
        self.extensions.get_or_init(|| self.scan_extensions())
    }

    pub fn extensions_loaded(&self) -> bool {
        self.extensions.get().is_some()
    }

    fn claim(&self, path: &str) -> Result<Option<Arc<dyn PathItem>>> {
        claim_in(&self.factories.load(), path)
    }

    fn scan_extensions(&self) -> Vec<ExtensionDescriptor> {
        let mut candidates = Vec::new();
        if self.config.load_bundled_extensions {
            candidates.extend(ExtensionDescriptor::bundled());
        }
        for path in &self.config.extension_path {
            candidates.extend(self.descriptors_under(&path.display().to_string()));
        }

        let context = ExtensionContext {
            config: &self.config,
            pool: &self.pool,
        };
        let mut loaded: Vec<ExtensionDescriptor> = Vec::new();
        for descriptor in candidates {
            if loaded.iter().any(|d| d.factory_name == descriptor.factory_name) {
                continue;
            }
            let Some(constructor) = self.catalog.get(&descriptor.factory_name) else {
                tracing::warn!(
                    factory = %descriptor.factory_name,
                    "extension names an unknown factory, skipping"
                );
                continue;
            };

            self.register(constructor(&context));
            tracing::debug!(
                factory = %descriptor.factory_name,
                name = descriptor.display_name.as_deref().unwrap_or_default(),
                "loaded extension"
            );
            loaded.push(descriptor);
        }
        loaded
    }

    /// Descriptors found anywhere below one extension search path entry.
    /// Resolution here only consults the factories registered so far.
    fn descriptors_under(&self, path: &str) -> Vec<ExtensionDescriptor> {
        let item = match self.claim(path) {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::warn!(path, "extension path is not a directory or archive");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "cannot open extension path");
                return Vec::new();
            }
        };

        let resources = match item.find_resources_for_extension(DESCRIPTOR_SUFFIX, Recursion::Recursive) {
            Ok(resources) => resources,
            Err(e) => {
                tracing::warn!(path, error = %e, "cannot search extension path");
                return Vec::new();
            }
        };

        let mut descriptors = Vec::new();
        for resource in resources {
            let text = match resource.read_to_vec() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!(descriptor = %resource, error = %e, "cannot read extension descriptor");
                    continue;
                }
            };
            match ExtensionDescriptor::parse(&text) {
                Some(descriptor) => descriptors.push(descriptor),
                None => tracing::warn!(descriptor = %resource, "extension descriptor has no {}", FACTORY_NAME),
            }
        }
        descriptors
    }
}

fn claim_in(factories: &[Arc<dyn PathItemFactory>], path: &str) -> Result<Option<Arc<dyn PathItem>>> {
    for factory in factories {
        if let Some(item) = factory.path_item(path)? {
            tracing::debug!(path, factory = factory.name(), "resolved path item");
            return Ok(Some(item));
        }
    }
    Ok(None)
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(ResourceConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("factories", &self.factory_names())
            .field("extensions_loaded", &self.extensions_loaded())
            .finish()
    }
}
