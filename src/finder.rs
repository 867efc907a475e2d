//! Fanning a lookup out over an ordered list of path items.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ResourceConfig;
use crate::error::{ResourceAccessError, Result};
use crate::item::{PathItem, PathItemExt, Query, Recursion};
use crate::paths;
use crate::registry::Registry;
use crate::resource::Resource;

/// An ordered list of path items searched with one recursion mode.
///
/// Results follow item order, then each item's own match order. The finder
/// keeps no state beyond its list.
#[derive(Debug, Clone, Default)]
pub struct ResourceFinder {
    items: Vec<Arc<dyn PathItem>>,
    recursion: Recursion,
}

impl ResourceFinder {
    pub fn new(recursion: Recursion) -> Self {
        Self {
            items: Vec::new(),
            recursion,
        }
    }

    pub fn with_items(items: Vec<Arc<dyn PathItem>>, recursion: Recursion) -> Self {
        Self { items, recursion }
    }

    pub fn items(&self) -> &[Arc<dyn PathItem>] {
        &self.items
    }

    pub fn add_item(&mut self, item: Arc<dyn PathItem>) {
        self.items.push(item);
    }

    /// Remove every item whose root is `root`. Returns whether any was removed.
    pub fn remove_item(&mut self, root: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.root() != root);
        self.items.len() != before
    }

    pub fn set_items(&mut self, items: Vec<Arc<dyn PathItem>>) {
        self.items = items;
    }

    pub fn recursion(&self) -> Recursion {
        self.recursion
    }

    pub fn set_recursion(&mut self, recursion: Recursion) {
        self.recursion = recursion;
    }

    /// First match across the items, in item order.
    pub fn find(&self, name: &str) -> Result<Option<Resource>> {
        let name = checked_name(name)?;
        for item in &self.items {
            if let Some(resource) = item.find_resource(&name, self.recursion)? {
                return Ok(Some(resource));
            }
        }
        Ok(None)
    }

    pub fn find_all(&self, name: &str) -> Result<Vec<Resource>> {
        let name = checked_name(name)?;
        let mut found = Vec::new();
        for item in &self.items {
            found.extend(item.find_resources(&name, self.recursion)?);
        }
        Ok(found)
    }

    /// `extension` may be given with or without its leading dot.
    pub fn find_for_extension(&self, extension: &str) -> Result<Vec<Resource>> {
        Query::extension(extension)?;
        let mut found = Vec::new();
        for item in &self.items {
            found.extend(item.find_resources_for_extension(extension, self.recursion)?);
        }
        Ok(found)
    }
}

fn checked_name(name: &str) -> Result<String> {
    let name = paths::normalize(name);
    if name.is_empty() {
        return Err(ResourceAccessError::EmptyName);
    }
    Ok(name)
}

#[derive(Debug)]
struct LoaderState {
    /// Each path as given, with the item it resolved to.
    entries: Vec<(String, Arc<dyn PathItem>)>,
    recursion: Recursion,
}

/// Path strings in, resources out.
///
/// The loader resolves every path it is given through its [`Registry`] and
/// searches the resulting items in the order they were added. All methods
/// take `&self`; lookups work on a snapshot of the path list, so paths may be
/// changed while other threads search.
#[derive(Debug)]
pub struct ResourceLoader {
    registry: Arc<Registry>,
    state: RwLock<LoaderState>,
}

impl ResourceLoader {
    pub fn new(config: ResourceConfig) -> Self {
        Self::with_registry(Arc::new(Registry::new(config)))
    }

    /// Search with the recursion mode of the registry's configuration.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        let recursion = registry.config().recursion;
        Self {
            registry,
            state: RwLock::new(LoaderState {
                entries: Vec::new(),
                recursion,
            }),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolve `path` and append its item to the search list.
    pub fn add_path(&self, path: &str) -> Result<Arc<dyn PathItem>> {
        let item = self.registry.resolve(path)?;
        self.state
            .write()
            .entries
            .push((path.to_string(), Arc::clone(&item)));
        Ok(item)
    }

    /// Drop every item added as `path` (or whose root is `path`).
    pub fn remove_path(&self, path: &str) -> bool {
        let mut state = self.state.write();
        let before = state.entries.len();
        state
            .entries
            .retain(|(given, item)| given != path && item.root() != path);
        state.entries.len() != before
    }

    /// Replace the whole search list. Nothing changes if any path fails to
    /// resolve.
    pub fn set_paths<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        let entries = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                Ok((path.to_string(), self.registry.resolve(path)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.state.write().entries = entries;
        Ok(())
    }

    /// Paths in search order, as they were given.
    pub fn paths(&self) -> Vec<String> {
        self.state
            .read()
            .entries
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn recursion(&self) -> Recursion {
        self.state.read().recursion
    }

    pub fn set_recursion(&self, recursion: Recursion) {
        self.state.write().recursion = recursion;
    }

    /// Snapshot of the current search list.
    pub fn finder(&self) -> ResourceFinder {
        let state = self.state.read();
        ResourceFinder::with_items(
            state.entries.iter().map(|(_, item)| Arc::clone(item)).collect(),
            state.recursion,
        )
    }

    pub fn find_resource(&self, name: &str) -> Result<Option<Resource>> {
        self.finder().find(name)
    }

    pub fn find_resources(&self, name: &str) -> Result<Vec<Resource>> {
        self.finder().find_all(name)
    }

    pub fn find_resources_for_extension(&self, extension: &str) -> Result<Vec<Resource>> {
        self.finder().find_for_extension(extension)
    }
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new(ResourceConfig::default())
    }
}
