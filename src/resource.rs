use std::fmt;
use std::io::Read;
use std::sync::Arc;

use url::Url;

use crate::error::{ResourceAccessError, Result};
use crate::item::{PathItem, ResourceStream};

/// A named entry inside a path item.
///
/// Nothing is resolved up front: the path, the URI and the bytes are all
/// derived from the owning item when asked for.
#[derive(Clone)]
pub struct Resource {
    item: Arc<dyn PathItem>,
    name: String,
}

impl Resource {
    pub fn new(item: Arc<dyn PathItem>, name: impl Into<String>) -> Self {
        Self {
            item,
            name: name.into(),
        }
    }

    /// Normalized name relative to the item root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_item(&self) -> &Arc<dyn PathItem> {
        &self.item
    }

    /// Root path joined with the name.
    pub fn path(&self) -> String {
        self.item.resource_path(&self.name)
    }

    pub fn uri(&self) -> Result<Url> {
        self.item.resource_uri(&self.name)
    }

    pub fn open(&self) -> Result<ResourceStream> {
        self.item.open(&self.name)
    }

    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let mut stream = self.open()?;
        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .map_err(|e| ResourceAccessError::io(self.path(), e))?;
        Ok(data)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.item), Arc::as_ptr(&other.item))
            && self.name == other.name
    }
}

impl Eq for Resource {}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("root", &self.item.root())
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uri() {
            Ok(uri) => write!(f, "{}", uri),
            Err(_) => write!(f, "{}", self.path()),
        }
    }
}
