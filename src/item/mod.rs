//! Path items: one searchable root each (a directory, an archive, a remote
//! location), all searched through the same explicit-stack [`walk`].

mod directory;
mod null;
pub mod walk;

pub use directory::{DirectoryPathItem, DirectoryPathItemFactory};
pub use null::NullPathItem;
pub use walk::{Node, Tree, walk};

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use url::Url;

use crate::error::{ResourceAccessError, Result};
use crate::paths;
use crate::resource::Resource;

/// Byte stream handed out for one resource.
pub type ResourceStream = Box<dyn Read + Send>;

/// How far below the requested location a search descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recursion {
    /// Only the directory named by the request (the root, or the parent
    /// component of a name such as `a/a/test1.file`).
    #[default]
    NonRecursive,
    /// The whole subtree below that directory.
    Recursive,
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// A normalized relative name; its parent component selects the
    /// directory the search starts from and its base name is matched.
    Name(String),
    /// A dotted suffix matched against file names.
    Extension(String),
}

impl Query {
    pub fn name(name: &str) -> Result<Self> {
        let name = paths::normalize(name);
        if name.is_empty() {
            return Err(ResourceAccessError::EmptyName);
        }
        Ok(Query::Name(name))
    }

    pub fn extension(extension: &str) -> Result<Self> {
        let extension = extension.trim();
        if extension.is_empty() || extension == "." {
            return Err(ResourceAccessError::EmptyName);
        }
        Ok(Query::Extension(paths::prefix_dot(extension)))
    }

    /// Directory, relative to the item root, where the walk begins.
    pub fn start_dir(&self) -> &str {
        match self {
            Query::Name(name) => paths::parent(name),
            Query::Extension(_) => "",
        }
    }

    /// Whether a file with the given normalized relative path matches.
    pub fn matches(&self, path: &str) -> bool {
        let file_name = paths::base_name(path);
        match self {
            Query::Name(name) => file_name == paths::base_name(name),
            Query::Extension(extension) => paths::has_extension(file_name, extension),
        }
    }
}

/// One resolved root capable of searching for and streaming resources.
///
/// Implementations provide the backend hooks; the lookup operations callers
/// use live on [`PathItemExt`].
pub trait PathItem: Send + Sync + fmt::Debug {
    /// The root identifier this item was created for.
    fn root(&self) -> &str;

    /// Stable identifier of the root, e.g. `file:///abs/dir/`,
    /// `jar:file:///abs/x.jar!/` or `sftp://host:22/srv`.
    fn uri(&self) -> Result<Url>;

    /// Normalized names of matching files, in the backend's enumeration
    /// order, stopping after `limit` matches when one is given.
    fn search(
        &self,
        query: &Query,
        recursion: Recursion,
        limit: Option<usize>,
    ) -> Result<Vec<String>>;

    /// Open the bytes of one entry directly, without searching.
    fn open(&self, name: &str) -> Result<ResourceStream>;

    fn resource_uri(&self, name: &str) -> Result<Url> {
        let base = self.uri()?;
        let name = paths::encode_uri_path(name);
        let uri = if base.as_str().ends_with('/') {
            format!("{}{}", base, name)
        } else {
            format!("{}/{}", base, name)
        };
        Url::parse(&uri).map_err(|e| ResourceAccessError::uri(uri, e))
    }

    fn resource_path(&self, name: &str) -> String {
        format!("{}/{}", self.root().trim_end_matches('/'), name)
    }
}

/// Lookup operations over a shared path item.
pub trait PathItemExt {
    /// First match for `name`, or `None` when there is none.
    fn find_resource(&self, name: &str, recursion: Recursion) -> Result<Option<Resource>>;

    /// Every match for `name`; empty when there is none.
    fn find_resources(&self, name: &str, recursion: Recursion) -> Result<Vec<Resource>>;

    /// Every file whose name ends with `extension` (`"txt"` or `".txt"`).
    fn find_resources_for_extension(
        &self,
        extension: &str,
        recursion: Recursion,
    ) -> Result<Vec<Resource>>;

    /// Bytes of the entry called `name`, bypassing the search.
    fn input_stream(&self, name: &str) -> Result<ResourceStream>;
}

impl PathItemExt for Arc<dyn PathItem> {
    fn find_resource(&self, name: &str, recursion: Recursion) -> Result<Option<Resource>> {
        let query = Query::name(name)?;
        let found = self.search(&query, recursion, Some(1))?;
        Ok(found
            .into_iter()
            .next()
            .map(|name| Resource::new(Arc::clone(self), name)))
    }

    fn find_resources(&self, name: &str, recursion: Recursion) -> Result<Vec<Resource>> {
        let query = Query::name(name)?;
        collect(self, &query, recursion)
    }

    fn find_resources_for_extension(
        &self,
        extension: &str,
        recursion: Recursion,
    ) -> Result<Vec<Resource>> {
        let query = Query::extension(extension)?;
        collect(self, &query, recursion)
    }

    fn input_stream(&self, name: &str) -> Result<ResourceStream> {
        let name = paths::normalize(name);
        if name.is_empty() {
            return Err(ResourceAccessError::EmptyName);
        }
        self.open(&name).inspect_err(|e| {
            tracing::debug!(root = self.root(), %name, error = %e, "cannot open resource");
        })
    }
}

fn collect(item: &Arc<dyn PathItem>, query: &Query, recursion: Recursion) -> Result<Vec<Resource>> {
    Ok(item
        .search(query, recursion, None)?
        .into_iter()
        .map(|name| Resource::new(Arc::clone(item), name))
        .collect())
}
