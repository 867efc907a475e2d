use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::ArchiveCache;
use crate::error::{ResourceAccessError, Result};
use crate::item::{PathItem, Query, Recursion, ResourceStream, walk};

/// A path item rooted at the top of an archive.
#[derive(Debug)]
pub struct ArchivePathItem {
    root: String,
    uri: String,
    cache: Arc<ArchiveCache>,
}

impl ArchivePathItem {
    /// `uri` is the archive's root URI, ending in `!/`.
    pub fn new(root: impl Into<String>, uri: impl Into<String>, cache: Arc<ArchiveCache>) -> Self {
        Self {
            root: root.into(),
            uri: uri.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ArchiveCache> {
        &self.cache
    }
}

/// `<scheme>:<location>!/`, where a local location is written as a `file:` URL.
pub(crate) fn archive_uri(scheme: &str, location: &str) -> Result<String> {
    let inner = if location.contains("://") {
        location.to_string()
    } else {
        Url::from_file_path(Path::new(location))
            .map_err(|_| ResourceAccessError::uri(location, url::ParseError::RelativeUrlWithoutBase))?
            .to_string()
    };
    Ok(format!("{}:{}!/", scheme, inner))
}

impl PathItem for ArchivePathItem {
    fn root(&self) -> &str {
        &self.root
    }

    fn uri(&self) -> Result<Url> {
        Url::parse(&self.uri).map_err(|e| ResourceAccessError::uri(&self.uri, e))
    }

    fn search(
        &self,
        query: &Query,
        recursion: Recursion,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let index = self.cache.index()?;
        walk(&mut &*index, query, recursion, limit)
    }

    fn open(&self, name: &str) -> Result<ResourceStream> {
        self.cache.open_entry(name)
    }
}
