use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use super::{Node, PathItem, Query, Recursion, ResourceStream, Tree, walk};
use crate::error::{ResourceAccessError, Result};
use crate::paths;
use crate::registry::PathItemFactory;

/// A local directory.
#[derive(Debug)]
pub struct DirectoryPathItem {
    dir: PathBuf,
    root: String,
}

impl DirectoryPathItem {
    /// `dir` should be absolute; the factory canonicalizes it.
    pub fn new(dir: PathBuf) -> Self {
        let root = dir.display().to_string();
        Self { dir, root }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.dir.clone(), |path, segment| path.join(segment))
    }
}

struct DirectoryTree<'a> {
    root: &'a Path,
}

impl Tree for DirectoryTree<'_> {
    fn children(&mut self, dir: &str) -> Result<Vec<Node>> {
        let path = dir.split('/').fold(self.root.to_path_buf(), |path, segment| {
            if segment.is_empty() {
                path
            } else {
                path.join(segment)
            }
        });

        // A directory that vanished or cannot be listed simply has no entries.
        let listing = match fs::read_dir(&path) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "cannot list directory");
                return Ok(Vec::new());
            }
        };

        let mut nodes = Vec::new();
        for entry in listing.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            nodes.push(Node {
                path: paths::join(dir, &name),
                is_dir: file_type.is_dir(),
            });
        }
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(nodes)
    }
}

impl PathItem for DirectoryPathItem {
    fn root(&self) -> &str {
        &self.root
    }

    fn uri(&self) -> Result<Url> {
        Url::from_directory_path(&self.dir).map_err(|_| {
            ResourceAccessError::uri(&self.root, url::ParseError::RelativeUrlWithoutBase)
        })
    }

    fn search(
        &self,
        query: &Query,
        recursion: Recursion,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        walk(&mut DirectoryTree { root: &self.dir }, query, recursion, limit)
    }

    fn open(&self, name: &str) -> Result<ResourceStream> {
        if paths::escapes_root(name) {
            return Err(ResourceAccessError::EntryNotFound {
                root: self.root.clone(),
                name: name.to_string(),
            });
        }

        let path = self.file_path(name);
        let file = fs::File::open(&path)
            .map_err(|e| ResourceAccessError::io(path.display().to_string(), e))?;
        Ok(Box::new(file))
    }

    fn resource_path(&self, name: &str) -> String {
        self.file_path(name).display().to_string()
    }
}

/// Claims existing directories, given as plain paths or `file:` URLs.
#[derive(Debug, Default)]
pub struct DirectoryPathItemFactory;

impl PathItemFactory for DirectoryPathItemFactory {
    fn name(&self) -> &str {
        "directory"
    }

    fn path_item(&self, path: &str) -> Result<Option<Arc<dyn PathItem>>> {
        let dir = if path.starts_with("file:") {
            let url = Url::parse(path).map_err(|e| ResourceAccessError::uri(path, e))?;
            match url.to_file_path() {
                Ok(dir) => dir,
                Err(()) => return Ok(None),
            }
        } else {
            PathBuf::from(path)
        };

        if !dir.is_dir() {
            return Ok(None);
        }

        let dir = dir
            .canonicalize()
            .map_err(|e| ResourceAccessError::io(path, e))?;
        Ok(Some(Arc::new(DirectoryPathItem::new(dir))))
    }
}
