use url::Url;

use super::{PathItem, Query, Recursion, ResourceStream};
use crate::error::{ResourceAccessError, Result};

/// Stand-in for a path no factory could resolve: searches find nothing and
/// opening anything fails.
#[derive(Debug, Clone)]
pub struct NullPathItem {
    root: String,
}

impl NullPathItem {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl PathItem for NullPathItem {
    fn root(&self) -> &str {
        &self.root
    }

    fn uri(&self) -> Result<Url> {
        Err(ResourceAccessError::Unresolved(self.root.clone()))
    }

    fn search(&self, _: &Query, _: Recursion, _: Option<usize>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn open(&self, _: &str) -> Result<ResourceStream> {
        Err(ResourceAccessError::Unresolved(self.root.clone()))
    }
}
