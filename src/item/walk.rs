//! The traversal every backend shares.
//!
//! Backends only say how to list one directory ([`Tree::children`]); the walk
//! owns the recursion policy, the match predicate and the result limit. It
//! keeps pending directories on an explicit stack so deep trees cannot
//! exhaust the call stack.

use super::{Query, Recursion};
use crate::error::Result;
use crate::paths;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Normalized path relative to the item root.
    pub path: String,
    pub is_dir: bool,
}

impl Node {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Enumeration capability of one backend.
pub trait Tree {
    /// Direct children of `dir` (`""` is the root). A directory that does not
    /// exist has no children.
    fn children(&mut self, dir: &str) -> Result<Vec<Node>>;
}

/// Collect the paths of files matching `query`, starting from
/// [`Query::start_dir`]. `limit` of `None` collects everything.
pub fn walk<T: Tree + ?Sized>(
    tree: &mut T,
    query: &Query,
    recursion: Recursion,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut found = Vec::new();
    if limit == Some(0) {
        return Ok(found);
    }
    // Names are relative to the root and never leave it.
    if let Query::Name(name) = query
        && paths::escapes_root(name)
    {
        return Ok(found);
    }

    let mut pending = vec![query.start_dir().to_string()];

    while let Some(dir) = pending.pop() {
        let mut subdirs = Vec::new();

        for node in tree.children(&dir)? {
            if node.is_dir {
                if recursion == Recursion::Recursive {
                    subdirs.push(node.path);
                }
                continue;
            }

            if query.matches(&node.path) {
                found.push(node.path);
                if limit == Some(found.len()) {
                    return Ok(found);
                }
            }
        }

        // Reverse so siblings are visited in listing order.
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(found)
}
