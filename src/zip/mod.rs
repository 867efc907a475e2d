//! ZIP and JAR archives.
//!
//! The module is organized into:
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`archive`]: [`ZipArchive`], the [`Archive`] adapter the resource layer uses
//!
//! The central directory is read once per archive and cached by
//! [`ArchiveCache`](crate::archive::ArchiveCache); entries are then streamed
//! straight from their recorded offsets, over a local file or HTTP Range
//! requests alike.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use structures::*;

use std::sync::Arc;

use crate::archive::{
    Archive, ArchiveCachePool, ArchivePathItem, ArchiveSource, archive_uri, parse_location,
};
use crate::config::HttpConfig;
use crate::error::Result;
use crate::item::PathItem;
use crate::registry::PathItemFactory;

/// Claims `jar:`/`zip:` URIs and paths or URLs ending in `.jar` or `.zip`.
#[derive(Debug)]
pub struct ZipPathItemFactory {
    pool: Arc<ArchiveCachePool>,
    http: HttpConfig,
}

impl ZipPathItemFactory {
    pub const SCHEMES: &'static [&'static str] = &["jar", "zip"];
    pub const SUFFIXES: &'static [&'static str] = &[".jar", ".zip"];

    pub fn new(pool: Arc<ArchiveCachePool>, http: HttpConfig) -> Self {
        Self { pool, http }
    }
}

impl PathItemFactory for ZipPathItemFactory {
    fn name(&self) -> &str {
        "zip"
    }

    fn path_item(&self, path: &str) -> Result<Option<Arc<dyn PathItem>>> {
        let Some(location) = parse_location(path, Self::SCHEMES, Self::SUFFIXES)? else {
            return Ok(None);
        };
        let (location, key) = location.canonical()?;

        let source = ArchiveSource::new(location, &self.http);
        let cache = self.pool.get_or_open(&key, || {
            Ok(Box::new(ZipArchive::new(source)) as Box<dyn Archive>)
        })?;

        Ok(Some(Arc::new(ArchivePathItem::new(
            key.clone(),
            archive_uri("jar", &key)?,
            cache,
        ))))
    }
}
