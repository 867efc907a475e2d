//! Archive adapters and the entry cache shared by the ZIP and TAR backends.
//!
//! An [`Archive`] is the only thing a format has to provide: open, list
//! entries, stream one entry, close. [`ArchiveCache`] indexes the listing
//! once, [`ArchiveCachePool`] shares caches between path items that name the
//! same physical archive, and [`ArchivePathItem`] searches an index with the
//! common walk.

mod cache;
mod item;
mod pool;

pub use cache::{ArchiveCache, EntryIndex};
pub use item::ArchivePathItem;
pub(crate) use item::archive_uri;
pub use pool::ArchiveCachePool;

#[cfg(test)]
pub(crate) use cache::tests::MemoryArchive;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::config::HttpConfig;
use crate::error::{ResourceAccessError, Result};
use crate::io::{HttpRangeReader, LocalFileReader, ReadAt};
use crate::item::ResourceStream;
use crate::zip::ZipFileEntry;

/// Read-only access to one physical archive.
pub trait Archive: Send + Sync + fmt::Debug {
    /// File name of the archive.
    fn name(&self) -> &str;

    /// Absolute path or URL the archive was opened from.
    fn path(&self) -> &str;

    /// Number of entries, when known without a full scan.
    fn entry_count(&self) -> Option<usize> {
        None
    }

    /// Establish the read handle. Calling it on an open archive does nothing.
    fn open(&self) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Every entry, in archive order.
    fn entries(&self) -> Result<Vec<ArchiveEntry>>;

    /// Stream the bytes of an entry returned by [`Archive::entries`].
    fn open_entry(&self, entry: &ArchiveEntry) -> Result<ResourceStream>;

    fn close(&self);
}

/// One file or directory inside an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Normalized relative path.
    pub name: String,
    /// Uncompressed size, when the format records it.
    pub size: Option<u64>,
    pub is_dir: bool,
    pub locator: Locator,
}

/// Where an entry's bytes live, in the terms its archive understands.
#[derive(Debug, Clone)]
pub enum Locator {
    /// Central directory record of a ZIP entry.
    Zip(ZipFileEntry),
    /// Byte offset of the data in an uncompressed container.
    Offset(u64),
    /// Position in a forward-only stream; reading it means re-reading the
    /// stream up to this index.
    Sequence(usize),
}

/// Where an archive named by a path string lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    File(PathBuf),
    Http(String),
}

/// Split `<scheme>:<location>!/` (the `!/` is optional) or a bare location
/// ending in one of `suffixes`. Returns `None` when the path is neither.
pub(crate) fn parse_location(
    path: &str,
    schemes: &[&str],
    suffixes: &[&str],
) -> Result<Option<Location>> {
    let inner = schemes.iter().find_map(|scheme| {
        path.strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix(':'))
    });

    let inner = match inner {
        Some(inner) => inner.split("!/").next().unwrap_or(inner).trim_end_matches('!'),
        None => {
            let lower = path.to_ascii_lowercase();
            if !suffixes.iter().any(|suffix| lower.ends_with(suffix)) {
                return Ok(None);
            }
            path
        }
    };

    if inner.starts_with("http://") || inner.starts_with("https://") {
        return Ok(Some(Location::Http(inner.to_string())));
    }

    if inner.starts_with("file:") {
        let url = Url::parse(inner).map_err(|e| ResourceAccessError::uri(path, e))?;
        let file = url.to_file_path().map_err(|_| ResourceAccessError::InvalidUri {
            uri: path.to_string(),
            source: url::ParseError::RelativeUrlWithoutBase,
        })?;
        return Ok(Some(Location::File(file)));
    }

    if inner.is_empty() {
        return Err(ResourceAccessError::InvalidUri {
            uri: path.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }

    Ok(Some(Location::File(PathBuf::from(inner))))
}

/// An opened-on-demand byte source for one archive.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    Local(PathBuf),
    Http { url: String, config: HttpConfig },
}

impl ArchiveSource {
    pub(crate) fn new(location: Location, http: &HttpConfig) -> Self {
        match location {
            Location::File(path) => ArchiveSource::Local(path),
            Location::Http(url) => ArchiveSource::Http {
                url,
                config: http.clone(),
            },
        }
    }

    /// Absolute path or URL.
    pub fn location(&self) -> String {
        match self {
            ArchiveSource::Local(path) => path.display().to_string(),
            ArchiveSource::Http { url, .. } => url.clone(),
        }
    }

    pub fn reader(&self) -> Result<Arc<dyn ReadAt>> {
        Ok(match self {
            ArchiveSource::Local(path) => Arc::new(LocalFileReader::new(path)?),
            ArchiveSource::Http { url, config } => Arc::new(HttpRangeReader::new(url.clone(), config)?),
        })
    }
}

impl Location {
    /// Pool key and display root: the canonical path, or the URL as given.
    pub(crate) fn canonical(self) -> Result<(Location, String)> {
        match self {
            Location::File(path) => {
                let path = path
                    .canonicalize()
                    .map_err(|e| ResourceAccessError::io(path.display().to_string(), e))?;
                let key = path.display().to_string();
                Ok((Location::File(path), key))
            }
            Location::Http(url) => {
                let key = url.clone();
                Ok((Location::Http(url), key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMES: &[&str] = &["jar", "zip"];
    const SUFFIXES: &[&str] = &[".jar", ".zip"];

    fn parse(path: &str) -> Option<Location> {
        parse_location(path, SCHEMES, SUFFIXES).unwrap()
    }

    #[test]
    fn bare_paths_are_claimed_by_suffix() {
        assert_eq!(parse("/x/lib.JAR"), Some(Location::File("/x/lib.JAR".into())));
        assert_eq!(parse("/x/lib.tar"), None);
        assert_eq!(
            parse("https://host/lib.zip"),
            Some(Location::Http("https://host/lib.zip".into()))
        );
    }

    #[test]
    fn scheme_prefixed_paths() {
        #[cfg(unix)]
        assert_eq!(
            parse("jar:file:///x/lib.jar!/"),
            Some(Location::File("/x/lib.jar".into()))
        );
        assert_eq!(
            parse("jar:https://host/lib.jar!/"),
            Some(Location::Http("https://host/lib.jar".into()))
        );
        assert_eq!(parse("zip:/x/archive"), Some(Location::File("/x/archive".into())));
        assert!(parse_location("jar:!/", SCHEMES, SUFFIXES).is_err());
    }
}
