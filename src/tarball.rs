//! TAR archives, plain or gzip-compressed.
//!
//! A plain TAR records where every entry's data starts, so entries are read
//! straight from those offsets like STORED ZIP entries. A compressed stream
//! has no such directory: each entry remembers its position in the stream
//! and opening it re-reads the stream from the start up to that position.

use std::fmt;
use std::io::{BufReader, Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::read::GzDecoder;
use parking_lot::RwLock;

use crate::archive::{
    Archive, ArchiveCachePool, ArchiveEntry, ArchivePathItem, ArchiveSource, Locator,
    archive_uri, parse_location,
};
use crate::config::HttpConfig;
use crate::error::{ResourceAccessError, Result};
use crate::io::{ReadAt, SectionReader};
use crate::item::{PathItem, ResourceStream};
use crate::paths;
use crate::registry::PathItemFactory;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const STREAM_BUFFER: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
}

struct OpenTar {
    reader: Arc<dyn ReadAt>,
    compression: TarCompression,
}

impl OpenTar {
    /// The archive as one forward-only stream of TAR blocks.
    fn stream(&self) -> Box<dyn Read + Send> {
        let raw = BufReader::with_capacity(
            STREAM_BUFFER,
            SectionReader::new(Arc::clone(&self.reader), 0, self.reader.size()),
        );
        match self.compression {
            TarCompression::None => Box::new(raw),
            TarCompression::Gzip => Box::new(GzDecoder::new(raw)),
        }
    }
}

pub struct TarArchive {
    source: ArchiveSource,
    location: String,
    name: String,
    state: RwLock<Option<Arc<OpenTar>>>,
    rewinds: AtomicUsize,
}

impl TarArchive {
    pub fn new(source: ArchiveSource) -> Self {
        let location = source.location();
        let name = paths::base_name(&paths::normalize(&location)).to_string();
        Self {
            source,
            location,
            name,
            state: RwLock::new(None),
            rewinds: AtomicUsize::new(0),
        }
    }

    /// Detected when the archive is opened.
    pub fn compression(&self) -> Option<TarCompression> {
        self.state.read().as_ref().map(|state| state.compression)
    }

    /// How many times a compressed stream was re-read to reach an entry.
    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::Relaxed)
    }

    fn state(&self) -> Result<Arc<OpenTar>> {
        self.state
            .read()
            .clone()
            .ok_or_else(|| ResourceAccessError::Closed(self.location.clone()))
    }

    fn malformed(&self, source: std::io::Error) -> ResourceAccessError {
        ResourceAccessError::malformed(&self.location, source.to_string())
    }

    fn read_sequence(&self, state: &OpenTar, entry: &ArchiveEntry, index: usize) -> Result<Vec<u8>> {
        self.rewinds.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(
            archive = %self.location,
            entry = %entry.name,
            index,
            "re-reading compressed TAR stream"
        );

        let mut tar = tar::Archive::new(state.stream());
        let mut found = tar
            .entries()
            .map_err(|e| self.malformed(e))?
            .nth(index)
            .ok_or_else(|| ResourceAccessError::EntryNotFound {
                root: self.location.clone(),
                name: entry.name.clone(),
            })?
            .map_err(|e| self.malformed(e))?;

        let mut data = Vec::new();
        found
            .read_to_end(&mut data)
            .map_err(|e| ResourceAccessError::io(paths::join(&self.location, &entry.name), e))?;
        Ok(data)
    }
}

impl fmt::Debug for TarArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarArchive")
            .field("location", &self.location)
            .field("compression", &self.compression())
            .finish()
    }
}

impl Archive for TarArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.location
    }

    fn open(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Ok(());
        }

        let reader = self.source.reader()?;
        let mut magic = [0u8; 2];
        let compression = if reader.size() >= magic.len() as u64 {
            reader.read_exact_at(0, &mut magic)?;
            if magic == GZIP_MAGIC {
                TarCompression::Gzip
            } else {
                TarCompression::None
            }
        } else {
            TarCompression::None
        };

        let tar = OpenTar {
            reader,
            compression,
        };
        // The first header must parse; an empty stream is an empty archive.
        let mut first = tar::Archive::new(tar.stream());
        first
            .entries()
            .and_then(|mut entries| entries.next().transpose().map(|_| ()))
            .map_err(|e| self.malformed(e))?;

        tracing::debug!(archive = %self.location, ?compression, "opened TAR archive");
        *state = Some(Arc::new(tar));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let state = self.state()?;
        let mut tar = tar::Archive::new(state.stream());
        let mut entries = Vec::new();

        // Indexes count every header the reader yields, so a later re-read
        // can skip to the same position.
        for (index, entry) in tar.entries().map_err(|e| self.malformed(e))?.enumerate() {
            let entry = entry.map_err(|e| self.malformed(e))?;
            let kind = entry.header().entry_type();
            if !kind.is_file() && !kind.is_dir() {
                continue;
            }

            let name = entry
                .path()
                .map_err(|e| self.malformed(e))?
                .to_string_lossy()
                .into_owned();
            let locator = match state.compression {
                TarCompression::None => Locator::Offset(entry.raw_file_position()),
                TarCompression::Gzip => Locator::Sequence(index),
            };

            entries.push(ArchiveEntry {
                name,
                size: Some(entry.size()),
                is_dir: kind.is_dir(),
                locator,
            });
        }

        Ok(entries)
    }

    fn open_entry(&self, entry: &ArchiveEntry) -> Result<ResourceStream> {
        let state = self.state()?;
        match entry.locator {
            Locator::Offset(offset) => Ok(Box::new(SectionReader::new(
                Arc::clone(&state.reader),
                offset,
                entry.size.unwrap_or(0),
            ))),
            Locator::Sequence(index) => {
                Ok(Box::new(Cursor::new(self.read_sequence(&state, entry, index)?)))
            }
            Locator::Zip(_) => Err(ResourceAccessError::malformed(
                &self.location,
                format!("`{}` is not a TAR entry", entry.name),
            )),
        }
    }

    fn close(&self) {
        self.state.write().take();
    }
}

/// Claims `tar:` URIs and paths ending in `.tar`, `.tar.gz` or `.tgz`.
#[derive(Debug)]
pub struct TarPathItemFactory {
    pool: Arc<ArchiveCachePool>,
    http: HttpConfig,
}

impl TarPathItemFactory {
    pub const SCHEMES: &'static [&'static str] = &["tar"];
    pub const SUFFIXES: &'static [&'static str] = &[".tar", ".tar.gz", ".tgz"];

    pub fn new(pool: Arc<ArchiveCachePool>, http: HttpConfig) -> Self {
        Self { pool, http }
    }
}

impl PathItemFactory for TarPathItemFactory {
    fn name(&self) -> &str {
        "tar"
    }

    fn path_item(&self, path: &str) -> Result<Option<Arc<dyn PathItem>>> {
        let Some(location) = parse_location(path, Self::SCHEMES, Self::SUFFIXES)? else {
            return Ok(None);
        };
        let (location, key) = location.canonical()?;

        let source = ArchiveSource::new(location, &self.http);
        let cache = self.pool.get_or_open(&key, || {
            Ok(Box::new(TarArchive::new(source)) as Box<dyn Archive>)
        })?;

        Ok(Some(Arc::new(ArchivePathItem::new(
            key.clone(),
            archive_uri("tar", &key)?,
            cache,
        ))))
    }
}
