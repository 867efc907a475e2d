use std::fmt;
use std::sync::Arc;

use flate2::read::DeflateDecoder;
use parking_lot::RwLock;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};
use crate::archive::{Archive, ArchiveEntry, ArchiveSource, Locator};
use crate::error::{ResourceAccessError, Result};
use crate::io::SectionReader;
use crate::item::ResourceStream;
use crate::paths;

/// ZIP/JAR archive read through its central directory.
///
/// Every entry is reachable in O(1) from its central directory record, so
/// concurrent readers never share a cursor.
pub struct ZipArchive {
    source: ArchiveSource,
    location: String,
    name: String,
    parser: RwLock<Option<Arc<ZipParser>>>,
}

impl ZipArchive {
    pub fn new(source: ArchiveSource) -> Self {
        let location = source.location();
        let name = paths::base_name(&paths::normalize(&location)).to_string();
        Self {
            source,
            location,
            name,
            parser: RwLock::new(None),
        }
    }

    fn parser(&self) -> Result<Arc<ZipParser>> {
        self.parser
            .read()
            .clone()
            .ok_or_else(|| ResourceAccessError::Closed(self.location.clone()))
    }
}

impl fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipArchive")
            .field("location", &self.location)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Archive for ZipArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.location
    }

    fn entry_count(&self) -> Option<usize> {
        self.parser()
            .and_then(|parser| parser.entry_count())
            .ok()
            .map(|count| count as usize)
    }

    fn open(&self) -> Result<()> {
        let mut parser = self.parser.write();
        if parser.is_some() {
            return Ok(());
        }

        let opened = ZipParser::new(self.source.reader()?, self.location.clone());
        // Fail here, not on first search, when this is not a ZIP file.
        opened.find_eocd()?;

        tracing::debug!(archive = %self.location, "opened ZIP archive");
        *parser = Some(Arc::new(opened));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.parser.read().is_some()
    }

    fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let entries = self.parser()?.list_files()?;
        Ok(entries
            .into_iter()
            .map(|entry| ArchiveEntry {
                name: entry.file_name.clone(),
                size: Some(entry.uncompressed_size),
                is_dir: entry.is_directory,
                locator: Locator::Zip(entry),
            })
            .collect())
    }

    fn open_entry(&self, entry: &ArchiveEntry) -> Result<ResourceStream> {
        let Locator::Zip(record) = &entry.locator else {
            return Err(ResourceAccessError::malformed(
                &self.location,
                format!("`{}` is not a ZIP entry", entry.name),
            ));
        };
        let parser = self.parser()?;
        open_record(&parser, record)
    }

    fn close(&self) {
        self.parser.write().take();
    }
}

fn open_record(parser: &ZipParser, record: &ZipFileEntry) -> Result<ResourceStream> {
    let data_offset = parser.data_offset(record)?;
    let section = SectionReader::new(
        Arc::clone(parser.reader()),
        data_offset,
        record.compressed_size,
    );

    match record.compression_method {
        CompressionMethod::Stored => Ok(Box::new(section)),
        CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(section))),
        CompressionMethod::Unknown(method) => {
            Err(ResourceAccessError::UnsupportedCompression(method))
        }
    }
}
