//! Low-level ZIP archive parser.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. To stream an entry, read its Local File Header to find the data
//!
//! Listing an archive therefore touches only its tail, which keeps HTTP
//! sources down to a couple of Range requests.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use crate::error::{ResourceAccessError, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Parses ZIP structures out of any [`ReadAt`] source.
pub struct ZipParser {
    reader: Arc<dyn ReadAt>,
    /// Archive path or URL, for error messages
    name: String,
    size: u64,
}

impl ZipParser {
    pub fn new(reader: Arc<dyn ReadAt>, name: impl Into<String>) -> Self {
        let size = reader.size();
        Self {
            reader,
            name: name.into(),
            size,
        }
    }

    fn malformed(&self, reason: impl ToString) -> ResourceAccessError {
        ResourceAccessError::malformed(&self.name, reason.to_string())
    }

    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the file.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no archive comment, EOCD is the last 22 bytes.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let buf = self.read(offset, EndOfCentralDirectory::SIZE)?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf).map_err(|e| self.malformed(e))?;
                return Ok((eocd, offset));
            }
        }

        // Otherwise search backwards through the largest possible comment.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;
        let buf = self.read(search_start, search_size as usize)?;

        if buf.len() >= EndOfCentralDirectory::SIZE {
            for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
                if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                    continue;
                }

                // The comment length must account for every remaining byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])
                            .map_err(|e| self.malformed(e))?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(self.malformed("not a valid ZIP file"))
    }

    /// Read the ZIP64 End of Central Directory record that precedes the
    /// regular EOCD at `eocd_offset`.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| self.malformed("missing ZIP64 locator"))?;
        let locator_buf = self.read(locator_offset, Zip64EOCDLocator::SIZE)?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf).map_err(|e| self.malformed(e))?;

        let eocd64_buf = self.read(locator.eocd64_offset, Zip64EOCD::MIN_SIZE)?;
        Zip64EOCD::from_bytes(&eocd64_buf).map_err(|e| self.malformed(e))
    }

    /// Number of entries recorded in the EOCD.
    pub fn entry_count(&self) -> Result<u64> {
        let (eocd, eocd_offset) = self.find_eocd()?;
        if eocd.is_zip64() {
            Ok(self.read_zip64_eocd(eocd_offset)?.total_entries)
        } else {
            Ok(eocd.total_entries as u64)
        }
    }

    /// List all entries from the Central Directory.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            return Err(self.malformed("central directory lies outside the file"));
        }

        // One read for the whole directory; a single Range request over HTTP.
        let cd_data = self.read(cd_offset, cd_size as usize)?;

        let mut cursor = Cursor::new(cd_data.as_slice());
        let mut entries = Vec::with_capacity(total_entries.min(u16::MAX as u64) as usize);

        for _ in 0..total_entries {
            if cd_data.len() - (cursor.position() as usize).min(cd_data.len()) < CDFH_MIN_SIZE {
                return Err(self.malformed("central directory is truncated"));
            }
            let entry = parse_cdfh(&mut cursor).map_err(|e| self.malformed(e))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first data byte of `entry`.
    ///
    /// The Local File Header repeats the name and may carry a different extra
    /// field than the Central Directory, so its lengths are read again here.
    pub fn data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh_buf = self.read(entry.lfh_offset, LFH_SIZE)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(self.malformed(format!(
                "invalid Local File Header for `{}`",
                entry.file_name
            )));
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(|e| self.malformed(e))?;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(|e| self.malformed(e))?;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length as u64 + extra_field_length as u64)
    }

    pub fn reader(&self) -> &Arc<dyn ReadAt> {
        &self.reader
    }
}

/// Parse one Central Directory File Header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> io::Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid Central Directory File Header",
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Non-UTF8 names are kept, lossily.
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/') || file_name.ends_with('\\');

    // ZIP64 sizes and offsets live in extra field 0x0001, present only for
    // header fields saturated to 0xFFFFFFFF.
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }

        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}
