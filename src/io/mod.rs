//! Random-access byte sources.
//!
//! Archives that keep a directory (ZIP central directory, recorded TAR data
//! offsets) are read through [`ReadAt`], so the same parser works over a
//! local file and over HTTP Range requests.

mod http;
mod local;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;

use std::io::{self, Read};
use std::sync::Arc;

use crate::error::{ResourceAccessError, Result};

/// Trait for random access reading from a data source
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely, issuing as many reads as the source needs.
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read_at(offset, buf)?;
            if n == 0 {
                return Err(ResourceAccessError::io(
                    format!("offset {}", offset),
                    io::Error::from(io::ErrorKind::UnexpectedEof),
                ));
            }
            offset += n as u64;
            buf = &mut buf[n..];
        }
        Ok(())
    }
}

/// A bounded window `[offset, offset + len)` of a [`ReadAt`] source exposed as
/// a forward-only [`Read`].
pub struct SectionReader {
    reader: Arc<dyn ReadAt>,
    offset: u64,
    len: u64,
    pos: u64,
}

impl SectionReader {
    pub fn new(reader: Arc<dyn ReadAt>, offset: u64, len: u64) -> Self {
        Self {
            reader,
            offset,
            len,
            pos: 0,
        }
    }
}

impl Read for SectionReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len - self.pos;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(remaining) as usize;
        let n = self
            .reader
            .read_at(self.offset + self.pos, &mut buf[..want])
            .map_err(io::Error::other)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source ended {} bytes before the end of the section", remaining),
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}
