use std::fs::File;
use std::path::{Path, PathBuf};

use super::ReadAt;
use crate::error::{ResourceAccessError, Result};

/// Local file reader with random access support
pub struct LocalFileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| ResourceAccessError::io(&display, e))?;
        let size = file
            .metadata()
            .map_err(|e| ResourceAccessError::io(&display, e))?
            .len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: std::io::Error) -> ResourceAccessError {
        ResourceAccessError::io(self.path.display().to_string(), source)
    }
}

impl ReadAt for LocalFileReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset).map_err(|e| self.error(e))
        }

        #[cfg(windows)]
        {
            // seek_read moves the shared cursor, but every caller goes through
            // read_at with an explicit offset so the cursor is never relied on.
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset).map_err(|e| self.error(e))
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))
                .and_then(|_| file.read(buf))
                .map_err(|e| self.error(e))
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
