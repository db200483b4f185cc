use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::Path;

/// Local file reader with random access support.
///
/// Reads are positional (`pread` on Unix, `seek_read` on Windows), so one
/// reader can be shared between the central directory parser and any number
/// of entry streams without a shared cursor.
pub struct LocalFileReader {
    file: File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Blocking positional read, used by entry streams on the blocking pool.
    pub fn pread(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = (offset, buf);
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "positional reads are not supported on this platform",
            ))
        }
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        Ok(self.pread(offset, buf)?)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
