//! Streaming access to a single entry's content.

use std::cmp;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use crc32fast::Hasher;
use flate2::read::DeflateDecoder;

use crate::io::LocalFileReader;

use super::structures::{CompressionMethod, ZipFileEntry};

/// The raw (possibly compressed) bytes of one entry, read positionally.
struct DataSection {
    reader: Arc<LocalFileReader>,
    offset: u64,
    remaining: u64,
}

impl Read for DataSection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let len = cmp::min(buf.len() as u64, self.remaining) as usize;
        let n = self.reader.pread(self.offset, &mut buf[..len])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive ended inside entry data",
            ));
        }

        self.offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Decompressing reader over one entry.
///
/// Holds its own reference to the archive file, so the handle stays open
/// exactly as long as some reader needs it. Size and CRC-32 are checked
/// when the underlying data is exhausted; a mismatch surfaces as an
/// [`io::ErrorKind::InvalidData`] error instead of a clean end of stream.
pub struct EntryReader {
    inner: Box<dyn Read + Send>,
    name: String,
    hasher: Hasher,
    expected_crc: u32,
    expected_size: u64,
    produced: u64,
    verified: bool,
}

impl EntryReader {
    /// Build a reader for `entry` whose data starts at `data_offset`.
    ///
    /// Callers must have rejected compression methods other than STORED and
    /// DEFLATE already; see [`ZipArchive::open_entry`](super::ZipArchive::open_entry).
    pub(crate) fn new(reader: Arc<LocalFileReader>, data_offset: u64, entry: &ZipFileEntry) -> Self {
        let section = DataSection {
            reader,
            offset: data_offset,
            remaining: entry.compressed_size,
        };

        let inner: Box<dyn Read + Send> = match entry.compression_method {
            CompressionMethod::Deflate => Box::new(DeflateDecoder::new(section)),
            _ => Box::new(section),
        };

        Self {
            inner,
            name: entry.file_name.clone(),
            hasher: Hasher::new(),
            expected_crc: entry.crc32,
            expected_size: entry.uncompressed_size,
            produced: 0,
            verified: false,
        }
    }

    /// Declared uncompressed size of the entry
    pub fn size(&self) -> u64 {
        self.expected_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn verify(&mut self) -> io::Result<()> {
        if self.verified {
            return Ok(());
        }
        self.verified = true;

        if self.produced != self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: expected {} bytes, decompressed {}",
                    self.name, self.expected_size, self.produced
                ),
            ));
        }

        let actual = self.hasher.clone().finalize();
        if actual != self.expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: CRC-32 mismatch, expected {:08x}, got {:08x}",
                    self.name, self.expected_crc, actual
                ),
            ));
        }

        Ok(())
    }
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.inner.read(buf)?;
        if n == 0 {
            self.verify()?;
            return Ok(0);
        }

        self.produced += n as u64;
        if self.produced > self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: entry data exceeds declared size of {} bytes",
                    self.name, self.expected_size
                ),
            ));
        }

        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

impl fmt::Debug for EntryReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryReader")
            .field("name", &self.name)
            .field("expected_size", &self.expected_size)
            .field("produced", &self.produced)
            .finish()
    }
}
