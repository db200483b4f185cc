//! ZIP archive parsing and entry access.
//!
//! This module provides read-only access to ZIP archives on the local
//! filesystem, supporting both standard ZIP format and ZIP64 extensions
//! for large archives.
//!
//! ## Architecture
//!
//! - `structures`: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - `parser`: Low-level parsing of ZIP structures from raw bytes
//! - [`archive`]: Entry lookup and classification (file, directory, absent, unsupported)
//! - [`entry_reader`]: Bounded-memory decompressing reader for a single entry
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the EOCD first (from the end of the file),
//! then the Central Directory, which allows lookups without reading
//! the entire archive.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//! - CRC-32 verification while streaming
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

pub mod archive;
pub mod entry_reader;
mod parser;
mod structures;

pub use archive::{ArchiveChild, ArchiveEntry, ArchiveError, ZipArchive};
pub use entry_reader::EntryReader;
pub use structures::*;
