//! Entry lookup inside an opened archive.
//!
//! Directories in a ZIP file are only a naming convention: an archive may
//! carry explicit `dir/` records, or nothing but `dir/file` names. Lookups
//! here treat both the same way, and the empty path always names the
//! archive root.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::io::LocalFileReader;

use super::entry_reader::EntryReader;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, EntryKind, ZipFileEntry};

/// Failures while opening an archive or one of its entries
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt archive {path}: {reason:#}")]
    Corrupt { path: PathBuf, reason: anyhow::Error },

    #[error("entry {entry} in {path} uses unsupported compression method {method}")]
    UnsupportedCompression {
        path: PathBuf,
        entry: String,
        method: u16,
    },

    #[error("entry {entry} in {path} is encrypted")]
    Encrypted { path: PathBuf, entry: String },
}

/// Result of looking up a path inside an archive
#[derive(Debug)]
pub enum ArchiveEntry<'a> {
    /// A regular file; open it with [`ZipArchive::open_entry`]
    File(&'a ZipFileEntry),
    /// An explicit or implicit directory with its immediate children
    Directory(Vec<ArchiveChild>),
    /// Nothing in the archive answers to this path
    Absent,
    /// A record that exists but is neither a file nor a directory
    Unsupported(&'a ZipFileEntry, EntryKind),
}

/// One immediate child of a directory inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveChild {
    pub name: String,
    pub kind: EntryKind,
    /// Uncompressed size, present for regular files only
    pub size: Option<u64>,
}

impl ArchiveChild {
    fn directory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: EntryKind::Directory,
            size: None,
        }
    }

    fn from_entry(name: &str, entry: &ZipFileEntry) -> Self {
        let kind = entry.kind();
        Self {
            name: name.to_string(),
            kind,
            size: (kind == EntryKind::File).then_some(entry.uncompressed_size),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A ZIP archive opened for reading.
///
/// Holds the central directory in memory and the file handle behind an
/// `Arc`; the handle closes once the archive and every [`EntryReader`]
/// opened from it are dropped.
pub struct ZipArchive {
    path: PathBuf,
    parser: ZipParser<LocalFileReader>,
    entries: Vec<ZipFileEntry>,
}

impl ZipArchive {
    /// Open `path` and read its central directory
    pub async fn open(path: &Path) -> Result<Self, ArchiveError> {
        let reader = LocalFileReader::new(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let parser = ZipParser::new(Arc::new(reader));
        let entries = parser
            .central_directory()
            .await
            .map_err(|reason| ArchiveError::Corrupt {
                path: path.to_path_buf(),
                reason,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            parser,
            entries,
        })
    }

    /// Look up `entry_path` (`/`-separated, no leading or trailing slash).
    ///
    /// An exact record wins; otherwise `entry_path/` or any deeper name
    /// makes it a directory. The empty path is the archive root.
    pub fn find_entry(&self, entry_path: &str) -> ArchiveEntry<'_> {
        if entry_path.is_empty() {
            return ArchiveEntry::Directory(self.children(""));
        }

        if let Some(entry) = self.entries.iter().find(|e| e.file_name == entry_path) {
            return match entry.kind() {
                EntryKind::File => ArchiveEntry::File(entry),
                EntryKind::Directory => ArchiveEntry::Directory(self.children(entry_path)),
                kind => ArchiveEntry::Unsupported(entry, kind),
            };
        }

        let dir_prefix = format!("{entry_path}/");
        if self
            .entries
            .iter()
            .any(|e| e.file_name.starts_with(&dir_prefix))
        {
            ArchiveEntry::Directory(self.children(entry_path))
        } else {
            ArchiveEntry::Absent
        }
    }

    /// Immediate children of the directory `dir` (empty for the root).
    ///
    /// Names deeper than one level contribute their first segment as an
    /// implicit directory. Empty, `.` and `..` names are never returned, so
    /// a hostile entry table cannot point a listing outside the archive.
    pub fn children(&self, dir: &str) -> Vec<ArchiveChild> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut children: HashMap<String, ArchiveChild> = HashMap::new();
        for entry in &self.entries {
            let Some(rest) = entry.file_name.strip_prefix(prefix.as_str()) else {
                continue;
            };

            let (name, nested) = match rest.split_once('/') {
                Some((name, _)) => (name, true),
                None => (rest, false),
            };
            if matches!(name, "" | "." | "..") {
                continue;
            }

            let child = if nested {
                ArchiveChild::directory(name)
            } else {
                ArchiveChild::from_entry(name, entry)
            };

            // A directory outranks a same-named non-directory record
            let replace = match children.get(name) {
                None => true,
                Some(existing) => !existing.is_directory() && child.is_directory(),
            };
            if replace {
                children.insert(name.to_string(), child);
            }
        }

        children.into_values().collect()
    }

    /// Open a reader over a file entry's uncompressed content.
    ///
    /// Fails up front for encrypted entries and unknown compression
    /// methods, before any content is produced.
    pub async fn open_entry(&self, entry: &ZipFileEntry) -> Result<EntryReader, ArchiveError> {
        if entry.is_encrypted() {
            return Err(ArchiveError::Encrypted {
                path: self.path.clone(),
                entry: entry.file_name.clone(),
            });
        }

        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(ArchiveError::UnsupportedCompression {
                path: self.path.clone(),
                entry: entry.file_name.clone(),
                method,
            });
        }

        let data_offset =
            self.parser
                .data_offset(entry)
                .await
                .map_err(|reason| ArchiveError::Corrupt {
                    path: self.path.clone(),
                    reason,
                })?;

        Ok(EntryReader::new(
            Arc::clone(self.parser.reader()),
            data_offset,
            entry,
        ))
    }
}
