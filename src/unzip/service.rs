use std::path::PathBuf;

use log::{debug, warn};

use crate::config::UnzipConfig;
use crate::error::UnzipError;
use crate::zip::{ArchiveEntry, EntryReader, ZipArchive};

use super::listing::DirectoryListing;
use super::{locator, resolver};

/// A file entry ready to stream
#[derive(Debug)]
pub struct FileContent {
    pub reader: EntryReader,
    /// Guessed content type; `None` means send no `Content-Type`
    pub content_type: Option<String>,
    /// Declared uncompressed size
    pub size: u64,
    pub archive: PathBuf,
    pub entry_path: String,
}

/// What a successful request produces
#[derive(Debug)]
pub enum Outcome {
    File(FileContent),
    Listing(DirectoryListing),
}

/// Stateless request handler over one root directory
#[derive(Debug, Clone)]
pub struct Unzipper {
    config: UnzipConfig,
}

impl Unzipper {
    pub fn new(config: UnzipConfig) -> Self {
        Self { config }
    }

    /// Answer a decoded, root-relative request path such as
    /// `run.zip/logs/out.txt`.
    pub async fn handle(&self, requested: &str) -> Result<Outcome, UnzipError> {
        let resolved = resolver::resolve(&self.config.root, requested).inspect_err(|rejected| {
            debug!("Rejected request path {requested:?}: {rejected}");
        })?;

        let located = locator::locate(&self.config.root, &resolved, &self.config.extension)
            .await
            .ok_or(UnzipError::ArchiveNotFound)?;

        let archive = ZipArchive::open(&located.archive).await?;

        match archive.find_entry(&located.entry_path) {
            ArchiveEntry::File(entry) => {
                let reader = archive.open_entry(entry).await?;
                Ok(Outcome::File(FileContent {
                    content_type: self.config.media_types.guess(&located.entry_path),
                    size: reader.size(),
                    reader,
                    archive: located.archive,
                    entry_path: located.entry_path,
                }))
            }
            ArchiveEntry::Directory(children) => Ok(Outcome::Listing(DirectoryListing::build(
                &located.archive_name,
                &located.entry_path,
                children,
            ))),
            ArchiveEntry::Absent => Err(UnzipError::EntryNotFound {
                archive: located.archive,
                entry: located.entry_path,
            }),
            ArchiveEntry::Unsupported(entry, kind) => {
                warn!(
                    "Cannot unzip an entry that is neither a file nor a directory, \
                     archive = {}, entry = {}, kind = {}",
                    located.archive.display(),
                    entry.file_name,
                    kind
                );
                Err(UnzipError::UnsupportedEntry {
                    archive: located.archive,
                    entry: located.entry_path,
                    kind,
                })
            }
        }
    }
}
