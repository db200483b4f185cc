//! Second trust boundary: resolved path -> archive file + entry path.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

use super::resolver::ResolvedPath;

/// An archive directly under the root, and a path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEntry {
    /// Absolute path of the archive file
    pub archive: PathBuf,
    /// File name of the archive, the first segment of every listing path
    pub archive_name: String,
    /// `/`-joined path inside the archive; empty for the archive root
    pub entry_path: String,
}

/// Split a resolved path into its first segment below `root` and the rest.
///
/// Returns `None` when the path is not below `root` or any segment is not
/// valid UTF-8. No filesystem access.
pub fn split(root: &Path, resolved: &ResolvedPath) -> Option<LocatedEntry> {
    let relative = resolved.as_path().strip_prefix(root).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            _ => return None,
        }
    }

    let (archive_name, rest) = segments.split_first()?;
    Some(LocatedEntry {
        archive: root.join(archive_name),
        archive_name: archive_name.to_string(),
        entry_path: rest.join("/"),
    })
}

/// Locate the archive named by `resolved`.
///
/// Only regular files (symlinks are followed) whose extension is exactly
/// `extension` qualify; anything else under the root stays invisible.
pub async fn locate(root: &Path, resolved: &ResolvedPath, extension: &str) -> Option<LocatedEntry> {
    let located = split(root, resolved)?;

    if located.archive.extension().and_then(|ext| ext.to_str()) != Some(extension) {
        return None;
    }

    match fs::metadata(&located.archive).await {
        Ok(metadata) if metadata.is_file() => Some(located),
        _ => None,
    }
}
