//! Validated runtime configuration for the unzip service.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::unzip::MediaTypes;

/// Where archives live and how they are recognized.
#[derive(Debug, Clone)]
pub struct UnzipConfig {
    /// Canonical, absolute root directory holding the archives
    pub root: PathBuf,
    /// Archive file extension without the leading dot, e.g. `zip`
    pub extension: String,
    pub media_types: MediaTypes,
}

impl UnzipConfig {
    /// Validate and canonicalize `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>, extension: &str) -> Result<Self, ConfigError> {
        let path = root.as_ref();
        let root = path.canonicalize().map_err(|source| ConfigError::Root {
            path: path.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root));
        }

        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\', '.']) {
            return Err(ConfigError::Extension(extension.to_string()));
        }

        Ok(Self {
            root,
            extension: extension.to_string(),
            media_types: MediaTypes::default(),
        })
    }

    /// Apply `EXT=TYPE` media type overrides
    pub fn with_media_types<I, S>(mut self, mappings: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for mapping in mappings {
            let mapping = mapping.as_ref();
            match mapping.split_once('=') {
                Some((ext, media_type))
                    if !ext.trim().is_empty() && media_type.contains('/') =>
                {
                    self.media_types.insert(ext.trim(), media_type.trim());
                }
                _ => return Err(ConfigError::MediaType(mapping.to_string())),
            }
        }
        Ok(self)
    }
}
