//! Content type guessing for archive entries.

use std::collections::HashMap;
use std::path::Path;

/// Built-in extension -> media type mappings
const DEFAULT_MEDIA_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("log", "text/plain"),
    ("out", "text/plain"),
    ("err", "text/plain"),
    ("text", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("wasm", "application/wasm"),
];

/// Media types that get `charset=utf-8` when they carry no charset
fn is_textual(media_type: &str) -> bool {
    media_type.starts_with("text/")
        || matches!(
            media_type,
            "application/json"
                | "application/javascript"
                | "application/xml"
                | "application/yaml"
                | "image/svg+xml"
        )
}

/// Extension -> media type table: the built-in defaults plus any
/// configured overrides, which win on conflict.
#[derive(Debug, Clone)]
pub struct MediaTypes {
    by_extension: HashMap<String, String>,
}

impl Default for MediaTypes {
    fn default() -> Self {
        Self {
            by_extension: DEFAULT_MEDIA_TYPES
                .iter()
                .map(|(ext, media_type)| (ext.to_string(), media_type.to_string()))
                .collect(),
        }
    }
}

impl MediaTypes {
    /// Add or replace a mapping. The extension is matched case-insensitively.
    pub fn insert(&mut self, extension: &str, media_type: &str) {
        self.by_extension.insert(
            extension.trim_start_matches('.').to_ascii_lowercase(),
            media_type.to_string(),
        );
    }

    /// Content type for an entry path, or `None` when there is no good guess.
    pub fn guess(&self, entry_path: &str) -> Option<String> {
        let extension = Path::new(entry_path).extension()?.to_str()?;
        let media_type = self.by_extension.get(&extension.to_ascii_lowercase())?;

        if is_textual(media_type) && !media_type.contains("charset") {
            Some(format!("{media_type}; charset=utf-8"))
        } else {
            Some(media_type.clone())
        }
    }
}
