//! Directory listing data handed to renderers.

use std::cmp::Ordering;

use serde::Serialize;

use crate::zip::ArchiveChild;

/// One segment of the trail from the archive down to the viewed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    /// Archive name and internal path joined by `/`
    pub full_path: String,
    pub is_directory: bool,
    /// Marks the directory currently being viewed
    pub is_selected: bool,
}

/// One immediate child of the viewed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildEntry {
    pub name: String,
    /// Archive name and internal path joined by `/`
    pub full_path: String,
    /// Human readable size, regular files only
    pub size: Option<String>,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<ChildEntry>,
}

impl DirectoryListing {
    /// Build the listing for `entry_path` inside `archive_name`.
    ///
    /// Breadcrumbs run from the archive to the viewed directory, the last
    /// one selected. Children come directories first, then by name ignoring
    /// case.
    pub fn build(archive_name: &str, entry_path: &str, children: Vec<ArchiveChild>) -> Self {
        let segments: Vec<&str> = std::iter::once(archive_name)
            .chain(entry_path.split('/').filter(|s| !s.is_empty()))
            .collect();

        let breadcrumbs = (1..=segments.len())
            .map(|i| Breadcrumb {
                name: segments[i - 1].to_string(),
                full_path: segments[..i].join("/"),
                is_directory: true,
                is_selected: i == segments.len(),
            })
            .collect();

        let base = segments.join("/");
        let mut children: Vec<ChildEntry> = children
            .into_iter()
            .map(|child| ChildEntry {
                full_path: format!("{base}/{}", child.name),
                size: child.size.map(format_size_si),
                is_directory: child.is_directory(),
                name: child.name,
            })
            .collect();
        children.sort_by(compare_children);

        Self {
            breadcrumbs,
            children,
        }
    }
}

fn compare_children(a: &ChildEntry, b: &ChildEntry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Format a byte count on the 1000-based SI scale with one decimal.
///
/// `format_size_si(10) == "10 B"`, `format_size_si(1500) == "1.5 kB"`.
pub fn format_size_si(bytes: u64) -> String {
    const UNIT: f64 = 1000.0;
    const PREFIXES: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut scaled = bytes as f64;
    let mut exp = 0;
    while scaled >= UNIT && exp < PREFIXES.len() {
        scaled /= UNIT;
        exp += 1;
    }

    format!("{:.1} {}B", scaled, PREFIXES[exp - 1])
}
