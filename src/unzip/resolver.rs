//! First trust boundary: client path -> path under the root directory.
//!
//! Pure path algebra; nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Why a requested path was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("empty request path")]
    Empty,
    #[error("request path is not a valid path")]
    Invalid,
    #[error("request path is not in normal form")]
    NotNormalized,
    #[error("request path escapes the root directory")]
    OutsideRoot,
}

/// A requested path joined onto the root, normalized and confined to it.
///
/// Only [`resolve`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Lexically normalize a path: drop `.` components and let `..` pop the
/// previous normal component. `..` never climbs above a root or prefix.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Resolve `requested` against `root`.
///
/// `root` is expected to be absolute and already normalized (the config
/// layer canonicalizes it). The joined path must equal its own normal form,
/// which rules out any `.` or `..` segment, and must sit strictly below
/// `root` when compared component by component.
pub fn resolve(root: &Path, requested: &str) -> Result<ResolvedPath, Rejected> {
    if requested.is_empty() {
        return Err(Rejected::Empty);
    }
    if requested.contains('\0') {
        return Err(Rejected::Invalid);
    }

    // Path parsing folds interior `.` away, so look at the raw segments
    if requested.split(std::path::is_separator).any(|segment| segment == ".") {
        return Err(Rejected::NotNormalized);
    }

    let requested = Path::new(requested);
    if requested
        .components()
        .any(|c| matches!(c, Component::Prefix(_)))
    {
        return Err(Rejected::Invalid);
    }

    let joined = root.join(requested);
    let normalized = normalize(&joined);

    if !joined.components().eq(normalized.components()) {
        return Err(Rejected::NotNormalized);
    }
    if !normalized.starts_with(root) || normalized == root {
        return Err(Rejected::OutsideRoot);
    }

    Ok(ResolvedPath(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn root() -> PathBuf {
        PathBuf::from("/data")
    }

    #[test]
    fn accepts_paths_below_the_root() {
        let resolved = resolve(&root(), "run.zip/logs/out.txt").unwrap();
        assert_eq!(resolved.as_path(), Path::new("/data/run.zip/logs/out.txt"));

        let resolved = resolve(&root(), "run.zip/").unwrap();
        assert_eq!(resolved.as_path(), Path::new("/data/run.zip"));
    }

    #[test]
    fn rejects_empty_and_root_requests() {
        assert_eq!(resolve(&root(), ""), Err(Rejected::Empty));
        assert_eq!(resolve(&root(), "/"), Err(Rejected::OutsideRoot));
        assert_eq!(resolve(&root(), "."), Err(Rejected::NotNormalized));
    }

    #[test]
    fn rejects_parent_segments() {
        assert_eq!(resolve(&root(), "../etc/passwd"), Err(Rejected::NotNormalized));
        assert_eq!(
            resolve(&root(), "run.zip/../other.zip"),
            Err(Rejected::NotNormalized)
        );
        assert_eq!(resolve(&root(), "run.zip/.."), Err(Rejected::NotNormalized));
    }

    #[test]
    fn rejects_current_dir_segments() {
        for requested in ["run.zip/./logs", "./run.zip", "run.zip/.", "run.zip/logs/./out.txt"] {
            assert_eq!(
                resolve(&root(), requested),
                Err(Rejected::NotNormalized),
                "{requested}"
            );
        }
    }

    #[test]
    fn rejects_absolute_paths() {
        assert_eq!(resolve(&root(), "/etc/passwd"), Err(Rejected::OutsideRoot));
    }

    #[test]
    fn prefix_check_is_component_wise() {
        let root = PathBuf::from("/results");
        assert_eq!(
            resolve(&root, "/results-evil/run.zip"),
            Err(Rejected::OutsideRoot)
        );
    }

    #[test]
    fn rejects_nul_bytes() {
        assert_eq!(resolve(&root(), "run.zip\0/x"), Err(Rejected::Invalid));
    }

    #[test]
    fn normalize_pops_and_drops() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    proptest! {
        #[test]
        fn never_escapes_root(segments in prop::collection::vec(
            prop_oneof![
                Just("..".to_string()),
                Just(".".to_string()),
                Just("".to_string()),
                "[a-z]{1,6}(\\.zip)?",
            ],
            1..8,
        )) {
            let requested = segments.join("/");
            if let Ok(resolved) = resolve(&root(), &requested) {
                prop_assert!(resolved.as_path().starts_with("/data"));
                prop_assert!(resolved.as_path() != Path::new("/data"));
                prop_assert!(!segments.iter().any(|s| s == ".." || s == "."));
            }
        }

        #[test]
        fn any_parent_segment_is_rejected(
            before in "[a-z]{1,6}",
            after in "[a-z]{0,6}",
        ) {
            let requested = format!("{before}/../{after}");
            prop_assert!(resolve(&root(), &requested).is_err());
        }
    }
}
