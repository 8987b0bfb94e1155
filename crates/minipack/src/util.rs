//! Path and source-position helpers

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `name/..` pairs
///
/// Does not touch the filesystem, so symlinks are not followed. A `..` that
/// cannot be folded is kept, except directly below the root where it is a no-op.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.into_iter().map(Component::as_os_str).collect()
}

/// Express `path` relative to `base`, both taken as already normalized
///
/// Behaves like `path.relative` in Node: common leading components are
/// stripped and every remaining component of `base` becomes a `..`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base_parts: Vec<_> = base.components().collect();
    let path_parts: Vec<_> = path.components().collect();

    let common = base_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

/// Render a relative path with `/` separators regardless of platform
pub fn to_slash_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// 1-based line and column for a byte offset into `source`
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
