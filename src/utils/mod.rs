//! Utility functions and helpers.

pub mod log;

use std::path::Path;

/// Final path component for display, falling back to the full path.
pub fn file_name(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// True when `value` is a single plain path component (no separators, not `.`/`..`).
pub fn is_plain_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
}
