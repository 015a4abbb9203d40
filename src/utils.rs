//! Utility functions for obsidian-vault
//!
//! Path helpers that turn absolute paths into the `/`-separated relative
//! identifiers used by the inventory and the codec (and back), permission
//! handling, and byte formatting for reports.
//!
//! ## Relative Identifiers
//!
//! ```rust,ignore
//! use crate::utils::{join_relative, relative_slash_path};
//! use std::path::Path;
//!
//! let base = Path::new("/notes");
//! let rel = relative_slash_path(Path::new("/notes/sub/note.md"), base)?;
//! assert_eq!(rel, "sub/note.md");
//! assert_eq!(join_relative(base, &rel), Path::new("/notes/sub/note.md"));
//! ```
//!
//! All functions are thread-safe and can be called concurrently.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Set Unix permissions
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Set permissions (Windows implementation)
///
/// Only the read-only attribute can be expressed; it is set when the owner
/// write bit is missing from `mode`.
#[cfg(windows)]
pub fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    let is_readonly = (mode & 0o200) == 0;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(is_readonly);
    fs::set_permissions(path, perms)
}

/// Make a path relative to a base path
///
/// Attempts a lexical strip first so symbolic links keep their own path,
/// and falls back to canonicalising both sides when the lexical strip fails.
///
/// # Errors
///
/// - `InvalidInput` if the path is not under the base path
/// - Any error from canonicalization (fallback case only)
pub fn make_relative(path: &Path, base: &Path) -> io::Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {:?} is not relative to {:?}", path_canon, base_canon),
            )
        })
}

/// Relative path of `path` under `base`, joined with `/` on every platform
///
/// # Errors
///
/// - `InvalidInput` if the path is not under the base path
/// - `InvalidData` if a component is not valid UTF-8
pub fn relative_slash_path(path: &Path, base: &Path) -> io::Result<String> {
    let relative = make_relative(path, base)?;
    let mut parts = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("path is not valid UTF-8: {:?}", path),
                    )
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unexpected component {:?} in {:?}", other, relative),
                ))
            }
        }
    }

    Ok(parts.join("/"))
}

/// Resolve a `/`-separated relative identifier under `root`
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Format bytes in human-readable form
///
/// Uses 1024 as the conversion factor. Values below 1 KB are shown as whole
/// bytes, larger values with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
