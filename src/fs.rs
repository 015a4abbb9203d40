//! Filesystem capability used by the core
//!
//! Scanning, reconciling and transforming only touch the disk through the
//! [`FileSystem`] trait, so they can be driven against any backend that can
//! read, write, remove, create and walk. [`StdFileSystem`] is the real one,
//! built on `std::fs` and `walkdir`.

use crate::utils;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;

/// Entry handed to a walk visitor
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Absolute path of the entry
    pub path: PathBuf,
    /// Final path component
    pub file_name: OsString,
    /// Whether the entry is a directory (symlinks are not followed)
    pub is_dir: bool,
    /// Depth below the walk root, starting at 1
    pub depth: usize,
}

/// What the walk should do after visiting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Keep going, descending into directories
    Continue,
    /// Do not descend into this directory; a no-op for files
    SkipDir,
}

/// A walk failure, tagged with the entry it happened at
#[derive(Debug, Error)]
#[error("{path:?}: {source}")]
pub struct WalkError {
    /// Entry the walk or the visitor failed on
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: io::Error,
}

impl WalkError {
    /// Tag `source` with `path`
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Disk operations the core depends on
pub trait FileSystem: Send + Sync {
    /// Read a whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a whole file with the given permission bits
    ///
    /// Must not create missing parent directories.
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;

    /// Remove a single file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing parents; existing directories are fine
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Walk everything below `root`, excluding `root` itself
    ///
    /// The first error, from the walk or from the visitor, stops the walk and
    /// is returned with the path of the entry that failed.
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&WalkEntry) -> io::Result<WalkAction>,
    ) -> Result<(), WalkError>;
}

/// [`FileSystem`] backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        fs::write(path, contents)?;
        utils::set_permissions(path, mode)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&WalkEntry) -> io::Result<WalkAction>,
    ) -> Result<(), WalkError> {
        let mut it = WalkDir::new(root).min_depth(1).follow_links(false).into_iter();

        while let Some(result) = it.next() {
            let entry = result.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                WalkError::new(path, io::Error::from(e))
            })?;
            let is_dir = entry.file_type().is_dir();
            let walk_entry = WalkEntry {
                path: entry.path().to_path_buf(),
                file_name: entry.file_name().to_os_string(),
                is_dir,
                depth: entry.depth(),
            };

            let action =
                visit(&walk_entry).map_err(|e| WalkError::new(walk_entry.path.clone(), e))?;
            if action == WalkAction::SkipDir && is_dir {
                trace!("Skipping directory {:?}", walk_entry.path);
                it.skip_current_dir();
            }
        }

        Ok(())
    }
}
