//! Source tree inventory
//!
//! The scanner checks that a root is a recognised vault (its marker directory
//! exists directly below the root) and then records every directory and file
//! below it as a `/`-separated relative path. Entries whose name starts with
//! the version-control prefix are skipped together with everything beneath
//! them, which keeps `.git`, `.gitignore` and the nested `.git-<name>` mirror
//! out of the inventory.
//!
//! ## Example
//!
//! ```rust,no_run
//! use obsidian_vault::fs::StdFileSystem;
//! use obsidian_vault::scanner::Scanner;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scanner = Scanner::new(&StdFileSystem, ".obsidian", ".git");
//! let inventory = scanner.scan(Path::new("/home/me/notes"))?;
//! println!("{} files", inventory.files().len());
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VaultError};
use crate::fs::{FileSystem, WalkAction};
use crate::types::Inventory;
use crate::utils;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// Walks a source root into an [`Inventory`]
pub struct Scanner<'a> {
    fs: &'a dyn FileSystem,
    marker_dir: &'a str,
    vcs_prefix: &'a str,
}

impl<'a> Scanner<'a> {
    /// Create a scanner
    ///
    /// # Arguments
    ///
    /// * `fs` - Filesystem to walk
    /// * `marker_dir` - Directory that must exist directly under the root
    /// * `vcs_prefix` - Name prefix of entries that are skipped with their subtree
    pub fn new(fs: &'a dyn FileSystem, marker_dir: &'a str, vcs_prefix: &'a str) -> Self {
        Self {
            fs,
            marker_dir,
            vcs_prefix,
        }
    }

    /// Inventory everything below `root`
    ///
    /// Each call builds a fresh inventory; nothing carries over between scans.
    /// Both sequences are sorted lexicographically.
    ///
    /// # Errors
    ///
    /// - [`VaultError::NotAVault`] if the marker directory is missing
    /// - [`VaultError::Scan`] on any traversal failure, including non-UTF-8 names;
    ///   no partial inventory is returned
    pub fn scan(&self, root: &Path) -> Result<Inventory> {
        let start = Instant::now();

        if !self.fs.is_dir(&root.join(self.marker_dir)) {
            return Err(VaultError::NotAVault {
                path: root.to_path_buf(),
                marker: self.marker_dir.to_string(),
            });
        }

        let mut directories = Vec::new();
        let mut files = Vec::new();

        let walked = self.fs.walk(root, &mut |entry| {
            if entry.file_name.to_string_lossy().starts_with(self.vcs_prefix) {
                trace!("Skipping version-control entry {:?}", entry.path);
                return Ok(WalkAction::SkipDir);
            }

            let relative = utils::relative_slash_path(&entry.path, root)?;
            if entry.is_dir {
                directories.push(relative);
            } else {
                files.push(relative);
            }
            Ok(WalkAction::Continue)
        });
        walked.map_err(|e| VaultError::scan(&e.path, e.source))?;

        let inventory = Inventory::new(directories, files);
        debug!(
            "Scanned {:?} in {:?}: {} directories, {} files",
            root,
            start.elapsed(),
            inventory.directories().len(),
            inventory.files().len()
        );

        Ok(inventory)
    }
}
