//! Target tree reconciliation
//!
//! Before a transform writes into a target root, the reconciler empties it and
//! recreates the directory skeleton of the inventory. The only entries that
//! survive are the reserved ones: names that match a reserved name exactly
//! (`.git` by default) and explicitly reserved absolute paths (the git mirror
//! nested inside the local vault). Other hidden entries are removed like any
//! other file.
//!
//! Reconciliation is fail-fast. The first removal or creation error aborts the
//! run and nothing is rolled back, so the target may be left partially
//! reconciled.

use crate::error::{Result, VaultError};
use crate::fs::{FileSystem, WalkAction};
use crate::types::{CleanSummary, Inventory, NoOpReporter, Reporter};
use crate::utils;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Entries a clean must leave untouched
#[derive(Debug, Clone, Default)]
pub struct CleanPolicy {
    reserved_names: Vec<String>,
    reserved_paths: Vec<PathBuf>,
}

impl CleanPolicy {
    /// Exempt entries whose name equals one of `names`
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            reserved_names: names.into_iter().map(Into::into).collect(),
            reserved_paths: Vec::new(),
        }
    }

    /// Also exempt the entry at this absolute path
    pub fn reserve_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.reserved_paths.push(path.into());
        self
    }

    /// Whether the entry at `path` called `name` is exempt
    pub fn is_reserved(&self, name: &str, path: &Path) -> bool {
        self.reserved_names.iter().any(|reserved| reserved == name)
            || self.reserved_paths.iter().any(|reserved| reserved == path)
    }
}

/// Makes a target root match an inventory's directory skeleton
pub struct Reconciler<'a> {
    fs: &'a dyn FileSystem,
    policy: &'a CleanPolicy,
    reporter: &'a dyn Reporter,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler
    pub fn new(fs: &'a dyn FileSystem, policy: &'a CleanPolicy) -> Self {
        Self {
            fs,
            policy,
            reporter: &NoOpReporter,
        }
    }

    /// Report removals and creations to `reporter`
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Empty `target_root` and recreate `inventory`'s directories under it
    ///
    /// On success the target holds exactly the inventory's directories, no
    /// files, and whatever the policy reserves.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Clean`] for the first entry that could not be walked,
    ///   removed or created
    pub fn clean(&self, target_root: &Path, inventory: &Inventory) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();
        let mut doomed: Vec<(PathBuf, bool)> = Vec::new();

        // Directories go wholesale, so nothing below the top level needs visiting.
        let walked = self.fs.walk(target_root, &mut |entry| {
            let name = entry.file_name.to_string_lossy();
            if self.policy.is_reserved(&name, &entry.path) {
                trace!("Keeping reserved entry {:?}", entry.path);
            } else {
                doomed.push((entry.path.clone(), entry.is_dir));
            }
            Ok(WalkAction::SkipDir)
        });
        walked.map_err(|e| VaultError::clean(&e.path, e.source))?;

        for (path, is_dir) in doomed {
            let removed = if is_dir {
                self.fs.remove_dir_all(&path)
            } else {
                self.fs.remove_file(&path)
            };
            removed.map_err(|e| VaultError::clean(&path, e))?;

            self.reporter.removed(&path);
            summary.entries_removed += 1;
        }

        for directory in inventory.directories() {
            let path = utils::join_relative(target_root, directory);
            self.fs
                .create_dir_all(&path)
                .map_err(|e| VaultError::clean(&path, e))?;

            self.reporter.created(&path);
            summary.directories_created += 1;
        }

        debug!(
            "Cleaned {:?}: {} entries removed, {} directories created",
            target_root, summary.entries_removed, summary.directories_created
        );
        Ok(summary)
    }
}
