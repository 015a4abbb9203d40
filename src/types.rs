//! Core data types used throughout the obsidian-vault library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Tree State**: `Inventory` - the relative directories and files captured by one scan
//! - **Locations**: `VaultRoot`, `VaultLocation` - resolved roots and the direction of a cycle
//! - **Results**: `CleanSummary`, `TransformSummary`, `SyncReport` - what an operation did
//! - **Configuration**: `VaultConfig` - knobs shared by every operation
//! - **Observers**: `Reporter` - injected callbacks for progress and per-entry events
//!
//! ## Examples
//!
//! ```rust
//! use obsidian_vault::types::{Operation, VaultLocation};
//! use std::path::PathBuf;
//!
//! let location = VaultLocation::new(
//!     PathBuf::from("/notes"),
//!     PathBuf::from("/notes/.git-notes"),
//!     Operation::Encrypt,
//! );
//! assert_eq!(location.source.path(), PathBuf::from("/notes").as_path());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative paths captured by one scan of a source root
///
/// Both sequences hold `/`-separated relative paths, sorted lexicographically.
/// An inventory is immutable once built and is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    directories: Vec<String>,
    files: Vec<String>,
}

impl Inventory {
    /// Build an inventory, sorting both sequences
    pub fn new(mut directories: Vec<String>, mut files: Vec<String>) -> Self {
        directories.sort();
        files.sort();
        Self { directories, files }
    }

    /// Relative directory paths
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    /// Relative file paths
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    /// Whether the scan found nothing
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Encrypt (local to mirror) or decrypt (mirror to local)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    /// Plaintext source, encrypted target
    Encrypt,
    /// Encrypted source, plaintext target
    Decrypt,
}

impl Operation {
    /// Past-tense label used in log lines
    pub fn past_tense(&self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypted",
            Operation::Decrypt => "decrypted",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Encrypt => f.write_str("encrypt"),
            Operation::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// One of the two trees a vault is mirrored between, with its absolute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VaultRoot {
    /// The plaintext note collection
    Local(PathBuf),
    /// The encrypted git working tree
    Git(PathBuf),
}

impl VaultRoot {
    /// Absolute path of this root
    pub fn path(&self) -> &Path {
        match self {
            VaultRoot::Local(path) | VaultRoot::Git(path) => path,
        }
    }

    /// Short name for messages
    pub fn label(&self) -> &'static str {
        match self {
            VaultRoot::Local(_) => "local",
            VaultRoot::Git(_) => "git",
        }
    }
}

/// Source and target roots of one cycle
///
/// Resolved once; the operation decides which side is which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLocation {
    /// Tree that is scanned and read
    pub source: VaultRoot,
    /// Tree that is reconciled and written
    pub target: VaultRoot,
}

impl VaultLocation {
    /// Pair the local and git roots for `operation`
    pub fn new(local: PathBuf, git: PathBuf, operation: Operation) -> Self {
        match operation {
            Operation::Encrypt => Self {
                source: VaultRoot::Local(local),
                target: VaultRoot::Git(git),
            },
            Operation::Decrypt => Self {
                source: VaultRoot::Git(git),
                target: VaultRoot::Local(local),
            },
        }
    }
}

/// Result of reconciling a target tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    /// Top-level files and directories removed
    pub entries_removed: usize,
    /// Directories (re)created from the inventory
    pub directories_created: usize,
}

/// Result of a successful transform run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    /// Files written to the target
    pub files: usize,
    /// Bytes read from the source
    pub bytes_read: u64,
    /// Bytes written to the target
    pub bytes_written: u64,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

/// Result of a full cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Directories in the scanned inventory
    pub directories: usize,
    /// Files in the scanned inventory
    pub files: usize,
    /// Reconcile step
    pub clean: CleanSummary,
    /// Transform step
    pub transform: TransformSummary,
}

/// Configuration shared by every vault operation
#[derive(Debug, Clone, Serialize)]
pub struct VaultConfig {
    /// Directory that must exist under a scanned root
    pub marker_dir: String,
    /// Entries starting with this prefix are never scanned
    pub vcs_prefix: String,
    /// Entry names exempt from cleaning (exact match)
    pub reserved_names: Vec<String>,
    /// Upper bound on concurrently transformed files
    pub parallel_workers: usize,
    /// Permission bits of every written file
    pub file_mode: u32,
    /// Shell used for git and gh commands
    pub shell: String,
    /// Remote branch pushed to and pulled from
    pub branch: String,
    /// Repository name, defaults to the vault directory name
    pub repository: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            marker_dir: ".obsidian".to_string(),
            vcs_prefix: ".git".to_string(),
            reserved_names: vec![".git".to_string()],
            parallel_workers: num_cpus::get(),
            file_mode: 0o644,
            shell: crate::command::default_shell(),
            branch: "main".to_string(),
            repository: None,
        }
    }
}

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: Operation,
    /// Relative path that just finished
    pub current_item: Option<String>,
    /// Files processed so far
    pub processed: usize,
    /// Files to process
    pub total: usize,
    /// Bytes written so far
    pub bytes_processed: u64,
}

impl ProgressInfo {
    /// Get progress as a percentage (0-100)
    pub fn percentage(&self) -> Option<f32> {
        if self.total > 0 {
            Some((self.processed as f32 / self.total as f32) * 100.0)
        } else {
            None
        }
    }
}

/// Observer for per-entry events
///
/// Passed into every core operation instead of relying on global logger
/// state. All methods default to doing nothing. Transform events arrive from
/// worker threads, in completion order.
///
/// # Examples
///
/// ```rust
/// use obsidian_vault::types::{ProgressInfo, Reporter};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl Reporter for Counter {
///     fn progress(&self, _info: &ProgressInfo) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait Reporter: Send + Sync {
    /// A scan finished
    fn scanned(&self, _root: &Path, _inventory: &Inventory) {}

    /// A file or directory was removed from a target
    fn removed(&self, _path: &Path) {}

    /// A directory was created in a target
    fn created(&self, _path: &Path) {}

    /// A file was written to a target
    fn transformed(&self, _operation: Operation, _path: &Path, _bytes: usize) {}

    /// A transform unit finished, successfully or not
    fn progress(&self, _info: &ProgressInfo) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default)]
pub struct NoOpReporter;

impl Reporter for NoOpReporter {}

/// Reporter that turns events into `debug` log lines
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn scanned(&self, root: &Path, inventory: &Inventory) {
        debug!(
            "scanned {:?}: {} directories, {} files",
            root,
            inventory.directories().len(),
            inventory.files().len()
        );
    }

    fn removed(&self, path: &Path) {
        debug!("removed: {:?}", path);
    }

    fn created(&self, path: &Path) {
        debug!("created directory: {:?}", path);
    }

    fn transformed(&self, operation: Operation, path: &Path, bytes: usize) {
        debug!("{} file: {:?} ({}B)", operation.past_tense(), path, bytes);
    }
}
