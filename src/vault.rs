//! Vault orchestrator
//!
//! This module provides the [`Vault`] struct, the entry point that binds the
//! core operations (scan, clean, transform) to a resolved pair of roots and
//! sequences them into full cycles with the remote layer around them.
//!
//! ## Layout
//!
//! A vault at `/home/me/notes` is mirrored into the git working tree
//! `/home/me/notes/.git-notes`. The mirror is nested inside the local vault,
//! so the scanner's version-control prefix keeps it out of the local
//! inventory and cleaning the local side always reserves it.
//!
//! ## Cycles
//!
//! - `backup`: Scan(local) → Clean(git) → EncryptAll
//! - `restore`: Scan(git) → Clean(local) → DecryptAll
//! - `push` is `backup` followed by git add, commit and push
//! - `pull` is git pull followed by `restore`
//!
//! ## Examples
//!
//! ```rust,no_run
//! use obsidian_vault::VaultBuilder;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = VaultBuilder::new()
//!     .parallel_workers(4)
//!     .build(PathBuf::from("./notes"))?;
//!
//! let report = vault.push("correct horse battery staple")?;
//! println!("pushed {} files", report.transform.files);
//! # Ok(())
//! # }
//! ```

use crate::codec::{Codec, KdfParams};
use crate::command::{CommandRunner, ShellRunner};
use crate::error::{Result, VaultError};
use crate::fs::{FileSystem, StdFileSystem};
use crate::reconciler::{CleanPolicy, Reconciler};
use crate::remote::{Git, GitHub};
use crate::scanner::Scanner;
use crate::transform::TransformRunner;
use crate::types::*;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Prefix of the mirror directory name inside the local vault
pub const MIRROR_PREFIX: &str = ".git-";

/// Commit message for a backup taken at `now`
pub fn commit_message(now: DateTime<Local>) -> String {
    format!("[{}] obsidian-vault backup", now.format("%Y-%m-%d %H:%M:%S"))
}

/// A local vault and its encrypted git mirror
pub struct Vault {
    local_path: PathBuf,
    git_path: PathBuf,
    config: VaultConfig,
    codec: Codec,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("local_path", &self.local_path)
            .field("git_path", &self.git_path)
            .field("config", &self.config)
            .finish()
    }
}

impl Vault {
    /// Absolute path of the plaintext vault
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Absolute path of the encrypted git working tree
    pub fn git_path(&self) -> &Path {
        &self.git_path
    }

    /// Effective configuration
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// GitHub repository name
    pub fn repository(&self) -> &str {
        self.config.repository.as_deref().unwrap_or_default()
    }

    /// Source and target roots for `operation`
    pub fn location(&self, operation: Operation) -> VaultLocation {
        VaultLocation::new(self.local_path.clone(), self.git_path.clone(), operation)
    }

    /// Inventory a root
    ///
    /// # Errors
    ///
    /// - [`VaultError::NotAVault`] if the marker directory is missing
    /// - [`VaultError::Scan`] if the walk fails
    pub fn scan(&self, root: &VaultRoot) -> Result<Inventory> {
        debug!("Scanning {} vault {:?}", root.label(), root.path());
        let inventory = Scanner::new(
            self.fs.as_ref(),
            &self.config.marker_dir,
            &self.config.vcs_prefix,
        )
        .scan(root.path())?;

        self.reporter.scanned(root.path(), &inventory);
        Ok(inventory)
    }

    /// Reconcile a root to the directory skeleton of `inventory`
    ///
    /// When `root` is the local vault, the nested mirror is reserved.
    pub fn clean(&self, root: &VaultRoot, inventory: &Inventory) -> Result<CleanSummary> {
        debug!("Cleaning {} vault {:?}", root.label(), root.path());
        let mut policy = CleanPolicy::new(self.config.reserved_names.iter().cloned());
        if let VaultRoot::Local(_) = root {
            policy = policy.reserve_path(&self.git_path);
        }

        Reconciler::new(self.fs.as_ref(), &policy)
            .with_reporter(self.reporter.as_ref())
            .clean(root.path(), inventory)
    }

    /// Encrypt every inventory file from the local vault into the mirror
    pub fn encrypt_all(&self, inventory: &Inventory, password: &str) -> Result<TransformSummary> {
        self.transform_runner().encrypt_all(
            inventory.files(),
            &self.local_path,
            &self.git_path,
            password,
        )
    }

    /// Decrypt every inventory file from the mirror into the local vault
    pub fn decrypt_all(&self, inventory: &Inventory, password: &str) -> Result<TransformSummary> {
        self.transform_runner().decrypt_all(
            inventory.files(),
            &self.git_path,
            &self.local_path,
            password,
        )
    }

    /// Mirror the local vault into the git working tree, encrypted
    #[instrument(skip(self, password))]
    pub fn backup(&self, password: &str) -> Result<SyncReport> {
        info!("Encrypting local vault {:?}", self.local_path);
        self.cycle(Operation::Encrypt, password)
    }

    /// Mirror the git working tree into the local vault, decrypted
    #[instrument(skip(self, password))]
    pub fn restore(&self, password: &str) -> Result<SyncReport> {
        info!("Decrypting git vault {:?}", self.git_path);
        self.cycle(Operation::Decrypt, password)
    }

    /// Back up, then commit and push the mirror
    #[instrument(skip(self, password))]
    pub fn push(&self, password: &str) -> Result<SyncReport> {
        let report = self.backup(password)?;

        let git = self.git();
        git.add()?;
        git.commit(&commit_message(Local::now()))?;
        git.push()?;

        Ok(report)
    }

    /// Pull the mirror, then restore the local vault from it
    #[instrument(skip(self, password))]
    pub fn pull(&self, password: &str) -> Result<SyncReport> {
        self.git().pull()?;
        self.restore(password)
    }

    /// Clone the remote repository into the mirror path, creating it first if asked
    #[instrument(skip(self))]
    pub fn clone_remote(&self, create: bool) -> Result<()> {
        let gh = GitHub::new(self.runner.as_ref(), &self.git_path, self.repository());
        if create {
            gh.create_repository()?;
        }
        gh.clone_repository()
    }

    /// Empty the mirror, keeping its git metadata, or delete it entirely with `remove`
    #[instrument(skip(self))]
    pub fn clean_mirror(&self, remove: bool) -> Result<CleanSummary> {
        if remove {
            info!("Removing git vault {:?}", self.git_path);
            self.fs
                .remove_dir_all(&self.git_path)
                .map_err(|e| VaultError::clean(&self.git_path, e))?;
            self.reporter.removed(&self.git_path);
            return Ok(CleanSummary {
                entries_removed: 1,
                directories_created: 0,
            });
        }

        info!("Cleaning git vault {:?}", self.git_path);
        self.clean(&VaultRoot::Git(self.git_path.clone()), &Inventory::default())
    }

    fn cycle(&self, operation: Operation, password: &str) -> Result<SyncReport> {
        let start = Instant::now();
        let location = self.location(operation);

        let inventory = self.scan(&location.source)?;
        let clean = self.clean(&location.target, &inventory)?;
        let transform = self.transform_runner().run(
            inventory.files(),
            location.source.path(),
            location.target.path(),
            password,
            operation,
        )?;

        info!(
            "{} {} files into {} vault in {:?}",
            operation.past_tense(),
            transform.files,
            location.target.label(),
            start.elapsed()
        );

        Ok(SyncReport {
            directories: inventory.directories().len(),
            files: inventory.files().len(),
            clean,
            transform,
        })
    }

    fn transform_runner(&self) -> TransformRunner<'_> {
        TransformRunner::new(self.fs.as_ref(), self.codec)
            .with_parallel_workers(self.config.parallel_workers)
            .with_file_mode(self.config.file_mode)
            .with_reporter(self.reporter.as_ref())
    }

    fn git(&self) -> Git<'_> {
        Git::new(self.runner.as_ref(), &self.git_path, &self.config.branch)
    }
}

/// Builder for [`Vault`]
///
/// # Examples
///
/// ```rust
/// use obsidian_vault::VaultBuilder;
///
/// let builder = VaultBuilder::new()
///     .marker_dir(".obsidian")
///     .branch("main")
///     .parallel_workers(2);
/// ```
pub struct VaultBuilder {
    config: VaultConfig,
    kdf_params: KdfParams,
    inherit_output: bool,
    fs: Option<Arc<dyn FileSystem>>,
    runner: Option<Arc<dyn CommandRunner>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl VaultBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: VaultConfig::default(),
            kdf_params: KdfParams::default(),
            inherit_output: false,
            fs: None,
            runner: None,
            reporter: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: VaultConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the directory that marks a vault root
    pub fn marker_dir(mut self, marker: impl Into<String>) -> Self {
        self.config.marker_dir = marker.into();
        self
    }

    /// Set number of parallel workers
    ///
    /// # Notes
    ///
    /// - Defaults to the number of CPU cores
    /// - Values less than 1 are automatically set to 1
    pub fn parallel_workers(mut self, count: usize) -> Self {
        self.config.parallel_workers = count.max(1);
        self
    }

    /// Set the permission bits of written files
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Set the shell that runs git and gh
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.config.shell = shell.into();
        self
    }

    /// Set the branch pushed to and pulled from
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = branch.into();
        self
    }

    /// Set the GitHub repository name
    pub fn repository(mut self, name: impl Into<String>) -> Self {
        self.config.repository = Some(name.into());
        self
    }

    /// Use custom scrypt parameters
    pub fn kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    /// Show git and gh output on the terminal
    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Use a custom filesystem
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use a custom process runner instead of the shell
    pub fn command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Receive per-entry events; defaults to [`TracingReporter`]
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build a vault rooted at `local_path`
    ///
    /// The path is made absolute and the mirror path derived from its base
    /// name. Neither tree is touched.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidConfiguration`] if the path cannot be resolved,
    ///   has no base name, or the configuration is unusable
    #[instrument(skip(self))]
    pub fn build(self, local_path: PathBuf) -> Result<Vault> {
        let local_path = local_path.canonicalize().map_err(|e| {
            VaultError::invalid_configuration(format!(
                "cannot resolve vault path {:?}: {}",
                local_path, e
            ))
        })?;

        let name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                VaultError::invalid_configuration(format!(
                    "vault path {:?} has no usable directory name",
                    local_path
                ))
            })?
            .to_string();
        let git_path = local_path.join(format!("{}{}", MIRROR_PREFIX, name));

        let mut config = self.config;
        if config.marker_dir.is_empty() {
            return Err(VaultError::invalid_configuration("marker directory must not be empty"));
        }
        if config.vcs_prefix.is_empty() {
            return Err(VaultError::invalid_configuration("version-control prefix must not be empty"));
        }
        config.parallel_workers = config.parallel_workers.max(1);
        config.repository.get_or_insert(name);

        debug!("local vault path: {:?}", local_path);
        debug!("git vault path: {:?}", git_path);

        let runner = self.runner.unwrap_or_else(|| {
            Arc::new(ShellRunner::new(config.shell.clone()).with_inherited_output(self.inherit_output))
        });

        Ok(Vault {
            local_path,
            git_path,
            codec: Codec::with_params(self.kdf_params),
            fs: self.fs.unwrap_or_else(|| Arc::new(StdFileSystem)),
            runner,
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            config,
        })
    }
}

impl Default for VaultBuilder {
    fn default() -> Self {
        Self::new()
    }
}
