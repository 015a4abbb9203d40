//! # obsidian-vault - Encrypted git mirrors of note collections
//!
//! Mirrors a plaintext note collection into a parallel, per-file encrypted
//! directory tree that can be committed to a git remote, and reverses the
//! mirroring on retrieval.
//!
//! ## Overview
//!
//! A cycle runs three core stages in order:
//!
//! - **Scan**: inventory the source root's relative directories and files
//! - **Clean**: empty the target root and recreate the inventory's directory skeleton
//! - **Transform**: encrypt or decrypt every inventory file into the target, concurrently
//!
//! Every run fully reconciles the target; nothing is diffed. git and `gh`
//! commands run strictly before or after the core stages.
//!
//! ## File Format
//!
//! Each managed file in the mirror is `nonce(12) || ciphertext || tag(16)`,
//! sealed with AES-256-GCM under a key derived by scrypt from the password,
//! salted with the file's `/`-separated relative path. Renaming a blob in the
//! mirror therefore makes it fail authentication, exactly like corruption.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obsidian_vault::VaultBuilder;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = VaultBuilder::new().build(PathBuf::from("./notes"))?;
//!
//! // Encrypt into ./notes/.git-notes without touching the remote
//! let report = vault.backup("password")?;
//! println!("{} files encrypted", report.transform.files);
//!
//! // Decrypt back into ./notes
//! vault.restore("password")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, VaultError>`. Transform errors carry the
//! relative path of the first file that failed; other files in the same run
//! may already have been written.
//!
//! ## Module Organization
//!
//! - [`codec`]: Key derivation and authenticated encryption of single files
//! - [`scanner`]: Source tree inventory
//! - [`reconciler`]: Target tree cleaning
//! - [`transform`]: Concurrent per-file encryption and decryption
//! - [`vault`]: The orchestrator binding everything to a local vault and its mirror
//! - [`remote`], [`command`]: git and `gh` invocation
//! - [`fs`]: Filesystem capability used by the core
//! - [`types`]: Common types and data structures
//! - [`error`]: Error types and handling

// Public API modules
pub mod codec;
pub mod command;
pub mod error;
pub mod fs;
pub mod reconciler;
pub mod remote;
pub mod scanner;
pub mod transform;
pub mod types;
pub mod vault;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use codec::{Codec, KdfParams};
pub use command::{CommandRunner, ShellRunner};
pub use error::{Result, VaultError};
pub use fs::{FileSystem, StdFileSystem};
pub use types::*;
pub use vault::{Vault, VaultBuilder};

pub use utils::format_bytes;
