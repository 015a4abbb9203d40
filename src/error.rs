//! Error types for the obsidian-vault library
//!
//! This module defines every error that can occur while mirroring a vault.
//! Errors carry the path or command they occurred at so the top-level caller
//! can report them without extra bookkeeping. The core never retries.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Type alias for Results in the obsidian-vault library
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for all vault operations
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault marker directory is missing under the scanned root
    #[error("Not an obsidian vault: {path:?} (missing {marker} directory)")]
    NotAVault {
        /// Root that was scanned
        path: PathBuf,
        /// Name of the marker directory that was expected
        marker: String,
    },

    /// I/O failure while walking a source tree
    #[error("Failed to scan vault at {path:?}: {source}")]
    Scan {
        /// Path where the traversal failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while deleting or creating entries in a target tree
    #[error("Failed to clean vault at {path:?}: {source}")]
    Clean {
        /// Path that could not be removed or created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Key derivation failed, usually because of invalid KDF parameters
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// AEAD open failed: tampered or truncated blob, wrong password or wrong file identifier
    #[error("Authentication failed for {identifier}")]
    Authentication {
        /// File identifier the blob was opened with
        identifier: String,
    },

    /// AEAD seal failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A per-file read, codec or write failure during a transform
    #[error("Failed to transform {path}: {source}")]
    Transform {
        /// Relative path of the offending file
        path: String,
        /// What went wrong for that file
        #[source]
        source: Box<VaultError>,
    },

    /// External command failed to start or exited unsuccessfully
    #[error("Command failed: {command}: {reason}")]
    Command {
        /// Command line handed to the shell
        command: String,
        /// Exit status or spawn error
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// I/O errors outside of scan and clean
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Create a scan error for `path`
    pub fn scan(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        VaultError::Scan {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a clean error for `path`
    pub fn clean(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        VaultError::Clean {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap a per-file failure with the relative path it happened at
    pub fn transform(path: impl Into<String>, source: VaultError) -> Self {
        VaultError::Transform {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a command error
    pub fn command(command: impl Into<String>, reason: impl ToString) -> Self {
        VaultError::Command {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        VaultError::InvalidConfiguration(msg.into())
    }

    /// Check if this error is an authentication failure, looking through transform wrappers
    pub fn is_authentication(&self) -> bool {
        match self {
            VaultError::Authentication { .. } => true,
            VaultError::Transform { source, .. } => source.is_authentication(),
            _ => false,
        }
    }

    /// Relative path of the file a transform error is tagged with
    pub fn relative_path(&self) -> Option<&str> {
        match self {
            VaultError::Transform { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            VaultError::NotAVault { path, marker } => {
                format!(
                    "{:?} is not an obsidian vault: no '{}' directory found. \
                     Point at the vault root or configure the marker directory name.",
                    path, marker
                )
            }
            VaultError::Transform { path, source } if source.is_authentication() => {
                format!(
                    "Could not decrypt '{}'. The password is wrong, or the file was \
                     renamed or modified in the remote repository.",
                    path
                )
            }
            VaultError::Command { command, reason } => {
                format!(
                    "'{}' failed ({}). Check that git and gh are installed and authenticated.",
                    command, reason
                )
            }
            _ => self.to_string(),
        }
    }
}
