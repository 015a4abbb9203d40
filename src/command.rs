//! Process invocation hook
//!
//! The remote layer never spawns processes itself; it hands complete command
//! lines to a [`CommandRunner`]. [`ShellRunner`] runs them through
//! `<shell> -c <command>`, tests substitute a recorder.

use crate::error::{Result, VaultError};
use std::process::{Command, Stdio};
use tracing::debug;

/// Shell used when `$SHELL` is unset
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// The user's shell from `$SHELL`, or `/bin/sh`
pub fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| FALLBACK_SHELL.to_string())
}

/// Runs a command line synchronously
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion
    ///
    /// # Errors
    ///
    /// - [`VaultError::Command`] if the process cannot start or exits unsuccessfully
    fn run(&self, command: &str) -> Result<()>;
}

/// [`CommandRunner`] that executes through a shell
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    inherit_output: bool,
}

impl ShellRunner {
    /// Runner for `shell`; child output is discarded
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            inherit_output: false,
        }
    }

    /// Forward the child's stdout and stderr to ours
    pub fn with_inherited_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    fn stdio(&self) -> Stdio {
        if self.inherit_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<()> {
        debug!("{}", command);

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(self.stdio())
            .stderr(self.stdio())
            .status()
            .map_err(|e| VaultError::command(command, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(VaultError::command(command, status))
        }
    }
}
