//! git and GitHub commands for the encrypted mirror
//!
//! These wrappers only build command lines and hand them to a
//! [`CommandRunner`]. They run strictly before or after the core cycle, never
//! during it.

use crate::command::CommandRunner;
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Name of git's metadata directory inside the mirror
pub const GIT_DIR: &str = ".git";

/// git operations on the mirror working tree
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    path: PathBuf,
    branch: String,
}

impl<'a> Git<'a> {
    /// Commands against the working tree at `path`, pushing and pulling `branch`
    pub fn new(runner: &'a dyn CommandRunner, path: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        Self {
            runner,
            path: path.into(),
            branch: branch.into(),
        }
    }

    fn base(&self) -> String {
        format!(
            "git --git-dir {} --work-tree {}",
            self.path.join(GIT_DIR).display(),
            self.path.display()
        )
    }

    /// Stage everything in the working tree
    pub fn add(&self) -> Result<()> {
        self.runner.run(&format!("{} add .", self.base()))
    }

    /// Commit staged changes with `message`
    pub fn commit(&self, message: &str) -> Result<()> {
        self.runner
            .run(&format!("{} commit -m \"{}\"", self.base(), message))
    }

    /// Push the branch to origin
    pub fn push(&self) -> Result<()> {
        info!("Pushing vault to GitHub");
        self.runner
            .run(&format!("{} push origin {}", self.base(), self.branch))
    }

    /// Pull the branch from origin
    pub fn pull(&self) -> Result<()> {
        info!("Pulling vault from GitHub");
        self.runner
            .run(&format!("{} pull origin {}", self.base(), self.branch))
    }
}

/// GitHub repository management through the `gh` CLI
pub struct GitHub<'a> {
    runner: &'a dyn CommandRunner,
    path: PathBuf,
    name: String,
}

impl<'a> GitHub<'a> {
    /// Repository `name`, cloned into `path`
    pub fn new(runner: &'a dyn CommandRunner, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            runner,
            path: path.into(),
            name: name.into(),
        }
    }

    /// Create a private repository for the mirror
    pub fn create_repository(&self) -> Result<()> {
        info!("Creating GitHub repository {}", self.name);
        let description = format!(
            "Encrypted backup of {}, created with obsidian-vault.",
            self.name
        );
        self.runner.run(&format!(
            "gh repo create {} --description \"{}\" --private --disable-issues --disable-wiki",
            self.name, description
        ))
    }

    /// Clone the repository into the mirror path
    pub fn clone_repository(&self) -> Result<()> {
        info!("Cloning GitHub repository {}", self.name);
        self.runner
            .run(&format!("gh repo clone {} {}", self.name, self.path.display()))
    }
}
