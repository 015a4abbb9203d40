//! # ov - Encrypted backups of Obsidian notes in GitHub
//!
//! Command-line front end for the obsidian-vault library.
//!
//! ## Usage
//! ```bash
//! # Create a private repository and clone it next to the notes
//! ov clone --create --path ~/notes
//!
//! # Encrypt, commit and push
//! OV_PASSWORD=secret ov push --path ~/notes
//!
//! # Pull and decrypt
//! OV_PASSWORD=secret ov pull --path ~/notes
//!
//! # Show resolved paths
//! ov status --json
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use obsidian_vault::{
    format_bytes, Inventory, Operation, ProgressInfo, Reporter, SyncReport, TracingReporter,
    Vault, VaultBuilder, VaultError,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// ov - Backup Obsidian notes in GitHub with AES-256-GCM encryption
#[derive(Parser)]
#[command(name = "ov")]
#[command(version)]
#[command(about = "CLI to backup Obsidian encrypted notes in GitHub")]
#[command(long_about = None)]
struct Cli {
    /// Path to the obsidian vault
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    /// Name of the config folder that marks a vault
    #[arg(long, global = true, default_value = ".obsidian")]
    config: String,

    /// Shell used to run git and gh
    #[arg(long, global = true, env = "SHELL")]
    shell: Option<String>,

    /// Password the notes are encrypted with
    #[arg(long, global = true, env = "OV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Maximum number of files encrypted or decrypted at once
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Enable debug output, including git and gh output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone the GitHub repository into the git vault
    Clone {
        /// Create the private repository first
        #[arg(long)]
        create: bool,
    },

    /// Encrypt and push the local vault to GitHub
    Push,

    /// Pull from GitHub and decrypt into the local vault
    Pull,

    /// Clean the git vault
    Clean {
        /// Remove the git vault after cleaning
        #[arg(long)]
        remove: bool,
    },

    /// Show resolved paths and configuration
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "✗".red().bold(), error_message(&e).red());
        std::process::exit(1);
    }
}

/// User-facing text for a failed run, with flag hints where they help
fn error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<VaultError>() {
        Some(err @ VaultError::NotAVault { .. }) => {
            format!("{} (see --path and --config)", err.user_message())
        }
        Some(err) => err.user_message(),
        None => format!("{:#}", e),
    }
}

/// Bar message for a progress event: percentage and the file just finished
fn progress_message(info: &ProgressInfo) -> Option<String> {
    let item = info.current_item.as_ref()?;
    let percent = info.percentage()?;
    Some(format!("{:>3.0}% {}", percent, item))
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    let progress = Arc::new(ProgressReporter::new());

    let mut builder = VaultBuilder::new()
        .marker_dir(cli.config.clone())
        .inherit_output(cli.debug)
        .reporter(progress.clone());
    if let Some(shell) = &cli.shell {
        builder = builder.shell(shell.clone());
    }
    if let Some(workers) = cli.workers {
        builder = builder.parallel_workers(workers);
    }

    let vault = builder
        .build(cli.path.clone())
        .with_context(|| format!("failed to open vault at {}", cli.path.display()))?;

    match cli.command {
        Commands::Clone { create } => cmd_clone(&vault, create),
        Commands::Push => cmd_push(&vault, require_password(cli.password)?, &progress),
        Commands::Pull => cmd_pull(&vault, require_password(cli.password)?, &progress),
        Commands::Clean { remove } => cmd_clean(&vault, remove),
        Commands::Status { json } => cmd_status(&vault, json),
    }
}

fn require_password(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) if !password.is_empty() => Ok(password),
        _ => bail!("flag 'password' is required (or set OV_PASSWORD)"),
    }
}

/// Clone the remote repository into the git vault
fn cmd_clone(vault: &Vault, create: bool) -> anyhow::Result<()> {
    if create {
        println!("{} {}", "Creating repository".blue().bold(), vault.repository().yellow());
    }
    println!("{} {}", "Cloning into".blue().bold(), vault.git_path().display().to_string().cyan());

    vault.clone_remote(create)?;

    println!("{} Vault cloned", "✓".green().bold());
    Ok(())
}

/// Encrypt the local vault and push it
fn cmd_push(vault: &Vault, password: String, progress: &ProgressReporter) -> anyhow::Result<()> {
    println!("{} {}", "Encrypting vault".blue().bold(), vault.local_path().display().to_string().cyan());

    let start = Instant::now();
    let result = vault.push(&password);
    progress.finish();
    let report = result?;

    println!("{} Vault backup successful", "✓".green().bold());
    print_report(&report, start.elapsed());
    Ok(())
}

/// Pull the git vault and decrypt it into the local vault
fn cmd_pull(vault: &Vault, password: String, progress: &ProgressReporter) -> anyhow::Result<()> {
    println!("{} {}", "Pulling vault into".blue().bold(), vault.local_path().display().to_string().cyan());

    let start = Instant::now();
    let result = vault.pull(&password);
    progress.finish();
    let report = result?;

    println!("{} Vault sync successful", "✓".green().bold());
    print_report(&report, start.elapsed());
    Ok(())
}

/// Clean or remove the git vault
fn cmd_clean(vault: &Vault, remove: bool) -> anyhow::Result<()> {
    let summary = vault.clean_mirror(remove)?;

    if remove {
        println!("{} Removed {}", "✓".green().bold(), vault.git_path().display().to_string().cyan());
    } else {
        println!(
            "{} Cleaned {} ({} entries removed)",
            "✓".green().bold(),
            vault.git_path().display().to_string().cyan(),
            summary.entries_removed.to_string().yellow()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct Status<'a> {
    local_path: &'a Path,
    git_path: &'a Path,
    git_vault_exists: bool,
    repository: &'a str,
    marker_dir: &'a str,
    branch: &'a str,
    shell: &'a str,
    parallel_workers: usize,
}

/// Show resolved paths and configuration
fn cmd_status(vault: &Vault, json: bool) -> anyhow::Result<()> {
    let config = vault.config();
    let status = Status {
        local_path: vault.local_path(),
        git_path: vault.git_path(),
        git_vault_exists: vault.git_path().is_dir(),
        repository: vault.repository(),
        marker_dir: &config.marker_dir,
        branch: &config.branch,
        shell: &config.shell,
        parallel_workers: config.parallel_workers,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Vault Status".bold().underline());
    println!("  Local vault: {}", status.local_path.display().to_string().cyan());
    println!(
        "  Git vault: {} {}",
        status.git_path.display().to_string().cyan(),
        if status.git_vault_exists { "(cloned)".green() } else { "(missing)".yellow() }
    );
    println!("  Repository: {}", status.repository.yellow());
    println!("  Branch: {}", status.branch);
    println!("  Marker: {}", status.marker_dir);
    println!("  Shell: {}", status.shell);
    println!("  Workers: {}", status.parallel_workers);
    Ok(())
}

fn print_report(report: &SyncReport, elapsed: Duration) {
    println!("  Directories: {}", report.directories.to_string().cyan());
    println!("  Files: {}", report.transform.files.to_string().cyan());
    println!("  Written: {}", format_bytes(report.transform.bytes_written).cyan());
    println!("  Removed: {} entries", report.clean.entries_removed.to_string().cyan());
    // Whole milliseconds only
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
    println!("  Time: {}", format_duration(elapsed).to_string().cyan());
}

/// Reporter that drives a progress bar during transforms
struct ProgressReporter {
    bar: ProgressBar,
    logs: TracingReporter,
}

impl ProgressReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self {
            bar,
            logs: TracingReporter,
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Reporter for ProgressReporter {
    fn scanned(&self, root: &Path, inventory: &Inventory) {
        self.logs.scanned(root, inventory);
    }

    fn removed(&self, path: &Path) {
        self.logs.removed(path);
    }

    fn created(&self, path: &Path) {
        self.logs.created(path);
    }

    fn transformed(&self, operation: Operation, path: &Path, bytes: usize) {
        self.logs.transformed(operation, path, bytes);
    }

    fn progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total as u64);
        self.bar.set_position(info.processed as u64);
        if let Some(message) = progress_message(info) {
            self.bar.set_message(message);
        }
    }
}
