//! Concurrent per-file encryption and decryption
//!
//! The transform runner reads every inventory file from the source root,
//! passes it through the [`Codec`] with the file's relative path as
//! identifier, and writes the result to the same relative path under the
//! target root. The target's directory skeleton must already exist.
//!
//! ## Concurrency
//!
//! Files are processed on a dedicated `rayon` pool bounded by
//! `parallel_workers`. Units never share a path. When a unit fails, its error
//! is kept if it is the first one observed; the remaining units still run to
//! completion. A failed run can therefore leave a mix of old and new files in
//! the target and must not be treated as all-or-nothing.

use crate::codec::Codec;
use crate::error::{Result, VaultError};
use crate::fs::FileSystem;
use crate::types::{NoOpReporter, Operation, ProgressInfo, Reporter, TransformSummary};
use crate::utils;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Applies the codec across a list of files
pub struct TransformRunner<'a> {
    fs: &'a dyn FileSystem,
    codec: Codec,
    parallel_workers: usize,
    file_mode: u32,
    reporter: &'a dyn Reporter,
}

impl<'a> TransformRunner<'a> {
    /// Create a runner using one worker per CPU and mode `0o644`
    pub fn new(fs: &'a dyn FileSystem, codec: Codec) -> Self {
        Self {
            fs,
            codec,
            parallel_workers: num_cpus::get(),
            file_mode: 0o644,
            reporter: &NoOpReporter,
        }
    }

    /// Set the maximum number of files in flight (minimum 1)
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers.max(1);
        self
    }

    /// Set the permission bits of written files
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Report written files and progress to `reporter`
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Encrypt `files` from `source_root` into `target_root`
    pub fn encrypt_all(
        &self,
        files: &[String],
        source_root: &Path,
        target_root: &Path,
        password: &str,
    ) -> Result<TransformSummary> {
        self.run(files, source_root, target_root, password, Operation::Encrypt)
    }

    /// Decrypt `files` from `source_root` into `target_root`
    pub fn decrypt_all(
        &self,
        files: &[String],
        source_root: &Path,
        target_root: &Path,
        password: &str,
    ) -> Result<TransformSummary> {
        self.run(files, source_root, target_root, password, Operation::Decrypt)
    }

    /// Transform every file, waiting for all units before returning
    ///
    /// # Errors
    ///
    /// - [`VaultError::Transform`] carrying the first failure observed, tagged
    ///   with its relative path; other files may have been written regardless
    /// - [`VaultError::ThreadPool`] if the worker pool cannot be created
    pub fn run(
        &self,
        files: &[String],
        source_root: &Path,
        target_root: &Path,
        password: &str,
        operation: Operation,
    ) -> Result<TransformSummary> {
        let start = Instant::now();
        if files.is_empty() {
            return Ok(TransformSummary::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_workers)
            .thread_name(|idx| format!("ov-transform-{}", idx))
            .build()
            .map_err(|e| VaultError::ThreadPool(e.to_string()))?;

        let first_error: Mutex<Option<VaultError>> = Mutex::new(None);
        let processed = AtomicUsize::new(0);
        let written = AtomicUsize::new(0);
        let bytes_read = AtomicU64::new(0);
        let bytes_written = AtomicU64::new(0);
        let total = files.len();

        debug!(
            "Running {} over {} files with {} workers",
            operation, total, self.parallel_workers
        );

        pool.install(|| {
            files.par_iter().for_each(|relative| {
                let outcome = self.transform_file(relative, source_root, target_root, password, operation);

                match outcome {
                    Ok((read, out)) => {
                        written.fetch_add(1, Ordering::Relaxed);
                        bytes_read.fetch_add(read as u64, Ordering::Relaxed);
                        bytes_written.fetch_add(out as u64, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!("Failed to {} {}: {}", operation, relative, e);
                        let mut slot = first_error.lock();
                        if slot.is_none() {
                            *slot = Some(VaultError::transform(relative.as_str(), e));
                        }
                    }
                }

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                self.reporter.progress(&ProgressInfo {
                    operation,
                    current_item: Some(relative.clone()),
                    processed: done,
                    total,
                    bytes_processed: bytes_written.load(Ordering::Relaxed),
                });
            });
        });

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }

        let summary = TransformSummary {
            files: written.into_inner(),
            bytes_read: bytes_read.into_inner(),
            bytes_written: bytes_written.into_inner(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            "{} {} files ({}) in {}ms",
            operation.past_tense(),
            summary.files,
            utils::format_bytes(summary.bytes_written),
            summary.duration_ms
        );
        Ok(summary)
    }

    /// One unit of work: read, seal or open, write
    fn transform_file(
        &self,
        relative: &str,
        source_root: &Path,
        target_root: &Path,
        password: &str,
        operation: Operation,
    ) -> Result<(usize, usize)> {
        let source = utils::join_relative(source_root, relative);
        let target = utils::join_relative(target_root, relative);

        let input = self.fs.read(&source)?;
        let output = match operation {
            Operation::Encrypt => self.codec.encrypt(&input, password, relative)?,
            Operation::Decrypt => self.codec.decrypt(&input, password, relative)?,
        };
        self.fs.write(&target, &output, self.file_mode)?;

        self.reporter.transformed(operation, &target, output.len());
        Ok((input.len(), output.len()))
    }
}
