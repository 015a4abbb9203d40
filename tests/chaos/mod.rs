//! Chaos testing for obsidian-vault
//!
//! Injects filesystem faults and corrupts mirror blobs to check that
//! failures are reported with the right path and kind, and that the
//! documented partial-failure behavior holds.

use ::obsidian_vault::fs::{WalkAction, WalkEntry, WalkError};
use ::obsidian_vault::*;
use crate::integration::{fast_kdf, snapshot, VaultTestHarness};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Filesystem that fails selected operations by file name
#[derive(Default)]
pub struct FaultyFileSystem {
    inner: StdFileSystem,
    fail_read: HashSet<String>,
    fail_write: HashSet<String>,
    fail_remove: HashSet<String>,
}

impl FaultyFileSystem {
    pub fn fail_read(mut self, name: &str) -> Self {
        self.fail_read.insert(name.to_string());
        self
    }

    pub fn fail_write(mut self, name: &str) -> Self {
        self.fail_write.insert(name.to_string());
        self
    }

    pub fn fail_remove(mut self, name: &str) -> Self {
        self.fail_remove.insert(name.to_string());
        self
    }

    fn check(set: &HashSet<String>, path: &Path) -> io::Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if set.contains(&name) {
            Err(io::Error::other(format!("injected fault at {}", name)))
        } else {
            Ok(())
        }
    }
}

impl FileSystem for FaultyFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        Self::check(&self.fail_read, path)?;
        self.inner.read(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        Self::check(&self.fail_write, path)?;
        self.inner.write(path, contents, mode)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        Self::check(&self.fail_remove, path)?;
        self.inner.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        Self::check(&self.fail_remove, path)?;
        self.inner.remove_dir_all(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&WalkEntry) -> io::Result<WalkAction>,
    ) -> std::result::Result<(), WalkError> {
        self.inner.walk(root, visit)
    }
}

fn faulty_harness(fs: FaultyFileSystem) -> VaultTestHarness {
    VaultTestHarness::with_builder(VaultBuilder::new().file_system(Arc::new(fs)))
}

fn write_notes(harness: &VaultTestHarness, names: &[&str]) {
    for name in names {
        fs::write(harness.local.join(name), format!("content of {}", name)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fault_does_not_stop_siblings() {
        let harness = faulty_harness(FaultyFileSystem::default().fail_read("b.md"));
        write_notes(&harness, &["a.md", "b.md", "c.md", "d.md"]);

        let err = harness.vault.backup("pw").unwrap_err();

        assert_eq!(err.relative_path(), Some("b.md"));
        assert!(matches!(err, VaultError::Transform { ref source, .. } if matches!(**source, VaultError::Io(_))));
        let git = harness.vault.git_path();
        for name in ["a.md", "c.md", "d.md"] {
            assert!(git.join(name).is_file(), "{} should have been written", name);
        }
        assert!(!git.join("b.md").exists());
    }

    #[test]
    fn test_write_fault_reports_relative_path() {
        let harness = faulty_harness(FaultyFileSystem::default().fail_write("inner.md"));
        fs::create_dir_all(harness.local.join("deep/er")).unwrap();
        fs::write(harness.local.join("deep/er/inner.md"), b"x").unwrap();
        write_notes(&harness, &["top.md"]);

        let err = harness.vault.backup("pw").unwrap_err();

        assert_eq!(err.relative_path(), Some("deep/er/inner.md"));
        assert!(harness.vault.git_path().join("top.md").is_file());
        assert!(harness.vault.git_path().join("deep/er").is_dir());
    }

    #[test]
    fn test_clean_is_fail_fast() {
        let harness = faulty_harness(FaultyFileSystem::default().fail_remove("stuck.md"));
        write_notes(&harness, &["note.md"]);
        let git = harness.vault.git_path();
        fs::write(git.join("stuck.md"), b"blob").unwrap();

        let err = harness.vault.backup("pw").unwrap_err();

        assert!(matches!(err, VaultError::Clean { ref path, .. } if path.ends_with("stuck.md")));
        // Nothing after the failure ran: no skeleton, no blobs
        assert!(!git.join(".obsidian").exists());
        assert!(!git.join("note.md").exists());
        assert!(git.join(".git/HEAD").is_file());
    }

    #[test]
    fn test_tampered_blob_fails_authentication() {
        let harness = VaultTestHarness::new();
        write_notes(&harness, &["a.md", "b.md"]);
        harness.vault.backup("pw").unwrap();

        let blob_path = harness.vault.git_path().join("b.md");
        let mut blob = fs::read(&blob_path).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let at = rng.random_range(0..blob.len());
        blob[at] ^= 0x01;
        fs::write(&blob_path, blob).unwrap();

        let err = harness.vault.restore("pw").unwrap_err();

        assert!(err.is_authentication());
        assert_eq!(err.relative_path(), Some("b.md"));
        assert_eq!(
            fs::read(harness.local.join("a.md")).unwrap(),
            b"content of a.md"
        );
    }

    #[test]
    fn test_truncated_blob_fails_authentication() {
        let harness = VaultTestHarness::new();
        write_notes(&harness, &["short.md"]);
        harness.vault.backup("pw").unwrap();
        fs::write(harness.vault.git_path().join("short.md"), [0u8; 27]).unwrap();

        let err = harness.vault.restore("pw").unwrap_err();
        assert!(err.is_authentication());
        assert!(err.user_message().contains("short.md"));
    }

    #[test]
    fn test_renamed_blob_is_indistinguishable_from_corruption() {
        let harness = VaultTestHarness::new();
        write_notes(&harness, &["before.md"]);
        harness.vault.backup("pw").unwrap();
        let git = harness.vault.git_path();
        fs::rename(git.join("before.md"), git.join("after.md")).unwrap();

        let err = harness.vault.restore("pw").unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.relative_path(), Some("after.md"));
    }

    #[test]
    fn test_wrong_password_leaves_mirror_untouched() {
        let harness = VaultTestHarness::new();
        write_notes(&harness, &["a.md", "b.md", "c.md"]);
        harness.vault.backup("pw").unwrap();
        let mirror_before = snapshot(harness.vault.git_path(), &[".git"]);

        let err = harness.vault.restore("not the password").unwrap_err();

        assert!(err.is_authentication());
        assert_eq!(snapshot(harness.vault.git_path(), &[".git"]), mirror_before);
        // The right password still recovers everything
        harness.vault.restore("pw").unwrap();
        assert_eq!(fs::read(harness.local.join("c.md")).unwrap(), b"content of c.md");
    }

    #[test]
    fn test_many_faults_report_one_error() {
        let fs_faults = ["n3.md", "n7.md", "n11.md"]
            .iter()
            .fold(FaultyFileSystem::default(), |faults, name| faults.fail_read(name));
        let harness = faulty_harness(fs_faults);
        let names: Vec<String> = (0..16).map(|i| format!("n{}.md", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        write_notes(&harness, &refs);

        let err = harness.vault.backup("pw").unwrap_err();

        let failed = err.relative_path().unwrap();
        assert!(["n3.md", "n7.md", "n11.md"].contains(&failed));
        let written = fs::read_dir(harness.vault.git_path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('n'))
            .count();
        assert_eq!(written, 13);
    }

    #[test]
    fn test_kdf_params_must_match_between_backup_and_restore() {
        let harness = VaultTestHarness::new();
        write_notes(&harness, &["a.md"]);
        harness.vault.backup("pw").unwrap();

        let other = VaultBuilder::new()
            .kdf_params(KdfParams::new(11, 8, 1).unwrap())
            .build(harness.local.clone())
            .unwrap();
        assert!(other.restore("pw").unwrap_err().is_authentication());

        let same = VaultBuilder::new()
            .kdf_params(fast_kdf())
            .build(harness.local.clone())
            .unwrap();
        same.restore("pw").unwrap();
    }
}
