//! Main test module for obsidian-vault
//!
//! This module includes all test suites:
//! - Integration tests for full backup and restore cycles
//! - Chaos tests for fault injection and tampering
//! - Property-based tests for codec and tree invariants
//! - Edge cases for unusual names, permissions and links

pub mod chaos;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use crate::integration::VaultTestHarness;
    use ::obsidian_vault::*;
    use std::fs;

    #[test]
    fn test_empty_vault() {
        let harness = VaultTestHarness::new();
        fs::remove_file(harness.local.join(".obsidian/app.json")).unwrap();

        let report = harness.vault.backup("pw").unwrap();
        assert_eq!(report.files, 0);
        assert_eq!(report.directories, 1);
        assert_eq!(report.transform, TransformSummary::default());

        // Add a note locally, restore should remove it
        fs::write(harness.local.join("file.md"), "content").unwrap();
        harness.vault.restore("pw").unwrap();
        assert!(!harness.local.join("file.md").exists());
        assert!(harness.local.join(".obsidian").is_dir());
    }

    #[test]
    fn test_special_filenames() {
        let harness = VaultTestHarness::new();

        let special_names = vec![
            "note with spaces.md",
            "note-with-dashes.md",
            "note.with.dots.md",
            "note@with#special$chars.md",
            "note(with)parens.md",
            "note[with]brackets.md",
            "'quoted'.md",
        ];

        let mut created = Vec::new();
        for name in &special_names {
            // Skip if OS doesn't support this filename
            if fs::write(harness.local.join(name), format!("Content of {}", name)).is_ok() {
                created.push(*name);
            }
        }

        harness.vault.backup("pw").unwrap();
        for name in &created {
            fs::remove_file(harness.local.join(name)).unwrap();
        }
        harness.vault.restore("pw").unwrap();

        for name in &created {
            let content = fs::read_to_string(harness.local.join(name)).unwrap();
            assert_eq!(content, format!("Content of {}", name));
        }
    }

    #[test]
    fn test_unicode_filenames() {
        let harness = VaultTestHarness::new();

        let unicode_names = vec![
            "заметка.md", // Russian
            "笔记.md",    // Chinese
            "ノート.md",  // Japanese
            "σημείωση.md", // Greek
            "🚀🌟💾.md",  // Emojis
        ];

        let mut created = Vec::new();
        for name in &unicode_names {
            if fs::write(harness.local.join(name), format!("Unicode content: {}", name)).is_ok() {
                created.push(*name);
            }
        }
        if created.is_empty() {
            // No unicode support on this system
            return;
        }

        harness.vault.backup("pw").unwrap();

        // Blob names keep the plaintext name, salts use the same string
        for name in &created {
            assert!(harness.vault.git_path().join(name).is_file());
        }

        harness.vault.restore("pw").unwrap();
        for name in &created {
            let content = fs::read_to_string(harness.local.join(name)).unwrap();
            assert_eq!(content, format!("Unicode content: {}", name));
        }
    }

    #[test]
    fn test_written_files_use_configured_mode() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let harness = VaultTestHarness::new();
            let note = harness.local.join("private.md");
            fs::write(&note, "secret").unwrap();
            fs::set_permissions(&note, fs::Permissions::from_mode(0o600)).unwrap();

            harness.vault.backup("pw").unwrap();
            let blob_mode = fs::metadata(harness.vault.git_path().join("private.md"))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(blob_mode, 0o644);

            harness.vault.restore("pw").unwrap();
            let restored_mode = fs::metadata(&note).unwrap().permissions().mode() & 0o777;
            assert_eq!(restored_mode, 0o644);
        }
    }

    #[test]
    fn test_symlinked_directory_is_not_followed() {
        #[cfg(unix)]
        {
            let harness = VaultTestHarness::new();
            let outside = harness.temp_dir.path().join("outside");
            fs::create_dir(&outside).unwrap();
            fs::write(outside.join("elsewhere.md"), "not part of the vault").unwrap();
            std::os::unix::fs::symlink(&outside, harness.local.join("linked")).unwrap();

            let inventory = harness
                .vault
                .scan(&VaultRoot::Local(harness.vault.local_path().to_path_buf()))
                .unwrap();

            assert!(!inventory.directories().contains(&"linked".to_string()));
            assert!(!inventory.files().iter().any(|f| f.starts_with("linked/")));
        }
    }

    #[test]
    fn test_scan_without_mirror_is_not_a_vault() {
        let harness = VaultTestHarness::new();
        fs::remove_dir_all(harness.vault.git_path()).unwrap();
        fs::create_dir(harness.vault.git_path()).unwrap();

        // An empty mirror has no marker directory yet
        let err = harness.vault.restore("pw").unwrap_err();
        assert!(matches!(err, VaultError::NotAVault { .. }));
        assert!(harness.local.join(".obsidian/app.json").is_file());
    }
}

// Re-export test utilities for use across suites
pub use integration::{NoteConfig, NoteGenerator, RecordingRunner, VaultTestHarness};
