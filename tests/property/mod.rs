//! Property-based testing for obsidian-vault
//!
//! Uses proptest to check the codec and tree invariants across randomly
//! generated inputs. Key derivation is expensive, so case counts stay low and
//! the codec runs with reduced scrypt cost.

use ::obsidian_vault::reconciler::{CleanPolicy, Reconciler};
use ::obsidian_vault::scanner::Scanner;
use ::obsidian_vault::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

fn codec() -> Codec {
    Codec::with_params(crate::integration::fast_kdf())
}

/// Relative `/`-separated note paths, one to three levels deep
fn relative_path_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z]{1,6}", 0..=2),
        "[a-z0-9]{1,8}\\.md",
    )
        .prop_map(|(dirs, file)| {
            let mut parts = dirs;
            parts.push(file);
            parts.join("/")
        })
}

fn password_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_round_trip(
        plaintext in prop::collection::vec(any::<u8>(), 0..4096),
        password in password_strategy(),
        identifier in relative_path_strategy(),
    ) {
        let codec = codec();
        let blob = codec.encrypt(&plaintext, &password, &identifier).unwrap();
        prop_assert_eq!(blob.len(), plaintext.len() + 28);
        prop_assert_eq!(codec.decrypt(&blob, &password, &identifier).unwrap(), plaintext);
    }

    #[test]
    fn prop_encryption_is_randomized(
        plaintext in prop::collection::vec(any::<u8>(), 0..512),
        password in password_strategy(),
    ) {
        let codec = codec();
        let first = codec.encrypt(&plaintext, &password, "note.md").unwrap();
        let second = codec.encrypt(&plaintext, &password, "note.md").unwrap();

        prop_assert_ne!(&first, &second);
        prop_assert_eq!(codec.decrypt(&first, &password, "note.md").unwrap(), plaintext.clone());
        prop_assert_eq!(codec.decrypt(&second, &password, "note.md").unwrap(), plaintext);
    }

    #[test]
    fn prop_any_flipped_byte_fails(
        plaintext in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let codec = codec();
        let mut blob = codec.encrypt(&plaintext, "pw", "a/b.md").unwrap();
        let at = index.index(blob.len());
        blob[at] ^= 1 << bit;

        let err = codec.decrypt(&blob, "pw", "a/b.md").unwrap_err();
        prop_assert!(err.is_authentication());
    }

    #[test]
    fn prop_wrong_identifier_or_password_fails(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        identifier in relative_path_strategy(),
        other in relative_path_strategy(),
    ) {
        prop_assume!(identifier != other);
        let codec = codec();
        let blob = codec.encrypt(&plaintext, "pw", &identifier).unwrap();

        prop_assert!(codec.decrypt(&blob, "pw", &other).unwrap_err().is_authentication());
        prop_assert!(codec.decrypt(&blob, "pW", &identifier).unwrap_err().is_authentication());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_scan_matches_written_tree(
        paths in prop::collection::btree_set(relative_path_strategy(), 1..20),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join(".obsidian")).unwrap();

        let mut expected_dirs = BTreeSet::from([".obsidian".to_string()]);
        let mut expected_files = BTreeSet::new();
        // Directory names never contain a dot, so no file name doubles as a directory
        for path in &paths {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, path.as_bytes()).unwrap();

            let mut dir = String::new();
            for part in path.split('/').rev().skip(1).collect::<Vec<_>>().into_iter().rev() {
                if !dir.is_empty() {
                    dir.push('/');
                }
                dir.push_str(part);
                expected_dirs.insert(dir.clone());
            }
            expected_files.insert(path.clone());
        }

        let inventory = Scanner::new(&StdFileSystem, ".obsidian", ".git").scan(root).unwrap();

        prop_assert_eq!(inventory.directories().to_vec(), expected_dirs.into_iter().collect::<Vec<_>>());
        prop_assert_eq!(inventory.files().to_vec(), expected_files.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn prop_clean_leaves_exactly_the_skeleton(
        existing in prop::collection::btree_set(relative_path_strategy(), 0..12),
        wanted in prop::collection::btree_set("[a-z]{1,4}(/[a-z]{1,4}){0,2}", 0..8),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path();
        fs::create_dir_all(target.join(".git/refs")).unwrap();
        fs::write(target.join(".git/HEAD"), b"ref").unwrap();
        for path in &existing {
            let full = target.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, b"stale").unwrap();
        }

        let inventory = Inventory::new(wanted.iter().cloned().collect(), Vec::new());
        let policy = CleanPolicy::new([".git"]);
        Reconciler::new(&StdFileSystem, &policy).clean(target, &inventory).unwrap();

        let files: Vec<_> = walkdir::WalkDir::new(target)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        prop_assert!(files.is_empty());
        for dir in &wanted {
            prop_assert!(target.join(dir).is_dir());
        }
        prop_assert_eq!(fs::read(target.join(".git/HEAD")).unwrap(), b"ref".to_vec());
    }
}
