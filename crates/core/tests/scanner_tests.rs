// ═══════════════════════════════════════════════════════════════════
// Scanner Tests — ScannerService tree building, master lookup,
// LocalFileProvider
// ═══════════════════════════════════════════════════════════════════

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use signal_board_core::errors::CoreError;
use signal_board_core::models::directory::{find_directory, DirectoryNode, MasterSource};
use signal_board_core::models::settings::BoardSettings;
use signal_board_core::providers::local::LocalFileProvider;
use signal_board_core::providers::traits::DataFileProvider;
use signal_board_core::services::scanner_service::ScannerService;

fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn scanner() -> ScannerService {
    ScannerService::new(&BoardSettings::default())
}

fn settings_for(root: &Path) -> BoardSettings {
    BoardSettings {
        data_root: root.to_path_buf(),
        ..BoardSettings::default()
    }
}

fn names(nodes: &[DirectoryNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

/// Every node in the tree must hold a file or a qualifying descendant.
fn assert_no_empty_nodes(nodes: &[DirectoryNode]) {
    for node in nodes {
        assert!(node.has_content(), "empty node {}", node.path);
        assert!(node.total_files() > 0, "node without files {}", node.path);
        assert_no_empty_nodes(&node.subdirectories);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ScannerService::scan
// ═══════════════════════════════════════════════════════════════════

mod scan {
    use super::*;

    #[test]
    fn missing_root_yields_empty_tree() {
        let dir = TempDir::new().unwrap();
        let tree = scanner().scan(&dir.path().join("does-not-exist")).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn empty_root_yields_empty_tree() {
        let dir = TempDir::new().unwrap();
        assert!(scanner().scan(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn directories_without_data_files_are_pruned() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty/deeper/deepest")).unwrap();
        write(dir.path(), "notes/readme.txt", "not data");
        write(dir.path(), "signals/today.json", "[]");

        let tree = scanner().scan(dir.path()).unwrap();
        assert_eq!(names(&tree), vec!["signals"]);
        assert_no_empty_nodes(&tree);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(outside.path(), "linked.json", "[]");
        write(dir.path(), "real/today.json", "[]");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("alias")).unwrap();

        let tree = scanner().scan(dir.path()).unwrap();
        assert_eq!(names(&tree), vec!["real"]);
    }

    #[test]
    fn folder_kept_when_only_a_descendant_has_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "signals/2024/q1/jan.json", "[]");
        fs::create_dir_all(dir.path().join("signals/2023")).unwrap();

        let tree = scanner().scan(dir.path()).unwrap();
        assert_eq!(tree.len(), 1);

        let signals = &tree[0];
        assert!(signals.files.is_empty());
        assert_eq!(names(&signals.subdirectories), vec!["2024"]);

        let q1 = &signals.subdirectories[0].subdirectories[0];
        assert_eq!(q1.name, "q1");
        assert_eq!(q1.path, "signals/2024/q1");
        assert_eq!(q1.files, vec!["jan.json"]);
        assert_no_empty_nodes(&tree);
    }

    #[test]
    fn only_matching_extension_is_listed_and_files_are_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/zeta.json", "[]");
        write(dir.path(), "a/alpha.json", "[]");
        write(dir.path(), "a/notes.txt", "");
        write(dir.path(), "a/backup.json.bak", "");

        let tree = scanner().scan(dir.path()).unwrap();
        assert_eq!(tree[0].files, vec!["alpha.json", "zeta.json"]);
    }

    #[test]
    fn root_level_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "stray.json", "[]");
        assert!(scanner().scan(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn sibling_directories_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["gamma", "Alpha", "beta"] {
            write(dir.path(), &format!("{name}/x.json"), "[]");
        }
        let tree = scanner().scan(dir.path()).unwrap();
        assert_eq!(names(&tree), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn custom_extension_setting() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/one.ndjson", "");
        write(dir.path(), "a/two.json", "[]");

        let settings = BoardSettings {
            data_extension: ".ndjson".into(),
            ..BoardSettings::default()
        };
        let tree = ScannerService::new(&settings).scan(dir.path()).unwrap();
        assert_eq!(tree[0].files, vec!["one.ndjson"]);
    }

    #[test]
    fn every_scan_rereads_the_filesystem() {
        let dir = TempDir::new().unwrap();
        let svc = scanner();
        assert!(svc.scan(dir.path()).unwrap().is_empty());

        write(dir.path(), "late/arrival.json", "[]");
        assert_eq!(names(&svc.scan(dir.path()).unwrap()), vec!["late"]);
    }

    #[test]
    fn listing_wraps_tree_in_directories_key() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "master/all.json", "[]");

        let listing = scanner().listing(dir.path()).unwrap();
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["directories"][0]["name"], "master");
        assert_eq!(json["directories"][0]["path"], "master");
        assert_eq!(json["directories"][0]["files"][0], "all.json");
        assert!(json["directories"][0]["subdirectories"].as_array().unwrap().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Master lookup
// ═══════════════════════════════════════════════════════════════════

mod master_lookup {
    use super::*;

    fn node(name: &str, path: &str, files: &[&str], subdirectories: Vec<DirectoryNode>) -> DirectoryNode {
        DirectoryNode {
            name: name.into(),
            path: path.into(),
            files: files.iter().map(|f| f.to_string()).collect(),
            subdirectories,
        }
    }

    #[test]
    fn finds_top_level_master() {
        let tree = vec![
            node("alpha", "alpha", &["a.json"], vec![]),
            node("master", "master", &["all.json"], vec![]),
        ];
        let found = scanner().find_master(&tree).unwrap();
        assert_eq!(found.path, "master");
    }

    #[test]
    fn pre_order_prefers_the_nested_match_found_first() {
        // alpha/master is reached before the top-level master sibling.
        let tree = vec![
            node(
                "alpha",
                "alpha",
                &[],
                vec![node("master", "alpha/master", &["nested.json"], vec![])],
            ),
            node("master", "master", &["top.json"], vec![]),
        ];
        assert_eq!(scanner().find_master(&tree).unwrap().path, "alpha/master");
    }

    #[test]
    fn parent_checked_before_children() {
        let tree = vec![node(
            "master",
            "master",
            &["outer.json"],
            vec![node("master", "master/master", &["inner.json"], vec![])],
        )];
        assert_eq!(find_directory(&tree, "master").unwrap().path, "master");
    }

    #[test]
    fn absent_master_is_none() {
        let tree = vec![node("alpha", "alpha", &["a.json"], vec![])];
        assert!(scanner().find_master(&tree).is_none());
        assert!(scanner().master_source(&tree).is_none());
    }

    #[test]
    fn master_source_requires_own_files() {
        let tree = vec![node(
            "master",
            "master",
            &[],
            vec![node("deep", "master/deep", &["x.json"], vec![])],
        )];
        assert!(scanner().find_master(&tree).is_some());
        assert!(scanner().master_source(&tree).is_none());
    }

    #[test]
    fn master_source_copies_path_and_files() {
        let master = node("master", "data/master", &["a.json", "b.json"], vec![]);
        let source = MasterSource::from_node(&master).unwrap();
        assert_eq!(source.path, "data/master");
        assert_eq!(source.files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn custom_master_name() {
        let settings = BoardSettings {
            master_directory: "everything".into(),
            ..BoardSettings::default()
        };
        let tree = vec![
            node("master", "master", &["m.json"], vec![]),
            node("everything", "everything", &["e.json"], vec![]),
        ];
        let svc = ScannerService::new(&settings);
        assert_eq!(svc.find_master(&tree).unwrap().name, "everything");
    }
}

// ═══════════════════════════════════════════════════════════════════
// LocalFileProvider
// ═══════════════════════════════════════════════════════════════════

mod local_provider {
    use super::*;

    #[tokio::test]
    async fn lists_directories_from_data_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "master/all.json", "[]");
        write(dir.path(), "daily/monday.json", "[]");

        let provider = LocalFileProvider::new(&settings_for(dir.path()));
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.root(), dir.path());

        let tree = provider.list_directories().await.unwrap();
        assert_eq!(names(&tree), vec!["daily", "master"]);
    }

    #[tokio::test]
    async fn missing_root_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let provider = LocalFileProvider::new(&settings_for(&dir.path().join("gone")));
        assert!(provider.list_directories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetches_raw_file_text() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "daily/monday.json", r#"{"tickerName":"AAPL"}"#);

        let provider = LocalFileProvider::new(&settings_for(dir.path()));
        let text = provider.fetch("daily/monday.json").await.unwrap();
        assert_eq!(text, r#"{"tickerName":"AAPL"}"#);
    }

    #[tokio::test]
    async fn missing_file_is_data_file_error() {
        let dir = TempDir::new().unwrap();
        let provider = LocalFileProvider::new(&settings_for(dir.path()));
        let err = provider.fetch("daily/none.json").await.unwrap_err();
        assert!(matches!(err, CoreError::DataFile { ref path, .. } if path == "daily/none.json"));
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "inner/data/a.json", "[]");
        write(dir.path(), "secret.json", "[]");

        let provider = LocalFileProvider::new(&settings_for(&dir.path().join("inner/data")));
        let err = provider.fetch("../../secret.json").await.unwrap_err();
        assert!(err.to_string().contains("escapes the data root"));
    }
}
