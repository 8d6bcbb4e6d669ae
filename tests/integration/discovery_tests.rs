//! Discovery against a real directory tree

use std::fs;
use std::path::{Path, PathBuf};

use claude_consolidate::config::DiscoveryConfig;
use claude_consolidate::discovery::discover;
use claude_consolidate::{ConsolidateError, OsFileSystem};
use tempfile::TempDir;

fn touch_settings(dir: &Path) -> PathBuf {
    let claude = dir.join(".claude");
    fs::create_dir_all(&claude).unwrap();
    let file = claude.join("settings.local.json");
    fs::write(&file, r#"{"permissions":{"allow":[]}}"#).unwrap();
    file
}

fn relative(root: &Path, found: Vec<PathBuf>) -> Vec<String> {
    found
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_finds_projects_in_sorted_order() {
    let root = TempDir::new().unwrap();
    touch_settings(&root.path().join("zeta"));
    touch_settings(&root.path().join("alpha"));
    touch_settings(&root.path().join("alpha/nested"));

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(
        relative(root.path(), found),
        vec![
            "alpha/.claude/settings.local.json",
            "alpha/nested/.claude/settings.local.json",
            "zeta/.claude/settings.local.json",
        ]
    );
}

#[test]
fn test_nested_claude_inside_claude_is_ignored() {
    let root = TempDir::new().unwrap();
    let outer = touch_settings(&root.path().join("proj"));
    let inner = root.path().join("proj/.claude/subdir/.claude");
    fs::create_dir_all(&inner).unwrap();
    fs::write(inner.join("settings.local.json"), "{}").unwrap();

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(found, vec![outer]);
}

#[test]
fn test_skipped_directories_are_not_entered() {
    let root = TempDir::new().unwrap();
    touch_settings(&root.path().join("node_modules/pkg"));
    touch_settings(&root.path().join(".cache/tool"));
    let kept = touch_settings(&root.path().join("app"));

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(found, vec![kept]);
}

#[test]
fn test_depth_limit() {
    let root = TempDir::new().unwrap();
    let shallow = touch_settings(&root.path().join("a"));
    touch_settings(&root.path().join("a/b/c/d"));

    let options = DiscoveryConfig {
        max_depth: 2,
        ..DiscoveryConfig::default()
    };
    let found = discover(&OsFileSystem, root.path(), &options).unwrap();
    assert_eq!(found, vec![shallow]);
}

#[test]
fn test_claude_dir_without_settings_file() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("proj/.claude")).unwrap();
    fs::write(root.path().join("proj/.claude/settings.json"), "{}").unwrap();

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_missing_root() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope");
    assert!(matches!(
        discover(&OsFileSystem, &missing, &DiscoveryConfig::default()),
        Err(ConsolidateError::RootNotFound { .. })
    ));
}

#[test]
fn test_root_is_a_file() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    let err = discover(&OsFileSystem, &file, &DiscoveryConfig::default()).unwrap_err();
    assert!(matches!(err, ConsolidateError::RootNotDirectory { .. }));
    assert_eq!(err.exit_code(), 64);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_terminates() {
    use std::os::unix::fs::symlink;

    let root = TempDir::new().unwrap();
    let project = touch_settings(&root.path().join("proj"));
    // proj/loop -> root
    symlink(root.path(), root.path().join("proj/loop")).unwrap();
    // proj/self -> proj
    symlink(root.path().join("proj"), root.path().join("proj/self")).unwrap();

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(found, vec![project]);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_ignored() {
    use std::os::unix::fs::symlink;

    let root = TempDir::new().unwrap();
    let project = touch_settings(&root.path().join("proj"));
    symlink(root.path().join("gone"), root.path().join("dangling")).unwrap();

    let found = discover(&OsFileSystem, root.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(found, vec![project]);
}
