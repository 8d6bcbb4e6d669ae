//! End-to-end consolidation on the real filesystem

use std::fs;
use std::path::{Path, PathBuf};

use claude_consolidate::parser::settings::SettingsDocument;
use claude_consolidate::{
    Category, Config, ConsolidateError, ConsolidateOptions, Consolidator, OsFileSystem,
};
use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    global: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("code");
        let global = dir.path().join("home/.claude/settings.json");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        Self {
            _dir: dir,
            root,
            global,
        }
    }

    fn project(&self, name: &str, content: &str) {
        let claude = self.root.join(name).join(".claude");
        fs::create_dir_all(&claude).unwrap();
        fs::write(claude.join("settings.local.json"), content).unwrap();
    }

    fn options(&self, dry_run: bool) -> ConsolidateOptions {
        ConsolidateOptions {
            root: self.root.clone(),
            global_path: self.global.clone(),
            dry_run,
        }
    }

    fn global_json(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(&self.global).unwrap()).unwrap()
    }

    fn backups(&self) -> Vec<PathBuf> {
        let dir = self.global.parent().unwrap();
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".backup-"))
            .collect();
        found.sort();
        found
    }
}

fn consolidator() -> Consolidator<OsFileSystem> {
    Consolidator::new(OsFileSystem, Config::default())
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect()
}

#[test]
fn test_end_to_end_merge_preserves_other_fields() {
    let ws = Workspace::new();
    fs::write(
        &ws.global,
        r#"{"hooks":{"PreToolUse":[{"matcher":"Bash","hooks":[{"type":"command","command":"guard"}]}]},"permissions":{"allow":["Bash(npm test)"],"defaultMode":"acceptEdits"}}"#,
    )
    .unwrap();
    ws.project("web", r#"{"permissions":{"allow":["Bash(npm:*)","Read(/srv/**)"]}}"#);
    ws.project(
        "ops",
        r#"{"permissions":{"allow":["Bash(curl:*)"],"deny":["Bash(curl:*)","Read(/srv/secrets/**)"]}}"#,
    );
    ws.project("junk", "[1, 2, 3]");

    let outcome = consolidator().run(&ws.options(false)).unwrap();
    assert!(outcome.written);
    assert_eq!(outcome.result.files_scanned, 3);
    assert_eq!(outcome.result.files_skipped, 1);
    assert_eq!(outcome.result.conflicts_resolved, 1);

    let global = ws.global_json();
    assert_eq!(
        global["hooks"]["PreToolUse"][0]["hooks"][0]["command"],
        "guard"
    );
    assert_eq!(global["permissions"]["defaultMode"], "acceptEdits");
    assert_eq!(
        strings(&global["permissions"]["allow"]),
        vec!["Bash(npm:*)", "Read(/srv/**)"]
    );
    assert_eq!(
        strings(&global["permissions"]["deny"]),
        vec!["Bash(curl:*)", "Read(/srv/secrets/**)"]
    );
    assert_eq!(ws.backups().len(), 1);
}

#[test]
fn test_second_run_leaves_file_byte_identical() {
    let ws = Workspace::new();
    ws.project(
        "a",
        r#"{"permissions":{"allow":["Bash(cargo:*)"],"deny":["Bash(cargo publish:*)"]}}"#,
    );

    let first = consolidator().run(&ws.options(false)).unwrap();
    assert!(first.written);
    assert!(first.backup.is_none());
    let after_first = fs::read(&ws.global).unwrap();

    let second = consolidator().run(&ws.options(false)).unwrap();
    assert!(!second.changed);
    assert!(!second.written);
    assert_eq!(second.result.added.total(), 0);
    assert_eq!(fs::read(&ws.global).unwrap(), after_first);
    assert!(ws.backups().is_empty());
}

#[test]
fn test_dry_run_touches_nothing() {
    let ws = Workspace::new();
    let original = r#"{"permissions":{"allow":["Bash(ls:*)"]}}"#;
    fs::write(&ws.global, original).unwrap();
    ws.project("a", r#"{"permissions":{"allow":["Bash(make:*)"]}}"#);

    let outcome = consolidator().run(&ws.options(true)).unwrap();
    assert!(outcome.dry_run);
    assert!(outcome.changed);
    assert!(outcome.result.merged.contains(Category::Allow, "Bash(make:*)"));
    assert_eq!(fs::read_to_string(&ws.global).unwrap(), original);
    assert!(ws.backups().is_empty());
}

#[test]
fn test_no_files_found_exit_code() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.root.join("plain/src")).unwrap();

    let err = consolidator().run(&ws.options(false)).unwrap_err();
    assert!(matches!(err, ConsolidateError::NoFilesFound { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!ws.global.exists());
}

#[test]
fn test_malformed_global_is_left_alone() {
    let ws = Workspace::new();
    fs::write(&ws.global, "{ broken").unwrap();
    ws.project("a", r#"{"permissions":{"allow":["Bash(ls:*)"]}}"#);

    let err = consolidator().run(&ws.options(false)).unwrap_err();
    assert!(matches!(err, ConsolidateError::GlobalMalformed { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(fs::read_to_string(&ws.global).unwrap(), "{ broken");
}

#[test]
fn test_backups_are_pruned_to_configured_count() {
    let ws = Workspace::new();
    fs::write(&ws.global, "{}").unwrap();
    let parent = ws.global.parent().unwrap();
    for stamp in ["20200101-000000", "20200102-000000", "20200103-000000"] {
        fs::write(parent.join(format!("settings.json.backup-{}", stamp)), "{}").unwrap();
    }
    ws.project("a", r#"{"permissions":{"allow":["Bash(ls:*)"]}}"#);

    let mut config = Config::default();
    config.backup.keep = 2;
    let outcome = Consolidator::new(OsFileSystem, config)
        .run(&ws.options(false))
        .unwrap();

    assert_eq!(outcome.pruned_backups.len(), 2);
    let backups = ws.backups();
    assert_eq!(backups.len(), 2);
    assert!(backups.contains(outcome.backup.as_ref().unwrap()));
    assert!(backups.contains(&parent.join("settings.json.backup-20200103-000000")));
}

#[test]
fn test_written_file_round_trips() {
    let ws = Workspace::new();
    ws.project("a", r#"{"permissions":{"ask":["WebFetch(domain:docs.rs)"]}}"#);
    consolidator().run(&ws.options(false)).unwrap();

    let document = SettingsDocument::load(&OsFileSystem, Path::new(&ws.global)).unwrap();
    assert!(document
        .rule_set()
        .contains(Category::Ask, "WebFetch(domain:docs.rs)"));
    let text = fs::read_to_string(&ws.global).unwrap();
    assert_eq!(document.to_canonical_string().unwrap(), text);
}
