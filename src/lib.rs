//! claude-consolidate - Merge per-project Claude Code permissions into the
//! global settings file
//!
//! Projects accumulate their own `.claude/settings.local.json` permission
//! rules. This library finds them, merges them into
//! `~/.claude/settings.json`, drops allow rules made redundant by broader
//! ones, and lets deny rules win over conflicting allows.
//!
//! # Features
//!
//! - **Discovery**: Depth-first scan for `.claude/settings.local.json`, safe against symlink cycles
//! - **Subsumption**: `Bash(git:*)` makes `Bash(git log:*)` redundant
//! - **Deny wins**: An allow rule covered by a deny rule is dropped
//! - **Safe writes**: Timestamped backup, then write-to-temp and rename
//! - **Audit logging**: JSONL log of every run
//!
//! # Example
//!
//! ```
//! use claude_consolidate::{merge_permissions, RuleSet};
//!
//! let global = RuleSet::from_lists(["Bash(git log:*)"], ["Bash(rm:*)"], Vec::<&str>::new());
//! let none = Vec::<&str>::new();
//! let local = RuleSet::from_lists(["Bash(git:*)", "Bash(rm -rf:*)"], none.clone(), none);
//!
//! let result = merge_permissions(&global, &[local]);
//! assert_eq!(result.merged.allow.iter().collect::<Vec<_>>(), vec!["Bash(git:*)"]);
//! assert_eq!(result.conflicts_resolved, 1);
//! ```

pub mod audit;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod fs;
pub mod output;
pub mod parser;
pub mod persist;
pub mod rules;

// Re-exports for convenience
pub use config::Config;
pub use engine::{merge_permissions, ConsolidateOptions, Consolidation, Consolidator};
pub use error::{ConsolidateError, MalformedRuleError};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use output::format_report;
pub use rules::{Category, MergeResult, Rule, RuleSet, RuleType};
