//! Permission model for claude-consolidate
//!
//! A [`Rule`] is one parsed `Type(scope)` entry from a settings file. A
//! [`RuleSet`] holds the raw strings of one source grouped by [`Category`];
//! strings that do not parse are kept verbatim so user data is never lost.

pub mod subsumption;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::parser::rule::parse_rule;

/// Permission category as it appears under `permissions` in a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Allow,
    Deny,
    Ask,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 3] = [Category::Allow, Category::Deny, Category::Ask];

    /// JSON key for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Allow => "allow",
            Category::Deny => "deny",
            Category::Ask => "ask",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Tool a rule applies to. Rules of different types are never comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleType {
    Bash,
    Read,
    Write,
    Edit,
    MultiEdit,
    NotebookEdit,
    NotebookRead,
    WebFetch,
    WebSearch,
    Glob,
    Grep,
    LS,
    Task,
    TodoWrite,
}

impl RuleType {
    pub const ALL: [RuleType; 14] = [
        RuleType::Bash,
        RuleType::Read,
        RuleType::Write,
        RuleType::Edit,
        RuleType::MultiEdit,
        RuleType::NotebookEdit,
        RuleType::NotebookRead,
        RuleType::WebFetch,
        RuleType::WebSearch,
        RuleType::Glob,
        RuleType::Grep,
        RuleType::LS,
        RuleType::Task,
        RuleType::TodoWrite,
    ];

    /// Look up a type token. Matching is exact (tool names are case sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        RuleType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleType::Bash => "Bash",
            RuleType::Read => "Read",
            RuleType::Write => "Write",
            RuleType::Edit => "Edit",
            RuleType::MultiEdit => "MultiEdit",
            RuleType::NotebookEdit => "NotebookEdit",
            RuleType::NotebookRead => "NotebookRead",
            RuleType::WebFetch => "WebFetch",
            RuleType::WebSearch => "WebSearch",
            RuleType::Glob => "Glob",
            RuleType::Grep => "Grep",
            RuleType::LS => "LS",
            RuleType::Task => "Task",
            RuleType::TodoWrite => "TodoWrite",
        }
    }

    /// Tools whose bare scopes may be filesystem paths
    pub fn is_file_tool(&self) -> bool {
        matches!(
            self,
            RuleType::Read
                | RuleType::Write
                | RuleType::Edit
                | RuleType::MultiEdit
                | RuleType::NotebookEdit
                | RuleType::NotebookRead
                | RuleType::Glob
                | RuleType::Grep
                | RuleType::LS
        )
    }

    /// Tools whose scope is a single opaque token (e.g. `domain:example.com`)
    pub fn has_opaque_scope(&self) -> bool {
        matches!(self, RuleType::WebFetch | RuleType::WebSearch)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Explicit path key in `key:<pattern>` scopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKey {
    FilePath,
    DirectoryPath,
    Path,
}

impl PathKey {
    /// Split a `key:` prefix off a scope, if present
    pub fn strip_from(scope: &str) -> Option<(PathKey, &str)> {
        [
            ("file_path:", PathKey::FilePath),
            ("directory_path:", PathKey::DirectoryPath),
            ("path:", PathKey::Path),
        ]
        .into_iter()
        .find_map(|(prefix, key)| scope.strip_prefix(prefix).map(|rest| (key, rest)))
    }
}

/// Space-delimited command pattern, optionally wildcard terminated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandPattern {
    /// Whitespace-separated tokens with the wildcard marker removed
    pub tokens: Vec<String>,
    /// Whether the pattern ended in `:*` or ` *`
    pub wildcard: bool,
}

/// Filesystem path pattern, optionally terminated by the recursive `/**` marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    pub key: Option<PathKey>,
    /// Pattern started with `/`
    pub absolute: bool,
    /// Non-empty path components, separators normalized
    pub components: Vec<String>,
    /// Pattern ended in `/**`
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Command(CommandPattern),
    Path(PathPattern),
}

/// A single parsed permission entry. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    raw: String,
    rule_type: RuleType,
    scope: Scope,
    category: Category,
}

impl Rule {
    pub(crate) fn new(raw: String, rule_type: RuleType, scope: Scope, category: Category) -> Self {
        Self {
            raw,
            rule_type,
            scope,
            category,
        }
    }

    /// The string exactly as it appeared in the settings file
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Categorized permission strings from one source.
///
/// Each category is a set keyed by the raw string; iteration order is
/// alphabetical, which is also the canonical output order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub allow: BTreeSet<String>,
    #[serde(default)]
    pub deny: BTreeSet<String>,
    #[serde(default)]
    pub ask: BTreeSet<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from string lists (duplicates collapse)
    pub fn from_lists<A, D, K, S>(allow: A, deny: D, ask: K) -> Self
    where
        A: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: allow.into_iter().map(Into::into).collect(),
            deny: deny.into_iter().map(Into::into).collect(),
            ask: ask.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Allow => &self.allow,
            Category::Deny => &self.deny,
            Category::Ask => &self.ask,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Allow => &mut self.allow,
            Category::Deny => &mut self.deny,
            Category::Ask => &mut self.ask,
        }
    }

    /// Add a raw rule string; returns false if it was already present
    pub fn insert(&mut self, category: Category, raw: impl Into<String>) -> bool {
        self.get_mut(category).insert(raw.into())
    }

    pub fn contains(&self, category: Category, raw: &str) -> bool {
        self.get(category).contains(raw)
    }

    /// Total number of entries across all categories
    pub fn len(&self) -> usize {
        self.allow.len() + self.deny.len() + self.ask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parsed rules of one category. Unparsable strings are skipped here but
    /// stay in the set.
    pub fn rules(&self, category: Category) -> Vec<Rule> {
        self.get(category)
            .iter()
            .filter_map(|raw| parse_rule(raw, category).ok())
            .collect()
    }
}

/// A discovered settings file and what could be read from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// `None` when the file was malformed or disappeared before parsing
    pub rules: Option<RuleSet>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, rules: Option<RuleSet>) -> Self {
        Self {
            path: path.into(),
            rules,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.as_ref().map_or(0, RuleSet::len)
    }
}

/// Per-category counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub allow: usize,
    pub deny: usize,
    pub ask: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Allow => self.allow,
            Category::Deny => self.deny,
            Category::Ask => self.ask,
        }
    }

    pub fn set(&mut self, category: Category, value: usize) {
        match category {
            Category::Allow => self.allow = value,
            Category::Deny => self.deny = value,
            Category::Ask => self.ask = value,
        }
    }

    pub fn total(&self) -> usize {
        self.allow + self.deny + self.ask
    }
}

/// Outcome of merging the global rule set with every local source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Local sources considered
    pub files_scanned: usize,
    /// Local sources that contributed at least one rule
    pub files_processed: usize,
    /// Local sources with no rules (empty or unreadable)
    pub files_skipped: usize,
    /// Rules in the merged set that the global set did not have
    pub added: CategoryCounts,
    /// Allow entries removed because a broader allow or deny covers them
    pub subsumed: Vec<String>,
    /// Allow entries removed because a deny matches or covers them
    pub conflicts_resolved: usize,
    pub merged: RuleSet,
}

impl MergeResult {
    /// Whether persisting the merge would leave `current` as it is
    pub fn is_unchanged_from(&self, current: &RuleSet) -> bool {
        &self.merged == current
    }
}
