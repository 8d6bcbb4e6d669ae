//! Error types for claude-consolidate
//!
//! Expected conditions (a malformed local settings file, a missing file) are
//! modelled as values, see [`crate::parser::settings::SettingsDecode`]. The
//! errors here are the operator-visible failures that abort a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes reported by the CLI
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const NO_FILES_FOUND: i32 = 2;
    /// Reserved: conflict resolution is always deterministic today
    pub const UNRESOLVED_CONFLICTS: i32 = 3;
    pub const PERSIST_FAILURE: i32 = 4;
    pub const USAGE: i32 = 64;
}

/// Fatal errors raised by the consolidation pipeline
#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("Root directory does not exist: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Root is not a directory: {}", path.display())]
    RootNotDirectory { path: PathBuf },

    #[error("Permission denied while scanning {}: {source}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to scan {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No settings.local.json files found under {}", root.display())]
    NoFilesFound { root: PathBuf },

    #[error("Failed to read global settings {}: {source}", path.display())]
    GlobalUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Global settings {} is not valid JSON: {source}", path.display())]
    GlobalMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Global settings {} must be a JSON object; \"permissions\" must be an object",
        path.display()
    )]
    GlobalNotObject { path: PathBuf },

    #[error(
        "Global settings {}: \"permissions.{category}\" must be an array of strings",
        path.display()
    )]
    GlobalInvalidCategory { path: PathBuf, category: String },

    #[error("Failed to back up {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConsolidateError {
    /// Map the error onto the CLI exit code contract
    pub fn exit_code(&self) -> i32 {
        match self {
            ConsolidateError::RootNotFound { .. } | ConsolidateError::RootNotDirectory { .. } => {
                exit_code::USAGE
            }
            ConsolidateError::NoFilesFound { .. } => exit_code::NO_FILES_FOUND,
            ConsolidateError::Backup { .. }
            | ConsolidateError::Write { .. }
            | ConsolidateError::Serialize(_) => exit_code::PERSIST_FAILURE,
            ConsolidateError::PermissionDenied { .. }
            | ConsolidateError::Traversal { .. }
            | ConsolidateError::GlobalUnreadable { .. }
            | ConsolidateError::GlobalMalformed { .. }
            | ConsolidateError::GlobalNotObject { .. }
            | ConsolidateError::GlobalInvalidCategory { .. } => exit_code::FAILURE,
        }
    }
}

/// A single rule string that does not follow the `Type(scope)` grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRuleError {
    #[error("rule '{raw}' is not of the form Type(scope)")]
    NotTypeScope { raw: String },

    #[error("rule '{raw}' has an empty type")]
    EmptyType { raw: String },

    #[error("rule '{raw}' has an empty scope")]
    EmptyScope { raw: String },

    #[error("rule '{raw}' has whitespace between the type and '('")]
    DetachedParen { raw: String },

    #[error("rule '{raw}' uses unknown type '{rule_type}'")]
    UnknownType { raw: String, rule_type: String },
}

pub type Result<T, E = ConsolidateError> = std::result::Result<T, E>;
