//! JSONL audit logging for claude-consolidate
//!
//! Appends one entry per run so changes to the global settings file can be
//! traced back to the run that made them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::{ConsolidateOptions, Consolidation};
use crate::error::ConsolidateError;
use crate::rules::CategoryCounts;

/// Outcome recorded for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    /// The global file was rewritten
    Applied,
    /// Nothing new to merge
    Unchanged,
    DryRun,
    Failed,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub outcome: RunOutcome,

    /// Discovery root
    pub root: PathBuf,

    /// Global settings file
    pub global_path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_scanned: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<CategoryCounts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsumed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    /// Entry for a run that completed
    pub fn completed(options: &ConsolidateOptions, consolidation: &Consolidation) -> Self {
        let outcome = if consolidation.dry_run {
            RunOutcome::DryRun
        } else if consolidation.written {
            RunOutcome::Applied
        } else {
            RunOutcome::Unchanged
        };
        let result = &consolidation.result;

        Self {
            timestamp: Utc::now(),
            outcome,
            root: options.root.clone(),
            global_path: options.global_path.clone(),
            files_scanned: Some(result.files_scanned),
            added: Some(result.added),
            subsumed: Some(result.subsumed.len()),
            conflicts: Some(result.conflicts_resolved),
            backup: consolidation.backup.clone(),
            error: None,
        }
    }

    /// Entry for a run that aborted
    pub fn failed(options: &ConsolidateOptions, error: &ConsolidateError) -> Self {
        Self {
            timestamp: Utc::now(),
            outcome: RunOutcome::Failed,
            root: options.root.clone(),
            global_path: options.global_path.clone(),
            files_scanned: None,
            added: None,
            subsumed: None,
            conflicts: None,
            backup: None,
            error: Some(error.to_string()),
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Open `path` for appending. Logging is silently disabled when the
    /// file cannot be opened.
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(BufWriter::new)
        });

        Self { writer }
    }

    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log the result of a run
    pub fn log_run(
        &mut self,
        options: &ConsolidateOptions,
        outcome: &Result<Consolidation, ConsolidateError>,
    ) -> Result<(), std::io::Error> {
        let entry = match outcome {
            Ok(consolidation) => AuditEntry::completed(options, consolidation),
            Err(error) => AuditEntry::failed(options, error),
        };
        self.log(&entry)
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
