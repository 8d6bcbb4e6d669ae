//! Report formatting for claude-consolidate
//!
//! Produces the human-readable summary and the JSON report.

use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

use crate::engine::Consolidation;
use crate::rules::{Category, MergeResult};

/// Format a merge summary. Pure: no I/O.
pub fn format_report(result: &MergeResult, dry_run: bool) -> String {
    let mut out = String::new();

    if dry_run {
        out.push_str("Permission consolidation (dry run)\n");
    } else {
        out.push_str("Permission consolidation\n");
    }

    let _ = writeln!(out, "  Files scanned:      {}", result.files_scanned);
    let _ = writeln!(out, "  Files processed:    {}", result.files_processed);
    let _ = writeln!(out, "  Files skipped:      {}", result.files_skipped);

    let _ = writeln!(out, "  Rules added:        {}", result.added.total());
    for category in Category::ALL {
        let count = result.added.get(category);
        if count > 0 {
            let _ = writeln!(out, "    {:<6} +{}", category, count);
        }
    }

    let _ = writeln!(out, "  Subsumed removed:   {}", result.subsumed.len());
    for raw in &result.subsumed {
        let _ = writeln!(out, "    - {}", raw);
    }

    let _ = writeln!(out, "  Conflicts resolved: {}", result.conflicts_resolved);

    let _ = writeln!(
        out,
        "  Merged totals:      allow {}, deny {}, ask {}",
        result.merged.allow.len(),
        result.merged.deny.len(),
        result.merged.ask.len()
    );

    if dry_run {
        out.push_str("\nDry run: no files were modified.\n");
    }

    out
}

/// Machine-readable report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub dry_run: bool,
    pub changed: bool,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<&'a PathBuf>,
    pub sources: Vec<JsonSource<'a>>,
    pub result: &'a MergeResult,
}

#[derive(Debug, Serialize)]
pub struct JsonSource<'a> {
    pub path: &'a PathBuf,
    pub readable: bool,
    pub rules: usize,
}

impl<'a> JsonReport<'a> {
    pub fn from_consolidation(consolidation: &'a Consolidation) -> Self {
        Self {
            dry_run: consolidation.dry_run,
            changed: consolidation.changed,
            written: consolidation.written,
            backup: consolidation.backup.as_ref(),
            sources: consolidation
                .sources
                .iter()
                .map(|s| JsonSource {
                    path: &s.path,
                    readable: s.rules.is_some(),
                    rules: s.rule_count(),
                })
                .collect(),
            result: &consolidation.result,
        }
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
