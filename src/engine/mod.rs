//! Consolidation engine for claude-consolidate
//!
//! Coordinates discovery, parsing, merging and persistence.

pub mod merge;

pub use merge::merge_permissions;

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::discovery::discover;
use crate::error::{ConsolidateError, Result};
use crate::fs::FileSystem;
use crate::parser::settings::{parse_file, SettingsDocument};
use crate::persist::{create_backup, prune_backups, AtomicWriter};
use crate::rules::{MergeResult, RuleSet, SourceFile};

/// Inputs of a single consolidation run
#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    /// Directory to scan for `.claude/settings.local.json`
    pub root: PathBuf,
    /// Global settings file to merge into
    pub global_path: PathBuf,
    /// Compute and report only; never touch the global file
    pub dry_run: bool,
}

/// What a run did
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub result: MergeResult,
    pub sources: Vec<SourceFile>,
    pub dry_run: bool,
    /// The merged rules differ from the global file's current rules
    pub changed: bool,
    /// The global file was rewritten
    pub written: bool,
    pub backup: Option<PathBuf>,
    pub pruned_backups: Vec<PathBuf>,
}

/// The consolidation pipeline over an injected filesystem
pub struct Consolidator<F: FileSystem> {
    fs: F,
    config: Config,
}

impl<F: FileSystem> Consolidator<F> {
    pub fn new(fs: F, config: Config) -> Self {
        Self { fs, config }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find local settings files under `root`
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        discover(&self.fs, root, &self.config.discovery)
    }

    /// Parse every discovered file; unreadable files become `rules: None`
    pub fn load_sources(&self, paths: &[PathBuf]) -> Vec<SourceFile> {
        paths
            .iter()
            .map(|path| {
                let rules = parse_file(&self.fs, path).into_rule_set();
                debug!(
                    path = %path.display(),
                    rules = rules.as_ref().map_or(0, RuleSet::len),
                    "parsed local settings"
                );
                SourceFile::new(path.clone(), rules)
            })
            .collect()
    }

    /// Run the whole pipeline
    pub fn run(&self, options: &ConsolidateOptions) -> Result<Consolidation> {
        let paths = self.discover(&options.root)?;
        if paths.is_empty() {
            return Err(ConsolidateError::NoFilesFound {
                root: options.root.clone(),
            });
        }
        info!(count = paths.len(), root = %options.root.display(), "discovered local settings");

        let sources = self.load_sources(&paths);
        let document = SettingsDocument::load(&self.fs, &options.global_path)?;
        let current = document.rule_set();

        let locals: Vec<RuleSet> = sources
            .iter()
            .map(|s| s.rules.clone().unwrap_or_default())
            .collect();
        let result = merge_permissions(&current, &locals);
        let changed = !result.is_unchanged_from(&current);

        info!(
            added = result.added.total(),
            subsumed = result.subsumed.len(),
            conflicts = result.conflicts_resolved,
            changed,
            "merged permissions"
        );

        let mut consolidation = Consolidation {
            result,
            sources,
            dry_run: options.dry_run,
            changed,
            written: false,
            backup: None,
            pruned_backups: Vec::new(),
        };

        if options.dry_run {
            info!("dry run, leaving global settings untouched");
            return Ok(consolidation);
        }
        if !changed {
            info!("global settings already up to date");
            return Ok(consolidation);
        }

        if self.config.backup.enabled {
            consolidation.backup = create_backup(&self.fs, &options.global_path, Utc::now())?;
        }

        AtomicWriter::new(&self.fs)
            .with_scratch_dir(self.config.scratch_dir())
            .write_rule_set(&options.global_path, &document, &consolidation.result.merged)?;
        consolidation.written = true;
        info!(path = %options.global_path.display(), "wrote global settings");

        if self.config.backup.enabled {
            consolidation.pruned_backups =
                prune_backups(&self.fs, &options.global_path, self.config.backup.keep);
        }

        Ok(consolidation)
    }
}
