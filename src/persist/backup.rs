//! Timestamped backups of the global settings file

use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ConsolidateError, Result};
use crate::fs::FileSystem;

/// Sortable timestamp embedded in backup names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

const BACKUP_MARKER: &str = ".backup-";

/// Sibling path a backup of `target` taken at `now` would use
pub fn backup_path(target: &Path, now: DateTime<Utc>) -> PathBuf {
    let name = file_name(target);
    target.with_file_name(format!(
        "{}{}{}",
        name,
        BACKUP_MARKER,
        now.format(BACKUP_TIMESTAMP_FORMAT)
    ))
}

/// Copy `target` aside before it is rewritten.
///
/// Returns `Ok(None)` when there is nothing to back up yet. Any other
/// failure to read or copy the file is an error: the caller must not go on
/// to overwrite a file it could not save.
pub fn create_backup<F: FileSystem + ?Sized>(
    fs: &F,
    target: &Path,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if let Err(e) = fs.kind(target) {
        if e.kind() == io::ErrorKind::NotFound {
            debug!(path = %target.display(), "no existing file, skipping backup");
            return Ok(None);
        }
        return Err(ConsolidateError::Backup {
            path: target.to_path_buf(),
            source: e,
        });
    }

    let base = backup_path(target, now);
    let mut candidate = base.clone();
    let mut n = 1;
    while fs.exists(&candidate) {
        candidate = PathBuf::from(format!("{}-{}", base.display(), n));
        n += 1;
    }

    fs.copy(target, &candidate)
        .map_err(|source| ConsolidateError::Backup {
            path: target.to_path_buf(),
            source,
        })?;

    info!(backup = %candidate.display(), "backed up global settings");
    Ok(Some(candidate))
}

/// Existing backups of `target`, oldest first
pub fn list_backups<F: FileSystem + ?Sized>(fs: &F, target: &Path) -> io::Result<Vec<PathBuf>> {
    let prefix = format!("{}{}", file_name(target), BACKUP_MARKER);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut backups: Vec<((String, u64), PathBuf)> = fs
        .read_dir(dir)?
        .into_iter()
        .filter_map(|e| {
            let key = backup_order(e.name.strip_prefix(&prefix)?);
            Some((key, e.path))
        })
        .collect();
    backups.sort();
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Sort key for the part of a backup name after the marker: the timestamp,
/// then the numeric collision suffix (`-2` before `-10`)
fn backup_order(stamp: &str) -> (String, u64) {
    // The timestamp itself contains one '-'; a second one starts the suffix
    match stamp.rsplit_once('-') {
        Some((base, n)) if base.contains('-') => match n.parse() {
            Ok(n) => (base.to_string(), n),
            Err(_) => (stamp.to_string(), 0),
        },
        _ => (stamp.to_string(), 0),
    }
}

/// Delete all but the `keep` newest backups of `target`. `keep == 0` keeps
/// everything. Failures are logged, never fatal.
pub fn prune_backups<F: FileSystem + ?Sized>(fs: &F, target: &Path, keep: usize) -> Vec<PathBuf> {
    if keep == 0 {
        return Vec::new();
    }

    let backups = match list_backups(fs, target) {
        Ok(backups) => backups,
        Err(e) => {
            warn!(path = %target.display(), error = %e, "cannot list backups for pruning");
            return Vec::new();
        }
    };

    let excess = backups.len().saturating_sub(keep);
    let mut removed = Vec::new();
    for path in backups.into_iter().take(excess) {
        match fs.remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "pruned old backup");
                removed.push(path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to prune backup"),
        }
    }
    removed
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings.json".to_string())
}
