//! Discovery of per-project `settings.local.json` files
//!
//! Depth-first walk from a root directory. A `.claude` directory is a leaf:
//! its `settings.local.json` is recorded and nothing below it is visited.
//! Directories are tracked by canonical path, so symlink cycles end the walk
//! instead of looping.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::DiscoveryConfig;
use crate::error::{ConsolidateError, Result};
use crate::fs::{EntryKind, FileSystem};

/// Per-project configuration directory
pub const MARKER_DIR: &str = ".claude";

/// Local settings file inside [`MARKER_DIR`]
pub const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

/// Find every local settings file under `root`, in depth-first sorted order
pub fn discover<F: FileSystem + ?Sized>(
    fs: &F,
    root: &Path,
    options: &DiscoveryConfig,
) -> Result<Vec<PathBuf>> {
    match fs.kind(root) {
        Ok(EntryKind::Dir) => {}
        Ok(_) => {
            return Err(ConsolidateError::RootNotDirectory {
                path: root.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConsolidateError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
        Err(e) => return Err(scan_error(root, e)),
    }

    let mut walker = Walker {
        fs,
        options,
        visited: HashSet::new(),
        found: Vec::new(),
    };
    walker.visit(root, 0)?;

    debug!(root = %root.display(), count = walker.found.len(), "discovery finished");
    Ok(walker.found)
}

struct Walker<'a, F: ?Sized> {
    fs: &'a F,
    options: &'a DiscoveryConfig,
    visited: HashSet<PathBuf>,
    found: Vec<PathBuf>,
}

impl<F: FileSystem + ?Sized> Walker<'_, F> {
    fn visit(&mut self, dir: &Path, depth: usize) -> Result<()> {
        let canonical = match self.fs.canonicalize(dir) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %dir.display(), "directory vanished during scan");
                return Ok(());
            }
            Err(e) => return Err(scan_error(dir, e)),
        };

        if !self.visited.insert(canonical) {
            trace!(path = %dir.display(), "already visited, skipping");
            return Ok(());
        }

        if is_marker_dir(dir) {
            let candidate = dir.join(LOCAL_SETTINGS_FILE);
            match self.fs.kind(&candidate) {
                Ok(EntryKind::File) => {
                    debug!(path = %candidate.display(), "found local settings");
                    self.found.push(candidate);
                }
                Ok(_) => trace!(path = %candidate.display(), "not a regular file, skipping"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(scan_error(&candidate, e)),
            }
            return Ok(());
        }

        let mut entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(scan_error(dir, e)),
        };
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in entries {
            if entry.kind != EntryKind::Dir {
                continue;
            }
            if entry.name != MARKER_DIR && self.options.skips(&entry.name) {
                trace!(path = %entry.path.display(), "skipping directory");
                continue;
            }
            if depth + 1 > self.options.max_depth {
                debug!(
                    path = %entry.path.display(),
                    max_depth = self.options.max_depth,
                    "depth limit reached"
                );
                continue;
            }
            self.visit(&entry.path, depth + 1)?;
        }

        Ok(())
    }
}

fn is_marker_dir(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| name == MARKER_DIR)
}

fn scan_error(path: &Path, source: io::Error) -> ConsolidateError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        ConsolidateError::PermissionDenied {
            path: path.to_path_buf(),
            source,
        }
    } else {
        ConsolidateError::Traversal {
            path: path.to_path_buf(),
            source,
        }
    }
}
