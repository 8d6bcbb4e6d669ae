//! Atomic write-then-rename of the global settings file

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ConsolidateError, Result};
use crate::fs::FileSystem;
use crate::parser::settings::SettingsDocument;
use crate::rules::RuleSet;

/// Writes settings so the target is always either the old or the new
/// content, never a partial file
pub struct AtomicWriter<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    scratch_dir: Option<PathBuf>,
}

impl<'a, F: FileSystem + ?Sized> AtomicWriter<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        Self {
            fs,
            scratch_dir: None,
        }
    }

    /// Stage temporary files in `dir` instead of the target's directory.
    /// A scratch directory on another device makes the rename fail.
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Replace the permissions of `document` with `rules` and write it
    pub fn write_rule_set(
        &self,
        target: &Path,
        document: &SettingsDocument,
        rules: &RuleSet,
    ) -> Result<()> {
        self.write_settings(target, &document.with_rule_set(rules))
    }

    /// Write `document` in canonical form
    pub fn write_settings(&self, target: &Path, document: &SettingsDocument) -> Result<()> {
        let content = document.to_canonical_string()?;
        self.write_bytes(target, content.as_bytes())
    }

    pub fn write_bytes(&self, target: &Path, contents: &[u8]) -> Result<()> {
        let write_error = |source: io::Error| ConsolidateError::Write {
            path: target.to_path_buf(),
            source,
        };

        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !self.fs.exists(&parent) {
            self.fs.create_dir_all(&parent).map_err(write_error)?;
        }

        let scratch = self.scratch_dir.clone().unwrap_or(parent);
        if !self.fs.exists(&scratch) {
            self.fs.create_dir_all(&scratch).map_err(write_error)?;
        }

        let temp = scratch.join(temp_name(target));
        debug!(temp = %temp.display(), target = %target.display(), "staging settings");

        if let Err(source) = self.fs.write(&temp, contents) {
            self.discard(&temp);
            return Err(write_error(source));
        }

        if let Err(source) = self.fs.rename(&temp, target) {
            self.discard(&temp);
            return Err(write_error(source));
        }

        Ok(())
    }

    fn discard(&self, temp: &Path) {
        match self.fs.remove_file(temp) {
            Ok(()) => debug!(temp = %temp.display(), "removed temporary file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(temp = %temp.display(), error = %e, "failed to remove temporary file"),
        }
    }
}

fn temp_name(target: &Path) -> String {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings.json".to_string());
    format!(".{}.{}.tmp", name, Uuid::new_v4().simple())
}
