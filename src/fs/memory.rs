//! In-memory filesystem with fault injection
//!
//! Paths are treated literally: callers should use absolute, already
//! normalized paths. Symlinks are not modelled.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use super::{DirEntry, EntryKind, FileSystem};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    /// `kind`, and everything built on it
    Stat,
    Read,
    ReadDir,
    Canonicalize,
    Write,
    Rename,
    Copy,
    Remove,
    CreateDir,
}

#[derive(Debug, Clone)]
struct Fault {
    op: FsOp,
    /// `None` matches every path
    path: Option<PathBuf>,
    kind: io::ErrorKind,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    faults: Vec<Fault>,
}

impl MemoryState {
    fn fault(&self, op: FsOp, path: &Path) -> io::Result<()> {
        let hit = self
            .faults
            .iter()
            .find(|f| f.op == op && f.path.as_deref().map_or(true, |p| p == path));
        match hit {
            Some(fault) => Err(io::Error::new(
                fault.kind,
                format!("injected {:?} failure on {}", op, path.display()),
            )),
            None => Ok(()),
        }
    }

    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.dirs.contains(parent),
            _ => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: RefCell<MemoryState>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = path.as_ref();
        let mut state = self.state.borrow_mut();
        if let Some(parent) = path.parent() {
            state.add_dir_all(parent);
        }
        state
            .files
            .insert(path.to_path_buf(), contents.as_ref().to_vec());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state.borrow_mut().add_dir_all(path.as_ref());
    }

    /// Make every `op` fail with `kind`
    pub fn fail(&self, op: FsOp, kind: io::ErrorKind) {
        self.state.borrow_mut().faults.push(Fault {
            op,
            path: None,
            kind,
        });
    }

    /// Make `op` fail with `kind` on exactly `path`
    pub fn fail_at(&self, op: FsOp, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.state.borrow_mut().faults.push(Fault {
            op,
            path: Some(path.as_ref().to_path_buf()),
            kind,
        });
    }

    pub fn clear_faults(&self) {
        self.state.borrow_mut().faults.clear();
    }

    /// Raw contents of a file, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.borrow().files.get(path.as_ref()).cloned()
    }

    /// Every file path, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.state.borrow().files.keys().cloned().collect()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.borrow();
        state.fault(FsOp::Read, path)?;
        let bytes = state.files.get(path).ok_or_else(|| not_found(path))?;
        String::from_utf8(bytes.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let state = self.state.borrow();
        state.fault(FsOp::Stat, path)?;
        if state.dirs.contains(path) {
            Ok(EntryKind::Dir)
        } else if state.files.contains_key(path) {
            Ok(EntryKind::File)
        } else {
            Err(not_found(path))
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.state.borrow().fault(FsOp::Canonicalize, path)?;
        self.kind(path).map(|_| path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.borrow();
        state.fault(FsOp::ReadDir, path)?;
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }

        let children = state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .map(|d| (d, EntryKind::Dir))
            .chain(
                state
                    .files
                    .keys()
                    .filter(|f| f.parent() == Some(path))
                    .map(|f| (f, EntryKind::File)),
            );

        Ok(children
            .map(|(child, kind)| DirEntry {
                name: child
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: child.clone(),
                kind,
            })
            .collect())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.parent_exists(path) {
            return Err(not_found(path));
        }
        if let Err(e) = state.fault(FsOp::Write, path) {
            // Simulate a write that dies halfway through
            let partial = contents[..contents.len() / 2].to_vec();
            state.files.insert(path.to_path_buf(), partial);
            return Err(e);
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.fault(FsOp::Rename, to)?;
        if !state.parent_exists(to) {
            return Err(not_found(to));
        }
        let bytes = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.fault(FsOp::Copy, from)?;
        state.fault(FsOp::Read, from)?;
        let bytes = state.files.get(from).cloned().ok_or_else(|| not_found(from))?;
        if !state.parent_exists(to) {
            return Err(not_found(to));
        }
        state.fault(FsOp::Write, to)?;
        state.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.fault(FsOp::Remove, path)?;
        state.files.remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.fault(FsOp::CreateDir, path)?;
        state.add_dir_all(path);
        Ok(())
    }
}
