//! Filesystem capability used by discovery, parsing and persistence
//!
//! Every component that touches the disk takes a `&dyn FileSystem` (or a
//! generic `F: FileSystem`) instead of calling `std::fs` directly, so
//! failure paths can be exercised with [`MemoryFileSystem`].

pub mod memory;

pub use memory::{FsOp, MemoryFileSystem};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// What a path points at, after following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Other,
}

/// A single directory listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Kind of the entry at `path`, following symlinks. Missing paths are
    /// reported as `ErrorKind::NotFound`.
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    fn exists(&self, path: &Path) -> bool {
        self.kind(path).is_ok()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Entries of a directory, in no particular order
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Create or truncate `path` and write `contents`
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = fs::metadata(path)?;
        Ok(if meta.is_dir() {
            EntryKind::Dir
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            // Dangling symlinks resolve to nothing
            let kind = match self.kind(&path) {
                Ok(kind) => kind,
                Err(e) if e.kind() == io::ErrorKind::NotFound => EntryKind::Other,
                Err(e) => return Err(e),
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind,
            });
        }
        Ok(entries)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}
