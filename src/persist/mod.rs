//! Persisting the merged rule set: backup first, then an atomic rewrite

pub mod backup;
pub mod writer;

pub use backup::{backup_path, create_backup, list_backups, prune_backups};
pub use writer::AtomicWriter;
