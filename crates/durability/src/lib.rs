//! Durability layer: index file IO, write-through persistence, registries
//!
//! This crate keeps engine-side indexes safe on disk:
//! - `io`: path handling, shadow-file writes, memory-mapped reads,
//!   backup/restore, file metadata
//! - `persistent`: the write-through [`PersistentIndex`] wrapper with its
//!   one-exclusive-lock concurrency contract
//! - `manager`: the named [`BatchIndexManager`] registry with bulk
//!   save/load over a directory

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod io;
pub mod manager;
pub mod persistent;

pub use io::{
    backup_index, index_file_info, read_index, restore_index, write_index, IndexFileInfo,
    BACKUP_SUFFIX, INDEX_EXT,
};
pub use manager::BatchIndexManager;
pub use persistent::{FileWriteThrough, PersistentIndex, WriteThrough};
