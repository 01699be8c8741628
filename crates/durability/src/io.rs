//! Index file IO: write, read, metadata, backup and restore
//!
//! The byte-level format belongs to the engine (see the engine codec); this
//! module owns everything around it - path validity, parent-directory
//! creation, the shadow-file write, memory-mapped reads, and the backup
//! suffix convention.
//!
//! Writes go to a temp file in the target directory, are synced, and are
//! then renamed into place, so a crash mid-write never leaves a partial
//! index file behind.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use memmap2::Mmap;
use quay_core::{Error, IoFlags, Result};
use quay_engine::IndexHandle;
use tracing::{debug, info};

/// Default suffix appended to a path by [`backup_index`]
pub const BACKUP_SUFFIX: &str = "bak";

/// File extension used for registry entries
pub const INDEX_EXT: &str = "idx";

/// Transfer buffer size for backup/restore copies
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Serialize an index to a file, creating parent directories as needed.
///
/// The write is atomic: bytes land in a temp file first and are renamed
/// over the destination only after a successful sync.
pub fn write_index(handle: &IndexHandle, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = handle.encode()?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&bytes)?;
        tmp.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    debug!(
        target: "quay::io",
        path = %path.display(),
        bytes = bytes.len(),
        ntotal = handle.ntotal(),
        "index written"
    );
    Ok(())
}

/// Deserialize an index from a file.
///
/// The path must exist; this is checked explicitly before any decoding.
/// `flags.mmap` reads the file through a memory map, and `flags.read_only`
/// yields a handle that rejects mutation.
pub fn read_index(path: impl AsRef<Path>, flags: IoFlags) -> Result<IndexHandle> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::IndexFileMissing(path.to_path_buf()));
    }

    let handle = if flags.mmap {
        let file = File::open(path)?;
        // Safety: the mapping is read in full before the file handle drops,
        // and index files are not mutated in place (writes rename over them)
        let map = unsafe { Mmap::map(&file)? };
        IndexHandle::decode(&map, flags)?
    } else {
        let bytes = fs::read(path)?;
        IndexHandle::decode(&bytes, flags)?
    };

    debug!(
        target: "quay::io",
        path = %path.display(),
        ntotal = handle.ntotal(),
        mmap = flags.mmap,
        read_only = flags.read_only,
        "index read"
    );
    Ok(handle)
}

/// Metadata of a persisted index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFileInfo {
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// Query size and modification time of a persisted index file
pub fn index_file_info(path: impl AsRef<Path>) -> Result<IndexFileInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::IndexFileMissing(path.to_path_buf()));
    }
    let meta = fs::metadata(path)?;
    Ok(IndexFileInfo {
        size: meta.len(),
        modified: meta.modified()?,
    })
}

/// Copy an index file to `<path>.bak`, returning the backup path
pub fn backup_index(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut backup = path.as_os_str().to_owned();
    backup.push(".");
    backup.push(BACKUP_SUFFIX);
    let backup = PathBuf::from(backup);

    copy_file(path, &backup)?;
    info!(
        target: "quay::io",
        from = %path.display(),
        to = %backup.display(),
        "index backed up"
    );
    Ok(backup)
}

/// Copy a backup file over a destination path
pub fn restore_index(backup: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    copy_file(backup.as_ref(), dest.as_ref())?;
    info!(
        target: "quay::io",
        from = %backup.as_ref().display(),
        to = %dest.as_ref().display(),
        "index restored"
    );
    Ok(())
}

/// Byte-for-byte copy through a fixed 64 KiB buffer, with a final sync.
/// Destination directories are created as needed.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::IndexFileMissing(src.to_path_buf()));
    }
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut reader = File::open(src)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n])?;
    }
    writer.sync_all()?;
    Ok(())
}
