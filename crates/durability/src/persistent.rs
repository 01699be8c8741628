//! Write-through persistent index
//!
//! `PersistentIndex` keeps an in-memory index and its on-disk serialization
//! synchronized: every mutating call re-serializes the whole handle to the
//! same path before returning. One exclusive lock per instance serializes
//! the full mutate-then-persist sequence; read-side calls take the same
//! lock, so concurrent reads during a write are safe by construction
//! (stricter than a bare engine handle, and deliberately so).
//!
//! The contract is best-effort, not atomic: when the in-memory mutation
//! succeeds but the write-through fails, the file is stale relative to
//! memory and the call returns [`quay_core::Error::PersistenceDiverged`].
//! This layer never retries - the caller decides whether to call
//! [`PersistentIndex::save`] again, reload from disk, or discard the
//! instance.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use quay_core::{Error, Id, IdSelector, IoFlags, MetricType, Result};
use quay_engine::IndexHandle;
use tracing::{info, warn};

use crate::io;

/// Persistence seam for the write-through step.
///
/// The default implementation writes through the index file IO; tests
/// substitute failing sinks to exercise the divergence path.
pub trait WriteThrough: Send + Sync {
    /// Serialize the handle to the given path
    fn persist(&self, handle: &IndexHandle, path: &Path) -> Result<()>;
}

/// Default sink: atomic file write via [`io::write_index`]
#[derive(Debug, Default)]
pub struct FileWriteThrough;

impl WriteThrough for FileWriteThrough {
    fn persist(&self, handle: &IndexHandle, path: &Path) -> Result<()> {
        io::write_index(handle, path)
    }
}

/// A concurrency-safe index wrapper that persists every mutation to a file
pub struct PersistentIndex {
    inner: Mutex<IndexHandle>,
    path: PathBuf,
    sink: Box<dyn WriteThrough>,
}

impl PersistentIndex {
    /// Open or create a persistent index at `path`.
    ///
    /// If the file exists it is deserialized; otherwise `factory` is
    /// invoked exactly once to build a fresh handle. No file is written
    /// until the first successful mutating call (or [`PersistentIndex::save`]).
    pub fn open<F>(path: impl Into<PathBuf>, factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<IndexHandle>,
    {
        Self::open_with(path, factory, Box::new(FileWriteThrough))
    }

    /// Like [`PersistentIndex::open`], with an explicit write-through sink
    pub fn open_with<F>(
        path: impl Into<PathBuf>,
        factory: F,
        sink: Box<dyn WriteThrough>,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<IndexHandle>,
    {
        let path = path.into();
        let handle = if path.exists() {
            io::read_index(&path, IoFlags::NONE)?
        } else {
            factory()?
        };

        info!(
            target: "quay::persistent",
            path = %path.display(),
            ntotal = handle.ntotal(),
            dimension = handle.d(),
            "persistent index opened"
        );
        Ok(PersistentIndex {
            inner: Mutex::new(handle),
            path,
            sink,
        })
    }

    /// Path this index persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add vectors and persist the change
    pub fn add(&self, x: &[f32]) -> Result<()> {
        let mut handle = self.inner.lock();
        handle.add(x)?;
        self.persist_locked(&handle, "add")
    }

    /// Add vectors with caller-supplied IDs and persist the change
    pub fn add_with_ids(&self, x: &[f32], ids: &[Id]) -> Result<()> {
        let mut handle = self.inner.lock();
        handle.add_with_ids(x, ids)?;
        self.persist_locked(&handle, "add_with_ids")
    }

    /// Add vectors in bounded chunks and persist once, after all chunks.
    ///
    /// A mid-batch engine failure surfaces as a plain batch error with the
    /// in-memory index partially advanced and the file untouched; the
    /// divergence between them is the same no-rollback contract as
    /// [`quay_engine::IndexHandle::add_batch`], extended to the file.
    pub fn add_batch(&self, x: &[f32], batch_size: usize) -> Result<()> {
        let mut handle = self.inner.lock();
        handle.add_batch(x, batch_size)?;
        self.persist_locked(&handle, "add_batch")
    }

    /// Remove vectors matched by the selector and persist the change.
    ///
    /// Returns the number of vectors removed. On a persistence failure the
    /// removal has already happened in memory and the error is flagged as
    /// a divergence.
    pub fn remove_ids(&self, sel: &IdSelector) -> Result<usize> {
        let mut handle = self.inner.lock();
        let removed = handle.remove_ids(sel)?;
        self.persist_locked(&handle, "remove_ids")?;
        Ok(removed)
    }

    /// Re-serialize the current in-memory state, e.g. to retry after a
    /// divergence error
    pub fn save(&self) -> Result<()> {
        let handle = self.inner.lock();
        self.sink.persist(&handle, &self.path)
    }

    /// Dimension of the indexed vectors
    pub fn d(&self) -> usize {
        self.inner.lock().d()
    }

    /// Number of indexed vectors
    pub fn ntotal(&self) -> i64 {
        self.inner.lock().ntotal()
    }

    /// Distance metric, fixed at creation
    pub fn metric_type(&self) -> MetricType {
        self.inner.lock().metric_type()
    }

    /// True if the index has been trained or does not require training
    pub fn is_trained(&self) -> bool {
        self.inner.lock().is_trained()
    }

    /// Search the index; takes the instance lock for the duration
    pub fn search(&self, x: &[f32], k: usize) -> Result<(Vec<f32>, Vec<Id>)> {
        self.inner.lock().search(x, k)
    }

    /// Batched search; takes the instance lock for the duration
    #[allow(clippy::type_complexity)]
    pub fn search_batch(
        &self,
        queries: &[f32],
        k: usize,
        batch_size: usize,
    ) -> Result<(Vec<Vec<f32>>, Vec<Vec<Id>>)> {
        self.inner.lock().search_batch(queries, k, batch_size)
    }

    fn persist_locked(&self, handle: &IndexHandle, op: &'static str) -> Result<()> {
        self.sink.persist(handle, &self.path).map_err(|e| {
            warn!(
                target: "quay::persistent",
                path = %self.path.display(),
                op,
                error = %e,
                "mutation persisted in memory but write-through failed"
            );
            Error::PersistenceDiverged {
                op,
                source: Box::new(e),
            }
        })
    }
}

impl std::fmt::Debug for PersistentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentIndex")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Sink that fails every persist call
    struct FailingSink;

    impl WriteThrough for FailingSink {
        fn persist(&self, _handle: &IndexHandle, _path: &Path) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected write failure",
            )))
        }
    }

    /// Sink that fails the first `failures_left` persist calls, then
    /// behaves like the real file sink
    struct FlakySink {
        failures_left: AtomicUsize,
    }

    impl WriteThrough for FlakySink {
        fn persist(&self, handle: &IndexHandle, path: &Path) -> Result<()> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "transient write failure",
                )));
            }
            FileWriteThrough.persist(handle, path)
        }
    }

    fn flat_factory() -> Result<IndexHandle> {
        IndexHandle::flat_l2(2)
    }

    #[test]
    fn test_open_invokes_factory_exactly_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.idx");
        let calls = AtomicUsize::new(0);

        let idx = PersistentIndex::open(&path, || {
            calls.fetch_add(1, Ordering::SeqCst);
            flat_factory()
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(idx.ntotal(), 0);
        // No file until the first mutation
        assert!(!path.exists());
    }

    #[test]
    fn test_first_mutation_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wt.idx");

        let idx = PersistentIndex::open(&path, flat_factory).unwrap();
        idx.add(&[1.0, 2.0]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_mutation_failure_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean-fail.idx");

        let idx = PersistentIndex::open(&path, flat_factory).unwrap();
        // Misaligned buffer: fails validation, nothing persisted
        assert!(idx.add(&[1.0, 2.0, 3.0]).is_err());
        assert!(!path.exists());
        assert_eq!(idx.ntotal(), 0);
    }

    #[test]
    fn test_divergence_flagged_and_memory_ahead() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diverge.idx");

        let idx =
            PersistentIndex::open_with(&path, flat_factory, Box::new(FailingSink)).unwrap();
        let err = idx.add_with_ids(&[1.0, 2.0], &[7]).unwrap_err();

        assert!(err.is_divergence());
        match err {
            Error::PersistenceDiverged { op, .. } => assert_eq!(op, "add_with_ids"),
            other => panic!("expected divergence, got {:?}", other),
        }
        // Memory already reflects the add; disk never saw it
        assert_eq!(idx.ntotal(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_ids_persists_and_reports_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("remove.idx");

        let idx = PersistentIndex::open(&path, flat_factory).unwrap();
        idx.add(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]).unwrap();

        let removed = idx.remove_ids(&IdSelector::batch(&[1]).unwrap()).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(idx.ntotal(), 2);

        let reopened = io::read_index(&path, IoFlags::NONE).unwrap();
        assert_eq!(reopened.ntotal(), 2);
    }

    #[test]
    fn test_remove_ids_no_match_is_zero_not_error() {
        let dir = TempDir::new().unwrap();
        let idx =
            PersistentIndex::open(dir.path().join("nomatch.idx"), flat_factory).unwrap();
        idx.add(&[0.0, 0.0]).unwrap();

        let removed = idx
            .remove_ids(&IdSelector::range(100, 200).unwrap())
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_save_retries_after_divergence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("retry.idx");

        let idx = PersistentIndex::open_with(
            &path,
            flat_factory,
            Box::new(FlakySink {
                failures_left: AtomicUsize::new(1),
            }),
        )
        .unwrap();

        let err = idx.add(&[3.0, 4.0]).unwrap_err();
        assert!(err.is_divergence());
        assert!(!path.exists());

        // The caller-driven retry: explicit save re-persists memory
        idx.save().unwrap();
        let reopened = io::read_index(&path, IoFlags::NONE).unwrap();
        assert_eq!(reopened.ntotal(), 1);
    }
}
