//! Index handle: the owned reference to one engine-side index
//!
//! `IndexHandle` is the single logical owner of an engine instance. Release
//! is deterministic - the engine is freed when the handle is dropped at the
//! end of its scope - so there is no separate close call and no reliance on
//! finalization timing.
//!
//! All public operations validate their inputs before touching the engine,
//! so a validation failure never mutates state. Engine-reported failures
//! carry their own operation context via [`quay_core::Error::Engine`] and
//! are propagated unchanged.

use quay_core::{
    validate_k, validate_vectors, Error, Id, IdSelector, IndexConfig, IoFlags, MetricType, Result,
};

use crate::codec;
use crate::flat::FlatEngine;
use crate::traits::{EngineKind, VectorEngine};

/// Owned reference to one engine-side index instance
pub struct IndexHandle {
    engine: Box<dyn VectorEngine>,
    read_only: bool,
}

impl IndexHandle {
    /// Wrap an engine instance in a mutable handle
    pub fn new(engine: Box<dyn VectorEngine>) -> Self {
        IndexHandle {
            engine,
            read_only: false,
        }
    }

    /// Create a flat (exhaustive-search) index
    pub fn flat(dimension: usize, metric: MetricType) -> Result<Self> {
        let config = IndexConfig::new(dimension, metric)?;
        Ok(IndexHandle::new(Box::new(FlatEngine::new(config))))
    }

    /// Flat index with squared-L2 distance
    pub fn flat_l2(dimension: usize) -> Result<Self> {
        IndexHandle::flat(dimension, MetricType::L2)
    }

    /// Flat index with inner-product similarity
    pub fn flat_ip(dimension: usize) -> Result<Self> {
        IndexHandle::flat(dimension, MetricType::InnerProduct)
    }

    /// Dimension of the indexed vectors
    pub fn d(&self) -> usize {
        self.engine.dimension()
    }

    /// Number of indexed vectors
    pub fn ntotal(&self) -> i64 {
        self.engine.ntotal()
    }

    /// Distance metric, fixed at creation
    pub fn metric_type(&self) -> MetricType {
        self.engine.metric()
    }

    /// True if the engine has been trained or does not require training
    pub fn is_trained(&self) -> bool {
        self.engine.is_trained()
    }

    /// True if this handle was opened read-only
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Engine kind behind this handle
    pub fn kind(&self) -> EngineKind {
        self.engine.kind()
    }

    /// Train the engine on a representative sample of vectors
    pub fn train(&mut self, x: &[f32]) -> Result<()> {
        self.check_writable()?;
        validate_vectors(x, self.d())?;
        self.engine.train(x)
    }

    /// Add vectors with engine-assigned sequential IDs
    pub fn add(&mut self, x: &[f32]) -> Result<()> {
        self.check_writable()?;
        validate_vectors(x, self.d())?;
        self.check_trained()?;
        self.engine.add(x)
    }

    /// Add vectors with caller-supplied IDs
    pub fn add_with_ids(&mut self, x: &[f32], ids: &[Id]) -> Result<()> {
        self.check_writable()?;
        let rows = validate_vectors(x, self.d())?;
        self.check_trained()?;
        if ids.len() != rows {
            return Err(Error::IdCountMismatch {
                ids: ids.len(),
                rows,
            });
        }
        self.engine.add_with_ids(x, ids)
    }

    /// Search the index with the query rows in `x`.
    ///
    /// Returns flat `(distances, labels)` arrays of length `n * k`,
    /// best-first per metric.
    pub fn search(&self, x: &[f32], k: usize) -> Result<(Vec<f32>, Vec<Id>)> {
        validate_vectors(x, self.d())?;
        validate_k(k)?;
        self.check_trained()?;
        self.engine.search(x, k)
    }

    /// Remove every vector whose ID the selector matches.
    ///
    /// Returns the number of vectors removed; a selector matching nothing
    /// removes zero and succeeds.
    pub fn remove_ids(&mut self, sel: &IdSelector) -> Result<usize> {
        self.check_writable()?;
        self.engine.remove_ids(sel)
    }

    /// Remove all vectors from the index
    pub fn reset(&mut self) -> Result<()> {
        self.check_writable()?;
        self.engine.reset()
    }

    /// Serialize the index into self-describing container bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode_index(self.engine.as_ref())
    }

    /// Deserialize an index from container bytes.
    ///
    /// The resulting handle is read-only when `flags.read_only` is set.
    pub fn decode(bytes: &[u8], flags: IoFlags) -> Result<Self> {
        Ok(IndexHandle {
            engine: codec::decode_index(bytes)?,
            read_only: flags.read_only,
        })
    }

    pub(crate) fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnlyIndex);
        }
        Ok(())
    }

    pub(crate) fn check_trained(&self) -> Result<()> {
        if !self.engine.is_trained() {
            return Err(Error::NotTrained);
        }
        Ok(())
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("kind", &self.kind().name())
            .field("d", &self.d())
            .field("ntotal", &self.ntotal())
            .field("metric", &self.metric_type().name())
            .field("read_only", &self.read_only)
            .finish()
    }
}
