//! Vector engine capability contract
//!
//! Defines the interface this layer consumes from a similarity-search
//! engine. The engine supplies the actual nearest-neighbor algorithms and
//! its own byte-level serialization; everything above it (validation,
//! batching, locking, durability) lives in this repository.
//!
//! IMPORTANT: This trait must work for both exhaustive and approximate
//! engines. Do not add methods that assume flat storage semantics.

use quay_core::{Id, IdSelector, MetricType, Result};

/// Interface to one engine-side index instance
///
/// Implementations are not assumed to be safe for concurrent use; callers
/// that share an engine across threads must serialize access themselves
/// (the persistent wrapper does exactly that).
///
/// # Contract
///
/// - `dimension` is fixed at creation and never changes
/// - `is_trained` is monotonic false -> true for engines that require
///   training; engines that do not, report true from the start
/// - `search` returns flat `(distances, labels)` arrays of length `n * k`,
///   best-first per metric; slots beyond the available neighbors are padded
///   with [`quay_core::MISSING_LABEL`] and [`MetricType::worst_distance`]
/// - `remove_ids` evaluates the selector as a predicate over existing IDs
///   and reports how many vectors it dropped; matching nothing is success
pub trait VectorEngine: Send {
    /// Engine kind tag, used by the persisted container header
    fn kind(&self) -> EngineKind;

    /// Dimension of the indexed vectors
    fn dimension(&self) -> usize;

    /// Distance metric, fixed at creation
    fn metric(&self) -> MetricType;

    /// Number of indexed vectors
    fn ntotal(&self) -> i64;

    /// True if the engine has been trained or does not require training
    fn is_trained(&self) -> bool;

    /// Train on a representative sample. Engines without a training phase
    /// treat this as a validated no-op.
    fn train(&mut self, x: &[f32]) -> Result<()>;

    /// Add vectors with engine-assigned sequential IDs
    fn add(&mut self, x: &[f32]) -> Result<()>;

    /// Add vectors with caller-supplied IDs
    fn add_with_ids(&mut self, x: &[f32], ids: &[Id]) -> Result<()>;

    /// k-nearest-neighbor search over `n` query rows.
    ///
    /// Returns `(distances, labels)`, each of length `n * k`.
    fn search(&self, x: &[f32], k: usize) -> Result<(Vec<f32>, Vec<Id>)>;

    /// Remove every vector whose ID the selector matches.
    ///
    /// Returns the number of vectors removed.
    fn remove_ids(&mut self, sel: &IdSelector) -> Result<usize>;

    /// Remove all vectors, returning the engine to its freshly-created state
    fn reset(&mut self) -> Result<()>;

    /// Serialize engine state to an opaque payload.
    ///
    /// The payload layout belongs to the engine; the container header that
    /// identifies it is this layer's concern (see the codec module).
    fn encode(&self) -> Result<Vec<u8>>;
}

/// Tag identifying a concrete engine implementation in persisted files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Exhaustive search over uncompressed vectors
    Flat,
}

impl EngineKind {
    /// Serialization value for the container header
    pub fn to_byte(&self) -> u8 {
        match self {
            EngineKind::Flat => 0,
        }
    }

    /// Deserialization from the container header
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(EngineKind::Flat),
            _ => None,
        }
    }

    /// Human-readable name for display and logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Flat => "flat",
        }
    }
}
