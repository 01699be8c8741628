//! Foundational value types: IDs, metrics, IO flags, index configuration
//!
//! These are immutable value objects shared by every layer. The metric set
//! mirrors what exhaustive and inverted-file engines commonly expose; the
//! config is fixed at index creation and never changes afterward.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Vector identifier. Engines assign sequential IDs on plain `add`;
/// callers may supply their own via `add_with_ids`.
pub type Id = i64;

/// Label used to pad search results when fewer than `k` neighbors exist.
pub const MISSING_LABEL: Id = -1;

/// Distance metric of an index, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricType {
    /// Squared L2 (Euclidean) distance. Lower = closer.
    #[default]
    L2,

    /// Inner product. Higher = closer. Equivalent to cosine similarity
    /// for normalized vectors; see [`crate::vectors::normalize_vectors`].
    InnerProduct,

    /// L1 (Manhattan) distance. Lower = closer.
    L1,

    /// L-infinity (Chebyshev) distance. Lower = closer.
    Linf,
}

impl MetricType {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            MetricType::L2 => "l2",
            MetricType::InnerProduct => "inner_product",
            MetricType::L1 => "l1",
            MetricType::Linf => "linf",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Some(MetricType::L2),
            "inner_product" | "ip" | "dot" => Some(MetricType::InnerProduct),
            "l1" | "manhattan" => Some(MetricType::L1),
            "linf" | "chebyshev" => Some(MetricType::Linf),
            _ => None,
        }
    }

    /// Serialization value for the persisted container header
    pub fn to_byte(&self) -> u8 {
        match self {
            MetricType::L2 => 0,
            MetricType::InnerProduct => 1,
            MetricType::L1 => 2,
            MetricType::Linf => 3,
        }
    }

    /// Deserialization from the persisted container header
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(MetricType::L2),
            1 => Some(MetricType::InnerProduct),
            2 => Some(MetricType::L1),
            3 => Some(MetricType::Linf),
            _ => None,
        }
    }

    /// Whether a smaller distance means a better match.
    /// Inner product is the only metric where higher is better.
    pub fn lower_is_better(&self) -> bool {
        !matches!(self, MetricType::InnerProduct)
    }

    /// Padding distance for result slots beyond the available neighbors.
    /// Chosen so padded entries always sort last.
    pub fn worst_distance(&self) -> f32 {
        if self.lower_is_better() {
            f32::INFINITY
        } else {
            f32::NEG_INFINITY
        }
    }
}

/// Flags controlling how a persisted index is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoFlags {
    /// Read the file through a memory map instead of a buffered read
    pub mmap: bool,
    /// Open the index read-only; mutating calls on the handle will fail
    pub read_only: bool,
}

impl IoFlags {
    /// Default flags: buffered read, mutable handle
    pub const NONE: IoFlags = IoFlags {
        mmap: false,
        read_only: false,
    };

    /// Enable memory-mapped reading
    pub fn mmap(mut self) -> Self {
        self.mmap = true;
        self
    }

    /// Open read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Index configuration - immutable after creation
///
/// The dimension is fixed per index and never changes; every vector buffer
/// handed to the index must have a length that is an exact multiple of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Embedding dimension (e.g. 384, 768, 1536). Must be > 0.
    pub dimension: usize,

    /// Distance metric, fixed at creation
    pub metric: MetricType,
}

impl IndexConfig {
    /// Create a new config with validation
    ///
    /// Returns an error if dimension is 0.
    pub fn new(dimension: usize, metric: MetricType) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidDimension(dimension));
        }
        Ok(IndexConfig { dimension, metric })
    }

    /// Config for MiniLM embeddings (384 dims)
    pub fn for_minilm() -> Self {
        IndexConfig {
            dimension: 384,
            metric: MetricType::InnerProduct,
        }
    }

    /// Config for sentence-transformers/all-mpnet-base-v2 (768 dims)
    pub fn for_mpnet() -> Self {
        IndexConfig {
            dimension: 768,
            metric: MetricType::InnerProduct,
        }
    }

    /// Config for OpenAI text-embedding-ada-002 (1536 dims)
    pub fn for_openai_ada() -> Self {
        IndexConfig {
            dimension: 1536,
            metric: MetricType::InnerProduct,
        }
    }
}
