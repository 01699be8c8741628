//! Quay - durable orchestration for vector similarity search
//!
//! Quay wraps an in-memory vector index with validation, batch
//! orchestration, and write-through persistence. Indexes are flat
//! (exhaustive) and deterministic: equal scores break ties by ascending
//! ID, and missing result slots are padded with [`MISSING_LABEL`].
//!
//! # Quick Start
//!
//! ```ignore
//! use quay::{IndexHandle, MetricType, PersistentIndex};
//!
//! // An in-memory flat index over 384-dimensional embeddings
//! let mut index = IndexHandle::flat(384, MetricType::L2)?;
//! index.add(&embeddings)?;
//! let (distances, labels) = index.search(&query, 10)?;
//!
//! // The same index, persisted to disk on every mutation
//! let durable = PersistentIndex::open("vectors.idx", || {
//!     IndexHandle::flat(384, MetricType::L2)
//! })?;
//! durable.add(&embeddings)?;
//! ```
//!
//! # Architecture
//!
//! The crate is split into three layers. `quay-core` holds the shared
//! vocabulary: errors, metrics, ID selectors, and vector validation.
//! `quay-engine` holds the flat engine, the serialization codec, and the
//! validated [`IndexHandle`] with its batch operations. `quay-durability`
//! adds file I/O, the write-through [`PersistentIndex`], and the
//! [`BatchIndexManager`] for saving and loading whole sets of indexes.

// Re-export the public API from the member crates
pub use quay_core::*;
pub use quay_durability::*;
pub use quay_engine::*;
