//! Engine contract, reference engine, and batch orchestration
//!
//! This crate defines the capability contract this layer consumes from a
//! vector-similarity engine ([`VectorEngine`]), a flat exhaustive-search
//! reference implementation, the self-describing container format indexes
//! persist to, and the [`IndexHandle`] that owns one engine instance and
//! orchestrates validated and batched operations against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod codec;
pub mod flat;
pub mod handle;
pub mod traits;

pub use batch::{DEFAULT_ADD_BATCH_SIZE, DEFAULT_SEARCH_BATCH_SIZE};
pub use codec::{decode_index, encode_index, FORMAT_VERSION, MAGIC};
pub use flat::FlatEngine;
pub use handle::IndexHandle;
pub use traits::{EngineKind, VectorEngine};
