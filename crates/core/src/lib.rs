//! Core types for quay
//!
//! This crate defines the foundational types used throughout the system:
//! - Id / MetricType / IoFlags / IndexConfig: value types fixed at index creation
//! - Error: error type hierarchy, including the persistence-divergence outcome
//! - vector buffer validation: the `len % d == 0` discipline
//! - IdSelector: predicate algebra over vector IDs, driving removal

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod selector;
pub mod types;
pub mod vectors;

pub use error::{Error, Result};
pub use selector::{dedupe_ids, validate_ids, IdSelector, SelectorBuilder};
pub use types::{Id, IndexConfig, IoFlags, MetricType, MISSING_LABEL};
pub use vectors::{normalize_vectors, validate_k, validate_vectors, vector_rows};
