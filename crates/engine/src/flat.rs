//! Flat (exhaustive) reference engine
//!
//! Stores full vectors row-major and scans all of them per query. The most
//! accurate and the slowest engine; fine as a baseline and for modest
//! datasets. It requires no training, so `is_trained` is always true.
//!
//! ID assignment is monotonic: plain `add` hands out sequential IDs from a
//! per-engine counter, and the counter never moves backwards on removal, so
//! IDs are not reused within the life of an engine. `reset` is the one
//! exception - it returns the engine to its freshly-created state.

use std::cmp::Ordering;

use quay_core::{
    validate_vectors, Error, Id, IdSelector, IndexConfig, MetricType, Result, MISSING_LABEL,
};
use serde::{Deserialize, Serialize};

use crate::traits::{EngineKind, VectorEngine};

/// Exhaustive-search engine over uncompressed row-major storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatEngine {
    config: IndexConfig,
    next_id: Id,
    ids: Vec<Id>,
    data: Vec<f32>,
}

impl FlatEngine {
    /// Create an empty flat engine
    pub fn new(config: IndexConfig) -> Self {
        FlatEngine {
            config,
            next_id: 0,
            ids: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Decode an engine from its serialized payload
    pub fn from_payload(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Copy of the vector stored under `id`, if present
    pub fn vector(&self, id: Id) -> Option<Vec<f32>> {
        let d = self.config.dimension;
        self.row_of(id).map(|row| self.data[row * d..(row + 1) * d].to_vec())
    }

    /// Copies of the vectors stored under `ids`, concatenated row-major.
    ///
    /// Fails if any ID is absent.
    pub fn vectors(&self, ids: &[Id]) -> Result<Vec<f32>> {
        let d = self.config.dimension;
        let mut out = Vec::with_capacity(ids.len() * d);
        for &id in ids {
            let row = self.row_of(id).ok_or(Error::IdOutOfBounds {
                id,
                max_id: self.next_id,
            })?;
            out.extend_from_slice(&self.data[row * d..(row + 1) * d]);
        }
        Ok(out)
    }

    /// Distances from one query to every indexed vector, best-first.
    ///
    /// Equivalent to a search with `k = ntotal`. Requires a non-empty index.
    pub fn compute_distances(&self, query: &[f32]) -> Result<Vec<f32>> {
        if self.ids.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if query.len() != self.config.dimension {
            return Err(Error::MisalignedVectors {
                len: query.len(),
                dimension: self.config.dimension,
            });
        }
        let (distances, _) = self.search(query, self.ids.len())?;
        Ok(distances)
    }

    /// L2 norm of every stored vector, in storage order
    pub fn l2_norms(&self) -> Result<Vec<f32>> {
        if self.ids.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let d = self.config.dimension;
        Ok(self
            .data
            .chunks_exact(d)
            .map(|row| row.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect())
    }

    /// Normalize every stored vector to unit L2 length, zero rows skipped
    pub fn normalize(&mut self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::EmptyIndex);
        }
        quay_core::normalize_vectors(&mut self.data, self.config.dimension)
    }

    /// Estimated memory footprint of the stored vectors, in bytes
    pub fn memory_usage(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
            + self.ids.len() * std::mem::size_of::<Id>()
    }

    fn row_of(&self, id: Id) -> Option<usize> {
        self.ids.iter().position(|&stored| stored == id)
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.config.metric {
            // Squared L2, matching the usual engine convention
            MetricType::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            MetricType::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            MetricType::L1 => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            MetricType::Linf => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f32::max),
        }
    }
}

impl VectorEngine for FlatEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Flat
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn metric(&self) -> MetricType {
        self.config.metric
    }

    fn ntotal(&self) -> i64 {
        self.ids.len() as i64
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn train(&mut self, x: &[f32]) -> Result<()> {
        // Flat storage has no training phase; validate and accept
        validate_vectors(x, self.config.dimension)?;
        Ok(())
    }

    fn add(&mut self, x: &[f32]) -> Result<()> {
        let n = validate_vectors(x, self.config.dimension)?;
        self.data.extend_from_slice(x);
        for _ in 0..n {
            self.ids.push(self.next_id);
            self.next_id += 1;
        }
        Ok(())
    }

    fn add_with_ids(&mut self, x: &[f32], ids: &[Id]) -> Result<()> {
        let n = validate_vectors(x, self.config.dimension)?;
        if ids.len() != n {
            return Err(Error::IdCountMismatch {
                ids: ids.len(),
                rows: n,
            });
        }
        for (index, &id) in ids.iter().enumerate() {
            if id < 0 {
                return Err(Error::NegativeId { index, id });
            }
        }
        self.data.extend_from_slice(x);
        self.ids.extend_from_slice(ids);
        // Keep the sequential counter ahead of every caller-assigned ID
        if let Some(max) = ids.iter().max() {
            self.next_id = self.next_id.max(max + 1);
        }
        Ok(())
    }

    fn search(&self, x: &[f32], k: usize) -> Result<(Vec<f32>, Vec<Id>)> {
        let n = validate_vectors(x, self.config.dimension)?;
        quay_core::validate_k(k)?;

        let d = self.config.dimension;
        let lower_is_better = self.config.metric.lower_is_better();
        let pad_distance = self.config.metric.worst_distance();

        let mut distances = Vec::with_capacity(n * k);
        let mut labels = Vec::with_capacity(n * k);

        for query in x.chunks_exact(d) {
            let mut scored: Vec<(Id, f32)> = self
                .ids
                .iter()
                .zip(self.data.chunks_exact(d))
                .map(|(&id, row)| (id, self.distance(query, row)))
                .collect();

            // Best-first with ID-ascending tie-break for determinism
            scored.sort_by(|(id_a, dist_a), (id_b, dist_b)| {
                let by_distance = if lower_is_better {
                    dist_a.partial_cmp(dist_b)
                } else {
                    dist_b.partial_cmp(dist_a)
                };
                by_distance
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| id_a.cmp(id_b))
            });
            scored.truncate(k);

            for &(id, dist) in &scored {
                distances.push(dist);
                labels.push(id);
            }
            for _ in scored.len()..k {
                distances.push(pad_distance);
                labels.push(MISSING_LABEL);
            }
        }

        Ok((distances, labels))
    }

    fn remove_ids(&mut self, sel: &IdSelector) -> Result<usize> {
        let d = self.config.dimension;
        let before = self.ids.len();

        let mut kept_ids = Vec::with_capacity(before);
        let mut kept_data = Vec::with_capacity(self.data.len());
        for (row, &id) in self.ids.iter().enumerate() {
            if !sel.matches(id) {
                kept_ids.push(id);
                kept_data.extend_from_slice(&self.data[row * d..(row + 1) * d]);
            }
        }

        self.ids = kept_ids;
        self.data = kept_data;
        Ok(before - self.ids.len())
    }

    fn reset(&mut self) -> Result<()> {
        self.ids.clear();
        self.data.clear();
        self.next_id = 0;
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
