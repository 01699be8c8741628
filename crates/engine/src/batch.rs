//! Batch orchestration over an index handle
//!
//! Engines assume modest single-shot buffers; these entry points split
//! large add/search workloads into bounded contiguous chunks while keeping
//! the observable result identical to the unbatched call. Chunking exists
//! purely to bound peak scratch allocation in the engine - there is no
//! internal concurrency, and all loops run on the calling thread.
//!
//! On a chunk failure the orchestration stops immediately and the error
//! names the failing row range. Rows from earlier chunks stay committed;
//! there is no rollback.

use quay_core::{validate_k, validate_vectors, Error, Id, Result};
use tracing::debug;

use crate::handle::IndexHandle;

/// Default chunk size for [`IndexHandle::add_batch`]
pub const DEFAULT_ADD_BATCH_SIZE: usize = 1024;

/// Default chunk size for [`IndexHandle::search_batch`]
pub const DEFAULT_SEARCH_BATCH_SIZE: usize = 256;

impl IndexHandle {
    /// Add vectors in contiguous chunks of `batch_size` rows.
    ///
    /// A `batch_size` of 0 selects the default; one larger than the row
    /// count is clamped to a single chunk. The final index content is the
    /// same as one unbatched `add` for every valid batch size.
    pub fn add_batch(&mut self, vectors: &[f32], batch_size: usize) -> Result<()> {
        self.check_writable()?;
        let total = validate_vectors(vectors, self.d())?;
        self.check_trained()?;

        let batch_size = effective_batch_size(batch_size, DEFAULT_ADD_BATCH_SIZE, total);
        let d = self.d();

        let mut start = 0;
        while start < total {
            let end = (start + batch_size).min(total);
            self.add(&vectors[start * d..end * d]).map_err(|e| Error::Batch {
                first_row: start,
                last_row: end - 1,
                source: Box::new(e),
            })?;
            start = end;
        }

        debug!(
            target: "quay::batch",
            rows = total,
            batch_size,
            ntotal = self.ntotal(),
            "add batch completed"
        );
        Ok(())
    }

    /// Search query rows in contiguous chunks of `batch_size`.
    ///
    /// Returns one distance list and one label list per query;
    /// `results[i]` corresponds to `queries[i]` regardless of batch size.
    /// Zero queries yield empty result lists without error.
    #[allow(clippy::type_complexity)]
    pub fn search_batch(
        &self,
        queries: &[f32],
        k: usize,
        batch_size: usize,
    ) -> Result<(Vec<Vec<f32>>, Vec<Vec<Id>>)> {
        if queries.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let total = validate_vectors(queries, self.d())?;
        validate_k(k)?;
        self.check_trained()?;

        let batch_size = effective_batch_size(batch_size, DEFAULT_SEARCH_BATCH_SIZE, total);
        let d = self.d();

        let mut distances: Vec<Vec<f32>> = vec![Vec::new(); total];
        let mut labels: Vec<Vec<Id>> = vec![Vec::new(); total];

        let mut start = 0;
        while start < total {
            let end = (start + batch_size).min(total);
            let (chunk_distances, chunk_labels) =
                self.search(&queries[start * d..end * d], k).map_err(|e| {
                    Error::Batch {
                        first_row: start,
                        last_row: end - 1,
                        source: Box::new(e),
                    }
                })?;

            // Redistribute the flat per-chunk arrays into per-query slots,
            // preserving original query order across chunk boundaries
            for j in 0..end - start {
                distances[start + j] = chunk_distances[j * k..(j + 1) * k].to_vec();
                labels[start + j] = chunk_labels[j * k..(j + 1) * k].to_vec();
            }
            start = end;
        }

        debug!(
            target: "quay::batch",
            queries = total,
            k,
            batch_size,
            "search batch completed"
        );
        Ok((distances, labels))
    }

    /// Distances from every query to every indexed vector.
    ///
    /// Implemented as a batched search with `k = ntotal`. Returns a dense
    /// row-major matrix of shape `num_queries x ntotal`; each row is
    /// ordered best-first per the index metric. Requires a non-empty index.
    pub fn compute_distances_batch(
        &self,
        queries: &[f32],
        batch_size: usize,
    ) -> Result<Vec<f32>> {
        let num_queries = validate_vectors(queries, self.d())?;
        let ntotal = self.ntotal();
        if ntotal <= 0 {
            return Err(Error::EmptyIndex);
        }
        let k = ntotal as usize;

        let (distances, _) = self.search_batch(queries, k, batch_size)?;

        let mut matrix = Vec::with_capacity(num_queries * k);
        for row in &distances {
            matrix.extend_from_slice(row);
        }
        Ok(matrix)
    }
}

fn effective_batch_size(requested: usize, default: usize, total: usize) -> usize {
    let size = if requested == 0 { default } else { requested };
    size.min(total)
}
