//! Flat vector buffer discipline
//!
//! A vector batch is a flat `&[f32]` of length `n * d`. Every public entry
//! point validates the buffer before any engine call, so validation errors
//! never mutate state.

use crate::error::{Error, Result};

/// Validate a flat vector buffer against a dimension.
///
/// Returns the number of rows (`len / d`) on success.
pub fn validate_vectors(x: &[f32], d: usize) -> Result<usize> {
    if x.is_empty() {
        return Err(Error::EmptyVectors);
    }
    if d == 0 {
        return Err(Error::InvalidDimension(d));
    }
    if x.len() % d != 0 {
        return Err(Error::MisalignedVectors {
            len: x.len(),
            dimension: d,
        });
    }
    Ok(x.len() / d)
}

/// Validate the `k` parameter for search
pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidK(k));
    }
    Ok(())
}

/// Normalize each row of a flat vector buffer to unit L2 length, in place.
///
/// Zero rows are left untouched. Useful for turning an inner-product index
/// into a cosine-similarity index.
pub fn normalize_vectors(x: &mut [f32], d: usize) -> Result<()> {
    let n = validate_vectors(x, d)?;
    for row in 0..n {
        let slice = &mut x[row * d..(row + 1) * d];
        let norm: f32 = slice.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            continue;
        }
        let inv = 1.0 / norm;
        for v in slice.iter_mut() {
            *v *= inv;
        }
    }
    Ok(())
}

/// Borrow a contiguous sub-range of rows `[start, start + count)` from a
/// flat buffer, clamping `count` to the available rows.
///
/// Returns `None` if `start` is past the end or `count` is zero.
pub fn vector_rows(x: &[f32], d: usize, start: usize, count: usize) -> Option<&[f32]> {
    if d == 0 || count == 0 {
        return None;
    }
    let n = x.len() / d;
    if start >= n {
        return None;
    }
    let count = count.min(n - start);
    Some(&x[start * d..(start + count) * d])
}
