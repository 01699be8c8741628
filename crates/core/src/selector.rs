//! ID selector algebra
//!
//! Selectors are immutable predicates over the vector ID domain, consumed by
//! `remove_ids` to decide which vectors a removal deletes. Two primitives
//! exist - a half-open range and an explicit set - and AND/OR/NOT are
//! implemented as combinators over `matches`, so composition needs nothing
//! from the engine beyond predicate evaluation.

use crate::error::{Error, Result};
use crate::types::Id;

/// A predicate over vector IDs.
///
/// Selectors are value objects: construction validates, evaluation via
/// [`IdSelector::matches`] is pure. They are owned by the caller and live
/// independently of any index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSelector {
    /// Matches IDs in the half-open range `[min, max)`
    Range {
        /// Inclusive lower bound (>= 0)
        min: Id,
        /// Exclusive upper bound (> min)
        max: Id,
    },

    /// Matches an explicit set of IDs, stored sorted and deduplicated
    Batch(Vec<Id>),

    /// Matches IDs matched by every operand
    And(Vec<IdSelector>),

    /// Matches IDs matched by any operand
    Or(Vec<IdSelector>),

    /// Matches IDs not matched by the operand
    Not(Box<IdSelector>),
}

impl IdSelector {
    /// Selector for the half-open range `[min, max)`.
    ///
    /// Rejects negative bounds and `min >= max`.
    pub fn range(min: Id, max: Id) -> Result<Self> {
        if min < 0 || max < 0 || min >= max {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(IdSelector::Range { min, max })
    }

    /// Selector for an explicit set of IDs.
    ///
    /// Rejects empty input and negative IDs. Duplicates are removed via
    /// sort-then-adjacent-compare, so `batch(&[3, 1, 2, 1])` and
    /// `batch(&[1, 2, 3])` build the same selector.
    pub fn batch(ids: &[Id]) -> Result<Self> {
        validate_ids(ids, None)?;
        Ok(IdSelector::Batch(dedupe_ids(ids.to_vec())))
    }

    /// Like [`IdSelector::batch`], but additionally rejects any
    /// ID `>= max_id`.
    pub fn batch_bounded(ids: &[Id], max_id: Id) -> Result<Self> {
        validate_ids(ids, Some(max_id))?;
        Ok(IdSelector::Batch(dedupe_ids(ids.to_vec())))
    }

    /// Selector matching IDs matched by every operand.
    ///
    /// Rejects an empty operand list.
    pub fn and(operands: Vec<IdSelector>) -> Result<Self> {
        if operands.is_empty() {
            return Err(Error::EmptyComposite);
        }
        Ok(IdSelector::And(operands))
    }

    /// Selector matching IDs matched by any operand.
    ///
    /// Rejects an empty operand list.
    pub fn or(operands: Vec<IdSelector>) -> Result<Self> {
        if operands.is_empty() {
            return Err(Error::EmptyComposite);
        }
        Ok(IdSelector::Or(operands))
    }

    /// Selector matching IDs the operand does not match
    pub fn not(operand: IdSelector) -> Self {
        IdSelector::Not(Box::new(operand))
    }

    /// Evaluate the predicate for one ID
    pub fn matches(&self, id: Id) -> bool {
        match self {
            IdSelector::Range { min, max } => *min <= id && id < *max,
            IdSelector::Batch(ids) => ids.binary_search(&id).is_ok(),
            IdSelector::And(operands) => operands.iter().all(|s| s.matches(id)),
            IdSelector::Or(operands) => operands.iter().any(|s| s.matches(id)),
            IdSelector::Not(operand) => !operand.matches(id),
        }
    }
}

/// Validate a slice of IDs: non-empty, non-negative, and below `max_id`
/// when a bound is given.
pub fn validate_ids(ids: &[Id], max_id: Option<Id>) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::EmptyIdSet);
    }
    for (index, &id) in ids.iter().enumerate() {
        if id < 0 {
            return Err(Error::NegativeId { index, id });
        }
        if let Some(max_id) = max_id {
            if id >= max_id {
                return Err(Error::IdOutOfBounds { id, max_id });
            }
        }
    }
    Ok(())
}

/// Sort ascending and drop adjacent duplicates. O(n log n).
pub fn dedupe_ids(mut ids: Vec<Id>) -> Vec<Id> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Staged construction of an explicit-set selector.
///
/// IDs and ranges accumulate freely; validation happens once, in
/// [`SelectorBuilder::build`]. An optional max-ID bound applies to the
/// whole accumulated set.
#[derive(Debug, Clone, Default)]
pub struct SelectorBuilder {
    ids: Vec<Id>,
    max_id: Option<Id>,
}

impl SelectorBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        SelectorBuilder::default()
    }

    /// Set the exclusive upper bound enforced at build time
    pub fn max_id(mut self, max_id: Id) -> Self {
        self.max_id = Some(max_id);
        self
    }

    /// Stage a single ID
    pub fn add_id(&mut self, id: Id) -> &mut Self {
        self.ids.push(id);
        self
    }

    /// Stage multiple IDs
    pub fn add_ids(&mut self, ids: &[Id]) -> &mut Self {
        self.ids.extend_from_slice(ids);
        self
    }

    /// Stage every ID in the half-open range `[start, end)`
    pub fn add_range(&mut self, start: Id, end: Id) -> &mut Self {
        self.ids.extend(start..end);
        self
    }

    /// Number of staged IDs, duplicates included
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Staged IDs, as accumulated
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    /// Drop all staged IDs, keeping the bound
    pub fn clear(&mut self) -> &mut Self {
        self.ids.clear();
        self
    }

    /// Validate and materialize an explicit-set selector
    pub fn build(&self) -> Result<IdSelector> {
        match self.max_id {
            Some(max_id) => IdSelector::batch_bounded(&self.ids, max_id),
            None => IdSelector::batch(&self.ids),
        }
    }
}
