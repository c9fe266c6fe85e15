//! Popularity scoring and dense ranking over the merged record set.
//!
//! Score: each country contributes `base - rank_in_country`, floored at zero,
//! so breadth of appearances and in-country placement both raise the score.
//! Ordering is total (score descending, then name ascending), which makes
//! re-ranking an unchanged set idempotent.

use std::fmt;

use crate::data::record::NameRecord;

pub const DEFAULT_SCORE_BASE: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankError {
    /// Ranking zero records is undefined.
    EmptyDataset,
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "cannot rank an empty dataset"),
        }
    }
}

impl std::error::Error for RankError {}

/// Popularity score from per-country ranks.
pub fn score_record(record: &NameRecord, base: u32) -> f64 {
    record
        .countries
        .values()
        .map(|rank| base.saturating_sub(*rank) as f64)
        .sum()
}

/// Recompute scores, sort, and assign dense 1-based ranks in place.
pub fn rank_records(records: &mut [NameRecord], base: u32) -> Result<(), RankError> {
    if records.is_empty() {
        return Err(RankError::EmptyDataset);
    }

    for record in records.iter_mut() {
        record.popularity_score = score_record(record, base);
    }

    records.sort_by(|left, right| {
        right
            .popularity_score
            .total_cmp(&left.popularity_score)
            .then_with(|| left.name.cmp(&right.name))
    });

    for (index, record) in records.iter_mut().enumerate() {
        record.popularity_rank = Some(index as u32 + 1);
    }

    Ok(())
}
