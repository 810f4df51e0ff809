//! Signal Ranker
//!
//! Orders per-asset scores best-first. Equal scores fall back to the lower
//! asset id so a rebalance never depends on iteration order.

use std::cmp::Ordering;

use thiserror::Error;

use crate::domain::{AssetScore, RankedSelection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("Insufficient candidates: need {required}, have {available}")]
    InsufficientCandidates { required: usize, available: usize },
}

/// Descending score, ascending asset id on ties
fn ranking_order(a: &AssetScore, b: &AssetScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.asset_id.cmp(&b.asset_id))
}

pub fn rank(scores: Vec<AssetScore>) -> RankedSelection {
    let mut entries = scores;
    entries.sort_by(ranking_order);
    RankedSelection::from_sorted(entries)
}

/// Exactly the first `k` entries
pub fn select_top_k(ranked: &RankedSelection, k: usize) -> Result<&[AssetScore], RankError> {
    if ranked.len() < k {
        return Err(RankError::InsufficientCandidates {
            required: k,
            available: ranked.len(),
        });
    }
    Ok(&ranked.as_slice()[..k])
}

/// The first `k` entries, or all of them when fewer are ranked
pub fn take_up_to(ranked: &RankedSelection, k: usize) -> &[AssetScore] {
    let n = k.min(ranked.len());
    &ranked.as_slice()[..n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(usize, f64)]) -> Vec<AssetScore> {
        values.iter().map(|&(id, s)| AssetScore::new(id, s)).collect()
    }

    #[test]
    fn test_rank_descending() {
        let ranked = rank(scores(&[(0, 0.01), (1, 0.2), (2, -0.3), (3, 0.05)]));
        assert_eq!(ranked.asset_ids(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_ties_prefer_lower_asset_id() {
        let input = scores(&[(7, 0.1), (2, 0.1), (5, 0.3), (4, 0.1)]);
        for _ in 0..5 {
            let ranked = rank(input.clone());
            assert_eq!(ranked.asset_ids(), vec![5, 2, 4, 7]);
        }

        let reversed: Vec<AssetScore> = input.iter().rev().copied().collect();
        assert_eq!(rank(reversed).asset_ids(), vec![5, 2, 4, 7]);
    }

    #[test]
    fn test_negative_zero_ties_are_total() {
        let ranked = rank(scores(&[(1, 0.0), (0, -0.0)]));
        // total_cmp puts +0.0 above -0.0
        assert_eq!(ranked.asset_ids(), vec![1, 0]);
    }

    #[test]
    fn test_select_top_k() {
        let ranked = rank(scores(&[(0, 1.0), (1, 2.0), (2, 3.0)]));
        let top = select_top_k(&ranked, 2).unwrap();
        assert_eq!(top.iter().map(|s| s.asset_id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(select_top_k(&ranked, 0).unwrap().len(), 0);
    }

    #[test]
    fn test_select_top_k_insufficient() {
        let ranked = rank(scores(&[(0, 1.0)]));
        assert_eq!(
            select_top_k(&ranked, 3),
            Err(RankError::InsufficientCandidates { required: 3, available: 1 })
        );
    }

    #[test]
    fn test_take_up_to() {
        let ranked = rank(scores(&[(0, 1.0), (1, 2.0)]));
        assert_eq!(take_up_to(&ranked, 5).len(), 2);
        assert_eq!(take_up_to(&ranked, 1)[0].asset_id, 1);
        assert!(take_up_to(&rank(Vec::new()), 3).is_empty());
    }
}
