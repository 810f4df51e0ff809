use serde::{Deserialize, Serialize};

/// Per-asset score for a single decision day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetScore {
    pub asset_id: usize,
    pub score: f64,
}

impl AssetScore {
    pub fn new(asset_id: usize, score: f64) -> Self {
        Self { asset_id, score }
    }
}

/// Scores sorted by descending score, ties by ascending asset id.
///
/// Only `strategy::ranker::rank` builds one, so the ordering always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedSelection {
    entries: Vec<AssetScore>,
}

impl RankedSelection {
    pub(crate) fn from_sorted(entries: Vec<AssetScore>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[AssetScore] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetScore> {
        self.entries.iter()
    }

    /// Asset ids in ranked order
    pub fn asset_ids(&self) -> Vec<usize> {
        self.entries.iter().map(|s| s.asset_id).collect()
    }
}
