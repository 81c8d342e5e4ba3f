use serde::{Deserialize, Serialize};

/// Number of scores kept.
pub const TABLE_SIZE: usize = 5;

/// Best final scores, highest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    scores: Vec<u32>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any list, normalizing order, zeros and length.
    pub fn from_scores(scores: impl IntoIterator<Item = u32>) -> Self {
        let mut table = Self::new();
        for score in scores {
            table.record(score);
        }
        table
    }

    /// Insert a final score. Returns its rank (0 = best) if it made the
    /// table. Zero never does.
    pub fn record(&mut self, score: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let rank = self.scores.partition_point(|&s| s >= score);
        if rank >= TABLE_SIZE {
            return None;
        }
        self.scores.insert(rank, score);
        self.scores.truncate(TABLE_SIZE);
        Some(rank)
    }

    pub fn best(&self) -> Option<u32> {
        self.scores.first().copied()
    }

    /// Whether `score` would enter the table.
    pub fn qualifies(&self, score: u32) -> bool {
        score > 0 && (self.scores.len() < TABLE_SIZE || self.scores.last().is_some_and(|&s| score > s))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
