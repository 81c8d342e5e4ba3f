//! JSON file holding the high-score table.
//!
//! ```text
//! { "schema_version": 1, "scores": [120, 80, 30] }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scores::HighScores;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ScoreDocument {
    schema_version: u32,
    scores: HighScores,
}

/// High scores bound to a path.
#[derive(Debug, Clone)]
pub struct ScoreFile {
    path: PathBuf,
    scores: HighScores,
}

impl ScoreFile {
    /// Read the table at `path`. A missing file is an empty table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let path = path.as_ref().to_path_buf();
        let scores = match std::fs::read_to_string(&path) {
            Ok(text) => {
                let doc: ScoreDocument = serde_json::from_str(&text)?;
                if doc.schema_version != SCHEMA_VERSION {
                    return Err(ScoreError::SchemaMismatch {
                        file_version: doc.schema_version,
                        expected_version: SCHEMA_VERSION,
                    });
                }
                // Re-record so a hand-edited file is normalized.
                HighScores::from_scores(doc.scores.as_slice().iter().copied())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no score file yet");
                HighScores::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, scores })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }

    /// Record a final score and write the file if the table changed.
    pub fn submit(&mut self, score: u32) -> Result<Option<usize>, ScoreError> {
        let rank = self.scores.record(score);
        if let Some(rank) = rank {
            self.save()?;
            tracing::info!(score, rank, "high score recorded");
        }
        Ok(rank)
    }

    pub fn save(&self) -> Result<(), ScoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let doc = ScoreDocument {
            schema_version: SCHEMA_VERSION,
            scores: self.scores.clone(),
        };
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &doc)?;
        Ok(())
    }
}
