//! Persistence of final scores.
//!
//! # Invariants
//! - The table holds at most five scores, highest first; zero is never
//!   recorded.
//! - A missing file reads as an empty table; a corrupt one is an error.

pub mod scores;
pub mod store;

pub use scores::{HighScores, TABLE_SIZE};
pub use store::{ScoreError, ScoreFile};
