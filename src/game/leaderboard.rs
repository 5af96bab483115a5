//! Local leaderboards, one per difficulty.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::points::Points;
use crate::game::settings::Difficulty;

/// Entries kept per difficulty.
pub const LEADERBOARD_CAPACITY: usize = 100;

/// One saved score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name
    pub player_name: String,
    /// Final score
    pub score: Points,
    /// Guesses used
    pub guesses: u32,
    /// Game length in minutes
    pub time_minutes: Points,
    /// Bucket
    pub difficulty: Difficulty,
    /// When the score was saved (ms since epoch)
    pub timestamp: u64,
}

/// Append-only boards sorted by descending score.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard(BTreeMap<Difficulty, Vec<LeaderboardEntry>>);

impl Leaderboard {
    /// Insert an entry; returns its 1-based rank, or `None` if it fell off
    /// the bottom of a full board.
    ///
    /// Equal scores keep insertion order.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let board = self.0.entry(entry.difficulty).or_default();
        let index = board.partition_point(|e| e.score >= entry.score);
        if index >= LEADERBOARD_CAPACITY {
            return None;
        }
        board.insert(index, entry);
        board.truncate(LEADERBOARD_CAPACITY);
        Some(index + 1)
    }

    /// Entries for a difficulty, best first.
    pub fn top(&self, difficulty: Difficulty) -> &[LeaderboardEntry] {
        self.0.get(&difficulty).map(Vec::as_slice).unwrap_or(&[])
    }
}
