//! Per-difficulty player statistics.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::points::Points;
use crate::game::settings::Difficulty;

/// Stats for one difficulty bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyStats {
    /// Finished games
    pub games_played: u32,
    /// Won games
    pub games_won: u32,
    /// Consecutive wins up to the latest game
    pub current_streak: u32,
    /// Longest win streak
    pub best_streak: u32,
    /// Best winning score
    pub best_score: Option<Points>,
    /// Guesses across all wins (for the average)
    pub total_guesses_in_wins: u32,
}

impl DifficultyStats {
    /// Fold in a finished game.
    pub fn record(&mut self, won: bool, score: Points, guesses: u32) {
        self.games_played += 1;
        if won {
            self.games_won += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
            self.total_guesses_in_wins += guesses;
            self.best_score = Some(self.best_score.map_or(score, |best| best.max(score)));
        } else {
            self.current_streak = 0;
        }
    }

    /// Average guesses per win.
    pub fn average_guesses(&self) -> Option<f64> {
        if self.games_won == 0 {
            None
        } else {
            Some(self.total_guesses_in_wins as f64 / self.games_won as f64)
        }
    }
}

/// Stats keyed by difficulty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsBook(BTreeMap<Difficulty, DifficultyStats>);

impl StatsBook {
    /// Stats for a bucket (zeroed if none recorded).
    pub fn get(&self, difficulty: Difficulty) -> DifficultyStats {
        self.0.get(&difficulty).cloned().unwrap_or_default()
    }

    /// Fold in a finished game.
    pub fn record(&mut self, difficulty: Difficulty, won: bool, score: Points, guesses: u32) {
        self.0.entry(difficulty).or_default().record(won, score, guesses);
    }
}
