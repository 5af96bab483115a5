//! Game State Definitions
//!
//! The session being played and the full engine state the reducer works on.
//! Uses BTreeMap/BTreeSet everywhere for deterministic iteration order.

use serde::{Serialize, Deserialize};

use crate::core::hash::{board_fingerprint, BoardHash};
use crate::core::points::Points;
use crate::core::rng::DeterministicRng;
use crate::game::feedback::Feedback;
use crate::game::hints::{HintCosts, HintState};
use crate::game::leaderboard::Leaderboard;
use crate::game::position::GuessBuffer;
use crate::game::scoring::{compute_score, elapsed_minutes};
use crate::game::scratchpad::ScratchpadState;
use crate::game::settings::Settings;
use crate::game::stats::StatsBook;
use crate::game::target::seeded_target;
use crate::game::Digit;

// =============================================================================
// GUESS
// =============================================================================

/// A submitted guess. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    /// 1-based sequence number within the session
    pub id: u32,
    /// Guessed digits
    pub digits: Vec<Digit>,
    /// Evaluation
    pub feedback: Feedback,
    /// Submission time (ms since epoch)
    pub timestamp: u64,
    /// Signed `target - guess` per position; shown through row-delta hints
    pub row_deltas: Option<Vec<i8>>,
    /// Guessed digit sum per grid row (multi-row feedback)
    pub row_sums: Option<Vec<u16>>,
}

// =============================================================================
// SESSION
// =============================================================================

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum GameStatus {
    /// No game yet
    #[default]
    Idle,
    /// Accepting guesses
    Active,
    /// Target found
    Won,
    /// Score or guesses ran out
    Lost,
}

/// One game from New Game to Won/Lost.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// Secret digits
    pub target: Vec<Digit>,
    /// In-progress guess, cursor and locks
    pub buffer: GuessBuffer,
    /// Submitted guesses, oldest first
    pub guesses: Vec<Guess>,
    /// Score as of the last submission or purchase
    pub score: Points,
    /// Lifecycle state
    pub status: GameStatus,
    /// Start time (ms since epoch)
    pub start_time: u64,
    /// End time once Won/Lost
    pub end_time: Option<u64>,
    /// Seed the target came from
    pub seed: u64,
    /// Started from a multiplayer game-start event
    pub multiplayer: bool,
    /// Hint randomness, continuing the target stream
    pub rng: DeterministicRng,
}

impl GameSession {
    /// No game.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Start a fresh game from a seed.
    pub fn start(settings: &Settings, seed: u64, multiplayer: bool, now_ms: u64) -> Self {
        let (target, rng) = seeded_target(settings, seed);
        Self {
            buffer: GuessBuffer::new(target.len()),
            target,
            guesses: Vec::new(),
            score: Points::MAX_SCORE,
            status: GameStatus::Active,
            start_time: now_ms,
            end_time: None,
            seed,
            multiplayer,
            rng,
        }
    }

    /// Accepting guesses?
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// Target found?
    pub fn is_won(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// Won or Lost?
    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Won | GameStatus::Lost)
    }

    /// The in-progress guess.
    pub fn current_guess(&self) -> &[Option<Digit>] {
        &self.buffer.digits
    }

    /// Elapsed minutes, frozen at the end time once the game is over.
    pub fn elapsed_minutes(&self, now_ms: u64) -> Points {
        if self.status == GameStatus::Idle {
            return Points::ZERO;
        }
        let end = self.end_time.unwrap_or(now_ms);
        elapsed_minutes(self.start_time, end)
    }

    /// Fingerprint of the board (seed, shape and target).
    pub fn fingerprint(&self, settings: &Settings) -> BoardHash {
        board_fingerprint(self.seed, settings.target_length, settings.digit_range, &self.target)
    }
}

// =============================================================================
// ENGINE STATE
// =============================================================================

/// Everything the reducer owns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Current settings
    pub settings: Settings,
    /// Current game
    pub session: GameSession,
    /// Purchased hints
    pub hints: HintState,
    /// Player annotations
    pub scratchpad: ScratchpadState,
    /// Per-difficulty stats
    pub stats: StatsBook,
    /// Per-difficulty leaderboards
    pub leaderboard: Leaderboard,
}

impl EngineState {
    /// Fresh state with the given settings and no game.
    pub fn new(settings: Settings) -> Self {
        Self { settings, ..Default::default() }
    }

    /// Hint points spent this session.
    pub fn total_hint_cost(&self) -> Points {
        self.hints.total_cost(&HintCosts::STANDARD)
    }

    /// Live score at `now_ms`.
    pub fn score_at(&self, now_ms: u64) -> Points {
        match self.session.status {
            GameStatus::Idle => Points::MAX_SCORE,
            GameStatus::Won | GameStatus::Lost => self.session.score,
            GameStatus::Active => compute_score(
                self.session.guesses.len(),
                self.session.elapsed_minutes(now_ms),
                self.total_hint_cost(),
            ),
        }
    }
}
