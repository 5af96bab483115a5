//! Game Events
//!
//! Emitted by the reducer for every committed transition. The UI and the
//! multiplayer coordinator observe these instead of diffing state.

use serde::{Serialize, Deserialize};

use crate::core::points::Points;
use crate::game::feedback::Feedback;
use crate::game::hints::{HintKind, HintReveal};
use crate::game::Digit;

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A new game began
    GameStarted {
        /// Target seed
        seed: u64,
        /// Seeded by a multiplayer game
        multiplayer: bool,
    },

    /// The guess buffer changed
    GuessEdited {
        /// Buffer after the edit
        digits: Vec<Option<Digit>>,
        /// Cursor after the edit
        active_position: usize,
    },

    /// A lock was toggled
    LockToggled {
        /// Position
        position: usize,
        /// New lock state
        locked: bool,
    },

    /// A guess was accepted
    GuessSubmitted {
        /// Guess id
        guess_id: u32,
        /// Evaluation
        feedback: Feedback,
        /// Score after the guess
        score: Points,
    },

    /// A hint was bought
    HintPurchased {
        /// Kind
        kind: HintKind,
        /// Revealed information
        reveal: HintReveal,
        /// Total spent so far
        total_cost: Points,
    },

    /// Target found
    GameWon {
        /// Final score
        score: Points,
        /// Guesses used
        guesses: u32,
    },

    /// Game lost
    GameLost {
        /// Final score
        score: Points,
        /// Guesses used
        guesses: u32,
    },

    /// Settings replaced
    SettingsUpdated {
        /// The board shape changed and the current game was dropped
        board_reset: bool,
    },

    /// A scratchpad color changed
    ScratchpadUpdated {
        /// Digit
        digit: Digit,
    },

    /// Game state cleared back to idle
    GameCleared,

    /// A score was saved to the leaderboard
    ScoreSaved {
        /// 1-based rank, `None` if it didn't make the board
        rank: Option<usize>,
    },
}

impl GameEvent {
    /// Did this event end the game?
    pub fn is_game_end(&self) -> bool {
        matches!(self, GameEvent::GameWon { .. } | GameEvent::GameLost { .. })
    }
}
