//! Dispatch vocabulary.
//!
//! Every state change goes through one of these. They serialize as
//! `{"type": "SET_GUESS_DIGIT", "position": 0, "digit": 4}` so a UI in any
//! language can drive the engine.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::feedback::GuessError;
use crate::game::hints::{HintError, HintKind};
use crate::game::leaderboard::LeaderboardEntry;
use crate::game::position::PositionError;
use crate::game::scratchpad::ScratchColor;
use crate::game::settings::{SettingsError, SettingsPatch};
use crate::game::Digit;

/// Actions accepted by the reducer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Start a single-player game
    StartNewGame,

    /// Start a game on a shared seed
    StartMultiplayerGame {
        /// Seed every client uses
        random_seed: u64,
    },

    /// Place or clear a digit and advance the cursor
    SetGuessDigit {
        /// Position
        position: usize,
        /// Digit, or `None` to clear
        digit: Option<Digit>,
    },

    /// Place or clear a digit without moving the cursor (drag and drop)
    SetGuessDigitNoAdvance {
        /// Position
        position: usize,
        /// Digit, or `None` to clear
        digit: Option<Digit>,
    },

    /// Place at the cursor and advance
    AddDigitSequential {
        /// Digit
        digit: Digit,
    },

    /// Submit the current guess
    SubmitGuess,

    /// Lock or unlock a position
    TogglePositionLock {
        /// Position
        position: usize,
    },

    /// Move the cursor
    SetActivePosition {
        /// Position
        position: usize,
    },

    /// Swap two positions
    MoveDigit {
        /// Source
        from: usize,
        /// Destination
        to: usize,
    },

    /// Buy a hint
    PurchaseHint {
        /// Kind
        kind: HintKind,
        /// Digit for bagel / not-bagel
        #[serde(default)]
        target_number: Option<Digit>,
    },

    /// Merge a partial settings update
    UpdateSettings(SettingsPatch),

    /// Annotate a digit
    SetScratchpadColor {
        /// Digit
        digit: Digit,
        /// Color
        color: ScratchColor,
    },

    /// Drop the current game, keep settings, stats and leaderboard
    ClearGameState,

    /// Add a leaderboard entry
    SaveScore(LeaderboardEntry),
}

impl Action {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartNewGame => "START_NEW_GAME",
            Action::StartMultiplayerGame { .. } => "START_MULTIPLAYER_GAME",
            Action::SetGuessDigit { .. } => "SET_GUESS_DIGIT",
            Action::SetGuessDigitNoAdvance { .. } => "SET_GUESS_DIGIT_NO_ADVANCE",
            Action::AddDigitSequential { .. } => "ADD_DIGIT_SEQUENTIAL",
            Action::SubmitGuess => "SUBMIT_GUESS",
            Action::TogglePositionLock { .. } => "TOGGLE_POSITION_LOCK",
            Action::SetActivePosition { .. } => "SET_ACTIVE_POSITION",
            Action::MoveDigit { .. } => "MOVE_DIGIT",
            Action::PurchaseHint { .. } => "PURCHASE_HINT",
            Action::UpdateSettings(_) => "UPDATE_SETTINGS",
            Action::SetScratchpadColor { .. } => "SET_SCRATCHPAD_COLOR",
            Action::ClearGameState => "CLEAR_GAME_STATE",
            Action::SaveScore(_) => "SAVE_SCORE",
        }
    }
}

/// Why an action left the state unchanged.
///
/// Rejections are ordinary outcomes, not faults: the UI reflects them
/// through the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The action needs an Active game.
    #[error("no active game")]
    NoActiveGame,

    /// Invalid guess.
    #[error("invalid guess: {0}")]
    Guess(#[from] GuessError),

    /// Invalid buffer edit.
    #[error("invalid edit: {0}")]
    Position(#[from] PositionError),

    /// Hint refused.
    #[error("hint refused: {0}")]
    Hint(#[from] HintError),

    /// Settings invalid.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Scratchpad digit forced by a hint.
    #[error("digit {0} is locked by a hint")]
    ScratchpadLocked(Digit),

    /// Digit outside the board.
    #[error("digit {0} is outside the board range")]
    DigitOutOfRange(Digit),
}
