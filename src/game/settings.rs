//! Game Settings
//!
//! Board shape, difficulty presets and player preferences, plus the partial
//! update used by `UPDATE_SETTINGS`.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::points::Points;

/// Highest digit a board can use (single decimal digits).
pub const MAX_DIGIT_RANGE: u8 = 9;

/// Default guess cap. Each guess costs a point, so the score runs out first
/// unless a custom cap is lower.
pub const DEFAULT_MAX_GUESSES: u32 = 100;

/// Difficulty bucket. Also keys stats and leaderboards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Difficulty {
    /// 3 digits in one row
    Easy,
    /// 4 digits in a 2×2 grid
    #[default]
    Medium,
    /// 6 digits in a 2×3 grid
    Hard,
    /// 9 digits in a 3×3 grid
    Expert,
    /// Explicit dimensions
    Custom,
}

impl Difficulty {
    /// Grid shape (rows, columns) and digit range for a preset.
    pub fn preset(self) -> Option<(u8, u8, u8)> {
        match self {
            Difficulty::Easy => Some((1, 3, 9)),
            Difficulty::Medium => Some((2, 2, 9)),
            Difficulty::Hard => Some((2, 3, 9)),
            Difficulty::Expert => Some((3, 3, 9)),
            Difficulty::Custom => None,
        }
    }

    /// All difficulty buckets, in order.
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::Custom,
    ];
}

/// Game settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of digits in the target
    pub target_length: u8,
    /// Digits are drawn from [0, digit_range]
    pub digit_range: u8,
    /// Grid rows (row-sum hints are per row)
    pub grid_rows: u8,
    /// Grid columns
    pub grid_columns: u8,
    /// Difficulty bucket
    pub difficulty: Difficulty,
    /// Fixed seed for replayable single-player games
    pub random_seed: Option<u64>,
    /// Enables the developer loss threshold
    pub developer_mode: bool,
    /// Developer hook: a submission scoring at or below this ends the game
    pub developer_lose_score: Points,
    /// Clear unlocked positions after each submitted guess
    pub clear_guess_after_submit: bool,
    /// Record per-row sums on each guess
    pub multi_row_feedback: bool,
    /// Guess cap before the game is lost
    pub max_guesses: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_length: 4,
            digit_range: 9,
            grid_rows: 2,
            grid_columns: 2,
            difficulty: Difficulty::Medium,
            random_seed: None,
            developer_mode: false,
            developer_lose_score: Points::ZERO,
            clear_guess_after_submit: true,
            multi_row_feedback: false,
            max_guesses: DEFAULT_MAX_GUESSES,
        }
    }
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Target must hold at least one digit.
    #[error("target length must be at least 1")]
    EmptyTarget,

    /// Grid does not cover the target.
    #[error("grid {rows}x{columns} does not match target length {target_length}")]
    GridMismatch {
        /// Grid rows
        rows: u8,
        /// Grid columns
        columns: u8,
        /// Target length
        target_length: u8,
    },

    /// Not enough distinct digits.
    #[error("digit range 0..={digit_range} cannot fill {target_length} distinct digits")]
    RangeTooSmall {
        /// Digit range
        digit_range: u8,
        /// Target length
        target_length: u8,
    },

    /// Digits above 9.
    #[error("digit range {0} exceeds {MAX_DIGIT_RANGE}")]
    RangeTooLarge(u8),

    /// Guess cap of zero.
    #[error("max guesses must be at least 1")]
    NoGuesses,
}

impl Settings {
    /// Settings for a difficulty preset with default preferences.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        if let Some((rows, columns, range)) = difficulty.preset() {
            settings.grid_rows = rows;
            settings.grid_columns = columns;
            settings.target_length = rows * columns;
            settings.digit_range = range;
        }
        settings.difficulty = difficulty;
        settings
    }

    /// Check every invariant.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.target_length == 0 {
            return Err(SettingsError::EmptyTarget);
        }
        if self.grid_rows as u16 * self.grid_columns as u16 != self.target_length as u16 {
            return Err(SettingsError::GridMismatch {
                rows: self.grid_rows,
                columns: self.grid_columns,
                target_length: self.target_length,
            });
        }
        if self.digit_range > MAX_DIGIT_RANGE {
            return Err(SettingsError::RangeTooLarge(self.digit_range));
        }
        if (self.digit_range as u16) + 1 < self.target_length as u16 {
            return Err(SettingsError::RangeTooSmall {
                digit_range: self.digit_range,
                target_length: self.target_length,
            });
        }
        if self.max_guesses == 0 {
            return Err(SettingsError::NoGuesses);
        }
        Ok(())
    }

    /// Merge a partial update and validate the result.
    ///
    /// Selecting a preset difficulty fills in its dimensions unless the
    /// patch also names dimensions explicitly.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Settings, SettingsError> {
        let mut next = self.clone();

        if let Some(difficulty) = patch.difficulty {
            next.difficulty = difficulty;
            if let Some((rows, columns, range)) = difficulty.preset() {
                next.grid_rows = rows;
                next.grid_columns = columns;
                next.target_length = rows * columns;
                next.digit_range = range;
            }
        }

        let explicit_shape = patch.target_length.is_some()
            || patch.grid_rows.is_some()
            || patch.grid_columns.is_some()
            || patch.digit_range.is_some();

        if let Some(v) = patch.target_length { next.target_length = v; }
        if let Some(v) = patch.digit_range { next.digit_range = v; }
        if let Some(v) = patch.grid_rows { next.grid_rows = v; }
        if let Some(v) = patch.grid_columns { next.grid_columns = v; }
        if let Some(v) = patch.random_seed { next.random_seed = v; }
        if let Some(v) = patch.developer_mode { next.developer_mode = v; }
        if let Some(v) = patch.developer_lose_score { next.developer_lose_score = v; }
        if let Some(v) = patch.clear_guess_after_submit { next.clear_guess_after_submit = v; }
        if let Some(v) = patch.multi_row_feedback { next.multi_row_feedback = v; }
        if let Some(v) = patch.max_guesses { next.max_guesses = v; }

        // Hand-picked dimensions that don't match the preset make it custom
        if explicit_shape {
            if let Some((rows, columns, range)) = next.difficulty.preset() {
                if (rows, columns, range) != (next.grid_rows, next.grid_columns, next.digit_range) {
                    next.difficulty = Difficulty::Custom;
                }
            }
        }

        next.validate()?;
        Ok(next)
    }

    /// Does the other settings value describe a different board?
    pub fn shape_differs(&self, other: &Settings) -> bool {
        self.target_length != other.target_length
            || self.digit_range != other.digit_range
            || self.grid_rows != other.grid_rows
            || self.grid_columns != other.grid_columns
    }
}

/// Partial settings update (`UPDATE_SETTINGS`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    /// New target length
    pub target_length: Option<u8>,
    /// New digit range
    pub digit_range: Option<u8>,
    /// New grid rows
    pub grid_rows: Option<u8>,
    /// New grid columns
    pub grid_columns: Option<u8>,
    /// New difficulty (presets fill dimensions)
    pub difficulty: Option<Difficulty>,
    /// `Some(None)` clears the seed
    pub random_seed: Option<Option<u64>>,
    /// Developer mode toggle
    pub developer_mode: Option<bool>,
    /// Developer loss threshold
    pub developer_lose_score: Option<Points>,
    /// Clear-after-submit toggle
    pub clear_guess_after_submit: Option<bool>,
    /// Multi-row feedback toggle
    pub multi_row_feedback: Option<bool>,
    /// Guess cap
    pub max_guesses: Option<u32>,
}

impl SettingsPatch {
    /// Patch that copies the board shape of a full settings value.
    ///
    /// Used when a multiplayer game dictates the board.
    pub fn board_of(settings: &Settings) -> Self {
        Self {
            target_length: Some(settings.target_length),
            digit_range: Some(settings.digit_range),
            grid_rows: Some(settings.grid_rows),
            grid_columns: Some(settings.grid_columns),
            difficulty: Some(settings.difficulty),
            max_guesses: Some(settings.max_guesses),
            ..Default::default()
        }
    }

    /// Every board field is set.
    pub fn pins_board(&self) -> bool {
        self.target_length.is_some()
            && self.digit_range.is_some()
            && self.grid_rows.is_some()
            && self.grid_columns.is_some()
            && self.difficulty.is_some()
            && self.max_guesses.is_some()
    }

    /// The same patch with any missing board field filled from the defaults.
    ///
    /// Applying the result gives the same board whatever settings it lands on.
    pub fn with_pinned_board(&self) -> Result<Self, SettingsError> {
        let board = Self::board_of(&Settings::default().merged(self)?);
        Ok(Self {
            target_length: board.target_length,
            digit_range: board.digit_range,
            grid_rows: board.grid_rows,
            grid_columns: board.grid_columns,
            difficulty: board.difficulty,
            max_guesses: board.max_guesses,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Settings::default().validate().is_ok());
        for difficulty in Difficulty::ALL {
            assert!(Settings::for_difficulty(difficulty).validate().is_ok(), "{difficulty:?}");
        }
    }

    #[test]
    fn test_grid_mismatch() {
        let settings = Settings { grid_rows: 3, ..Settings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::GridMismatch { .. })));
    }

    #[test]
    fn test_range_too_small() {
        let settings = Settings {
            target_length: 4,
            grid_rows: 1,
            grid_columns: 4,
            digit_range: 2,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::RangeTooSmall { .. })));

        // range 0..=3 holds exactly four digits
        let tight = Settings { digit_range: 3, ..settings };
        assert!(tight.validate().is_ok());
    }

    #[test]
    fn test_range_too_large() {
        let settings = Settings { digit_range: 12, ..Settings::default() };
        assert_eq!(settings.validate(), Err(SettingsError::RangeTooLarge(12)));
    }

    #[test]
    fn test_patch_preset() {
        let patch = SettingsPatch { difficulty: Some(Difficulty::Expert), ..Default::default() };
        let next = Settings::default().merged(&patch).unwrap();
        assert_eq!(next.target_length, 9);
        assert_eq!((next.grid_rows, next.grid_columns), (3, 3));
        assert_eq!(next.difficulty, Difficulty::Expert);
    }

    #[test]
    fn test_patch_explicit_shape_becomes_custom() {
        let patch = SettingsPatch {
            target_length: Some(5),
            grid_rows: Some(1),
            grid_columns: Some(5),
            ..Default::default()
        };
        let next = Settings::default().merged(&patch).unwrap();
        assert_eq!(next.difficulty, Difficulty::Custom);
        assert!(Settings::default().shape_differs(&next));
    }

    #[test]
    fn test_patch_invalid_rejected() {
        let patch = SettingsPatch { target_length: Some(5), ..Default::default() };
        assert!(Settings::default().merged(&patch).is_err());
    }

    #[test]
    fn test_patch_clear_seed() {
        let seeded = Settings { random_seed: Some(9), ..Settings::default() };
        let patch = SettingsPatch { random_seed: Some(None), ..Default::default() };
        assert_eq!(seeded.merged(&patch).unwrap().random_seed, None);
    }

    #[test]
    fn test_board_of_roundtrip() {
        let expert = Settings::for_difficulty(Difficulty::Expert);
        let next = Settings::default().merged(&SettingsPatch::board_of(&expert)).unwrap();
        assert!(!next.shape_differs(&expert));
        assert_eq!(next.difficulty, Difficulty::Expert);
    }

    #[test]
    fn test_pinned_board_ignores_local_settings() {
        for partial in [
            SettingsPatch::default(),
            SettingsPatch { difficulty: Some(Difficulty::Custom), ..Default::default() },
            SettingsPatch { multi_row_feedback: Some(true), ..Default::default() },
        ] {
            assert!(!partial.pins_board());
            let pinned = partial.with_pinned_board().unwrap();
            assert!(pinned.pins_board());
            assert_eq!(pinned.multi_row_feedback, partial.multi_row_feedback);

            let from_easy = Settings::for_difficulty(Difficulty::Easy).merged(&pinned).unwrap();
            let from_expert = Settings::for_difficulty(Difficulty::Expert).merged(&pinned).unwrap();
            assert!(!from_easy.shape_differs(&from_expert));
            assert_eq!(from_easy.difficulty, from_expert.difficulty);
            assert_eq!(from_easy.max_guesses, from_expert.max_guesses);
        }
    }

    #[test]
    fn test_pinned_board_keeps_explicit_shape() {
        let patch = SettingsPatch { difficulty: Some(Difficulty::Hard), ..Default::default() };
        let pinned = patch.with_pinned_board().unwrap();
        assert_eq!(pinned.target_length, Some(6));
        assert_eq!(pinned.difficulty, Some(Difficulty::Hard));

        let bad = SettingsPatch { grid_rows: Some(7), ..Default::default() };
        assert!(bad.with_pinned_board().is_err());
    }
}
