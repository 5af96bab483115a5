//! Guess buffer, cursor and position locks.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::feedback::has_duplicates;
use crate::game::Digit;

/// Why a buffer edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PositionError {
    /// Position index past the end.
    #[error("position {0} is out of range")]
    OutOfRange(usize),

    /// Position is locked.
    #[error("position {0} is locked")]
    Locked(usize),

    /// Locking an empty position.
    #[error("position {0} is empty")]
    Empty(usize),

    /// Locking while the buffer holds a repeated digit.
    #[error("guess contains duplicate digits")]
    Duplicates,

    /// Digit above the digit range.
    #[error("digit {0} is out of range")]
    DigitOutOfRange(Digit),
}

/// The in-progress guess.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessBuffer {
    /// One slot per target position
    pub digits: Vec<Option<Digit>>,
    /// Cursor for sequential entry
    pub active_position: usize,
    /// Positions kept across submissions and protected from edits
    pub locked_positions: BTreeSet<usize>,
}

impl GuessBuffer {
    /// Empty buffer of the given length.
    pub fn new(length: usize) -> Self {
        Self {
            digits: vec![None; length],
            active_position: 0,
            locked_positions: BTreeSet::new(),
        }
    }

    /// Buffer length.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Zero-length buffer (no game).
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Is this position locked?
    pub fn is_locked(&self, position: usize) -> bool {
        self.locked_positions.contains(&position)
    }

    /// Next unlocked position at or after `start`, wrapping to the front.
    ///
    /// If every position is locked, returns `start` clamped into range.
    pub fn next_unlocked_position(&self, start: usize) -> usize {
        let len = self.len();
        if len == 0 {
            return 0;
        }
        (start..len)
            .chain(0..start.min(len))
            .find(|p| !self.is_locked(*p))
            .unwrap_or_else(|| start.min(len - 1))
    }

    fn check_editable(&self, position: usize, digit: Option<Digit>, digit_range: u8) -> Result<(), PositionError> {
        if position >= self.len() {
            return Err(PositionError::OutOfRange(position));
        }
        if self.is_locked(position) {
            return Err(PositionError::Locked(position));
        }
        if let Some(d) = digit {
            if d > digit_range {
                return Err(PositionError::DigitOutOfRange(d));
            }
        }
        Ok(())
    }

    /// `SET_GUESS_DIGIT`: place (or clear) and advance past `position`.
    ///
    /// Clearing leaves the cursor where it is.
    pub fn set_digit(&mut self, position: usize, digit: Option<Digit>, digit_range: u8) -> Result<(), PositionError> {
        self.check_editable(position, digit, digit_range)?;
        self.digits[position] = digit;
        if digit.is_some() {
            self.active_position = self.next_unlocked_position((position + 1) % self.len());
        }
        Ok(())
    }

    /// `SET_GUESS_DIGIT_NO_ADVANCE`: place (or clear) without moving the cursor.
    pub fn set_digit_no_advance(&mut self, position: usize, digit: Option<Digit>, digit_range: u8) -> Result<(), PositionError> {
        self.check_editable(position, digit, digit_range)?;
        self.digits[position] = digit;
        Ok(())
    }

    /// `ADD_DIGIT_SEQUENTIAL`: place at the cursor and advance.
    pub fn add_sequential(&mut self, digit: Digit, digit_range: u8) -> Result<(), PositionError> {
        let position = self.active_position;
        self.set_digit(position, Some(digit), digit_range)
    }

    /// `TOGGLE_POSITION_LOCK`.
    ///
    /// Locking needs a digit at the position and a duplicate-free buffer.
    /// Locking the cursor position moves the cursor to the next unlocked one.
    pub fn toggle_lock(&mut self, position: usize) -> Result<bool, PositionError> {
        if position >= self.len() {
            return Err(PositionError::OutOfRange(position));
        }
        if self.locked_positions.remove(&position) {
            return Ok(false);
        }
        if self.digits[position].is_none() {
            return Err(PositionError::Empty(position));
        }
        if has_duplicates(&self.digits) {
            return Err(PositionError::Duplicates);
        }
        self.locked_positions.insert(position);
        if self.active_position == position {
            self.active_position = self.next_unlocked_position(position);
        }
        Ok(true)
    }

    /// `SET_ACTIVE_POSITION`.
    pub fn set_active(&mut self, position: usize) -> Result<(), PositionError> {
        if position >= self.len() {
            return Err(PositionError::OutOfRange(position));
        }
        if self.is_locked(position) {
            return Err(PositionError::Locked(position));
        }
        self.active_position = position;
        Ok(())
    }

    /// `MOVE_DIGIT`: swap two unlocked positions, cursor follows to `to`.
    pub fn move_digit(&mut self, from: usize, to: usize) -> Result<(), PositionError> {
        for position in [from, to] {
            if position >= self.len() {
                return Err(PositionError::OutOfRange(position));
            }
            if self.is_locked(position) {
                return Err(PositionError::Locked(position));
            }
        }
        self.digits.swap(from, to);
        self.active_position = to;
        Ok(())
    }

    /// Empty every unlocked position and put the cursor on the first unlocked one.
    pub fn clear_unlocked(&mut self) {
        for (position, slot) in self.digits.iter_mut().enumerate() {
            if !self.locked_positions.contains(&position) {
                *slot = None;
            }
        }
        self.active_position = self.next_unlocked_position(0);
    }
}
