//! Guess evaluation and validation.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::Digit;

/// Result of evaluating one guess against the target.
///
/// `picos + fermis + bagels` always equals the target length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Right digit, wrong position
    pub picos: u8,
    /// Right digit, right position
    pub fermis: u8,
    /// Digit not in the target
    pub bagels: u8,
    /// Every position is a fermi
    pub is_winner: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Fermi,
    Pico,
    Bagel,
}

#[inline]
fn mark_position(target: &[Digit], position: usize, digit: Digit) -> Mark {
    if target.get(position) == Some(&digit) {
        Mark::Fermi
    } else if target.contains(&digit) {
        Mark::Pico
    } else {
        Mark::Bagel
    }
}

/// Evaluate a full guess.
///
/// The guess is expected to be validated (same length, no repeats); a
/// repeated digit would be counted once per position.
pub fn evaluate_guess(guess: &[Digit], target: &[Digit]) -> Feedback {
    let mut picos = 0u8;
    let mut fermis = 0u8;
    let mut bagels = 0u8;

    for (position, digit) in guess.iter().enumerate() {
        match mark_position(target, position, *digit) {
            Mark::Fermi => fermis += 1,
            Mark::Pico => picos += 1,
            Mark::Bagel => bagels += 1,
        }
    }

    Feedback {
        picos,
        fermis,
        bagels,
        is_winner: fermis as usize == target.len(),
    }
}

/// Why a guess buffer cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GuessError {
    /// Buffer length differs from the target length.
    #[error("guess has {actual} positions, expected {expected}")]
    WrongLength {
        /// Expected length
        expected: usize,
        /// Buffer length
        actual: usize,
    },

    /// A position is empty.
    #[error("position {0} is empty")]
    EmptyPosition(usize),

    /// A digit appears twice.
    #[error("digit {0} appears more than once")]
    DuplicateDigit(Digit),

    /// A digit is above the digit range.
    #[error("digit {digit} is outside 0..={digit_range}")]
    OutOfRange {
        /// Offending digit
        digit: Digit,
        /// Allowed maximum
        digit_range: u8,
    },
}

/// Validate a guess buffer and return the digits.
pub fn validate_guess(
    buffer: &[Option<Digit>],
    target_length: usize,
    digit_range: u8,
) -> Result<Vec<Digit>, GuessError> {
    if buffer.len() != target_length {
        return Err(GuessError::WrongLength { expected: target_length, actual: buffer.len() });
    }

    let mut seen = [false; 256];
    let mut digits = Vec::with_capacity(buffer.len());

    for (position, slot) in buffer.iter().enumerate() {
        let digit = slot.ok_or(GuessError::EmptyPosition(position))?;
        if digit > digit_range {
            return Err(GuessError::OutOfRange { digit, digit_range });
        }
        if seen[digit as usize] {
            return Err(GuessError::DuplicateDigit(digit));
        }
        seen[digit as usize] = true;
        digits.push(digit);
    }

    Ok(digits)
}

/// Does the buffer hold any digit twice? Empty positions are ignored.
pub fn has_duplicates(buffer: &[Option<Digit>]) -> bool {
    let mut seen = [false; 256];
    for digit in buffer.iter().flatten() {
        if seen[*digit as usize] {
            return true;
        }
        seen[*digit as usize] = true;
    }
    false
}

/// Signed per-position distance `target[i] - guess[i]`, saturating at the `i8` bounds.
pub fn row_deltas(guess: &[Digit], target: &[Digit]) -> Vec<i8> {
    guess.iter()
        .zip(target.iter())
        .map(|(g, t)| {
            let delta = i16::from(*t) - i16::from(*g);
            delta.clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8
        })
        .collect()
}

/// Sum of digits in each grid row.
pub fn row_sums(digits: &[Digit], grid_columns: u8) -> Vec<u16> {
    if grid_columns == 0 {
        return Vec::new();
    }
    digits.chunks(grid_columns as usize)
        .map(|row| row.iter().map(|d| *d as u16).sum())
        .collect()
}
