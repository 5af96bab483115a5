//! Scratchpad annotations.
//!
//! Advisory per-digit colors the player sets while reasoning. Digits whose
//! membership was bought as a hint are forced and locked.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};

use crate::game::Digit;

/// Annotation color for a digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ScratchColor {
    /// No annotation
    #[default]
    Unmarked,
    /// Believed absent
    Absent,
    /// Believed present
    Present,
    /// Undecided
    Maybe,
}

/// Per-digit colors plus hint-locked digits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchpadState {
    colors: BTreeMap<Digit, ScratchColor>,
    locked: BTreeSet<Digit>,
}

impl ScratchpadState {
    /// Empty scratchpad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Color of a digit (`Unmarked` if never set).
    pub fn color(&self, digit: Digit) -> ScratchColor {
        self.colors.get(&digit).copied().unwrap_or_default()
    }

    /// Was this digit forced by a hint?
    pub fn is_locked(&self, digit: Digit) -> bool {
        self.locked.contains(&digit)
    }

    /// Manual edit. Returns false for hint-locked digits.
    pub fn set_color(&mut self, digit: Digit, color: ScratchColor) -> bool {
        if self.is_locked(digit) {
            return false;
        }
        if color == ScratchColor::Unmarked {
            self.colors.remove(&digit);
        } else {
            self.colors.insert(digit, color);
        }
        true
    }

    /// Hint-driven edit: sets the color and locks the digit.
    pub fn force(&mut self, digit: Digit, color: ScratchColor) {
        self.colors.insert(digit, color);
        self.locked.insert(digit);
    }

    /// Iterate over annotated digits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Digit, ScratchColor)> + '_ {
        self.colors.iter().map(|(d, c)| (*d, *c))
    }
}
