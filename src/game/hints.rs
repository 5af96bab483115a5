//! Hint Economy
//!
//! Five purchasable hints. Each purchase is billed through the session score;
//! the total is always recomputed from the hint state so nothing is charged
//! twice.
//!
//! | Hint          | Cost | Limit                                  |
//! |---------------|------|----------------------------------------|
//! | bagel(n)      | 2    | once per digit                         |
//! | not-bagel(n)  | 3    | once per digit                         |
//! | row-delta     | 4    | target_length + 1 (last one → signed)  |
//! | random-expose | 3    | until every digit is known             |
//! | row-sums      | 5    | grid_rows                              |

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::points::Points;
use crate::core::rng::DeterministicRng;
use crate::game::scratchpad::{ScratchColor, ScratchpadState};
use crate::game::settings::Settings;
use crate::game::Digit;

/// Kinds of purchasable hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    /// Confirm a digit is absent
    Bagel,
    /// Confirm a digit is present
    NotBagel,
    /// Reveal one more per-position distance
    RowDelta,
    /// Expose membership of a random unknown digit
    RandomExpose,
    /// Reveal the target sum of a random grid row
    RowSums,
}

/// Fixed cost table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintCosts {
    /// bagel(n)
    pub bagel: Points,
    /// not-bagel(n)
    pub not_bagel: Points,
    /// row-delta
    pub row_delta: Points,
    /// random-expose
    pub random_expose: Points,
    /// row-sums
    pub row_sums: Points,
}

impl HintCosts {
    /// The standard table.
    pub const STANDARD: HintCosts = HintCosts {
        bagel: Points::from_whole(2),
        not_bagel: Points::from_whole(3),
        row_delta: Points::from_whole(4),
        random_expose: Points::from_whole(3),
        row_sums: Points::from_whole(5),
    };

    /// Cost of one purchase of a kind.
    pub fn cost_of(&self, kind: HintKind) -> Points {
        match kind {
            HintKind::Bagel => self.bagel,
            HintKind::NotBagel => self.not_bagel,
            HintKind::RowDelta => self.row_delta,
            HintKind::RandomExpose => self.random_expose,
            HintKind::RowSums => self.row_sums,
        }
    }
}

impl Default for HintCosts {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Everything bought so far in the current session.
///
/// Grows monotonically; reset only by a new game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintState {
    /// Digits known to be absent
    pub bagel_numbers: BTreeSet<Digit>,
    /// Digits known to be present
    pub not_bagel_numbers: BTreeSet<Digit>,
    /// Row-delta purchases
    pub row_delta_hints: u8,
    /// Signed deltas unlocked
    pub show_actual_deltas: bool,
    /// Digits learned through random-expose (also in one of the sets above)
    pub random_exposed_numbers: BTreeSet<Digit>,
    /// Revealed grid rows and their target sums
    pub revealed_row_sums: BTreeMap<u8, u16>,
}

/// What a purchase revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HintReveal {
    /// Digit is absent
    Bagel {
        /// Digit
        digit: Digit,
    },
    /// Digit is present
    NotBagel {
        /// Digit
        digit: Digit,
    },
    /// Deltas visible for the first `positions` positions
    RowDelta {
        /// Positions revealed
        positions: u8,
        /// Signed deltas unlocked
        signed: bool,
    },
    /// Random digit exposed
    RandomExpose {
        /// Digit
        digit: Digit,
        /// Is it in the target?
        present: bool,
    },
    /// Target sum of a grid row
    RowSum {
        /// Row index
        row: u8,
        /// Sum of target digits in the row
        sum: u16,
    },
}

/// Why a purchase was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum HintError {
    /// bagel/not-bagel without a digit.
    #[error("hint needs a target number")]
    MissingNumber,

    /// Digit outside the board range.
    #[error("digit {0} is outside the board range")]
    NumberOutOfRange(Digit),

    /// Membership of the digit is already known.
    #[error("digit {0} is already known")]
    AlreadyKnown(Digit),

    /// bagel(n) on a digit that is in the target, or not-bagel(n) on one that isn't.
    #[error("digit {0} does not match the requested hint")]
    ClaimMismatch(Digit),

    /// No more purchases of this kind are possible.
    #[error("no {0:?} hints left")]
    Exhausted(HintKind),
}

impl HintState {
    /// Fresh state for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Is membership of this digit known?
    pub fn is_known(&self, digit: Digit) -> bool {
        self.bagel_numbers.contains(&digit) || self.not_bagel_numbers.contains(&digit)
    }

    /// Bagel digits bought directly (not via random-expose).
    pub fn direct_bagels(&self) -> usize {
        self.bagel_numbers.difference(&self.random_exposed_numbers).count()
    }

    /// Not-bagel digits bought directly (not via random-expose).
    pub fn direct_not_bagels(&self) -> usize {
        self.not_bagel_numbers.difference(&self.random_exposed_numbers).count()
    }

    /// Total points spent.
    ///
    /// Digits exposed by random-expose also sit in the bagel/not-bagel
    /// sets; they are billed once, as random-expose.
    pub fn total_cost(&self, costs: &HintCosts) -> Points {
        costs.bagel * self.direct_bagels() as i64
            + costs.not_bagel * self.direct_not_bagels() as i64
            + costs.row_delta * self.row_delta_hints as i64
            + costs.random_expose * self.random_exposed_numbers.len() as i64
            + costs.row_sums * self.revealed_row_sums.len() as i64
    }

    /// Number of purchases made.
    pub fn hints_used(&self) -> u32 {
        (self.direct_bagels()
            + self.direct_not_bagels()
            + self.row_delta_hints as usize
            + self.random_exposed_numbers.len()
            + self.revealed_row_sums.len()) as u32
    }

    /// Mask a guess's deltas down to what has been bought.
    ///
    /// Positions beyond the purchase count are `None`; revealed ones are
    /// absolute until signed deltas are unlocked.
    pub fn visible_deltas(&self, deltas: &[i8]) -> Vec<Option<i8>> {
        deltas.iter()
            .enumerate()
            .map(|(position, delta)| {
                if position < self.row_delta_hints as usize {
                    Some(if self.show_actual_deltas { *delta } else { delta.abs() })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Buy a hint.
    ///
    /// On error nothing changes: not the hint state, the scratchpad, or the RNG.
    pub fn purchase(
        &mut self,
        kind: HintKind,
        target_number: Option<Digit>,
        target: &[Digit],
        settings: &Settings,
        scratchpad: &mut ScratchpadState,
        rng: &mut DeterministicRng,
    ) -> Result<HintReveal, HintError> {
        match kind {
            HintKind::Bagel | HintKind::NotBagel => {
                let digit = target_number.ok_or(HintError::MissingNumber)?;
                if digit > settings.digit_range {
                    return Err(HintError::NumberOutOfRange(digit));
                }
                if self.is_known(digit) {
                    return Err(HintError::AlreadyKnown(digit));
                }
                let present = target.contains(&digit);
                match (kind, present) {
                    (HintKind::Bagel, false) => {
                        self.mark_membership(digit, false, scratchpad);
                        Ok(HintReveal::Bagel { digit })
                    }
                    (HintKind::NotBagel, true) => {
                        self.mark_membership(digit, true, scratchpad);
                        Ok(HintReveal::NotBagel { digit })
                    }
                    _ => Err(HintError::ClaimMismatch(digit)),
                }
            }
            HintKind::RowDelta => {
                let limit = settings.target_length + 1;
                if self.row_delta_hints >= limit {
                    return Err(HintError::Exhausted(kind));
                }
                self.row_delta_hints += 1;
                if self.row_delta_hints == limit {
                    self.show_actual_deltas = true;
                }
                Ok(HintReveal::RowDelta {
                    positions: self.row_delta_hints.min(settings.target_length),
                    signed: self.show_actual_deltas,
                })
            }
            HintKind::RandomExpose => {
                let candidates: Vec<Digit> = (0..=settings.digit_range)
                    .filter(|d| !self.is_known(*d))
                    .collect();
                let digit = *rng.choose(&candidates).ok_or(HintError::Exhausted(kind))?;
                let present = target.contains(&digit);
                self.random_exposed_numbers.insert(digit);
                self.mark_membership(digit, present, scratchpad);
                Ok(HintReveal::RandomExpose { digit, present })
            }
            HintKind::RowSums => {
                let candidates: Vec<u8> = (0..settings.grid_rows)
                    .filter(|r| !self.revealed_row_sums.contains_key(r))
                    .collect();
                let row = *rng.choose(&candidates).ok_or(HintError::Exhausted(kind))?;
                let columns = settings.grid_columns as usize;
                let start = row as usize * columns;
                let sum = target.iter()
                    .skip(start)
                    .take(columns)
                    .map(|d| *d as u16)
                    .sum();
                self.revealed_row_sums.insert(row, sum);
                Ok(HintReveal::RowSum { row, sum })
            }
        }
    }

    fn mark_membership(&mut self, digit: Digit, present: bool, scratchpad: &mut ScratchpadState) {
        if present {
            self.not_bagel_numbers.insert(digit);
            scratchpad.force(digit, ScratchColor::Present);
        } else {
            self.bagel_numbers.insert(digit);
            scratchpad.force(digit, ScratchColor::Absent);
        }
    }
}
