//! Fixed-Point Score Arithmetic
//!
//! Scores, hint costs and elapsed minutes are all expressed in hundredths of a
//! point. Two-decimal rounding is then exact and every client computes the
//! same score from the same inputs.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Points(i64) = value × 100                   │
//! │                                              │
//! │  91.5 points   → Points(9150)                │
//! │  1.5 minutes   → Points(150)                 │
//! │  Precision: 0.01                             │
//! └──────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Hundredths per whole point.
pub const POINTS_SCALE: i64 = 100;

/// A quantity of points with two decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(i64);

impl Points {
    /// 0.00
    pub const ZERO: Points = Points(0);

    /// 100.00, the starting score of every game.
    pub const MAX_SCORE: Points = Points(100 * POINTS_SCALE);

    /// Whole points.
    #[inline]
    pub const fn from_whole(points: i64) -> Self {
        Self(points * POINTS_SCALE)
    }

    /// Raw hundredths.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Raw hundredths.
    #[inline]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Convert to float for display.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / POINTS_SCALE as f64
    }

    /// Clamp into [lo, hi].
    #[inline]
    pub fn clamp_to(self, lo: Points, hi: Points) -> Points {
        Points(self.0.clamp(lo.0, hi.0))
    }

    /// Is this zero or below?
    #[inline]
    pub fn is_depleted(self) -> bool {
        self.0 <= 0
    }
}

impl Add for Points {
    type Output = Points;

    #[inline]
    fn add(self, rhs: Points) -> Points {
        Points(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Points {
    #[inline]
    fn add_assign(&mut self, rhs: Points) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Points {
    type Output = Points;

    #[inline]
    fn sub(self, rhs: Points) -> Points {
        Points(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<i64> for Points {
    type Output = Points;

    #[inline]
    fn mul(self, rhs: i64) -> Points {
        Points(self.0.saturating_mul(rhs))
    }
}

impl Neg for Points {
    type Output = Points;

    #[inline]
    fn neg(self) -> Points {
        Points(-self.0)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / POINTS_SCALE as u64, abs % POINTS_SCALE as u64)
    }
}
