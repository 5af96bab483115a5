//! Scoring
//!
//! `score = clamp(100 - guesses - elapsed_minutes - hint_cost, 0, 100)`
//!
//! Elapsed time is quantized to 200 ms ticks before conversion so a score
//! read twice within the same tick never flickers.

use crate::core::points::{Points, POINTS_SCALE};
use crate::game::settings::Settings;

/// Time quantum for elapsed-time scoring.
pub const SCORE_TICK_MS: u64 = 200;

/// Ticks per minute (60 000 ms / 200 ms).
pub const SCORE_TICKS_PER_MINUTE: u64 = 60_000 / SCORE_TICK_MS;

/// Whole 200 ms ticks between two instants. A clock running backwards
/// counts as zero.
#[inline]
pub fn elapsed_ticks(start_ms: u64, end_ms: u64) -> u64 {
    end_ms.saturating_sub(start_ms) / SCORE_TICK_MS
}

/// Elapsed minutes between two instants, rounded to the hundredth.
pub fn elapsed_minutes(start_ms: u64, end_ms: u64) -> Points {
    let ticks = elapsed_ticks(start_ms, end_ms) as i64;
    let per_minute = SCORE_TICKS_PER_MINUTE as i64;
    // round-half-up of ticks * 100 / 300
    Points::from_hundredths((ticks * POINTS_SCALE + per_minute / 2) / per_minute)
}

/// Score after `guess_count` guesses, `elapsed` minutes and `hint_cost`.
pub fn compute_score(guess_count: usize, elapsed: Points, hint_cost: Points) -> Points {
    let raw = Points::MAX_SCORE - Points::from_whole(guess_count as i64) - elapsed - hint_cost;
    raw.clamp_to(Points::ZERO, Points::MAX_SCORE)
}

/// Developer testing hook: force a loss at or below the configured score.
///
/// Not a gameplay rule; only active with `developer_mode`.
pub fn developer_forces_loss(settings: &Settings, score: Points) -> bool {
    settings.developer_mode && score <= settings.developer_lose_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_score() {
        // 2 guesses, 1.5 minutes, 5 hint points
        let elapsed = elapsed_minutes(0, 90_000);
        assert_eq!(elapsed, Points::from_hundredths(150));
        let score = compute_score(2, elapsed, Points::from_whole(5));
        assert_eq!(score.to_f64(), 91.5);
    }

    #[test]
    fn test_quantization() {
        // 199 ms is still zero ticks
        assert_eq!(elapsed_ticks(1_000, 1_199), 0);
        assert_eq!(elapsed_ticks(1_000, 1_200), 1);
        assert_eq!(elapsed_minutes(1_000, 1_199), Points::ZERO);
        // 6 s = 30 ticks = 0.1 min
        assert_eq!(elapsed_minutes(0, 6_000), Points::from_hundredths(10));
        // 1 tick = 0.00333 min → rounds to 0.00
        assert_eq!(elapsed_minutes(0, 200), Points::ZERO);
        // 2 ticks = 0.00667 min → rounds to 0.01
        assert_eq!(elapsed_minutes(0, 400), Points::from_hundredths(1));
    }

    #[test]
    fn test_backwards_clock() {
        assert_eq!(elapsed_minutes(5_000, 1_000), Points::ZERO);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(compute_score(0, Points::ZERO, Points::ZERO), Points::MAX_SCORE);
        assert_eq!(compute_score(150, Points::ZERO, Points::ZERO), Points::ZERO);
        assert_eq!(
            compute_score(1, Points::from_whole(200), Points::from_whole(10)),
            Points::ZERO,
        );
    }

    #[test]
    fn test_developer_hook() {
        let mut settings = Settings::default();
        settings.developer_lose_score = Points::from_whole(95);
        assert!(!developer_forces_loss(&settings, Points::from_whole(90)));

        settings.developer_mode = true;
        assert!(developer_forces_loss(&settings, Points::from_whole(90)));
        assert!(developer_forces_loss(&settings, Points::from_whole(95)));
        assert!(!developer_forces_loss(&settings, Points::from_whole(96)));
    }
}
