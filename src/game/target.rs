//! Target generation.

use crate::core::rng::DeterministicRng;
use crate::game::settings::Settings;
use crate::game::Digit;

/// Draw `target_length` distinct digits from [0, digit_range].
///
/// Rejection sampling: draw, keep the digit if unused, repeat. Settings
/// validation guarantees enough distinct digits, so this terminates. The
/// draw sequence is part of the multiplayer protocol; changing it changes
/// every seeded board.
pub fn generate_target(settings: &Settings, rng: &mut DeterministicRng) -> Vec<Digit> {
    let length = settings.target_length as usize;
    let mut used = [false; 256];
    let mut target = Vec::with_capacity(length);

    while target.len() < length {
        let digit = rng.next_digit(settings.digit_range);
        if !used[digit as usize] {
            used[digit as usize] = true;
            target.push(digit);
        }
    }

    target
}

/// Generate the target for a seed with a fresh generator.
///
/// Returns the generator too, positioned after the target draws, so hint
/// randomness continues the same stream.
pub fn seeded_target(settings: &Settings, seed: u64) -> (Vec<Digit>, DeterministicRng) {
    let mut rng = DeterministicRng::new(seed);
    let target = generate_target(settings, &mut rng);
    (target, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::settings::Difficulty;

    #[test]
    fn test_target_distinct_and_in_range() {
        for difficulty in Difficulty::ALL {
            let settings = Settings::for_difficulty(difficulty);
            for seed in 0..200 {
                let (target, _) = seeded_target(&settings, seed);
                assert_eq!(target.len(), settings.target_length as usize);
                let mut sorted = target.clone();
                sorted.sort_unstable();
                sorted.dedup();
                assert_eq!(sorted.len(), target.len());
                assert!(target.iter().all(|d| *d <= settings.digit_range));
            }
        }
    }

    #[test]
    fn test_seeded_known_targets() {
        // Cross-client regression values. Never change these.
        let easy = Settings::for_difficulty(Difficulty::Easy);
        assert_eq!(seeded_target(&easy, 42).0, vec![4, 9, 0]);
        assert_eq!(seeded_target(&easy, 12345).0, vec![1, 8, 4]);

        let medium = Settings::for_difficulty(Difficulty::Medium);
        assert_eq!(seeded_target(&medium, 1).0, vec![8, 4, 7, 9]);

        let expert = Settings::for_difficulty(Difficulty::Expert);
        assert_eq!(seeded_target(&expert, 2024).0, vec![3, 7, 6, 1, 5, 9, 0, 4, 2]);
    }

    #[test]
    fn test_full_range_permutation() {
        // digit_range == target_length - 1 forces a permutation of 0..=n
        let settings = Settings {
            target_length: 4,
            grid_rows: 1,
            grid_columns: 4,
            digit_range: 3,
            ..Settings::default()
        };
        let (mut target, _) = seeded_target(&settings, 99);
        target.sort_unstable();
        assert_eq!(target, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stream_continues_after_target() {
        let settings = Settings::default();
        let (_, mut rng_a) = seeded_target(&settings, 7);
        let (_, mut rng_b) = seeded_target(&settings, 7);
        assert_eq!(rng_a.next_u64(), rng_b.next_u64());
    }
}
