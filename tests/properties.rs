//! Property-based tests for core game mechanics.

use proptest::prelude::*;

use pico_fermi::core::points::Points;
use pico_fermi::game::feedback::{evaluate_guess, validate_guess};
use pico_fermi::game::hints::{HintCosts, HintKind};
use pico_fermi::game::position::{GuessBuffer, PositionError};
use pico_fermi::game::reducer::{reduce, ActionContext};
use pico_fermi::game::scoring::compute_score;
use pico_fermi::game::settings::{Difficulty, Settings};
use pico_fermi::game::state::EngineState;
use pico_fermi::game::target::seeded_target;
use pico_fermi::Action;

/// Strategy: a valid board shape (rows x cols <= 9, range 9).
fn settings_strategy() -> impl Strategy<Value = Settings> {
    (1u8..=3, 1u8..=3).prop_map(|(rows, cols)| Settings {
        target_length: rows * cols,
        digit_range: 9,
        grid_rows: rows,
        grid_columns: cols,
        difficulty: Difficulty::Custom,
        ..Settings::default()
    })
}

/// Strategy: a hint purchase.
fn hint_strategy() -> impl Strategy<Value = (HintKind, Option<u8>)> {
    (
        prop::sample::select(vec![
            HintKind::Bagel,
            HintKind::NotBagel,
            HintKind::RowDelta,
            HintKind::RandomExpose,
            HintKind::RowSums,
        ]),
        prop::option::of(0u8..=9),
    )
}

proptest! {
    // 1. Targets have the right length, distinct digits, all in range
    #[test]
    fn target_distinct_in_range(settings in settings_strategy(), seed in any::<u64>()) {
        let (target, _) = seeded_target(&settings, seed);
        prop_assert_eq!(target.len(), settings.target_length as usize);
        prop_assert!(target.iter().all(|d| *d <= settings.digit_range));
        let mut sorted = target.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), target.len());
    }

    // 2. Seeded generation is deterministic
    #[test]
    fn target_deterministic(settings in settings_strategy(), seed in any::<u64>()) {
        prop_assert_eq!(seeded_target(&settings, seed).0, seeded_target(&settings, seed).0);
    }

    // 3. Feedback partitions the positions; winner iff all fermi
    #[test]
    fn feedback_partitions(settings in settings_strategy(), a in any::<u64>(), b in any::<u64>()) {
        let (target, _) = seeded_target(&settings, a);
        let (guess, _) = seeded_target(&settings, b);
        let feedback = evaluate_guess(&guess, &target);
        let total = feedback.picos as usize + feedback.fermis as usize + feedback.bagels as usize;
        prop_assert_eq!(total, target.len());
        prop_assert_eq!(feedback.is_winner, feedback.fermis as usize == target.len());
        prop_assert_eq!(feedback.is_winner, guess == target);
    }

    // 4. Score stays within [0, 100]
    #[test]
    fn score_bounded(guesses in 0usize..500, elapsed in 0i64..1_000_000, hints in 0i64..20_000) {
        let score = compute_score(guesses, Points::from_hundredths(elapsed), Points::from_hundredths(hints));
        prop_assert!(score >= Points::ZERO && score <= Points::MAX_SCORE, "score={score}");
    }

    // 5. Each accepted purchase bills exactly its own cost
    #[test]
    fn hints_billed_once(seed in any::<u64>(), purchases in prop::collection::vec(hint_strategy(), 0..30)) {
        let mut state = EngineState::new(Settings::for_difficulty(Difficulty::Hard));
        let ctx = ActionContext::at(0, seed);
        reduce(&mut state, Action::StartNewGame, &ctx).unwrap();

        let mut expected = Points::ZERO;
        for (kind, target_number) in purchases {
            let before = state.clone();
            match reduce(&mut state, Action::PurchaseHint { kind, target_number }, &ctx) {
                Ok(_) => expected += HintCosts::STANDARD.cost_of(kind),
                Err(_) => {
                    prop_assert_eq!(&state, &before);
                }
            }
            prop_assert_eq!(state.total_hint_cost(), expected);
        }
    }

    // 6. Locking is refused while the buffer holds a duplicate
    #[test]
    fn lock_refused_with_duplicates(digit in 0u8..=9, spare in 0u8..=9, position in 0usize..3) {
        let mut buffer = GuessBuffer::new(3);
        buffer.set_digit_no_advance(0, Some(digit), 9).unwrap();
        buffer.set_digit_no_advance(1, Some(digit), 9).unwrap();
        buffer.set_digit_no_advance(2, Some(spare), 9).unwrap();
        prop_assert_eq!(buffer.toggle_lock(position), Err(PositionError::Duplicates));
        prop_assert!(buffer.locked_positions.is_empty());
        prop_assert!(validate_guess(&buffer.digits, 3, 9).is_err());
    }

    // 7. next_unlocked never lands on a lock unless everything is locked
    #[test]
    fn next_unlocked_skips_locks(locks in prop::collection::btree_set(0usize..6, 0..=6), start in 0usize..6) {
        let mut buffer = GuessBuffer::new(6);
        buffer.locked_positions = locks.clone();
        let next = buffer.next_unlocked_position(start);
        prop_assert!(next < 6);
        if locks.len() < 6 {
            prop_assert!(!locks.contains(&next));
        } else {
            prop_assert_eq!(next, start);
        }
    }
}
