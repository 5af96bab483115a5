//! The Reducer
//!
//! One function, one action, one committed transition. All time and entropy
//! arrive through [`ActionContext`]; the reducer reads no clock and no OS
//! randomness, so replaying the same actions with the same contexts rebuilds
//! the same state.
//!
//! Every branch validates before it mutates: a rejected action leaves the
//! state exactly as it was.

use crate::game::action::{Action, Rejection};
use crate::game::events::GameEvent;
use crate::game::feedback::{evaluate_guess, row_deltas, row_sums, validate_guess};
use crate::game::hints::HintState;
use crate::game::scoring::{compute_score, developer_forces_loss};
use crate::game::scratchpad::ScratchpadState;
use crate::game::state::{EngineState, GameSession, GameStatus, Guess};

/// Inputs from outside the state, read once per action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    /// Wall clock (ms since epoch)
    pub now_ms: u64,
    /// Fresh 64-bit entropy for unseeded games
    pub entropy: u64,
}

impl ActionContext {
    /// Context at a given time with fixed entropy.
    pub fn at(now_ms: u64, entropy: u64) -> Self {
        Self { now_ms, entropy }
    }
}

/// Apply one action.
///
/// Returns the events the transition produced, or why nothing changed.
pub fn reduce(
    state: &mut EngineState,
    action: Action,
    ctx: &ActionContext,
) -> Result<Vec<GameEvent>, Rejection> {
    match action {
        Action::StartNewGame => {
            let seed = state.settings.random_seed.unwrap_or(ctx.entropy);
            Ok(start_game(state, seed, false, ctx))
        }
        Action::StartMultiplayerGame { random_seed } => {
            Ok(start_game(state, random_seed, true, ctx))
        }
        Action::SetGuessDigit { position, digit } => {
            require_active(state)?;
            let range = state.settings.digit_range;
            state.session.buffer.set_digit(position, digit, range)?;
            Ok(vec![buffer_event(&state.session)])
        }
        Action::SetGuessDigitNoAdvance { position, digit } => {
            require_active(state)?;
            let range = state.settings.digit_range;
            state.session.buffer.set_digit_no_advance(position, digit, range)?;
            Ok(vec![buffer_event(&state.session)])
        }
        Action::AddDigitSequential { digit } => {
            require_active(state)?;
            let range = state.settings.digit_range;
            state.session.buffer.add_sequential(digit, range)?;
            Ok(vec![buffer_event(&state.session)])
        }
        Action::SubmitGuess => submit_guess(state, ctx),
        Action::TogglePositionLock { position } => {
            require_active(state)?;
            let locked = state.session.buffer.toggle_lock(position)?;
            Ok(vec![GameEvent::LockToggled { position, locked }])
        }
        Action::SetActivePosition { position } => {
            require_active(state)?;
            state.session.buffer.set_active(position)?;
            Ok(vec![buffer_event(&state.session)])
        }
        Action::MoveDigit { from, to } => {
            require_active(state)?;
            state.session.buffer.move_digit(from, to)?;
            Ok(vec![buffer_event(&state.session)])
        }
        Action::PurchaseHint { kind, target_number } => {
            require_active(state)?;
            let reveal = state.hints.purchase(
                kind,
                target_number,
                &state.session.target,
                &state.settings,
                &mut state.scratchpad,
                &mut state.session.rng,
            )?;
            state.session.score = state.score_at(ctx.now_ms);
            Ok(vec![GameEvent::HintPurchased {
                kind,
                reveal,
                total_cost: state.total_hint_cost(),
            }])
        }
        Action::UpdateSettings(patch) => {
            let next = state.settings.merged(&patch)?;
            let board_reset = state.session.status != GameStatus::Idle
                && state.settings.shape_differs(&next);
            state.settings = next;
            if board_reset {
                clear_game(state);
            }
            Ok(vec![GameEvent::SettingsUpdated { board_reset }])
        }
        Action::SetScratchpadColor { digit, color } => {
            if digit > state.settings.digit_range {
                return Err(Rejection::DigitOutOfRange(digit));
            }
            if !state.scratchpad.set_color(digit, color) {
                return Err(Rejection::ScratchpadLocked(digit));
            }
            Ok(vec![GameEvent::ScratchpadUpdated { digit }])
        }
        Action::ClearGameState => {
            clear_game(state);
            Ok(vec![GameEvent::GameCleared])
        }
        Action::SaveScore(entry) => {
            let rank = state.leaderboard.insert(entry);
            Ok(vec![GameEvent::ScoreSaved { rank }])
        }
    }
}

fn require_active(state: &EngineState) -> Result<(), Rejection> {
    if state.session.is_active() {
        Ok(())
    } else {
        Err(Rejection::NoActiveGame)
    }
}

fn buffer_event(session: &GameSession) -> GameEvent {
    GameEvent::GuessEdited {
        digits: session.buffer.digits.clone(),
        active_position: session.buffer.active_position,
    }
}

fn start_game(state: &mut EngineState, seed: u64, multiplayer: bool, ctx: &ActionContext) -> Vec<GameEvent> {
    state.session = GameSession::start(&state.settings, seed, multiplayer, ctx.now_ms);
    state.hints = HintState::new();
    state.scratchpad = ScratchpadState::new();
    vec![GameEvent::GameStarted { seed, multiplayer }]
}

fn clear_game(state: &mut EngineState) {
    state.session = GameSession::idle();
    state.hints = HintState::new();
    state.scratchpad = ScratchpadState::new();
}

fn submit_guess(state: &mut EngineState, ctx: &ActionContext) -> Result<Vec<GameEvent>, Rejection> {
    require_active(state)?;

    let settings = &state.settings;
    let digits = validate_guess(
        state.session.current_guess(),
        state.session.target.len(),
        settings.digit_range,
    )?;

    let feedback = evaluate_guess(&digits, &state.session.target);
    let guess = Guess {
        id: state.session.guesses.len() as u32 + 1,
        row_deltas: Some(row_deltas(&digits, &state.session.target)),
        row_sums: settings.multi_row_feedback.then(|| row_sums(&digits, settings.grid_columns)),
        digits,
        feedback,
        timestamp: ctx.now_ms,
    };
    let guess_id = guess.id;
    state.session.guesses.push(guess);

    let guess_count = state.session.guesses.len();
    let score = compute_score(
        guess_count,
        state.session.elapsed_minutes(ctx.now_ms),
        state.total_hint_cost(),
    );
    state.session.score = score;

    let mut events = vec![GameEvent::GuessSubmitted { guess_id, feedback, score }];

    let outcome = if feedback.is_winner {
        Some(GameStatus::Won)
    } else if score.is_depleted()
        || guess_count as u32 >= state.settings.max_guesses
        || developer_forces_loss(&state.settings, score)
    {
        Some(GameStatus::Lost)
    } else {
        None
    };

    match outcome {
        Some(status) => {
            state.session.status = status;
            state.session.end_time = Some(ctx.now_ms);
            let won = status == GameStatus::Won;
            state.stats.record(state.settings.difficulty, won, score, guess_count as u32);
            let guesses = guess_count as u32;
            events.push(if won {
                GameEvent::GameWon { score, guesses }
            } else {
                GameEvent::GameLost { score, guesses }
            });
        }
        None => {
            if state.settings.clear_guess_after_submit {
                state.session.buffer.clear_unlocked();
                events.push(buffer_event(&state.session));
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::points::Points;
    use crate::game::hints::HintKind;
    use crate::game::leaderboard::LeaderboardEntry;
    use crate::game::scratchpad::ScratchColor;
    use crate::game::settings::{Difficulty, Settings, SettingsPatch};

    // Easy board, seed 42 → target [4, 9, 0]
    fn easy_state() -> EngineState {
        let mut settings = Settings::for_difficulty(Difficulty::Easy);
        settings.random_seed = Some(42);
        let mut state = EngineState::new(settings);
        reduce(&mut state, Action::StartNewGame, &ActionContext::at(0, 0)).unwrap();
        state
    }

    fn enter(state: &mut EngineState, digits: &[u8], now_ms: u64) {
        for (position, digit) in digits.iter().enumerate() {
            reduce(
                state,
                Action::SetGuessDigit { position, digit: Some(*digit) },
                &ActionContext::at(now_ms, 0),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_new_game_uses_configured_seed() {
        let state = easy_state();
        assert_eq!(state.session.target, vec![4, 9, 0]);
        assert_eq!(state.session.seed, 42);
        assert!(state.session.is_active());
    }

    #[test]
    fn test_new_game_uses_entropy_without_seed() {
        let mut state = EngineState::new(Settings::default());
        let events = reduce(&mut state, Action::StartNewGame, &ActionContext::at(0, 1)).unwrap();
        assert_eq!(events, vec![GameEvent::GameStarted { seed: 1, multiplayer: false }]);
        assert_eq!(state.session.target, vec![8, 4, 7, 9]);
    }

    #[test]
    fn test_actions_rejected_when_idle() {
        let mut state = EngineState::new(Settings::default());
        let ctx = ActionContext::at(0, 0);
        assert_eq!(reduce(&mut state, Action::SubmitGuess, &ctx), Err(Rejection::NoActiveGame));
        assert_eq!(
            reduce(&mut state, Action::AddDigitSequential { digit: 1 }, &ctx),
            Err(Rejection::NoActiveGame),
        );
    }

    #[test]
    fn test_submit_and_win() {
        let mut state = easy_state();
        enter(&mut state, &[9, 4, 0], 1_000);
        let events = reduce(&mut state, Action::SubmitGuess, &ActionContext::at(6_000, 0)).unwrap();
        assert!(matches!(events[0], GameEvent::GuessSubmitted { guess_id: 1, .. }));
        assert!(state.session.is_active());
        // cleared after submit
        assert_eq!(state.session.current_guess(), &[None, None, None]);

        enter(&mut state, &[4, 9, 0], 7_000);
        let events = reduce(&mut state, Action::SubmitGuess, &ActionContext::at(12_000, 0)).unwrap();
        assert!(state.session.is_won());
        assert_eq!(state.session.end_time, Some(12_000));
        // 100 - 2 guesses - 0.2 min (12 s)
        assert_eq!(state.session.score, Points::from_hundredths(9780));
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameWon { guesses: 2, .. })));
        assert_eq!(state.stats.get(Difficulty::Easy).games_won, 1);

        // terminal until a new game
        assert_eq!(
            reduce(&mut state, Action::SubmitGuess, &ActionContext::at(13_000, 0)),
            Err(Rejection::NoActiveGame),
        );
    }

    #[test]
    fn test_invalid_guess_creates_no_record() {
        let mut state = easy_state();
        enter(&mut state, &[1, 1], 0);
        let before = state.clone();
        let result = reduce(&mut state, Action::SubmitGuess, &ActionContext::at(1_000, 0));
        assert!(matches!(result, Err(Rejection::Guess(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_guess_cap_loses() {
        let mut state = easy_state();
        reduce(
            &mut state,
            Action::UpdateSettings(SettingsPatch { max_guesses: Some(1), ..Default::default() }),
            &ActionContext::at(0, 0),
        )
        .unwrap();
        // shape unchanged, game survives
        assert!(state.session.is_active());

        enter(&mut state, &[1, 2, 3], 0);
        let events = reduce(&mut state, Action::SubmitGuess, &ActionContext::at(0, 0)).unwrap();
        assert_eq!(state.session.status, GameStatus::Lost);
        assert!(events.last().map_or(false, GameEvent::is_game_end));
        assert_eq!(state.stats.get(Difficulty::Easy).games_played, 1);
    }

    #[test]
    fn test_developer_threshold_loses() {
        let mut state = easy_state();
        state.settings.developer_mode = true;
        state.settings.developer_lose_score = Points::from_whole(99);
        enter(&mut state, &[1, 2, 3], 0);
        reduce(&mut state, Action::SubmitGuess, &ActionContext::at(0, 0)).unwrap();
        assert_eq!(state.session.status, GameStatus::Lost);
    }

    #[test]
    fn test_score_depletion_loses() {
        let mut state = easy_state();
        enter(&mut state, &[1, 2, 3], 0);
        // 100 minutes later
        reduce(&mut state, Action::SubmitGuess, &ActionContext::at(6_000_000, 0)).unwrap();
        assert_eq!(state.session.status, GameStatus::Lost);
        assert_eq!(state.session.score, Points::ZERO);
    }

    #[test]
    fn test_locked_positions_survive_submit() {
        let mut state = easy_state();
        enter(&mut state, &[4, 1, 2], 0);
        reduce(&mut state, Action::TogglePositionLock { position: 0 }, &ActionContext::at(0, 0)).unwrap();
        reduce(&mut state, Action::SubmitGuess, &ActionContext::at(0, 0)).unwrap();
        assert_eq!(state.session.current_guess(), &[Some(4), None, None]);
        assert_eq!(state.session.buffer.active_position, 1);
    }

    #[test]
    fn test_hint_purchase_updates_score() {
        let mut state = easy_state();
        let events = reduce(
            &mut state,
            Action::PurchaseHint { kind: HintKind::Bagel, target_number: Some(1) },
            &ActionContext::at(0, 0),
        )
        .unwrap();
        assert!(matches!(events[0], GameEvent::HintPurchased { .. }));
        assert_eq!(state.session.score, Points::from_whole(98));
        assert_eq!(state.scratchpad.color(1), ScratchColor::Absent);

        assert_eq!(
            reduce(
                &mut state,
                Action::SetScratchpadColor { digit: 1, color: ScratchColor::Present },
                &ActionContext::at(0, 0),
            ),
            Err(Rejection::ScratchpadLocked(1)),
        );
    }

    #[test]
    fn test_shape_change_drops_game() {
        let mut state = easy_state();
        let events = reduce(
            &mut state,
            Action::UpdateSettings(SettingsPatch { difficulty: Some(Difficulty::Hard), ..Default::default() }),
            &ActionContext::at(0, 0),
        )
        .unwrap();
        assert_eq!(events, vec![GameEvent::SettingsUpdated { board_reset: true }]);
        assert_eq!(state.session.status, GameStatus::Idle);
        assert_eq!(state.settings.target_length, 6);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut state = easy_state();
        let before = state.clone();
        let result = reduce(
            &mut state,
            Action::UpdateSettings(SettingsPatch { grid_rows: Some(4), ..Default::default() }),
            &ActionContext::at(0, 0),
        );
        assert!(matches!(result, Err(Rejection::Settings(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_clear_and_save_score() {
        let mut state = easy_state();
        reduce(&mut state, Action::ClearGameState, &ActionContext::at(0, 0)).unwrap();
        assert_eq!(state.session.status, GameStatus::Idle);
        assert!(state.session.target.is_empty());

        let entry = LeaderboardEntry {
            player_name: "ada".into(),
            score: Points::from_whole(91),
            guesses: 4,
            time_minutes: Points::from_whole(2),
            difficulty: Difficulty::Easy,
            timestamp: 0,
        };
        let events = reduce(&mut state, Action::SaveScore(entry), &ActionContext::at(0, 0)).unwrap();
        assert_eq!(events, vec![GameEvent::ScoreSaved { rank: Some(1) }]);
        assert_eq!(state.leaderboard.top(Difficulty::Easy).len(), 1);
    }

    #[test]
    fn test_multi_row_feedback_records_sums() {
        let mut settings = Settings::for_difficulty(Difficulty::Medium);
        settings.multi_row_feedback = true;
        let mut state = EngineState::new(settings);
        reduce(&mut state, Action::StartMultiplayerGame { random_seed: 1 }, &ActionContext::at(0, 0)).unwrap();
        assert!(state.session.multiplayer);

        enter(&mut state, &[1, 2, 3, 4], 0);
        reduce(&mut state, Action::SubmitGuess, &ActionContext::at(0, 0)).unwrap();
        let guess = &state.session.guesses[0];
        assert_eq!(guess.row_sums, Some(vec![3, 7]));
        // target [8, 4, 7, 9]
        assert_eq!(guess.row_deltas, Some(vec![7, 2, 4, 5]));
    }
}
