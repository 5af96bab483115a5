//! Owning engine.
//!
//! Wraps [`EngineState`] with a clock, an entropy source and an optional
//! store. Each dispatch reads the clock once, runs the pure reducer, logs the
//! outcome and persists the result.

use tracing::{debug, info, warn};

use crate::core::clock::{Clock, SystemClock};
use crate::core::hash::{short_hex, BoardHash};
use crate::core::points::Points;
use crate::core::rng::seed_from_entropy;
use crate::game::action::{Action, Rejection};
use crate::game::events::GameEvent;
use crate::game::feedback::validate_guess;
use crate::game::leaderboard::LeaderboardEntry;
use crate::game::reducer::{reduce, ActionContext};
use crate::game::settings::{Difficulty, Settings};
use crate::game::state::{EngineState, GameSession};
use crate::game::stats::DifficultyStats;
use crate::storage::{load_state, save_state, Store, StorageError};

/// Single-writer game engine.
pub struct Engine {
    state: EngineState,
    clock: Box<dyn Clock>,
    store: Option<Box<dyn Store>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl Engine {
    /// In-memory engine on the system clock.
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(EngineState::new(settings), Box::new(SystemClock))
    }

    /// Engine over existing state with a custom clock.
    pub fn with_clock(state: EngineState, clock: Box<dyn Clock>) -> Self {
        Self { state, clock, store: None }
    }

    /// Load from a store (defaults on any problem) and keep saving to it.
    pub fn open(store: Box<dyn Store>, clock: Box<dyn Clock>) -> Self {
        let state = load_state(store.as_ref());
        Self { state, clock, store: Some(store) }
    }

    /// Full state, read-only.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Current session.
    pub fn session(&self) -> &GameSession {
        &self.state.session
    }

    /// Current time on the engine's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Apply one action with fresh time and entropy.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<GameEvent>, Rejection> {
        let ctx = ActionContext {
            now_ms: self.clock.now_ms(),
            entropy: seed_from_entropy(uuid::Uuid::new_v4().as_bytes()),
        };
        self.dispatch_with(action, &ctx)
    }

    /// Apply one action with an explicit context (replays, tests).
    pub fn dispatch_with(
        &mut self,
        action: Action,
        ctx: &ActionContext,
    ) -> Result<Vec<GameEvent>, Rejection> {
        let name = action.name();
        match reduce(&mut self.state, action, ctx) {
            Ok(events) => {
                self.log_events(&events);
                self.autosave();
                Ok(events)
            }
            Err(rejection) => {
                debug!("{} rejected: {}", name, rejection);
                Err(rejection)
            }
        }
    }

    fn log_events(&self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::GameStarted { seed, multiplayer } => info!(
                    "Game started: seed={} multiplayer={} board={}",
                    seed,
                    multiplayer,
                    short_hex(&self.fingerprint()),
                ),
                GameEvent::GameWon { score, guesses } => {
                    info!("Game won: score={} guesses={}", score, guesses)
                }
                GameEvent::GameLost { score, guesses } => {
                    info!("Game lost: score={} guesses={}", score, guesses)
                }
                GameEvent::SettingsUpdated { board_reset: true } => {
                    info!("Board shape changed, current game dropped")
                }
                other => debug!("{:?}", other),
            }
        }
    }

    fn autosave(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to save state: {}", e);
        }
    }

    /// Save now. A no-op without a store.
    pub fn persist(&self) -> Result<(), StorageError> {
        match &self.store {
            Some(store) => save_state(store.as_ref(), &self.state),
            None => Ok(()),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Is the current guess complete, distinct and in range?
    pub fn is_guess_valid(&self) -> bool {
        let session = &self.state.session;
        !session.target.is_empty()
            && validate_guess(
                session.current_guess(),
                session.target.len(),
                self.state.settings.digit_range,
            )
            .is_ok()
    }

    /// Would `SUBMIT_GUESS` be accepted now?
    pub fn can_submit_guess(&self) -> bool {
        self.state.session.is_active() && self.is_guess_valid()
    }

    /// Hint points spent this session.
    pub fn total_hint_cost(&self) -> Points {
        self.state.total_hint_cost()
    }

    /// Minutes since the game started, frozen once it ends.
    pub fn game_time_minutes(&self) -> f64 {
        self.state.session.elapsed_minutes(self.clock.now_ms()).to_f64()
    }

    /// Live score.
    pub fn current_score(&self) -> Points {
        self.state.score_at(self.clock.now_ms())
    }

    /// Row deltas of a submitted guess, masked to what hints revealed.
    pub fn visible_row_deltas(&self, guess_index: usize) -> Option<Vec<Option<i8>>> {
        let guess = self.state.session.guesses.get(guess_index)?;
        let deltas = guess.row_deltas.as_ref()?;
        Some(self.state.hints.visible_deltas(deltas))
    }

    /// Stats for one difficulty.
    pub fn stats(&self, difficulty: Difficulty) -> DifficultyStats {
        self.state.stats.get(difficulty)
    }

    /// Leaderboard for one difficulty, best first.
    pub fn leaderboard(&self, difficulty: Difficulty) -> &[LeaderboardEntry] {
        self.state.leaderboard.top(difficulty)
    }

    /// Fingerprint of the current board.
    pub fn fingerprint(&self) -> BoardHash {
        self.state.session.fingerprint(&self.state.settings)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::clock::ManualClock;
    use crate::game::hints::HintKind;
    use crate::storage::MemoryStore;

    fn easy_engine(clock: &ManualClock) -> Engine {
        let mut settings = Settings::for_difficulty(Difficulty::Easy);
        settings.random_seed = Some(42);
        Engine::with_clock(EngineState::new(settings), Box::new(clock.clone()))
    }

    fn type_guess(engine: &mut Engine, digits: &[u8]) {
        for digit in digits {
            engine.dispatch(Action::AddDigitSequential { digit: *digit }).unwrap();
        }
    }

    #[test]
    fn test_queries_follow_the_game() {
        let clock = ManualClock::new(0);
        let mut engine = easy_engine(&clock);
        assert!(!engine.can_submit_guess());
        assert!(!engine.is_guess_valid());

        engine.dispatch(Action::StartNewGame).unwrap();
        assert_eq!(engine.session().target, vec![4, 9, 0]);
        type_guess(&mut engine, &[1, 2]);
        assert!(!engine.can_submit_guess());
        type_guess(&mut engine, &[3]);
        assert!(engine.can_submit_guess());

        clock.advance_ms(90_000);
        assert!((engine.game_time_minutes() - 1.5).abs() < 1e-9);
        assert_eq!(engine.current_score(), Points::from_hundredths(9850));
    }

    #[test]
    fn test_game_time_frozen_after_win() {
        let clock = ManualClock::new(0);
        let mut engine = easy_engine(&clock);
        engine.dispatch(Action::StartNewGame).unwrap();
        clock.advance_ms(60_000);
        type_guess(&mut engine, &[4, 9, 0]);
        engine.dispatch(Action::SubmitGuess).unwrap();
        assert!(engine.session().is_won());

        clock.advance_ms(600_000);
        assert!((engine.game_time_minutes() - 1.0).abs() < 1e-9);
        assert_eq!(engine.current_score(), Points::from_whole(98));
        assert_eq!(engine.stats(Difficulty::Easy).games_won, 1);
    }

    #[test]
    fn test_visible_row_deltas_follow_purchases() {
        let clock = ManualClock::new(0);
        let mut engine = easy_engine(&clock);
        engine.dispatch(Action::StartNewGame).unwrap();
        type_guess(&mut engine, &[6, 3, 1]);
        engine.dispatch(Action::SubmitGuess).unwrap();

        // target [4, 9, 0] - guess [6, 3, 1] = [-2, 6, -1]
        assert_eq!(engine.visible_row_deltas(0), Some(vec![None, None, None]));
        engine.dispatch(Action::PurchaseHint { kind: HintKind::RowDelta, target_number: None }).unwrap();
        assert_eq!(engine.visible_row_deltas(0), Some(vec![Some(2), None, None]));
        assert_eq!(engine.total_hint_cost(), Points::from_whole(4));
        assert_eq!(engine.visible_row_deltas(5), None);
    }

    #[test]
    fn test_rejection_leaves_state() {
        let clock = ManualClock::new(0);
        let mut engine = easy_engine(&clock);
        let before = engine.state().clone();
        assert_eq!(engine.dispatch(Action::SubmitGuess), Err(Rejection::NoActiveGame));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_unseeded_games_differ() {
        let clock = ManualClock::new(0);
        let mut engine = Engine::with_clock(EngineState::default(), Box::new(clock));
        engine.dispatch(Action::StartNewGame).unwrap();
        let first = engine.session().seed;
        engine.dispatch(Action::StartNewGame).unwrap();
        assert_ne!(first, engine.session().seed);
    }

    #[test]
    fn test_autosave_and_reopen() {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(5_000);

        let mut engine = Engine::open(Box::new(store.clone()), Box::new(clock.clone()));
        engine.dispatch(Action::StartMultiplayerGame { random_seed: 7 }).unwrap();
        engine.dispatch(Action::AddDigitSequential { digit: 3 }).unwrap();
        let saved = engine.state().clone();

        let reopened = Engine::open(Box::new(store), Box::new(clock));
        assert_eq!(reopened.state(), &saved);
        assert_eq!(reopened.fingerprint(), engine.fingerprint());
    }
}
