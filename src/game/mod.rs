//! Game Logic Module
//!
//! Everything that decides what a guess is worth. 100% deterministic: time
//! and entropy are handed in by the owning [`engine::Engine`].
//!
//! ## Module Structure
//!
//! - `settings`: Board shape, difficulty presets, validation
//! - `target`: Seeded target generation
//! - `feedback`: Guess evaluation and validation
//! - `scoring`: Score from guesses, time and hint spend
//! - `hints`: Hint economy
//! - `position`: Guess buffer, cursor and locks
//! - `state`: Session and engine state
//! - `action`: Dispatch vocabulary and rejections
//! - `reducer`: Pure state transitions
//! - `events`: What each transition did
//! - `engine`: Owning wrapper with clock, store and queries

pub mod settings;
pub mod target;
pub mod feedback;
pub mod scoring;
pub mod scratchpad;
pub mod hints;
pub mod position;
pub mod state;
pub mod stats;
pub mod leaderboard;
pub mod events;
pub mod action;
pub mod reducer;
pub mod engine;

/// A single target or guess digit, `0..=digit_range`.
pub type Digit = u8;

// Re-export key types
pub use action::{Action, Rejection};
pub use engine::Engine;
pub use events::GameEvent;
pub use feedback::{Feedback, evaluate_guess};
pub use hints::{HintKind, HintReveal};
pub use reducer::{reduce, ActionContext};
pub use settings::{Difficulty, Settings, SettingsPatch};
pub use state::{EngineState, GameSession, GameStatus, Guess};
