//! # Pico Fermi Bagel Engine
//!
//! Deterministic game-state engine for Pico/Fermi/Bagel, the digit-guessing
//! Mastermind variant, with seeded multiplayer parity.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PICO FERMI BAGEL ENGINE                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG, seed derivation        │
//! │  ├── points.rs   - Fixed-point score (hundredths)            │
//! │  ├── hash.rs     - Board fingerprints                        │
//! │  └── clock.rs    - Wall clock and manual clock               │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── target.rs   - Seeded target generation                  │
//! │  ├── feedback.rs - Guess evaluation and validation           │
//! │  ├── scoring.rs  - Score from guesses, time, hints           │
//! │  ├── hints.rs    - Hint economy                              │
//! │  ├── position.rs - Guess buffer, cursor and locks            │
//! │  ├── reducer.rs  - Pure action -> state transitions          │
//! │  └── engine.rs   - Owning engine and query surface           │
//! │                                                              │
//! │  storage/        - Persistence blob and stores               │
//! │                                                              │
//! │  network/        - Remote service (non-deterministic)        │
//! │  ├── remote.rs   - Service contract, loopback service        │
//! │  ├── retry.rs    - Bounded exponential backoff               │
//! │  ├── coordinator.rs - Shared seed, pulses, ranking           │
//! │  └── ws.rs       - WebSocket client and relay                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in scoring
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No clock reads inside the reducer
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and board shape, every client generates the
//! **identical target** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod storage;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use crate::core::points::Points;
pub use crate::core::rng::DeterministicRng;
pub use crate::game::action::{Action, Rejection};
pub use crate::game::engine::Engine;
pub use crate::game::events::GameEvent;
pub use crate::game::settings::{Difficulty, Settings};
pub use crate::config::EngineConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
