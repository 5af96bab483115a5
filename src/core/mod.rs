//! Core deterministic primitives.
//!
//! Everything a client needs to agree with every other client on the same
//! board: the seeded PRNG, fixed-point points and board fingerprints.

pub mod rng;
pub mod points;
pub mod hash;
pub mod clock;

// Re-export core types
pub use rng::{DeterministicRng, derive_game_seed};
pub use points::Points;
pub use hash::{BoardHash, board_fingerprint};
pub use clock::{Clock, ManualClock, SystemClock};
