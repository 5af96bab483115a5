//! Board Fingerprints
//!
//! Provides deterministic hashing of a board for:
//! - Confirming that multiplayer clients race on the same target
//! - Logging a board without printing the secret digits

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type BoardHash = [u8; 32];

/// Deterministic hasher with helpers for board fields.
///
/// Order of updates is critical for determinism.
pub struct BoardHasher {
    hasher: Sha256,
}

impl BoardHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for board fingerprints.
    pub fn for_board() -> Self {
        Self::new(b"PFB_BOARD_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> BoardHash {
        self.hasher.finalize().into()
    }
}

/// Fingerprint a board: seed, shape and target digits.
///
/// Two clients with equal fingerprints are solving the same puzzle.
pub fn board_fingerprint(
    seed: u64,
    target_length: u8,
    digit_range: u8,
    target: &[u8],
) -> BoardHash {
    let mut hasher = BoardHasher::for_board();
    hasher.update_u64(seed);
    hasher.update_u8(target_length);
    hasher.update_u8(digit_range);
    // Length prefix keeps [1, 2] + [3] distinct from [1] + [2, 3]
    hasher.update_u8(target.len() as u8);
    hasher.update_bytes(target);
    hasher.finalize()
}

/// Short hex form for log lines.
pub fn short_hex(hash: &BoardHash) -> String {
    hex::encode(&hash[..6])
}
