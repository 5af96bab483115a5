//! Persistence
//!
//! Settings, stats, leaderboards and the in-progress game are saved as a
//! versioned JSON blob through a [`Store`]. Loading never fails the caller:
//! a missing, corrupt or foreign blob falls back to defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::game::Digit;
use crate::game::feedback::has_duplicates;
use crate::game::hints::HintState;
use crate::game::leaderboard::Leaderboard;
use crate::game::scratchpad::ScratchpadState;
use crate::game::settings::Settings;
use crate::game::state::{EngineState, GameSession, GameStatus};
use crate::game::stats::StatsBook;

/// Current blob format version.
pub const BLOB_VERSION: u32 = 1;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Blob is not valid JSON for this format.
    #[error("blob is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Blob written by an unknown format version.
    #[error("unsupported blob version {0}")]
    UnsupportedVersion(u32),

    /// Stored settings break an invariant.
    #[error("stored settings are invalid: {0}")]
    InvalidSettings(#[from] crate::game::settings::SettingsError),

    /// Store lock poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Byte-level storage backend.
pub trait Store: Send + Sync {
    /// Read the blob, `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the blob.
    fn save(&self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Blob in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write-then-rename so a crash never leaves half a blob
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Blob in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with bytes.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { blob: Mutex::new(Some(bytes)) }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let blob = self.blob.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(blob.clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut blob = self.blob.lock().map_err(|_| StorageError::Poisoned)?;
        *blob = Some(bytes.to_vec());
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load()
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).save(bytes)
    }
}

/// In-progress game saved alongside the settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Session
    pub session: GameSession,
    /// Hints bought
    pub hints: HintState,
    /// Annotations
    pub scratchpad: ScratchpadState,
}

/// On-disk format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBlob {
    /// Format version
    pub version: u32,
    /// Settings
    pub settings: Settings,
    /// Stats by difficulty
    #[serde(default)]
    pub stats: StatsBook,
    /// Leaderboard by difficulty
    #[serde(default)]
    pub leaderboard: Leaderboard,
    /// In-progress game, if any
    #[serde(default)]
    pub game: Option<SavedGame>,
}

/// Encode the persistent parts of the state.
pub fn encode_state(state: &EngineState) -> Result<Vec<u8>, StorageError> {
    let game = (state.session.status != GameStatus::Idle).then(|| SavedGame {
        session: state.session.clone(),
        hints: state.hints.clone(),
        scratchpad: state.scratchpad.clone(),
    });
    let blob = PersistedBlob {
        version: BLOB_VERSION,
        settings: state.settings.clone(),
        stats: state.stats.clone(),
        leaderboard: state.leaderboard.clone(),
        game,
    };
    Ok(serde_json::to_vec(&blob)?)
}

/// Decode a blob, strictly.
pub fn decode_state(bytes: &[u8]) -> Result<EngineState, StorageError> {
    let blob: PersistedBlob = serde_json::from_slice(bytes)?;
    if blob.version != BLOB_VERSION {
        return Err(StorageError::UnsupportedVersion(blob.version));
    }
    blob.settings.validate()?;

    let mut state = EngineState::new(blob.settings);
    state.stats = blob.stats;
    state.leaderboard = blob.leaderboard;

    if let Some(game) = blob.game {
        match saved_game_problem(&game, &state.settings) {
            None => {
                state.session = game.session;
                state.hints = game.hints;
                state.scratchpad = game.scratchpad;
            }
            Some(problem) => warn!("Discarding saved game: {}", problem),
        }
    }

    Ok(state)
}

/// Why a saved game can't be resumed under these settings, if it can't.
fn saved_game_problem(game: &SavedGame, settings: &Settings) -> Option<&'static str> {
    let session = &game.session;
    let length = settings.target_length as usize;
    let in_range = |d: &Digit| *d <= settings.digit_range;

    if session.target.len() != length || session.buffer.len() != length {
        return Some("board shape differs from the saved settings");
    }
    if !session.target.iter().all(in_range) {
        return Some("target digit out of range");
    }
    if has_duplicates(&session.target.iter().copied().map(Some).collect::<Vec<_>>()) {
        return Some("target repeats a digit");
    }
    if !session.buffer.digits.iter().flatten().all(in_range) {
        return Some("guess digit out of range");
    }
    if session.buffer.active_position >= length
        || session.buffer.locked_positions.iter().any(|p| *p >= length)
    {
        return Some("cursor or lock outside the board");
    }
    if session.guesses.iter().any(|g| g.digits.len() != length || !g.digits.iter().all(in_range)) {
        return Some("recorded guess does not fit the board");
    }
    let hints = &game.hints;
    if !hints.bagel_numbers.iter().chain(&hints.not_bagel_numbers).all(in_range) {
        return Some("hinted digit out of range");
    }
    None
}

/// Load state from a store, falling back to defaults on any problem.
pub fn load_state(store: &dyn Store) -> EngineState {
    match store.load() {
        Ok(Some(bytes)) => match decode_state(&bytes) {
            Ok(state) => {
                debug!("Loaded saved state ({} bytes)", bytes.len());
                state
            }
            Err(e) => {
                warn!("Ignoring saved state: {}", e);
                EngineState::default()
            }
        },
        Ok(None) => {
            debug!("No saved state, starting fresh");
            EngineState::default()
        }
        Err(e) => {
            warn!("Could not read saved state: {}", e);
            EngineState::default()
        }
    }
}

/// Save state to a store.
pub fn save_state(store: &dyn Store, state: &EngineState) -> Result<(), StorageError> {
    let bytes = encode_state(state)?;
    store.save(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::points::Points;
    use crate::game::action::Action;
    use crate::game::reducer::{reduce, ActionContext};
    use crate::game::settings::Difficulty;

    fn played_state() -> EngineState {
        let mut state = EngineState::new(Settings::for_difficulty(Difficulty::Easy));
        let ctx = ActionContext::at(1_000, 42);
        reduce(&mut state, Action::StartNewGame, &ctx).unwrap();
        reduce(&mut state, Action::AddDigitSequential { digit: 1 }, &ctx).unwrap();
        state.stats.record(Difficulty::Easy, true, Points::from_whole(93), 5);
        state
    }

    #[test]
    fn test_memory_roundtrip_keeps_game() {
        let store = MemoryStore::new();
        let state = played_state();
        save_state(&store, &state).unwrap();
        assert_eq!(load_state(&store), state);
    }

    #[test]
    fn test_idle_state_saves_no_game() {
        let state = EngineState::new(Settings::default());
        let bytes = encode_state(&state).unwrap();
        let blob: PersistedBlob = serde_json::from_slice(&bytes).unwrap();
        assert!(blob.game.is_none());
        assert_eq!(blob.version, BLOB_VERSION);
    }

    #[test]
    fn test_missing_blob_defaults() {
        assert_eq!(load_state(&MemoryStore::new()), EngineState::default());
    }

    #[test]
    fn test_corrupt_blob_defaults() {
        let store = MemoryStore::with_bytes(b"{not json".to_vec());
        assert_eq!(load_state(&store), EngineState::default());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut blob: serde_json::Value =
            serde_json::from_slice(&encode_state(&played_state()).unwrap()).unwrap();
        blob["version"] = serde_json::json!(99);
        let bytes = serde_json::to_vec(&blob).unwrap();
        assert!(matches!(decode_state(&bytes), Err(StorageError::UnsupportedVersion(99))));
        assert_eq!(load_state(&MemoryStore::with_bytes(bytes)), EngineState::default());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut blob: serde_json::Value =
            serde_json::from_slice(&encode_state(&played_state()).unwrap()).unwrap();
        blob["settings"]["grid_rows"] = serde_json::json!(7);
        let bytes = serde_json::to_vec(&blob).unwrap();
        assert!(matches!(decode_state(&bytes), Err(StorageError::InvalidSettings(_))));
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
        let mut blob: serde_json::Value =
            serde_json::from_slice(&encode_state(&played_state()).unwrap()).unwrap();
        edit(&mut blob);
        serde_json::to_vec(&blob).unwrap()
    }

    #[test]
    fn test_out_of_range_target_discards_game() {
        let bytes = tampered(|blob| blob["game"]["session"]["target"] = serde_json::json!([128, 129, 130]));
        let mut state = load_state(&MemoryStore::with_bytes(bytes));
        assert_eq!(state.session.status, GameStatus::Idle);
        // Settings and stats survive
        assert_eq!(state.settings, played_state().settings);
        assert_eq!(state.stats, played_state().stats);

        // The next game plays normally
        let ctx = ActionContext::at(2_000, 7);
        reduce(&mut state, Action::StartNewGame, &ctx).unwrap();
        for digit in [1, 2, 3] {
            reduce(&mut state, Action::AddDigitSequential { digit }, &ctx).unwrap();
        }
        reduce(&mut state, Action::SubmitGuess, &ctx).unwrap();
        assert_eq!(state.session.guesses.len(), 1);
    }

    #[test]
    fn test_repeated_target_digit_discards_game() {
        let bytes = tampered(|blob| blob["game"]["session"]["target"] = serde_json::json!([4, 4, 0]));
        let state = decode_state(&bytes).unwrap();
        assert_eq!(state.session.status, GameStatus::Idle);
    }

    #[test]
    fn test_cursor_or_lock_outside_board_discards_game() {
        let bytes = tampered(|blob| blob["game"]["session"]["buffer"]["active_position"] = serde_json::json!(3));
        assert_eq!(decode_state(&bytes).unwrap().session.status, GameStatus::Idle);

        let bytes = tampered(|blob| blob["game"]["session"]["buffer"]["locked_positions"] = serde_json::json!([5]));
        assert_eq!(decode_state(&bytes).unwrap().session.status, GameStatus::Idle);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("pfb-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(dir.join("state.json"));
        assert!(store.load().unwrap().is_none());

        let state = played_state();
        save_state(&store, &state).unwrap();
        assert_eq!(load_state(&store), state);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
