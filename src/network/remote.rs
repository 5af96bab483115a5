//! Remote Service
//!
//! The lobby/leaderboard service contract, plus an in-process
//! implementation for offline play and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::game::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::game::settings::{Difficulty, Settings, SettingsPatch};
use crate::network::error::RemoteError;
use crate::network::protocol::{
    GamePulse, GameResultSubmission, GameStartEvent, LobbyState, PlayerId, PlayerProgress,
    Ranking, RemoteReply, RemoteRequest, UserProfile,
};

/// Lobby, progress and ranking service.
///
/// Every call may fail; callers never assume success.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Register (or refresh) a profile.
    async fn register_user(&self, profile: UserProfile) -> Result<UserProfile, RemoteError>;

    /// Join the open lobby. Joining again returns the current lobby, with
    /// the game start once the lobby has launched.
    async fn join_lobby(&self, profile: UserProfile) -> Result<LobbyState, RemoteError>;

    /// Leave a lobby.
    async fn leave_lobby(&self, lobby_id: &str, player_id: &str) -> Result<(), RemoteError>;

    /// Report progress, receive everyone's.
    async fn send_game_pulse(&self, pulse: GamePulse) -> Result<Vec<PlayerProgress>, RemoteError>;

    /// Submit final stats, receive the ranking so far.
    async fn submit_game_result(&self, result: GameResultSubmission) -> Result<Ranking, RemoteError>;

    /// Global leaderboard.
    async fn get_leaderboard(&self, difficulty: Difficulty) -> Result<Vec<LeaderboardEntry>, RemoteError>;
}

/// Answer a request envelope from a service.
pub async fn serve_request(service: &dyn RemoteService, request: RemoteRequest) -> RemoteReply {
    let reply = match request {
        RemoteRequest::RegisterUser(profile) => {
            service.register_user(profile).await.map(RemoteReply::Registered)
        }
        RemoteRequest::JoinLobby(profile) => service.join_lobby(profile).await.map(RemoteReply::Lobby),
        RemoteRequest::LeaveLobby { lobby_id, player_id } => {
            service.leave_lobby(&lobby_id, &player_id).await.map(|_| RemoteReply::Left)
        }
        RemoteRequest::SendGamePulse(pulse) => {
            service.send_game_pulse(pulse).await.map(RemoteReply::Progress)
        }
        RemoteRequest::SubmitGameResult(result) => {
            service.submit_game_result(result).await.map(RemoteReply::Ranking)
        }
        RemoteRequest::GetLeaderboard(difficulty) => {
            service.get_leaderboard(difficulty).await.map(RemoteReply::Leaderboard)
        }
    };
    reply.unwrap_or_else(RemoteReply::Failed)
}

// =============================================================================
// LOOPBACK
// =============================================================================

struct GameRecord {
    settings: SettingsPatch,
    players: Vec<UserProfile>,
    progress: BTreeMap<PlayerId, PlayerProgress>,
    results: BTreeMap<String, GameResultSubmission>,
}

#[derive(Default)]
struct LoopbackState {
    users: BTreeMap<PlayerId, UserProfile>,
    lobby_number: u32,
    open_lobby: Vec<UserProfile>,
    launched: BTreeMap<PlayerId, (String, GameStartEvent)>,
    games: BTreeMap<String, GameRecord>,
    leaderboard: Leaderboard,
}

/// In-process service.
///
/// Launches a game once `seats` players have joined, with a fixed seed if
/// one is configured or no seed (clients derive it from the game id).
pub struct LoopbackService {
    seats: usize,
    seed: Option<u64>,
    settings: SettingsPatch,
    state: Mutex<LoopbackState>,
}

impl LoopbackService {
    /// Service launching games of `seats` players on the given board.
    ///
    /// Start events pin the whole board so every client lands on the same one.
    pub fn new(seats: usize, board: &Settings) -> Self {
        Self {
            seats: seats.max(1),
            seed: None,
            settings: SettingsPatch::board_of(board),
            state: Mutex::new(LoopbackState::default()),
        }
    }

    /// Use a fixed seed for every game.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Results accepted for a game (test/inspection helper).
    pub async fn result_count(&self, game_id: &str) -> usize {
        let state = self.state.lock().await;
        state.games.get(game_id).map_or(0, |g| g.results.len())
    }

    fn lobby_id(number: u32) -> String {
        format!("lobby-{:04}", number)
    }
}

#[async_trait]
impl RemoteService for LoopbackService {
    async fn register_user(&self, profile: UserProfile) -> Result<UserProfile, RemoteError> {
        if profile.player_id.is_empty() {
            return Err(RemoteError::validation("player id is empty"));
        }
        let mut state = self.state.lock().await;
        state.users.insert(profile.player_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn join_lobby(&self, profile: UserProfile) -> Result<LobbyState, RemoteError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&profile.player_id) {
            return Err(RemoteError::from_status(401, "unregistered player"));
        }

        if let Some((lobby_id, start)) = state.launched.get(&profile.player_id) {
            return Ok(LobbyState {
                lobby_id: lobby_id.clone(),
                players: start.players.clone(),
                game_start: Some(start.clone()),
            });
        }

        if !state.open_lobby.iter().any(|p| p.player_id == profile.player_id) {
            state.open_lobby.push(profile);
        }
        let lobby_id = Self::lobby_id(state.lobby_number);

        if state.open_lobby.len() < self.seats {
            return Ok(LobbyState { lobby_id, players: state.open_lobby.clone(), game_start: None });
        }

        // Lobby full: launch and open a fresh one
        let players = std::mem::take(&mut state.open_lobby);
        let game_id = format!("game-{:04}", state.lobby_number);
        state.lobby_number += 1;
        let start = GameStartEvent {
            game_id: game_id.clone(),
            random_seed: self.seed,
            players: players.clone(),
            game_settings: self.settings.clone(),
        };
        for player in &players {
            state.launched.insert(player.player_id.clone(), (lobby_id.clone(), start.clone()));
        }
        state.games.insert(game_id.clone(), GameRecord {
            settings: self.settings.clone(),
            players: players.clone(),
            progress: BTreeMap::new(),
            results: BTreeMap::new(),
        });
        info!("Loopback launched {} with {} players", game_id, players.len());

        Ok(LobbyState { lobby_id, players, game_start: Some(start) })
    }

    async fn leave_lobby(&self, lobby_id: &str, player_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        state.open_lobby.retain(|p| p.player_id != player_id);
        let leaving = state.launched.get(player_id).map_or(false, |(id, _)| id == lobby_id);
        if leaving {
            state.launched.remove(player_id);
        }
        Ok(())
    }

    async fn send_game_pulse(&self, pulse: GamePulse) -> Result<Vec<PlayerProgress>, RemoteError> {
        let mut state = self.state.lock().await;
        let game = state.games.get_mut(&pulse.game_id)
            .ok_or_else(|| RemoteError::validation(format!("unknown game {}", pulse.game_id)))?;
        if !game.players.iter().any(|p| p.player_id == pulse.player_id) {
            return Err(RemoteError::from_status(403, "not seated in this game"));
        }

        let stale = game.progress.get(&pulse.player_id)
            .map_or(false, |p| p.sequence >= pulse.sequence);
        if stale {
            debug!("Ignoring stale pulse {} from {}", pulse.sequence, pulse.player_id);
        } else {
            game.progress.insert(pulse.player_id.clone(), PlayerProgress::from(&pulse));
        }
        Ok(game.progress.values().cloned().collect())
    }

    async fn submit_game_result(&self, result: GameResultSubmission) -> Result<Ranking, RemoteError> {
        let expected = GameResultSubmission::key_for(&result.game_id, &result.device_id);
        if result.idempotency_key != expected {
            return Err(RemoteError::validation("idempotency key does not match game and device"));
        }

        let mut state = self.state.lock().await;
        let state = &mut *state;
        let game = state.games.get_mut(&result.game_id)
            .ok_or_else(|| RemoteError::validation(format!("unknown game {}", result.game_id)))?;

        if game.results.contains_key(&result.idempotency_key) {
            debug!("Duplicate submission {}", result.idempotency_key);
        } else {
            let difficulty = game.settings.difficulty.unwrap_or_default();
            state.leaderboard.insert(LeaderboardEntry {
                player_name: result.player_name.clone(),
                score: result.score,
                guesses: result.guesses,
                time_minutes: result.time_minutes,
                difficulty,
                timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
            });
            game.results.insert(result.idempotency_key.clone(), result.clone());
        }

        Ok(Ranking::from_results(&result.game_id, game.results.values(), true))
    }

    async fn get_leaderboard(&self, difficulty: Difficulty) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        let state = self.state.lock().await;
        Ok(state.leaderboard.top(difficulty).to_vec())
    }
}
