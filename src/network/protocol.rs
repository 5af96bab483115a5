//! Protocol Messages
//!
//! Wire types shared with the lobby/leaderboard service. JSON for debugging
//! ease, bincode for compact transport. Enums here stay externally tagged
//! so both formats can carry them.

use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;

use crate::core::points::Points;
use crate::game::leaderboard::LeaderboardEntry;
use crate::game::settings::{Difficulty, SettingsPatch};
use crate::network::error::RemoteError;

/// Remote player identifier.
pub type PlayerId = String;

// =============================================================================
// LOBBY
// =============================================================================

/// A registered player on one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Service-wide id
    pub player_id: PlayerId,
    /// Display name
    pub player_name: String,
    /// Device the profile was registered from
    pub device_id: String,
}

/// Lobby snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyState {
    /// Lobby id
    pub lobby_id: String,
    /// Seated players
    pub players: Vec<UserProfile>,
    /// Set once the lobby has launched a game
    pub game_start: Option<GameStartEvent>,
}

/// Sent to every seated player when a game launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartEvent {
    /// Game id
    pub game_id: String,
    /// Shared seed; derived from `game_id` when absent
    pub random_seed: Option<u64>,
    /// Seated players
    pub players: Vec<UserProfile>,
    /// Board every player uses
    pub game_settings: SettingsPatch,
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Periodic progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePulse {
    /// Game id
    pub game_id: String,
    /// Reporter
    pub player_id: PlayerId,
    /// Reporter name
    pub player_name: String,
    /// Monotonic per player; stale pulses are ignored
    pub sequence: u64,
    /// Live score
    pub score: Points,
    /// Guesses submitted
    pub guess_count: u32,
    /// Hints bought
    pub hints_used: u32,
    /// Still playing
    pub active: bool,
}

/// Another player's progress as the service last saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    /// Player
    pub player_id: PlayerId,
    /// Name
    pub player_name: String,
    /// Live score
    pub score: Points,
    /// Guesses submitted
    pub guess_count: u32,
    /// Hints bought
    pub hints_used: u32,
    /// Still playing
    pub active: bool,
    /// Sequence of the pulse this came from
    pub sequence: u64,
}

impl From<&GamePulse> for PlayerProgress {
    fn from(pulse: &GamePulse) -> Self {
        Self {
            player_id: pulse.player_id.clone(),
            player_name: pulse.player_name.clone(),
            score: pulse.score,
            guess_count: pulse.guess_count,
            hints_used: pulse.hints_used,
            active: pulse.active,
            sequence: pulse.sequence,
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Final stats for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResultSubmission {
    /// `game_id:device_id`; the service scores each key once
    pub idempotency_key: String,
    /// Game id
    pub game_id: String,
    /// Submitting device
    pub device_id: String,
    /// Player
    pub player_id: PlayerId,
    /// Name
    pub player_name: String,
    /// Final score
    pub score: Points,
    /// Guesses used
    pub guesses: u32,
    /// Minutes played
    pub time_minutes: Points,
    /// Hints bought
    pub hints_used: u32,
    /// Found the target
    pub won: bool,
    /// Board fingerprint (hex), for parity checks
    pub board: String,
}

impl GameResultSubmission {
    /// Idempotency key for a game on a device.
    pub fn key_for(game_id: &str, device_id: &str) -> String {
        format!("{}:{}", game_id, device_id)
    }
}

/// One row of a game ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlayer {
    /// 1-based
    pub rank: u32,
    /// Player
    pub player_id: PlayerId,
    /// Name
    pub player_name: String,
    /// Final score
    pub score: Points,
    /// Guesses used
    pub guesses: u32,
    /// Minutes played
    pub time_minutes: Points,
}

/// Final standings of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    /// Game id
    pub game_id: String,
    /// Best first
    pub entries: Vec<RankedPlayer>,
    /// Computed by the service; `false` for a local fallback
    pub authoritative: bool,
}

impl Ranking {
    /// Rank submissions: score descending, then fewer guesses, then less time.
    pub fn from_results<'a>(
        game_id: &str,
        results: impl IntoIterator<Item = &'a GameResultSubmission>,
        authoritative: bool,
    ) -> Self {
        let mut rows: Vec<&GameResultSubmission> = results.into_iter().collect();
        rows.sort_by(|a, b| {
            b.score.cmp(&a.score)
                .then(a.guesses.cmp(&b.guesses))
                .then(a.time_minutes.cmp(&b.time_minutes))
                .then(a.player_id.cmp(&b.player_id))
        });
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| RankedPlayer {
                rank: i as u32 + 1,
                player_id: r.player_id.clone(),
                player_name: r.player_name.clone(),
                score: r.score,
                guesses: r.guesses,
                time_minutes: r.time_minutes,
            })
            .collect();
        Self { game_id: game_id.to_string(), entries, authoritative }
    }

    /// Rank of a player, if present.
    pub fn rank_of(&self, player_id: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.player_id == player_id).map(|e| e.rank)
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Requests to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteRequest {
    /// Register a profile
    RegisterUser(UserProfile),
    /// Join (or create) the open lobby
    JoinLobby(UserProfile),
    /// Leave a lobby
    LeaveLobby {
        /// Lobby
        lobby_id: String,
        /// Player
        player_id: PlayerId,
    },
    /// Report progress
    SendGamePulse(GamePulse),
    /// Submit final stats
    SubmitGameResult(GameResultSubmission),
    /// Fetch a global leaderboard
    GetLeaderboard(Difficulty),
}

/// Replies from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteReply {
    /// Registered profile
    Registered(UserProfile),
    /// Lobby after joining
    Lobby(LobbyState),
    /// Left the lobby
    Left,
    /// Everyone's progress
    Progress(Vec<PlayerProgress>),
    /// Ranking for a submitted game
    Ranking(Ranking),
    /// Global leaderboard
    Leaderboard(Vec<LeaderboardEntry>),
    /// Typed failure
    Failed(RemoteError),
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

/// Message encoding on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Text frames with JSON
    #[default]
    Json,
    /// Binary frames with bincode
    Binary,
}

impl WireFormat {
    /// Serialize a message.
    pub fn encode<T: Serialize>(self, message: &T) -> Result<Vec<u8>, RemoteError> {
        match self {
            WireFormat::Json => serde_json::to_vec(message)
                .map_err(|e| RemoteError::validation(format!("json encode: {}", e))),
            WireFormat::Binary => bincode::serialize(message)
                .map_err(|e| RemoteError::validation(format!("bincode encode: {}", e))),
        }
    }

    /// Deserialize a message.
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T, RemoteError> {
        let result = match self {
            WireFormat::Json => serde_json::from_slice(data).map_err(|e| e.to_string()),
            WireFormat::Binary => bincode::deserialize(data).map_err(|e| e.to_string()),
        };
        result.map_err(|e| RemoteError::new(
            crate::network::error::RemoteErrorKind::Unknown,
            format!("undecodable message: {}", e),
        ))
    }
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(WireFormat::Json),
            "binary" | "bincode" => Ok(WireFormat::Binary),
            other => Err(format!("unknown wire format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(player: &str, score: i64, guesses: u32) -> GameResultSubmission {
        GameResultSubmission {
            idempotency_key: GameResultSubmission::key_for("g1", player),
            game_id: "g1".into(),
            device_id: player.into(),
            player_id: player.into(),
            player_name: player.to_uppercase(),
            score: Points::from_whole(score),
            guesses,
            time_minutes: Points::from_whole(1),
            hints_used: 0,
            won: true,
            board: String::new(),
        }
    }

    #[test]
    fn test_request_binary_roundtrip() {
        let request = RemoteRequest::SendGamePulse(GamePulse {
            game_id: "g1".into(),
            player_id: "p1".into(),
            player_name: "Ada".into(),
            sequence: 3,
            score: Points::from_hundredths(9_150),
            guess_count: 2,
            hints_used: 1,
            active: true,
        });
        let bytes = WireFormat::Binary.encode(&request).unwrap();
        let parsed: RemoteRequest = WireFormat::Binary.decode(&bytes).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_game_start_carries_settings() {
        let start = GameStartEvent {
            game_id: "g1".into(),
            random_seed: Some(2024),
            players: vec![],
            game_settings: SettingsPatch { difficulty: Some(Difficulty::Expert), ..Default::default() },
        };
        for format in [WireFormat::Json, WireFormat::Binary] {
            let reply = RemoteReply::Lobby(LobbyState {
                lobby_id: "l1".into(),
                players: vec![],
                game_start: Some(start.clone()),
            });
            let bytes = format.encode(&reply).unwrap();
            assert_eq!(format.decode::<RemoteReply>(&bytes).unwrap(), reply);
        }
    }

    #[test]
    fn test_garbage_is_unknown_error() {
        let err = WireFormat::Json.decode::<RemoteReply>(b"\x00\x01").unwrap_err();
        assert_eq!(err.kind, crate::network::error::RemoteErrorKind::Unknown);
    }

    #[test]
    fn test_ranking_order() {
        let results = [submission("a", 90, 5), submission("b", 95, 7), submission("c", 90, 3)];
        let ranking = Ranking::from_results("g1", &results, true);
        let order: Vec<_> = ranking.entries.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(ranking.rank_of("a"), Some(3));
        assert_eq!(ranking.rank_of("zz"), None);
    }

    #[test]
    fn test_wire_format_parse() {
        assert_eq!("JSON".parse::<WireFormat>(), Ok(WireFormat::Json));
        assert_eq!("binary".parse::<WireFormat>(), Ok(WireFormat::Binary));
        assert!("xml".parse::<WireFormat>().is_err());
    }
}
