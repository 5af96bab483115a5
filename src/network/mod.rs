//! Network Layer
//!
//! Lobby, progress and ranking calls to the remote service.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod error;
pub mod protocol;
pub mod remote;
pub mod retry;
pub mod coordinator;
pub mod ws;

pub use error::{RemoteError, RemoteErrorKind, RecoveryAction, classify_status};
pub use protocol::{
    GamePulse, GameResultSubmission, GameStartEvent, LobbyState, PlayerProgress,
    Ranking, RankedPlayer, RemoteReply, RemoteRequest, UserProfile, WireFormat,
};
pub use remote::{LoopbackService, RemoteService, serve_request};
pub use retry::{RetryPolicy, with_retry};
pub use coordinator::{MultiplayerCoordinator, MultiplayerSession, RemoteUpdate};
pub use ws::WsRemoteService;
