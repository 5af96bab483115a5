//! WebSocket transport.
//!
//! The client opens one connection per request: send the request frame,
//! read one reply frame, close. Text frames carry JSON, binary frames carry
//! bincode. The relay serves any [`RemoteService`] over the same framing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::game::leaderboard::LeaderboardEntry;
use crate::game::settings::Difficulty;
use crate::network::error::{RemoteError, RemoteErrorKind};
use crate::network::protocol::{
    GamePulse, GameResultSubmission, LobbyState, PlayerProgress, Ranking, RemoteReply,
    RemoteRequest, UserProfile, WireFormat,
};
use crate::network::remote::{serve_request, RemoteService};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn to_frame(format: WireFormat, bytes: Vec<u8>) -> Result<Message, RemoteError> {
    match format {
        WireFormat::Json => String::from_utf8(bytes)
            .map(Message::Text)
            .map_err(|e| RemoteError::validation(e.to_string())),
        WireFormat::Binary => Ok(Message::Binary(bytes)),
    }
}

fn unexpected(reply: RemoteReply) -> RemoteError {
    match reply {
        RemoteReply::Failed(e) => e,
        other => RemoteError::new(RemoteErrorKind::Unknown, format!("unexpected reply: {:?}", other)),
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Remote service reached over WebSocket.
#[derive(Debug, Clone)]
pub struct WsRemoteService {
    url: String,
    format: WireFormat,
    timeout: Duration,
}

impl WsRemoteService {
    /// Client for `url` (`ws://host:port/path`).
    pub fn new(url: impl Into<String>, format: WireFormat, timeout: Duration) -> Self {
        Self { url: url.into(), format, timeout }
    }

    /// One request, one reply, bounded by the timeout.
    pub async fn call(&self, request: RemoteRequest) -> Result<RemoteReply, RemoteError> {
        tokio::time::timeout(self.timeout, self.round_trip(request)).await?
    }

    async fn round_trip(&self, request: RemoteRequest) -> Result<RemoteReply, RemoteError> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let frame = to_frame(self.format, self.format.encode(&request)?)?;
        ws_sender.send(frame).await?;

        let reply = loop {
            match ws_receiver.next().await {
                Some(Ok(Message::Text(text))) => break WireFormat::Json.decode(text.as_bytes())?,
                Some(Ok(Message::Binary(data))) => break WireFormat::Binary.decode(&data)?,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(RemoteError::network("connection closed before reply"));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        };

        if let Err(e) = ws_sender.close().await {
            debug!("Close after reply failed: {}", e);
        }
        Ok(reply)
    }
}

#[async_trait]
impl RemoteService for WsRemoteService {
    async fn register_user(&self, profile: UserProfile) -> Result<UserProfile, RemoteError> {
        match self.call(RemoteRequest::RegisterUser(profile)).await? {
            RemoteReply::Registered(profile) => Ok(profile),
            other => Err(unexpected(other)),
        }
    }

    async fn join_lobby(&self, profile: UserProfile) -> Result<LobbyState, RemoteError> {
        match self.call(RemoteRequest::JoinLobby(profile)).await? {
            RemoteReply::Lobby(lobby) => Ok(lobby),
            other => Err(unexpected(other)),
        }
    }

    async fn leave_lobby(&self, lobby_id: &str, player_id: &str) -> Result<(), RemoteError> {
        let request = RemoteRequest::LeaveLobby {
            lobby_id: lobby_id.to_string(),
            player_id: player_id.to_string(),
        };
        match self.call(request).await? {
            RemoteReply::Left => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn send_game_pulse(&self, pulse: GamePulse) -> Result<Vec<PlayerProgress>, RemoteError> {
        match self.call(RemoteRequest::SendGamePulse(pulse)).await? {
            RemoteReply::Progress(progress) => Ok(progress),
            other => Err(unexpected(other)),
        }
    }

    async fn submit_game_result(&self, result: GameResultSubmission) -> Result<Ranking, RemoteError> {
        match self.call(RemoteRequest::SubmitGameResult(result)).await? {
            RemoteReply::Ranking(ranking) => Ok(ranking),
            other => Err(unexpected(other)),
        }
    }

    async fn get_leaderboard(&self, difficulty: Difficulty) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        match self.call(RemoteRequest::GetLeaderboard(difficulty)).await? {
            RemoteReply::Leaderboard(entries) => Ok(entries),
            other => Err(unexpected(other)),
        }
    }
}

// =============================================================================
// RELAY
// =============================================================================

/// Serve a [`RemoteService`] to WebSocket clients until the listener fails.
pub async fn serve(listener: TcpListener, service: Arc<dyn RemoteService>) -> Result<(), RemoteError> {
    let local = listener.local_addr().map_err(|e| RemoteError::network(e.to_string()))?;
    info!("Relay listening on {}", local);
    loop {
        let (stream, addr) = listener.accept().await
            .map_err(|e| RemoteError::network(e.to_string()))?;
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, service).await {
                warn!("Connection {} failed: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    service: Arc<dyn RemoteService>,
) -> Result<(), RemoteError> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    debug!("Relay connection from {}", addr);

    while let Some(msg) = ws_receiver.next().await {
        let (format, request) = match msg? {
            Message::Text(text) => (WireFormat::Json, WireFormat::Json.decode::<RemoteRequest>(text.as_bytes())),
            Message::Binary(data) => (WireFormat::Binary, WireFormat::Binary.decode::<RemoteRequest>(&data)),
            Message::Close(_) => break,
            _ => continue,
        };
        let reply = match request {
            Ok(request) => serve_request(service.as_ref(), request).await,
            Err(e) => RemoteReply::Failed(RemoteError::validation(e.message)),
        };
        ws_sender.send(to_frame(format, format.encode(&reply)?)?).await?;
    }
    Ok(())
}
