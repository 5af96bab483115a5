//! Remote error taxonomy.
//!
//! Every remote failure lands in one of six kinds. The kind decides whether
//! the coordinator retries and what the player is told to do next.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteErrorKind {
    /// Transport failed or timed out.
    Network,
    /// Credentials missing or rejected.
    Authentication,
    /// Authenticated but not allowed.
    Permission,
    /// Request refused as malformed.
    Validation,
    /// Service failed internally.
    Server,
    /// Anything else.
    Unknown,
}

/// Suggested next step for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Try the call again.
    Retry,
    /// Ask the player to sign in again.
    CheckCredentials,
    /// Nothing the player can fix.
    ContactSupport,
    /// Finish the game as single-player.
    FallbackSinglePlayer,
}

impl RemoteErrorKind {
    /// Worth retrying automatically?
    pub fn is_retryable(self) -> bool {
        matches!(self, RemoteErrorKind::Network | RemoteErrorKind::Server)
    }

    /// What to do about it.
    pub fn recovery(self) -> RecoveryAction {
        match self {
            RemoteErrorKind::Network | RemoteErrorKind::Server => RecoveryAction::Retry,
            RemoteErrorKind::Authentication => RecoveryAction::CheckCredentials,
            RemoteErrorKind::Permission => RecoveryAction::ContactSupport,
            RemoteErrorKind::Validation | RemoteErrorKind::Unknown => {
                RecoveryAction::FallbackSinglePlayer
            }
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_status(status: u16) -> RemoteErrorKind {
    match status {
        401 => RemoteErrorKind::Authentication,
        403 => RemoteErrorKind::Permission,
        408 | 429 => RemoteErrorKind::Network,
        400..=499 => RemoteErrorKind::Validation,
        500..=599 => RemoteErrorKind::Server,
        _ => RemoteErrorKind::Unknown,
    }
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?} error: {message}")]
pub struct RemoteError {
    /// Class
    pub kind: RemoteErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl RemoteError {
    /// Error of a given kind.
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    /// Service failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Server, message)
    }

    /// Refused request.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }

    /// From an HTTP status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(classify_status(status), message)
    }

    /// Worth retrying automatically?
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// What to do about it.
    pub fn recovery(&self) -> RecoveryAction {
        self.kind.recovery()
    }
}

impl From<tungstenite::Error> for RemoteError {
    fn from(e: tungstenite::Error) -> Self {
        use tungstenite::Error as WsError;
        match e {
            WsError::Io(io) => RemoteError::network(io.to_string()),
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                RemoteError::network("connection closed")
            }
            WsError::Http(response) => {
                let status = response.status();
                RemoteError::from_status(status.as_u16(), format!("handshake refused: {}", status))
            }
            WsError::Url(url) => RemoteError::validation(format!("bad service url: {}", url)),
            other => RemoteError::new(RemoteErrorKind::Unknown, other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for RemoteError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        RemoteError::network("request timed out")
    }
}
