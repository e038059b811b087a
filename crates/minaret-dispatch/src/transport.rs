//! Push transport contract and its typed delivery errors.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::PushMessage;

/// Machine-readable delivery error kinds.
///
/// The two token kinds signal that the recipient is permanently unreachable
/// at that token and trigger directory cleanup; everything else is an opaque
/// failure that is recorded and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    InvalidToken,
    Unregistered,
    Other,
}

impl TransportErrorKind {
    /// Stable code recorded alongside failed requests.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidToken => "messaging/invalid-registration-token",
            Self::Unregistered => "messaging/registration-token-not-registered",
            Self::Other => "messaging/unknown",
        }
    }
}

/// A typed delivery error reported by the push transport.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::InvalidToken,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unregistered(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Unregistered,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            message: message.into(),
        }
    }

    /// Whether this error means the token must be erased from the directory.
    #[must_use]
    pub fn invalidates_token(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::InvalidToken | TransportErrorKind::Unregistered
        )
    }

    /// Stable code recorded alongside failed requests.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// The push delivery transport.
///
/// Accepts a structured message and either confirms delivery with the
/// transport's message identifier or reports a [`TransportError`].
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<String, TransportError>;
}
