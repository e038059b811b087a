//! The per-recipient send-and-cleanup primitive shared by every flow.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use minaret_core::Recipient;
use minaret_storage::RecipientDirectory;

use crate::message::PushMessage;
use crate::transport::{PushTransport, TransportErrorKind};

/// Classified result of one send attempt.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Delivered {
        message_id: String,
    },
    Failed {
        kind: TransportErrorKind,
        message: String,
    },
}

impl SendOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Sends one message to one token and classifies the outcome.
///
/// On a stale-token signal the recipient's token is erased from the
/// directory. That cleanup is a secondary, independently-failable side
/// effect: its failure is logged and swallowed, never allowed to mask the
/// delivery outcome. The send itself is never retried here.
pub struct RecipientSender {
    transport: Arc<dyn PushTransport>,
    directory: Arc<dyn RecipientDirectory>,
}

impl RecipientSender {
    pub fn new(transport: Arc<dyn PushTransport>, directory: Arc<dyn RecipientDirectory>) -> Self {
        Self {
            transport,
            directory,
        }
    }

    /// Sends to a directory recipient, cleaning up their token on a
    /// stale-token signal.
    pub async fn send_to_recipient(
        &self,
        recipient: &Recipient,
        title: &str,
        body: &str,
        data: &HashMap<String, Value>,
    ) -> SendOutcome {
        let Some(token) = recipient.token() else {
            return SendOutcome::Failed {
                kind: TransportErrorKind::Other,
                message: "recipient has no device token".to_string(),
            };
        };

        let outcome = self
            .send_raw(token, title, body, data, Some(&recipient.id))
            .await;
        if let SendOutcome::Failed { message, .. } = &outcome {
            error!(
                recipient_id = %recipient.id,
                email = %recipient.email_label(),
                error = %message,
                "Send to recipient failed"
            );
        }
        outcome
    }

    /// Sends to a bare token. `cleanup_id` names the directory record whose
    /// token is erased on a stale-token signal; `None` skips cleanup
    /// silently.
    pub async fn send_raw(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, Value>,
        cleanup_id: Option<&str>,
    ) -> SendOutcome {
        let message = PushMessage::build(token, title, body, data);
        match self.transport.send(&message).await {
            Ok(message_id) => SendOutcome::Delivered { message_id },
            Err(err) => {
                if err.invalidates_token() {
                    if let Some(id) = cleanup_id {
                        self.clear_invalid_token(id).await;
                    }
                }
                SendOutcome::Failed {
                    kind: err.kind,
                    message: err.message,
                }
            }
        }
    }

    /// Best-effort token erasure; at most one directory write, never
    /// propagated.
    async fn clear_invalid_token(&self, recipient_id: &str) {
        match self.directory.clear_token(recipient_id).await {
            Ok(()) => {
                info!(recipient_id = %recipient_id, "Removed invalid device token");
            }
            Err(err) => {
                warn!(
                    recipient_id = %recipient_id,
                    error = %err,
                    "Failed to remove invalid device token"
                );
            }
        }
    }
}
