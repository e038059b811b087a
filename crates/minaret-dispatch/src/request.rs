//! Single-request dispatch: one queued notification in, one status write out.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use minaret_core::{NotificationRequest, RequestStatus};
use minaret_storage::RequestStore;

use crate::sender::{RecipientSender, SendOutcome};

const MISSING_FIELDS_ERROR: &str = "Missing required fields (fcmToken, title, or body)";

/// Consumes one newly queued request, validates it, sends it, and records
/// the outcome.
///
/// Every path ends in a status write or an explicit no-op; nothing escapes
/// the trigger boundary.
pub struct RequestDispatcher {
    store: Arc<dyn RequestStore>,
    sender: Arc<RecipientSender>,
}

impl RequestDispatcher {
    pub fn new(store: Arc<dyn RequestStore>, sender: Arc<RecipientSender>) -> Self {
        Self { store, sender }
    }

    /// Handles a request-created trigger.
    pub async fn handle(&self, request: &NotificationRequest) {
        if request.status != RequestStatus::Pending {
            debug!(
                request_id = %request.id,
                status = ?request.status,
                "Request status is not pending, skipping"
            );
            return;
        }

        if request.fcm_token.trim().is_empty()
            || request.title.trim().is_empty()
            || request.body.trim().is_empty()
        {
            error!(
                request_id = %request.id,
                has_token = !request.fcm_token.trim().is_empty(),
                has_title = !request.title.trim().is_empty(),
                has_body = !request.body.trim().is_empty(),
                "Missing required fields in notification request"
            );
            self.write_failed(&request.id, MISSING_FIELDS_ERROR, None)
                .await;
            return;
        }

        let outcome = self
            .sender
            .send_raw(
                &request.fcm_token,
                &request.title,
                &request.body,
                &request.data,
                request.user_id.as_deref(),
            )
            .await;

        match outcome {
            SendOutcome::Delivered { message_id } => {
                info!(request_id = %request.id, message_id = %message_id, "Successfully sent message");
                if let Err(err) = self.store.mark_sent(&request.id, &message_id).await {
                    error!(request_id = %request.id, error = %err, "Failed to record sent status");
                }
            }
            SendOutcome::Failed { kind, message } => {
                error!(request_id = %request.id, error = %message, "Error sending message");
                self.write_failed(&request.id, &message, Some(kind.code()))
                    .await;
            }
        }
    }

    async fn write_failed(&self, id: &str, message: &str, code: Option<&str>) {
        if let Err(err) = self.store.mark_failed(id, message, code).await {
            error!(request_id = %id, error = %err, "Failed to record failed status");
        }
    }
}
