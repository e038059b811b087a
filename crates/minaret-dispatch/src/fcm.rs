//! HTTP push transport speaking the FCM v1 message shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::message::PushMessage;
use crate::transport::{PushTransport, TransportError};

/// Push transport posting messages to an FCM-compatible HTTP endpoint.
///
/// Credential provisioning is outside this crate; the transport is handed a
/// ready-to-use bearer credential from configuration.
pub struct FcmTransport {
    http_client: Client,
    endpoint: String,
    auth_token: String,
}

impl FcmTransport {
    pub fn new(endpoint: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, auth_token, Duration::from_secs(10))
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            auth_token: auth_token.into(),
        }
    }
}

#[async_trait]
impl PushTransport for FcmTransport {
    async fn send(&self, message: &PushMessage) -> Result<String, TransportError> {
        let body = json!({ "message": message });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::other(e.to_string()))?;

        let status = response.status();
        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::other(e.to_string()))?;

        if status.is_success() {
            // v1 responds with the message resource name.
            let message_id = response_body["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            return Ok(message_id);
        }

        let description = response_body["error"]["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();

        // The FCM error code lives in error.details[].errorCode; the
        // coarser error.status is the fallback.
        let code = response_body["error"]["details"]
            .as_array()
            .and_then(|details| {
                details
                    .iter()
                    .find_map(|d| d["errorCode"].as_str())
            })
            .or_else(|| response_body["error"]["status"].as_str())
            .unwrap_or_default();

        Err(match code {
            "UNREGISTERED" | "NOT_FOUND" => TransportError::unregistered(description),
            "INVALID_ARGUMENT" => TransportError::invalid_token(description),
            _ => TransportError::other(description),
        })
    }
}
