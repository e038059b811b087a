//! Transport message construction.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use minaret_core::payload::{channel_for_type, notification_type, sanitize_data};

/// A structured push message, FCM v1 shaped.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: NotificationContent,
    pub data: HashMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, Serialize)]
pub struct AndroidNotification {
    pub sound: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, Serialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

impl PushMessage {
    /// Builds a message for one token: string-coerced data payload,
    /// high-priority android hint with the channel selected from the
    /// payload type, and a default-sound/badge-1 aps hint.
    pub fn build(
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, Value>,
    ) -> Self {
        let channel_id = channel_for_type(&notification_type(data));
        Self {
            token: token.to_string(),
            notification: NotificationContent {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: sanitize_data(data),
            android: AndroidConfig {
                priority: "high".to_string(),
                notification: AndroidNotification {
                    sound: "default".to_string(),
                    channel_id: channel_id.to_string(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            },
        }
    }
}
