//! Data payload coercion and device channel selection.

use std::collections::HashMap;

use serde_json::Value;

/// Device-side channel for prayer-time notifications.
pub const PRAYER_TIME_CHANNEL: &str = "prayer_time_channel";
/// Device-side channel for everything else.
pub const GENERAL_CHANNEL: &str = "attendance_app_channel";
/// Payload `type` value that selects the prayer-time channel.
pub const PRAYER_TIME_TYPE: &str = "prayer_time";

const GENERAL_TYPE: &str = "general";

/// Resolves the notification type from a raw payload, defaulting to
/// "general". Only a non-empty string counts as a type; any other value is
/// treated as absent.
pub fn notification_type(data: &HashMap<String, Value>) -> String {
    data.get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| GENERAL_TYPE.to_string())
}

/// Single channel rule: `type == "prayer_time"` selects the prayer-time
/// channel, anything else the general one.
pub fn channel_for_type(notification_type: &str) -> &'static str {
    if notification_type == PRAYER_TIME_TYPE {
        PRAYER_TIME_CHANNEL
    } else {
        GENERAL_CHANNEL
    }
}

/// Coerces every payload value to a string; the transport only accepts
/// string-valued data. Nulls become empty strings, everything non-scalar
/// its JSON text. The `type` key is always present in the result.
pub fn sanitize_data(data: &HashMap<String, Value>) -> HashMap<String, String> {
    let mut sanitized: HashMap<String, String> = data
        .iter()
        .map(|(k, v)| (k.clone(), coerce_scalar(v)))
        .collect();
    sanitized.insert("type".to_string(), notification_type(data));
    sanitized
}

fn coerce_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Payload attached to every prayer-time broadcast.
pub fn prayer_payload(prayer_name: &str) -> HashMap<String, Value> {
    HashMap::from([
        ("type".to_string(), Value::from(PRAYER_TIME_TYPE)),
        ("prayerName".to_string(), Value::from(prayer_name)),
    ])
}
