use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;

use minaret_core::{NewNotificationRequest, NewScheduleEntry, Recipient};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Minaret Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

// ---- Broadcast endpoint ----

/// Broadcast parameters, accepted in the query string or the JSON body.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastParams {
    pub prayer_name: Option<String>,
    pub message: Option<String>,
}

impl BroadcastParams {
    /// Query values win over body values.
    fn merged(query: Self, body: Option<Self>) -> Self {
        let body = body.unwrap_or_default();
        Self {
            prayer_name: query.prayer_name.or(body.prayer_name),
            message: query.message.or(body.message),
        }
    }
}

pub async fn send_prayer_notification(
    State(state): State<AppState>,
    Query(query): Query<BroadcastParams>,
    body: Option<Json<BroadcastParams>>,
) -> impl IntoResponse {
    let params = BroadcastParams::merged(query, body.map(|Json(b)| b));

    let (Some(prayer_name), Some(message)) = (params.prayer_name, params.message) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing required parameters: prayerName and message"
            })),
        );
    };

    match state.broadcast.broadcast(&prayer_name, &message).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Prayer time notification sent: {prayer_name}"),
                "recipients": summary.recipients,
                "successCount": summary.success_count,
                "failureCount": summary.failure_count,
                "totalEmployees": summary.total_recipients,
                "usersWithTokens": summary.with_tokens,
                "usersWithoutTokens": summary.without_tokens,
            })),
        ),
        Err(err) => {
            error!(error = %err, "Error sending prayer time notification");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to send prayer time notification",
                    "details": err.to_string(),
                })),
            )
        }
    }
}

// ---- Request trigger ----

/// Queues a notification request and dispatches it inline. The dispatcher
/// records the outcome on the request itself; the response only confirms
/// acceptance.
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<NewNotificationRequest>,
) -> impl IntoResponse {
    let created = match state.requests.create(payload).await {
        Ok(r) => r,
        Err(err) => return storage_error("create notification request", &err),
    };

    state.request_dispatcher.handle(&created).await;

    (
        StatusCode::ACCEPTED,
        Json(json!({ "id": created.id, "status": "accepted" })),
    )
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.requests.get(&id).await {
        Ok(Some(request)) => (StatusCode::OK, Json(json!(request))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("notification request '{id}' not found") })),
        ),
        Err(err) => storage_error("read notification request", &err),
    }
}

// ---- Schedule entries ----

pub async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<NewScheduleEntry>,
) -> impl IntoResponse {
    match state.schedules.create(payload).await {
        Ok(entry) => (StatusCode::CREATED, Json(json!(entry))),
        Err(err) => storage_error("create schedule entry", &err),
    }
}

// ---- Recipient directory ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientBody {
    #[serde(default)]
    pub fcm_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Device re-registration: replaces the whole recipient record.
pub async fn upsert_recipient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RecipientBody>,
) -> impl IntoResponse {
    let recipient = Recipient {
        id,
        fcm_token: body.fcm_token,
        email: body.email,
    };
    match state.directory.upsert(recipient).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => storage_error("upsert recipient", &err).into_response(),
    }
}

fn storage_error(
    action: &str,
    err: &minaret_storage::StorageError,
) -> (StatusCode, Json<Value>) {
    error!(error = %err, "Failed to {action}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Failed to {action}") })),
    )
}
