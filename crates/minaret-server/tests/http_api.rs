//! End-to-end tests against an ephemeral-port server with a stub transport.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::task::JoinHandle;

use minaret_dispatch::{SchedulerSettings, TransportError, testing::StubTransport};
use minaret_server::{AppState, build_app};

fn test_state() -> (Arc<StubTransport>, AppState) {
    let transport = Arc::new(StubTransport::new());
    let state = AppState::with_transport(transport.clone(), SchedulerSettings::default());
    (transport, state)
}

async fn start_server(
    state: AppState,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(state);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

async fn register_recipient(client: &reqwest::Client, base: &str, id: &str, token: Option<&str>) {
    let res = client
        .put(format!("{base}/recipients/{id}"))
        .json(&json!({ "fcmToken": token, "email": format!("{id}@example.test") }))
        .send()
        .await
        .expect("upsert recipient");
    assert_eq!(res.status().as_u16(), 204);
    // 204 carries no body.
    assert!(res.bytes().await.expect("response body").is_empty());
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (_transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let res = client.get(format!("{base}/")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["service"], "Minaret Server");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn broadcast_via_query_params_reports_counts() {
    let (transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    register_recipient(&client, &base, "e1", Some("T1")).await;
    register_recipient(&client, &base, "e2", Some("T2")).await;
    register_recipient(&client, &base, "e3", None).await;
    transport.fail_token("T2", TransportError::other("503"));

    let res = client
        .get(format!("{base}/send-prayer-notification"))
        .query(&[("prayerName", "Fajr"), ("message", "Prayer time")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Prayer time notification sent: Fajr");
    assert_eq!(body["recipients"], 2);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["failureCount"], 1);
    assert_eq!(body["totalEmployees"], 3);
    assert_eq!(body["usersWithTokens"], 2);
    assert_eq!(body["usersWithoutTokens"], 1);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn broadcast_via_json_body() {
    let (transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    register_recipient(&client, &base, "e1", Some("T1")).await;

    let res = client
        .post(format!("{base}/send-prayer-notification"))
        .json(&json!({ "prayerName": "Maghrib", "message": "Prayer time" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["successCount"], 1);
    assert_eq!(transport.sent_count(), 1);
    assert_eq!(transport.sent_messages()[0].notification.title, "Maghrib");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn broadcast_missing_params_is_rejected() {
    let (transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/send-prayer-notification"))
        .json(&json!({ "prayerName": "Fajr" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Missing required parameters: prayerName and message"
    );
    assert_eq!(transport.sent_count(), 0);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn queued_request_is_dispatched_inline() {
    let (_transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/notifications"))
        .json(&json!({
            "fcmToken": "T1",
            "title": "Fajr",
            "body": "Prayer time",
            "data": { "type": "prayer_time" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 202);
    let accepted: Value = res.json().await.unwrap();
    let id = accepted["id"].as_str().expect("request id");

    let res = client
        .get(format!("{base}/notifications/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let stored: Value = res.json().await.unwrap();
    assert_eq!(stored["status"], "sent");
    assert_eq!(stored["messageId"], "m1");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalid_request_ends_failed() {
    let (transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/notifications"))
        .json(&json!({ "title": "Fajr", "body": "Prayer time" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 202);
    let id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let stored: Value = client
        .get(format!("{base}/notifications/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["status"], "failed");
    assert_eq!(
        stored["error"],
        "Missing required fields (fcmToken, title, or body)"
    );
    assert_eq!(transport.sent_count(), 0);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn schedule_entry_is_created_pending() {
    let (_transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/schedules"))
        .json(&json!({
            "prayerName": "Fajr",
            "scheduledFor": "2026-09-01T05:28:00Z"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let entry: Value = res.json().await.unwrap();
    assert_eq!(entry["status"], "pending");
    assert_eq!(entry["prayerName"], "Fajr");
    assert!(entry["id"].as_str().is_some());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn unknown_request_returns_404() {
    let (_transport, state) = test_state();
    let (base, shutdown_tx, handle) = start_server(state).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base}/notifications/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
