//! Integration tests for the Slack webhook surface.
//!
//! Each test binds the Axum router to a random port, drives it with the
//! JSON Slack actually sends, and records outbound notifications through a
//! stub Notifier — no network beyond loopback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use lab_assist::error::SlackError;
use lab_assist::notify::Notifier;
use lab_assist::queue::{MatchEngine, RequesterStatus};
use lab_assist::server::slack_routes;

const SHARED_SECRET: &str = "shared-secret";

/// Records every outbound call instead of talking to Slack.
#[derive(Default)]
struct RecordingNotifier {
    /// (user, text) per notification; block DMs record as "<blocks>".
    sent: Mutex<Vec<(String, String)>>,
    /// Users whose home view was published.
    homes: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: &str, text: &str) -> Result<(), SlackError> {
        self.sent
            .lock()
            .await
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn notify_blocks(&self, user_id: &str, _blocks: Vec<Value>) -> Result<(), SlackError> {
        self.sent
            .lock()
            .await
            .push((user_id.to_string(), "<blocks>".to_string()));
        Ok(())
    }

    async fn publish_home(&self, user_id: &str, _view: Value) -> Result<(), SlackError> {
        self.homes.lock().await.push(user_id.to_string());
        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> Result<String, SlackError> {
        Ok(format!("name-of-{user_id}"))
    }
}

async fn start_server() -> (u16, Arc<MatchEngine>, Arc<RecordingNotifier>) {
    let engine = Arc::new(MatchEngine::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let app = slack_routes(
        Arc::clone(&engine),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        SecretString::from(SHARED_SECRET),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, engine, notifier)
}

fn block_action_payload(token: &str, user: &str, action_id: &str) -> String {
    json!({
        "type": "block_actions",
        "token": token,
        "user": { "id": user, "username": user },
        "actions": [ { "action_id": action_id, "value": action_id } ],
    })
    .to_string()
}

/// Press a home-view button as `user`.
async fn press(port: u16, user: &str, action_id: &str) -> u16 {
    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/slack/interact"))
        .form(&[("payload", block_action_payload(SHARED_SECRET, user, action_id))])
        .send()
        .await
        .unwrap();
    response.status().as_u16()
}

#[tokio::test]
async fn health_endpoint_answers() {
    let (port, _engine, _notifier) = start_server().await;

    let body: Value = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{port}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let (port, _engine, _notifier) = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/slack/events"))
        .json(&json!({
            "type": "url_verification",
            "token": SHARED_SECRET,
            "challenge": "c0ffee",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "c0ffee");
}

#[tokio::test]
async fn bad_token_is_rejected_without_dispatch() {
    let (port, engine, notifier) = start_server().await;

    let status = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/slack/interact"))
        .form(&[(
            "payload",
            block_action_payload("wrong-secret", "U-student", "request_help"),
        )])
        .send()
        .await
        .unwrap()
        .status();

    assert_eq!(status.as_u16(), 401);
    assert_eq!(engine.queue_length().await, 0);
    assert_eq!(engine.status_of("U-student").await, RequesterStatus::Idle);
    assert!(notifier.homes.lock().await.is_empty());
}

#[tokio::test]
async fn app_home_opened_registers_and_publishes() {
    let (port, engine, notifier) = start_server().await;

    let status = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/slack/events"))
        .json(&json!({
            "type": "event_callback",
            "token": SHARED_SECRET,
            "event": { "type": "app_home_opened", "user": "U-new", "tab": "home" },
        }))
        .send()
        .await
        .unwrap()
        .status();

    assert_eq!(status.as_u16(), 200);
    assert_eq!(engine.status_of("U-new").await, RequesterStatus::Idle);
    assert_eq!(notifier.homes.lock().await.as_slice(), ["U-new"]);
}

#[tokio::test]
async fn request_with_free_helper_pairs_and_notifies_both_sides() {
    let (port, engine, notifier) = start_server().await;

    assert_eq!(press(port, "U-ta", "ta_toggle").await, 200);
    assert_eq!(press(port, "U-student", "request_help").await, 200);

    let pairs = engine.pairing_snapshot().await;
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].helper, "U-ta");
    assert_eq!(pairs[0].requester, "U-student");

    let sent = notifier.sent.lock().await;
    // TA got the login confirmation and the request DM; student got the
    // connection notice.
    assert!(sent.contains(&("U-ta".into(), "<blocks>".into())));
    assert!(
        sent.iter()
            .any(|(user, text)| user == "U-student" && text.contains("name-of-U-ta"))
    );

    // Both actors had their home view refreshed after acting.
    let homes = notifier.homes.lock().await;
    assert_eq!(homes.as_slice(), ["U-ta", "U-student"]);
}

#[tokio::test]
async fn complete_frees_student_and_drains_queue() {
    let (port, engine, notifier) = start_server().await;

    press(port, "U-ta", "ta_toggle").await;
    press(port, "U-s1", "request_help").await;
    press(port, "U-s2", "request_help").await;
    assert_eq!(engine.queue_length().await, 1);

    assert_eq!(press(port, "U-ta", "ta_complete").await, 200);

    assert_eq!(engine.status_of("U-s1").await, RequesterStatus::Idle);
    assert_eq!(engine.status_of("U-s2").await, RequesterStatus::Busy);
    assert_eq!(engine.queue_length().await, 0);

    let sent = notifier.sent.lock().await;
    assert!(
        sent.iter()
            .any(|(user, text)| user == "U-ta" && text.contains("name-of-U-s1"))
    );
    assert!(
        sent.iter()
            .any(|(user, text)| user == "U-s1" && text.contains("helped"))
    );
}

#[tokio::test]
async fn stale_press_is_refused_but_acknowledged() {
    let (port, engine, _notifier) = start_server().await;

    press(port, "U-student", "request_help").await;
    // Second press is a precondition violation inside the engine; the
    // transport still acknowledges so Slack doesn't retry.
    assert_eq!(press(port, "U-student", "request_help").await, 200);

    assert_eq!(engine.queue_length().await, 1);
    assert_eq!(engine.status_of("U-student").await, RequesterStatus::Queued);
}

#[tokio::test]
async fn leave_queue_removes_exactly_one() {
    let (port, engine, _notifier) = start_server().await;

    press(port, "U-s1", "request_help").await;
    press(port, "U-s2", "request_help").await;
    press(port, "U-s1", "leave_queue").await;

    assert_eq!(engine.queue_length().await, 1);
    assert_eq!(engine.position("U-s2").await.unwrap(), 1);
    assert_eq!(engine.status_of("U-s1").await, RequesterStatus::Idle);
}

#[tokio::test]
async fn admin_reset_clears_everything() {
    let (port, engine, _notifier) = start_server().await;

    press(port, "U-ta", "ta_toggle").await;
    press(port, "U-s1", "request_help").await;
    press(port, "U-s2", "request_help").await;

    assert_eq!(press(port, "U-ta", "admin_reset").await, 200);

    assert_eq!(engine.queue_length().await, 0);
    assert_eq!(engine.pool_size().await, 0);
    assert!(engine.pairing_snapshot().await.is_empty());
    assert_eq!(engine.is_helper("U-ta").await, (false, false));
}

#[tokio::test]
async fn unknown_action_is_acknowledged_and_ignored() {
    let (port, engine, _notifier) = start_server().await;

    assert_eq!(press(port, "U-x", "mystery_button").await, 200);
    assert_eq!(engine.queue_length().await, 0);
}
