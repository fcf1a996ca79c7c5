//! Webhook endpoints — receive Slack events and dispatch into the engine.
//!
//! State mutation and notification are strictly ordered: handlers call the
//! engine first, then notify from the returned outcome. A failed send is
//! logged and never rolls back the committed transition.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::notify::Notifier;
use crate::queue::{MatchEngine, Pairing, RequestOutcome, RequesterStatus};
use crate::slack::events::{EventEnvelope, InnerEvent, InteractForm, InteractPayload};
use crate::slack::home::{self, HelperHome, RosterLine, StudentHome, action};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub notifier: Arc<dyn Notifier>,
    /// Shared secret every inbound payload must present.
    verification_token: SecretString,
}

/// Build the Axum router for the Slack webhook surface.
pub fn slack_routes(
    engine: Arc<MatchEngine>,
    notifier: Arc<dyn Notifier>,
    verification_token: SecretString,
) -> Router {
    let state = AppState {
        engine,
        notifier,
        verification_token,
    };

    Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(events))
        .route("/slack/interact", post(interact))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lab-assist"
    }))
}

// ── Event callbacks ─────────────────────────────────────────────────────

async fn events(
    State(state): State<AppState>,
    Json(envelope): Json<EventEnvelope>,
) -> (StatusCode, String) {
    match envelope {
        EventEnvelope::UrlVerification { token, challenge } => {
            if !token_matches(&state, &token) {
                return (StatusCode::UNAUTHORIZED, String::new());
            }
            (StatusCode::OK, challenge)
        }
        EventEnvelope::EventCallback { token, event } => {
            if !token_matches(&state, &token) {
                return (StatusCode::UNAUTHORIZED, String::new());
            }
            match event {
                InnerEvent::AppHomeOpened { user } => {
                    debug!(user = %user, "Home opened");
                    refresh_home(&state, &user).await;
                }
                InnerEvent::Ignored => {}
            }
            (StatusCode::OK, String::new())
        }
    }
}

// ── Interactive components ──────────────────────────────────────────────

async fn interact(State(state): State<AppState>, Form(form): Form<InteractForm>) -> StatusCode {
    let payload: InteractPayload = match serde_json::from_str(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Unparseable interactivity payload");
            return StatusCode::BAD_REQUEST;
        }
    };
    if !token_matches(&state, &payload.token) {
        return StatusCode::UNAUTHORIZED;
    }

    let user = payload.user.id;
    for pressed in &payload.actions {
        dispatch_action(&state, &user, &pressed.action_id).await;
    }
    refresh_home(&state, &user).await;
    StatusCode::OK
}

/// Route one button press into the engine, then notify from the outcome.
async fn dispatch_action(state: &AppState, user: &str, action_id: &str) {
    match action_id {
        action::REQUEST_HELP => match state.engine.request(user).await {
            Ok(RequestOutcome::Paired(pairing)) => notify_pairing(state, &pairing).await,
            Ok(RequestOutcome::Queued { position }) => {
                info!(user = %user, position, "Requester queued");
            }
            Err(err) => stale_action(user, action_id, &err),
        },

        action::LEAVE_QUEUE => {
            if let Err(err) = state.engine.cancel(user).await {
                stale_action(user, action_id, &err);
            }
        }

        action::TA_TOGGLE => match state.engine.login_or_toggle(user).await {
            Ok(outcome) => {
                let text = if outcome.now_active {
                    "You have started accepting requests!"
                } else {
                    "You are logged off and are no longer accepting new requests!"
                };
                send_or_log(state, user, text).await;
                for pairing in &outcome.pairings {
                    notify_pairing(state, pairing).await;
                }
            }
            Err(err) => stale_action(user, action_id, &err),
        },

        action::TA_COMPLETE => match state.engine.complete(user).await {
            Ok(outcome) => {
                let student = display_name_or_id(state, &outcome.freed_requester).await;
                send_or_log(state, user, &format!("You finished helping {student}.")).await;
                send_or_log(
                    state,
                    &outcome.freed_requester,
                    "You have been helped! Ask again any time something else comes up.",
                )
                .await;
                for pairing in &outcome.pairings {
                    notify_pairing(state, pairing).await;
                }
            }
            Err(err) => stale_action(user, action_id, &err),
        },

        action::ADMIN_RESET => {
            state.engine.admin_reset().await;
            send_or_log(state, user, "Queue reset. All helpers and requests were cleared.").await;
        }

        other => {
            debug!(user = %user, action = %other, "Unhandled action id");
        }
    }
}

/// Stale button press: the engine refused the transition. The home refresh
/// that follows shows the user current state.
fn stale_action(user: &str, action_id: &str, err: &QueueError) {
    warn!(user = %user, action = %action_id, error = %err, "Action refused");
}

/// Tell both sides of a fresh assignment.
async fn notify_pairing(state: &AppState, pairing: &Pairing) {
    let student = display_name_or_id(state, &pairing.requester).await;
    if let Err(err) = state
        .notifier
        .notify_blocks(&pairing.helper, home::request_dm(&student))
        .await
    {
        warn!(helper = %pairing.helper, error = %err, "Request DM failed");
    }

    let helper = display_name_or_id(state, &pairing.helper).await;
    send_or_log(
        state,
        &pairing.requester,
        &format!("You are now connected to TA {helper} — check your direct messages."),
    )
    .await;
}

/// A failed send never affects the committed state transition.
async fn send_or_log(state: &AppState, user: &str, text: &str) {
    if let Err(err) = state.notifier.notify(user, text).await {
        warn!(user = %user, error = %err, "Notification failed");
    }
}

async fn display_name_or_id(state: &AppState, user: &str) -> String {
    state
        .notifier
        .display_name(user)
        .await
        .unwrap_or_else(|_| user.to_string())
}

/// Re-publish the acting user's home view.
async fn refresh_home(state: &AppState, user: &str) {
    let view = render_home(state, user).await;
    if let Err(err) = state.notifier.publish_home(user, view).await {
        warn!(user = %user, error = %err, "Home publish failed");
    }
}

/// Render the home view for a user from current engine state. Registered
/// helpers get the TA view; everyone else gets the student view and is
/// lazily registered as an idle requester.
async fn render_home(state: &AppState, user: &str) -> Value {
    let display_name = display_name_or_id(state, user).await;

    match state.engine.helper(user).await {
        Some(own) => {
            let mut roster = Vec::new();
            for helper in state.engine.helper_roster().await {
                if !helper.active && !helper.busy {
                    continue;
                }
                let name = display_name_or_id(state, &helper.id).await;
                let helping = match &helper.current_requester {
                    Some(student) => Some(display_name_or_id(state, student).await),
                    None => None,
                };
                roster.push(RosterLine { name, helping });
            }
            home::helper_home(&HelperHome {
                display_name: &display_name,
                is_active: own.active,
                is_busy: own.busy,
                active_count: state.engine.active_helper_count().await,
                roster,
                queue_length: state.engine.queue_length().await,
            })
        }
        None => {
            let status = state.engine.status_of(user).await;
            let position = match status {
                RequesterStatus::Queued => state.engine.position(user).await.ok(),
                _ => None,
            };
            home::student_home(&StudentHome {
                display_name: &display_name,
                status,
                position,
                active_helpers: state.engine.active_helper_count().await,
            })
        }
    }
}

fn token_matches(state: &AppState, token: &str) -> bool {
    if token == state.verification_token.expose_secret() {
        true
    } else {
        warn!("Inbound payload with a bad verification token");
        false
    }
}
