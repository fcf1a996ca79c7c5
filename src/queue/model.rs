//! Requester state machine and engine operation outcomes.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a requester.
///
/// Legal transitions are `Idle → Queued → Busy → Idle`, plus
/// `Queued → Idle` on cancel. Any unseen user id reads as `Idle`;
/// registration happens lazily on first status lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterStatus {
    #[default]
    Idle,
    Queued,
    Busy,
}

impl std::fmt::Display for RequesterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Busy => "busy",
        };
        write!(f, "{s}")
    }
}

/// A helper↔requester assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub helper: String,
    pub requester: String,
}

/// Result of [`MatchEngine::request`](super::MatchEngine::request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A free helper was available; the requester is now busy with it.
    Paired(Pairing),
    /// No helper was free; the requester joined the waiting line.
    Queued { position: usize },
}

/// Result of [`MatchEngine::login_or_toggle`](super::MatchEngine::login_or_toggle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub helper: String,
    /// Whether the helper is accepting requests after the toggle.
    pub now_active: bool,
    /// Assignments made by draining the line into the freed capacity.
    pub pairings: Vec<Pairing>,
}

/// Result of [`MatchEngine::complete`](super::MatchEngine::complete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOutcome {
    /// The requester this helper just finished with, now idle again.
    pub freed_requester: String,
    /// Whether the helper re-entered the free pool. False once the helper
    /// has logged off mid-engagement.
    pub back_in_pool: bool,
    /// Assignments made by draining the line into the freed capacity.
    pub pairings: Vec<Pairing>,
}
