//! Match engine — assigns waiting requesters to free helpers.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::QueueError;

use super::line::WaitingLine;
use super::model::{CompleteOutcome, LoginOutcome, Pairing, RequestOutcome, RequesterStatus};
use super::registry::{Helper, HelperRegistry};

/// Everything the engine mutates, guarded as one unit.
#[derive(Debug, Default)]
struct EngineState {
    registry: HelperRegistry,
    line: WaitingLine,
    /// helper id → requester id. One entry per busy helper.
    pairs: HashMap<String, String>,
    statuses: HashMap<String, RequesterStatus>,
}

/// The matching/queue engine.
///
/// All shared state lives behind a single lock. Every public operation
/// takes it once and runs synchronously to completion, so no caller can
/// observe a half-updated free pool or pairing table. Outbound
/// notifications belong to the caller, after the lock is released.
#[derive(Debug, Default)]
pub struct MatchEngine {
    state: RwLock<EngineState>,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for help. Pairs immediately with the longest-free helper when
    /// the pool is non-empty; otherwise joins the tail of the waiting line.
    ///
    /// Precondition: the requester is idle.
    pub async fn request(&self, requester_id: &str) -> Result<RequestOutcome, QueueError> {
        let mut state = self.state.write().await;
        let status = *state.status_entry(requester_id);
        if status != RequesterStatus::Idle {
            return Err(QueueError::RequesterNotIdle {
                user: requester_id.to_string(),
                status,
            });
        }

        if let Some(helper_id) = state.registry.pop_free() {
            let pairing = state.assign(&helper_id, requester_id)?;
            info!(requester = %requester_id, helper = %helper_id, "Requester paired immediately");
            Ok(RequestOutcome::Paired(pairing))
        } else {
            state
                .statuses
                .insert(requester_id.to_string(), RequesterStatus::Queued);
            let position = state.line.push_back(requester_id);
            info!(requester = %requester_id, position, "Requester queued");
            Ok(RequestOutcome::Queued { position })
        }
    }

    /// Leave the waiting line.
    ///
    /// Precondition: the requester is queued.
    pub async fn cancel(&self, requester_id: &str) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        let status = *state.status_entry(requester_id);
        if status != RequesterStatus::Queued {
            return Err(QueueError::RequesterNotQueued {
                user: requester_id.to_string(),
                status,
            });
        }

        let removed = state.line.remove(requester_id);
        debug_assert!(removed, "queued requester missing from waiting line");
        state
            .statuses
            .insert(requester_id.to_string(), RequesterStatus::Idle);
        info!(requester = %requester_id, "Requester left the waiting line");
        Ok(())
    }

    /// Finish a helper's current engagement. The freed requester goes back
    /// to idle; the helper re-enters the free pool only while still active,
    /// and the line is drained into the freed capacity.
    ///
    /// Precondition: the helper is registered and busy.
    pub async fn complete(&self, helper_id: &str) -> Result<CompleteOutcome, QueueError> {
        let mut state = self.state.write().await;
        let (freed, back_in_pool) = state.registry.mark_completed(helper_id)?;
        state.pairs.remove(helper_id);
        state
            .statuses
            .insert(freed.clone(), RequesterStatus::Idle);

        let pairings = if back_in_pool {
            state.drain()?
        } else {
            Vec::new()
        };
        info!(
            helper = %helper_id,
            requester = %freed,
            back_in_pool,
            "Engagement completed"
        );
        Ok(CompleteOutcome {
            freed_requester: freed,
            back_in_pool,
            pairings,
        })
    }

    /// Log a helper in for the first time, or toggle an existing helper's
    /// availability. Activation drains the waiting line into the freed
    /// capacity.
    pub async fn login_or_toggle(&self, helper_id: &str) -> Result<LoginOutcome, QueueError> {
        let mut state = self.state.write().await;
        let now_active = state.registry.login_or_toggle(helper_id);
        let pairings = if now_active { state.drain()? } else { Vec::new() };
        info!(helper = %helper_id, now_active, drained = pairings.len(), "Helper toggled");
        Ok(LoginOutcome {
            helper: helper_id.to_string(),
            now_active,
            pairings,
        })
    }

    /// Unconditionally stop a helper from accepting new assignments. A
    /// current engagement is left untouched.
    ///
    /// Precondition: the helper is registered.
    pub async fn force_offline(&self, helper_id: &str) -> Result<(), QueueError> {
        let mut state = self.state.write().await;
        state.registry.force_offline(helper_id)?;
        warn!(helper = %helper_id, "Helper forced offline");
        Ok(())
    }

    /// 1-based position in the waiting line.
    ///
    /// Precondition: the requester is queued.
    pub async fn position(&self, requester_id: &str) -> Result<usize, QueueError> {
        let state = self.state.read().await;
        state
            .line
            .position(requester_id)
            .ok_or_else(|| QueueError::RequesterNotQueued {
                user: requester_id.to_string(),
                status: state
                    .statuses
                    .get(requester_id)
                    .copied()
                    .unwrap_or_default(),
            })
    }

    /// Drop every helper, queue entry, pairing, and requester status in one
    /// step. Previously-known participants revert to the lazily-registered
    /// idle default.
    pub async fn admin_reset(&self) {
        let mut state = self.state.write().await;
        *state = EngineState::default();
        warn!("Queue state reset");
    }

    // ── Read accessors ──────────────────────────────────────────────────

    /// Current status of a requester. Unseen ids are registered as idle —
    /// this is the get-or-insert accessor backing lazy registration, and
    /// the one read that mutates.
    pub async fn status_of(&self, requester_id: &str) -> RequesterStatus {
        let mut state = self.state.write().await;
        *state.status_entry(requester_id)
    }

    /// `(is_helper, is_active)` for a user id.
    pub async fn is_helper(&self, user_id: &str) -> (bool, bool) {
        self.state.read().await.registry.is_helper(user_id)
    }

    /// Snapshot of one helper, if registered.
    pub async fn helper(&self, helper_id: &str) -> Option<Helper> {
        self.state.read().await.registry.get(helper_id).cloned()
    }

    pub async fn queue_length(&self) -> usize {
        self.state.read().await.line.len()
    }

    pub async fn pool_size(&self) -> usize {
        self.state.read().await.registry.pool_size()
    }

    /// Current assignments, sorted by helper id for stable rendering.
    pub async fn pairing_snapshot(&self) -> Vec<Pairing> {
        let state = self.state.read().await;
        let mut pairs: Vec<Pairing> = state
            .pairs
            .iter()
            .map(|(helper, requester)| Pairing {
                helper: helper.clone(),
                requester: requester.clone(),
            })
            .collect();
        pairs.sort_by(|a, b| a.helper.cmp(&b.helper));
        pairs
    }

    /// All known helpers, for the TA home view.
    pub async fn helper_roster(&self) -> Vec<Helper> {
        self.state.read().await.registry.roster()
    }

    /// Helpers currently accepting requests.
    pub async fn active_helper_count(&self) -> usize {
        self.state.read().await.registry.active_count()
    }

    /// Helpers free or mid-engagement.
    pub async fn serving_helper_count(&self) -> usize {
        self.state.read().await.registry.serving_count()
    }
}

impl EngineState {
    /// Get-or-insert accessor backing lazy requester registration.
    fn status_entry(&mut self, requester_id: &str) -> &mut RequesterStatus {
        self.statuses
            .entry(requester_id.to_string())
            .or_default()
    }

    /// The one primitive that creates a pairing. Immediate pairing in
    /// `request` and `drain` both go through here, so the status map, the
    /// pairing table, and the registry move together.
    fn assign(&mut self, helper_id: &str, requester_id: &str) -> Result<Pairing, QueueError> {
        self.registry.mark_assigned(helper_id, requester_id)?;
        self.pairs
            .insert(helper_id.to_string(), requester_id.to_string());
        self.statuses
            .insert(requester_id.to_string(), RequesterStatus::Busy);
        debug!(helper = %helper_id, requester = %requester_id, "Assignment recorded");
        Ok(Pairing {
            helper: helper_id.to_string(),
            requester: requester_id.to_string(),
        })
    }

    /// Consume the waiting line against the free pool until one runs dry.
    /// A no-op when either side is empty.
    fn drain(&mut self) -> Result<Vec<Pairing>, QueueError> {
        let mut pairings = Vec::new();
        while !self.line.is_empty() {
            let Some(helper_id) = self.registry.pop_free() else {
                break;
            };
            let Some(requester_id) = self.line.pop_front() else {
                break;
            };
            pairings.push(self.assign(&helper_id, &requester_id)?);
        }
        Ok(pairings)
    }
}
