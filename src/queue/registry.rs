//! Helper registry — identity, availability, and the free pool.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::QueueError;

/// A registered staff helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helper {
    pub id: String,
    /// Accepting new assignments.
    pub active: bool,
    /// Currently engaged with a requester.
    pub busy: bool,
    /// The requester being helped. Set iff `busy`.
    pub current_requester: Option<String>,
}

impl Helper {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            active: false,
            busy: false,
            current_requester: None,
        }
    }
}

/// The set of known helpers plus the free pool.
///
/// The free pool is FIFO by become-free time: a `VecDeque` carries the
/// order, a companion `HashSet` keeps membership checks O(1). Helpers are
/// never destroyed, only toggled, except by [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, Helper>,
    free_order: VecDeque<String>,
    free_members: HashSet<String>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the helper on first sight, then flip `active`. Returns the
    /// new `active` flag.
    ///
    /// Activation puts a non-busy helper at the tail of the free pool.
    /// Deactivation removes it from the pool but leaves a current
    /// engagement untouched: logging off mid-engagement does not abandon
    /// the requester, it only stops new assignments.
    pub fn login_or_toggle(&mut self, helper_id: &str) -> bool {
        let helper = self
            .helpers
            .entry(helper_id.to_string())
            .or_insert_with(|| Helper::new(helper_id));
        helper.active = !helper.active;
        let now_active = helper.active;
        let busy = helper.busy;

        if now_active {
            if !busy {
                self.push_free(helper_id);
            }
        } else {
            self.remove_free(helper_id);
        }
        now_active
    }

    /// Unconditional deactivation. No notification, no completion
    /// bookkeeping; a busy helper stays paired.
    pub fn force_offline(&mut self, helper_id: &str) -> Result<(), QueueError> {
        let helper = self.get_mut(helper_id)?;
        helper.active = false;
        self.remove_free(helper_id);
        Ok(())
    }

    /// Take the helper that has been free the longest out of the pool.
    pub fn pop_free(&mut self) -> Option<String> {
        let id = self.free_order.pop_front()?;
        self.free_members.remove(&id);
        Some(id)
    }

    /// Record an assignment. The helper id must have just come out of the
    /// free pool via [`pop_free`](Self::pop_free).
    pub fn mark_assigned(&mut self, helper_id: &str, requester_id: &str) -> Result<(), QueueError> {
        let helper = self.get_mut(helper_id)?;
        debug_assert!(!helper.busy, "assignment to a busy helper: {helper_id}");
        helper.busy = true;
        helper.current_requester = Some(requester_id.to_string());
        Ok(())
    }

    /// Clear an engagement. Returns the freed requester id and whether the
    /// helper re-entered the free pool — it does so only while still
    /// `active`; a helper that logged off mid-engagement stays out.
    pub fn mark_completed(&mut self, helper_id: &str) -> Result<(String, bool), QueueError> {
        let helper = self.get_mut(helper_id)?;
        let Some(finished) = helper.current_requester.take() else {
            return Err(QueueError::HelperNotBusy {
                helper: helper_id.to_string(),
            });
        };
        helper.busy = false;
        let back_in_pool = helper.active;
        if back_in_pool {
            self.push_free(helper_id);
        }
        Ok((finished, back_in_pool))
    }

    /// `(is_helper, is_active)` for a user id.
    pub fn is_helper(&self, user_id: &str) -> (bool, bool) {
        match self.helpers.get(user_id) {
            Some(helper) => (true, helper.active),
            None => (false, false),
        }
    }

    pub fn get(&self, helper_id: &str) -> Option<&Helper> {
        self.helpers.get(helper_id)
    }

    /// Helpers with `active && !busy`.
    pub fn pool_size(&self) -> usize {
        self.free_order.len()
    }

    /// Helpers currently accepting requests.
    pub fn active_count(&self) -> usize {
        self.helpers.values().filter(|h| h.active).count()
    }

    /// Helpers free or mid-engagement. Logged-off idle helpers don't count.
    pub fn serving_count(&self) -> usize {
        self.free_order.len() + self.helpers.values().filter(|h| h.busy).count()
    }

    /// All known helpers, sorted by id for stable rendering.
    pub fn roster(&self) -> Vec<Helper> {
        let mut all: Vec<Helper> = self.helpers.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn clear(&mut self) {
        self.helpers.clear();
        self.free_order.clear();
        self.free_members.clear();
    }

    fn get_mut(&mut self, helper_id: &str) -> Result<&mut Helper, QueueError> {
        self.helpers
            .get_mut(helper_id)
            .ok_or_else(|| QueueError::UnknownHelper {
                user: helper_id.to_string(),
            })
    }

    fn push_free(&mut self, helper_id: &str) {
        if self.free_members.insert(helper_id.to_string()) {
            self.free_order.push_back(helper_id.to_string());
        }
    }

    fn remove_free(&mut self, helper_id: &str) {
        if self.free_members.remove(helper_id) {
            self.free_order.retain(|id| id != helper_id);
        }
    }
}
