//! The console state: both record collections, selections, counts and flags.
//!
//! Collections are only ever replaced together with their pending count and
//! a re-resolved selection, so no reader can observe a list whose count or
//! selection is stale. Selections are kept as ids and resolved on read.

use crate::approval::types::{ApprovalRequest, DeferredAction};
use crate::config::defaults;
use std::time::Duration;

/// Which collection the console is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Pending,
    Deferred,
}

impl Tab {
    pub fn toggle(self) -> Tab {
        match self {
            Tab::Pending => Tab::Deferred,
            Tab::Deferred => Tab::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    requests: Vec<ApprovalRequest>,
    selected_request: Option<String>,
    pending_count: usize,

    deferred_actions: Vec<DeferredAction>,
    selected_deferred: Option<String>,
    deferred_count: usize,

    active_tab: Tab,

    pub(crate) is_loading: bool,
    pub(crate) is_action_loading: bool,
    pub(crate) is_deferred_loading: bool,
    pub(crate) error: Option<String>,

    pub(crate) polling_interval: Duration,
    pub(crate) polling_enabled: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            selected_request: None,
            pending_count: 0,
            deferred_actions: Vec::new(),
            selected_deferred: None,
            deferred_count: 0,
            active_tab: Tab::Pending,
            is_loading: false,
            is_action_loading: false,
            is_deferred_loading: false,
            error: None,
            polling_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            polling_enabled: true,
        }
    }
}

impl Snapshot {
    pub fn requests(&self) -> &[ApprovalRequest] {
        &self.requests
    }

    pub fn selected_request_id(&self) -> Option<&str> {
        self.selected_request.as_deref()
    }

    pub fn selected_request(&self) -> Option<&ApprovalRequest> {
        let id = self.selected_request.as_deref()?;
        self.requests.iter().find(|r| r.approval_id == id)
    }

    /// Number of requests with status pending.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    pub fn deferred_actions(&self) -> &[DeferredAction] {
        &self.deferred_actions
    }

    pub fn selected_deferred_id(&self) -> Option<&str> {
        self.selected_deferred.as_deref()
    }

    pub fn selected_deferred(&self) -> Option<&DeferredAction> {
        let id = self.selected_deferred.as_deref()?;
        self.deferred_actions.iter().find(|a| a.deferred_id == id)
    }

    /// Number of deferred actions with status pending.
    pub fn deferred_count(&self) -> usize {
        self.deferred_count
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_action_loading(&self) -> bool {
        self.is_action_loading
    }

    pub fn is_deferred_loading(&self) -> bool {
        self.is_deferred_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn is_polling_enabled(&self) -> bool {
        self.polling_enabled
    }

    /// Nothing to show yet and a first load is in flight.
    pub fn is_initial_loading(&self) -> bool {
        (self.is_loading || self.is_deferred_loading)
            && self.requests.is_empty()
            && self.deferred_actions.is_empty()
    }

    /// Requests listed in the console: the pending ones, in server order.
    pub fn visible_requests(&self) -> Vec<&ApprovalRequest> {
        self.requests.iter().filter(|r| r.is_pending()).collect()
    }

    /// Deferred actions listed in the console: the pending ones, in server order.
    pub fn visible_deferred(&self) -> Vec<&DeferredAction> {
        self.deferred_actions
            .iter()
            .filter(|a| a.is_pending())
            .collect()
    }

    pub(crate) fn replace_requests(&mut self, requests: Vec<ApprovalRequest>) {
        self.pending_count = requests.iter().filter(|r| r.is_pending()).count();
        if let Some(id) = self.selected_request.take() {
            if requests.iter().any(|r| r.approval_id == id) {
                self.selected_request = Some(id);
            }
        }
        self.requests = requests;
    }

    pub(crate) fn replace_deferred(&mut self, actions: Vec<DeferredAction>) {
        self.deferred_count = actions.iter().filter(|a| a.is_pending()).count();
        if let Some(id) = self.selected_deferred.take() {
            if actions.iter().any(|a| a.deferred_id == id) {
                self.selected_deferred = Some(id);
            }
        }
        self.deferred_actions = actions;
    }

    /// Mutate the deferred collection in place, keeping the count in sync.
    pub(crate) fn modify_deferred<R>(&mut self, f: impl FnOnce(&mut Vec<DeferredAction>) -> R) -> R {
        let mut actions = std::mem::take(&mut self.deferred_actions);
        let result = f(&mut actions);
        self.replace_deferred(actions);
        result
    }

    /// Select a request by id. Unknown ids clear the selection.
    pub(crate) fn select_request(&mut self, id: Option<&str>) {
        self.selected_request = id
            .filter(|id| self.requests.iter().any(|r| r.approval_id == *id))
            .map(str::to_string);
    }

    /// Select a deferred action by id. Unknown ids clear the selection.
    pub(crate) fn select_deferred(&mut self, id: Option<&str>) {
        self.selected_deferred = id
            .filter(|id| self.deferred_actions.iter().any(|a| a.deferred_id == *id))
            .map(str::to_string);
    }

    pub(crate) fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Select the first pending item of the active collection when nothing
    /// is selected there. Returns true when the selection changed.
    pub(crate) fn auto_select(&mut self) -> bool {
        match self.active_tab {
            Tab::Pending => {
                if self.selected_request.is_some() {
                    return false;
                }
                let first = self
                    .requests
                    .iter()
                    .find(|r| r.is_pending())
                    .map(|r| r.approval_id.clone());
                let changed = first.is_some();
                self.selected_request = first;
                changed
            }
            Tab::Deferred => {
                if self.selected_deferred.is_some() {
                    return false;
                }
                let first = self
                    .deferred_actions
                    .iter()
                    .find(|a| a.is_pending())
                    .map(|a| a.deferred_id.clone());
                let changed = first.is_some();
                self.selected_deferred = first;
                changed
            }
        }
    }

    /// Move the selection within the visible items of the active tab.
    pub(crate) fn select_relative(&mut self, delta: isize) {
        let (ids, current): (Vec<String>, Option<&str>) = match self.active_tab {
            Tab::Pending => (
                self.visible_requests()
                    .iter()
                    .map(|r| r.approval_id.clone())
                    .collect(),
                self.selected_request.as_deref(),
            ),
            Tab::Deferred => (
                self.visible_deferred()
                    .iter()
                    .map(|a| a.deferred_id.clone())
                    .collect(),
                self.selected_deferred.as_deref(),
            ),
        };
        if ids.is_empty() {
            return;
        }

        let next = match current.and_then(|c| ids.iter().position(|id| id == c)) {
            Some(index) => {
                let last = ids.len() as isize - 1;
                (index as isize + delta).clamp(0, last) as usize
            }
            None => 0,
        };
        let id = ids[next].clone();
        match self.active_tab {
            Tab::Pending => self.selected_request = Some(id),
            Tab::Deferred => self.selected_deferred = Some(id),
        }
    }

    /// Demo-mode countdown: every remaining-time field drops by `step`
    /// seconds, never below zero.
    pub(crate) fn tick_countdown(&mut self, step: i64) {
        let requests = self
            .requests
            .iter()
            .cloned()
            .map(|mut r| {
                r.time_remaining_seconds = (r.time_remaining_seconds - step).max(0);
                r
            })
            .collect();
        self.replace_requests(requests);
        self.modify_deferred(|actions| {
            for action in actions.iter_mut() {
                action.time_until_execution = (action.time_until_execution - step).max(0);
            }
        });
    }
}
