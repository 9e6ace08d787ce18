//! Client-side store for the Safeguard console.
//!
//! Holds the `Snapshot` behind a single async lock. Every operation applies
//! its outcome in one locked closure, and the lock is never held across a
//! network call, so intermediate states (`loading = true`) stay observable
//! while a request is in flight.

pub mod snapshot;

use crate::api::error::{ApiError, ApiResult, ErrorKind};
use crate::api::protocol::{CancelBody, DecisionBody, DEFAULT_LIST_LIMIT};
use crate::api::SafeguardApi;
use crate::approval::lifecycle::{self, LifecycleError};
use crate::approval::types::{ApprovalRequest, ApprovalStatus, DeferredAction};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub use snapshot::{Snapshot, Tab};

const REQUESTS_LOAD_ERROR: &str = "Failed to load pending requests";
const DEFERRED_LOAD_ERROR: &str = "Failed to load deferred actions";
const UNAUTHORIZED_ERROR: &str = "Access not authorized";
const FORBIDDEN_ERROR: &str = "Insufficient clearance level";

/// Which collection a fetch was loading; used to word failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Requests,
    Deferred,
}

/// Operator-facing message for a failed fetch.
pub fn fetch_failure_message(collection: Collection, kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Unauthorized => UNAUTHORIZED_ERROR,
        ErrorKind::Forbidden => FORBIDDEN_ERROR,
        ErrorKind::Transport | ErrorKind::ServerLogical => match collection {
            Collection::Requests => REQUESTS_LOAD_ERROR,
            Collection::Deferred => DEFERRED_LOAD_ERROR,
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn default_error(self) -> &'static str {
        match self {
            Decision::Approve => "Failed to approve the request",
            Decision::Reject => "Failed to reject the request",
        }
    }
}

/// Shared handle on the console state. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    api: Arc<dyn SafeguardApi>,
    state: Arc<RwLock<Snapshot>>,
    deferred_limit: u32,
}

impl Store {
    pub fn new(api: Arc<dyn SafeguardApi>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(Snapshot::default())),
            deferred_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Page size used when listing deferred actions.
    pub fn with_deferred_limit(mut self, limit: u32) -> Self {
        self.deferred_limit = limit;
        self
    }

    pub fn api(&self) -> &Arc<dyn SafeguardApi> {
        &self.api
    }

    /// A consistent copy of the current state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    async fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    // ── Fetches ──

    /// Replace the request list with the server's pending requests.
    ///
    /// On failure the error flag is set and the failure is returned, so the
    /// caller can decide on a fallback.
    pub async fn fetch_requests(&self, show_loading: bool) -> ApiResult<()> {
        self.update(|s| {
            if show_loading {
                s.is_loading = true;
            }
            s.error = None;
        })
        .await;

        let outcome = match self.api.list_requests(ApprovalStatus::Pending).await {
            Ok(response) if response.success => Ok(response.requests),
            Ok(_) => Err(ApiError::ServerLogical(
                "API returned success: false".to_string(),
            )),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(requests) => {
                debug!(count = requests.len(), "Fetched approval requests");
                self.update(|s| {
                    s.replace_requests(requests);
                    s.is_loading = false;
                })
                .await;
                Ok(())
            }
            Err(e) => {
                error!("Safeguard fetch error: {}", e);
                let message = fetch_failure_message(Collection::Requests, e.kind());
                self.update(|s| {
                    s.error = Some(message.to_string());
                    s.is_loading = false;
                })
                .await;
                Err(e)
            }
        }
    }

    /// Replace the deferred-action list with the server's current list.
    pub async fn fetch_deferred_actions(&self, show_loading: bool) -> ApiResult<()> {
        self.update(|s| {
            if show_loading {
                s.is_deferred_loading = true;
            }
            s.error = None;
        })
        .await;

        let outcome = match self.api.list_deferred(self.deferred_limit).await {
            Ok(response) => response
                .actions
                .ok_or_else(|| ApiError::ServerLogical("API returned no actions".to_string())),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(actions) => {
                debug!(count = actions.len(), "Fetched deferred actions");
                self.update(|s| {
                    for (id, from, to) in
                        lifecycle::illegal_observed_transitions(s.deferred_actions(), &actions)
                    {
                        warn!(
                            deferred_id = %id,
                            "Server reported illegal transition {} -> {}",
                            from,
                            to
                        );
                    }
                    s.replace_deferred(actions);
                    s.is_deferred_loading = false;
                })
                .await;
                Ok(())
            }
            Err(e) => {
                error!("Deferred fetch error: {}", e);
                let message = fetch_failure_message(Collection::Deferred, e.kind());
                self.update(|s| {
                    s.error = Some(message.to_string());
                    s.is_deferred_loading = false;
                })
                .await;
                Err(e)
            }
        }
    }

    // ── Decisions ──

    /// Approve a request. Returns false (with the error set) instead of failing.
    pub async fn approve_request(&self, approval_id: &str, comment: Option<&str>) -> bool {
        self.decide(Decision::Approve, approval_id, comment).await
    }

    /// Reject a request. Returns false (with the error set) instead of failing.
    pub async fn reject_request(&self, approval_id: &str, comment: Option<&str>) -> bool {
        self.decide(Decision::Reject, approval_id, comment).await
    }

    async fn decide(&self, decision: Decision, approval_id: &str, comment: Option<&str>) -> bool {
        self.begin_action().await;

        let body = DecisionBody::new(approval_id, comment);
        let result = match decision {
            Decision::Approve => self.api.approve(&body).await,
            Decision::Reject => self.api.reject(&body).await,
        };

        match result {
            Ok(response) if response.success => {
                info!(approval_id, ?decision, "Decision recorded");
                if let Err(e) = self.fetch_requests(false).await {
                    return self.fail_action(format!("Error: {}", e)).await;
                }
                self.update(|s| {
                    s.select_request(None);
                    s.is_action_loading = false;
                })
                .await;
                true
            }
            Ok(response) => {
                let message = response
                    .failure_message()
                    .unwrap_or(decision.default_error())
                    .to_string();
                warn!(approval_id, ?decision, "Decision refused: {}", message);
                self.fail_action(message).await
            }
            Err(e) => {
                error!(approval_id, ?decision, "Decision error: {}", e);
                self.fail_action(format!("Error: {}", e)).await
            }
        }
    }

    /// Cancel a deferred action before it fires.
    pub async fn cancel_deferred(
        &self,
        deferred_id: &str,
        cancelled_by: &str,
        reason: Option<&str>,
    ) -> bool {
        self.begin_action().await;

        let body = CancelBody::new(cancelled_by, reason);
        match self.api.cancel_deferred(deferred_id, &body).await {
            Ok(response) if response.success => {
                info!(deferred_id, cancelled_by = %body.cancelled_by, "Deferred action cancelled");
                if let Err(e) = self.fetch_deferred_actions(false).await {
                    return self.fail_action(format!("Error: {}", e)).await;
                }
                self.update(|s| {
                    s.select_deferred(None);
                    s.is_action_loading = false;
                })
                .await;
                true
            }
            Ok(response) => {
                let message = response
                    .failure_message()
                    .unwrap_or("Failed to cancel the action")
                    .to_string();
                warn!(deferred_id, "Cancellation refused: {}", message);
                self.fail_action(message).await
            }
            Err(e) => {
                error!(deferred_id, "Cancel deferred error: {}", e);
                self.fail_action(format!("Error: {}", e)).await
            }
        }
    }

    async fn begin_action(&self) {
        self.update(|s| {
            s.is_action_loading = true;
            s.error = None;
        })
        .await;
    }

    async fn fail_action(&self, message: String) -> bool {
        self.update(|s| {
            s.error = Some(message);
            s.is_action_loading = false;
        })
        .await;
        false
    }

    // ── Setters ──

    pub async fn set_requests(&self, requests: Vec<ApprovalRequest>) {
        self.update(|s| s.replace_requests(requests)).await;
    }

    pub async fn set_deferred_actions(&self, actions: Vec<DeferredAction>) {
        self.update(|s| s.replace_deferred(actions)).await;
    }

    pub async fn set_selected_request(&self, approval_id: Option<&str>) {
        self.update(|s| s.select_request(approval_id)).await;
    }

    pub async fn set_selected_deferred(&self, deferred_id: Option<&str>) {
        self.update(|s| s.select_deferred(deferred_id)).await;
    }

    /// Switch tab. The other tab keeps its selection.
    pub async fn set_active_tab(&self, tab: Tab) {
        self.update(|s| s.set_active_tab(tab)).await;
    }

    pub async fn set_polling_enabled(&self, enabled: bool) {
        self.update(|s| s.polling_enabled = enabled).await;
    }

    pub async fn set_polling_interval(&self, interval: Duration) {
        self.update(|s| s.polling_interval = interval).await;
    }

    /// Clear both loading flags at once.
    pub async fn set_loading(&self, loading: bool) {
        self.update(|s| {
            s.is_loading = loading;
            s.is_deferred_loading = loading;
        })
        .await;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.update(|s| s.error = error).await;
    }

    pub async fn clear_error(&self) {
        self.set_error(None).await;
    }

    /// Show the banner for a failed fetch. Used after concurrent fetches,
    /// where the second one to start clears the error of the first.
    pub async fn report_fetch_failure(&self, collection: Collection, error: &ApiError) {
        let message = fetch_failure_message(collection, error.kind());
        self.set_error(Some(message.to_string())).await;
    }

    // ── Console helpers ──

    /// (enabled, interval) without copying the collections.
    pub async fn polling_settings(&self) -> (bool, Duration) {
        let state = self.state.read().await;
        (state.polling_enabled, state.polling_interval)
    }

    /// Auto-select the first pending item of the active tab if nothing is selected.
    pub async fn auto_select(&self) -> bool {
        self.update(|s| s.auto_select()).await
    }

    pub async fn select_relative(&self, delta: isize) {
        self.update(|s| s.select_relative(delta)).await;
    }

    /// Decrease every remaining-time field by `step_secs`, flooring at zero.
    pub async fn tick_countdown(&self, step_secs: i64) {
        self.update(|s| s.tick_countdown(step_secs)).await;
    }

    /// Drop a request from the local list (demo mode decisions).
    pub async fn remove_request(&self, approval_id: &str) {
        self.update(|s| {
            let remaining = s
                .requests()
                .iter()
                .filter(|r| r.approval_id != approval_id)
                .cloned()
                .collect();
            s.replace_requests(remaining);
            s.select_request(None);
        })
        .await;
    }

    /// Cancel a deferred action locally (demo mode), enforcing the lifecycle guard.
    pub async fn apply_local_cancel(
        &self,
        deferred_id: &str,
        cancelled_by: &str,
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        self.update(|s| {
            let result = s.modify_deferred(|actions| {
                match actions.iter_mut().find(|a| a.deferred_id == deferred_id) {
                    Some(action) => action.cancel(cancelled_by, reason, Utc::now()),
                    None => Err(LifecycleError::UnknownAction {
                        id: deferred_id.to_string(),
                    }),
                }
            });
            if result.is_ok() {
                s.select_deferred(None);
            }
            result
        })
        .await
    }
}
