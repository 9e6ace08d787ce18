//! Shared test helpers: record builders and an in-memory approval service.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use safeguard::api::error::{ApiError, ApiResult};
use safeguard::api::protocol::*;
use safeguard::api::SafeguardApi;
use safeguard::approval::types::{
    ApprovalRequest, ApprovalStatus, Arguments, DeferredAction, DeferredStats, DeferredStatus,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub fn request(id: &str, status: ApprovalStatus, seconds_left: i64) -> ApprovalRequest {
    let now = Utc::now();
    ApprovalRequest {
        approval_id: id.to_string(),
        tool_name: "ad_reset_password".to_string(),
        arguments: Arguments::new(),
        security_level: "L3".to_string(),
        status,
        created_at: now - Duration::minutes(5),
        expires_at: now + Duration::seconds(seconds_left),
        time_remaining_seconds: seconds_left,
        requester_ip: None,
        context: None,
        approver: None,
        approval_comment: None,
    }
}

pub fn deferred(id: &str, status: DeferredStatus, seconds_left: i64) -> DeferredAction {
    let now = Utc::now();
    DeferredAction {
        deferred_id: id.to_string(),
        approval_id: format!("APR-{}", id),
        tool_name: "ad_disable_account".to_string(),
        parameters: Arguments::new(),
        security_level: "L3".to_string(),
        delay_hours: 24,
        scheduled_at: now + Duration::seconds(seconds_left),
        time_until_execution: seconds_left,
        status,
        approved_by: "admin.jean".to_string(),
        approved_at: now - Duration::hours(1),
        approval_comment: None,
        cancelled_by: None,
        cancelled_at: None,
        cancellation_reason: None,
        executed_at: None,
        execution_result: None,
        execution_error: None,
        context: None,
        created_at: None,
    }
}

/// How a list endpoint of the fake service misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Connection refused
    Transport,
    /// Non-2xx answer with this status
    Status(u16),
    /// 200 with `success: false` (requests) or no `actions` (deferred)
    Logical,
}

impl Failure {
    fn error(self) -> ApiError {
        match self {
            Failure::Transport => ApiError::Transport("connection refused".to_string()),
            Failure::Status(code) => ApiError::from_status(code, String::new()),
            Failure::Logical => unreachable!("logical failures are encoded in the body"),
        }
    }
}

/// In-memory approval service. Decisions and cancellations update its
/// records the way the real backend does, so refreshes observe them.
#[derive(Default)]
pub struct FakeApi {
    pub requests: Mutex<Vec<ApprovalRequest>>,
    pub deferred: Mutex<Vec<DeferredAction>>,
    pub fail_requests: Mutex<Option<Failure>>,
    pub fail_deferred: Mutex<Option<Failure>>,
    /// Replaces the normal answer of approve / reject
    pub decision_reply: Mutex<Option<DecisionResponse>>,
    /// Replaces the normal answer of cancel
    pub cancel_reply: Mutex<Option<CancelResponse>>,
    /// Every call, as "name arg"
    pub calls: Mutex<Vec<String>>,
    /// When set, list_requests waits for `release` before answering
    pub hold: AtomicBool,
    pub release: Notify,
}

impl FakeApi {
    pub fn with_data(requests: Vec<ApprovalRequest>, deferred: Vec<DeferredAction>) -> Self {
        let api = FakeApi::default();
        *api.requests.lock().unwrap() = requests;
        *api.deferred.lock().unwrap() = deferred;
        api
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn decide(&self, body: &DecisionBody, status: ApprovalStatus) -> DecisionResponse {
        if let Some(reply) = self.decision_reply.lock().unwrap().clone() {
            return reply;
        }
        let mut requests = self.requests.lock().unwrap();
        match requests
            .iter_mut()
            .find(|r| r.approval_id == body.approval_id && r.is_pending())
        {
            Some(r) => {
                r.status = status;
                r.approval_comment = body.comment.clone();
                DecisionResponse {
                    success: true,
                    approval_id: Some(body.approval_id.clone()),
                    status: Some(status),
                    message: Some(format!("Request {}", status)),
                    error: None,
                }
            }
            None => DecisionResponse {
                success: false,
                approval_id: Some(body.approval_id.clone()),
                status: None,
                message: Some("Request not found or already processed".to_string()),
                error: None,
            },
        }
    }
}

#[async_trait]
impl SafeguardApi for FakeApi {
    async fn list_requests(&self, status: ApprovalStatus) -> ApiResult<RequestListResponse> {
        self.record(format!("list_requests {}", status));
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        let failure = *self.fail_requests.lock().unwrap();
        match failure {
            Some(Failure::Logical) => Ok(RequestListResponse {
                success: false,
                requests: Vec::new(),
                total: 0,
            }),
            Some(f) => Err(f.error()),
            None => {
                let requests: Vec<ApprovalRequest> = self
                    .requests
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|r| r.status == status)
                    .cloned()
                    .collect();
                Ok(RequestListResponse {
                    success: true,
                    total: requests.len() as u64,
                    requests,
                })
            }
        }
    }

    async fn request_detail(&self, approval_id: &str) -> ApiResult<RequestDetailResponse> {
        self.record(format!("request_detail {}", approval_id));
        let request = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.approval_id == approval_id)
            .cloned();
        Ok(RequestDetailResponse {
            success: request.is_some(),
            error: request.is_none().then(|| "Request not found".to_string()),
            request,
        })
    }

    async fn approve(&self, body: &DecisionBody) -> ApiResult<DecisionResponse> {
        self.record(format!("approve {}", body.approval_id));
        Ok(self.decide(body, ApprovalStatus::Approved))
    }

    async fn reject(&self, body: &DecisionBody) -> ApiResult<DecisionResponse> {
        self.record(format!("reject {}", body.approval_id));
        Ok(self.decide(body, ApprovalStatus::Rejected))
    }

    async fn history(&self, limit: u32) -> ApiResult<RequestListResponse> {
        self.record(format!("history {}", limit));
        let requests: Vec<ApprovalRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.is_pending())
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(RequestListResponse {
            success: true,
            total: requests.len() as u64,
            requests,
        })
    }

    async fn list_deferred(&self, limit: u32) -> ApiResult<DeferredListResponse> {
        self.record(format!("list_deferred {}", limit));
        let failure = *self.fail_deferred.lock().unwrap();
        match failure {
            Some(Failure::Logical) => Ok(DeferredListResponse {
                success: Some(false),
                actions: None,
                count: 0,
                stats: None,
            }),
            Some(f) => Err(f.error()),
            None => {
                let actions: Vec<DeferredAction> = self
                    .deferred
                    .lock()
                    .unwrap()
                    .iter()
                    .take(limit as usize)
                    .cloned()
                    .collect();
                Ok(DeferredListResponse {
                    success: Some(true),
                    count: actions.len() as u64,
                    actions: Some(actions),
                    stats: None,
                })
            }
        }
    }

    async fn deferred_detail(&self, deferred_id: &str) -> ApiResult<DeferredDetailResponse> {
        self.record(format!("deferred_detail {}", deferred_id));
        let action = self
            .deferred
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.deferred_id == deferred_id)
            .cloned();
        Ok(DeferredDetailResponse {
            success: action.is_some(),
            error: action.is_none().then(|| "Action not found".to_string()),
            action,
        })
    }

    async fn cancel_deferred(
        &self,
        deferred_id: &str,
        body: &CancelBody,
    ) -> ApiResult<CancelResponse> {
        self.record(format!("cancel_deferred {} by {}", deferred_id, body.cancelled_by));
        if let Some(reply) = self.cancel_reply.lock().unwrap().clone() {
            return Ok(reply);
        }
        let mut actions = self.deferred.lock().unwrap();
        match actions
            .iter_mut()
            .find(|a| a.deferred_id == deferred_id && a.is_pending())
        {
            Some(a) => {
                a.status = DeferredStatus::Cancelled;
                a.cancelled_by = Some(body.cancelled_by.clone());
                a.cancelled_at = Some(Utc::now());
                a.cancellation_reason = body.reason.clone();
                Ok(CancelResponse {
                    success: true,
                    deferred_id: Some(deferred_id.to_string()),
                    status: Some(DeferredStatus::Cancelled),
                    message: Some("Action cancelled".to_string()),
                    error: None,
                })
            }
            None => Ok(CancelResponse {
                success: false,
                deferred_id: Some(deferred_id.to_string()),
                status: None,
                message: None,
                error: Some("Action not found or no longer pending".to_string()),
            }),
        }
    }

    async fn deferred_stats(&self) -> ApiResult<DeferredStatsResponse> {
        self.record("deferred_stats".to_string());
        let actions = self.deferred.lock().unwrap();
        let count = |s: DeferredStatus| actions.iter().filter(|a| a.status == s).count() as u64;
        Ok(DeferredStatsResponse {
            delay_config: [("L3".to_string(), 24), ("L4".to_string(), 48)]
                .into_iter()
                .collect(),
            stats: DeferredStats {
                pending: count(DeferredStatus::Pending),
                cancelled: count(DeferredStatus::Cancelled),
                executed: count(DeferredStatus::Executed),
                failed: count(DeferredStatus::Failed),
                total: actions.len() as u64,
            },
        })
    }
}
