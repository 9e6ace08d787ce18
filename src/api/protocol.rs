//! JSON bodies exchanged with the approval service.
//!
//! | Operation        | Method + path                          |
//! |------------------|----------------------------------------|
//! | list requests    | GET  /safeguard/requests?status=       |
//! | request detail   | GET  /safeguard/request/{id}           |
//! | approve          | POST /safeguard/approve                |
//! | reject           | POST /safeguard/reject                 |
//! | history          | GET  /safeguard/history?limit=         |
//! | list deferred    | GET  /safeguard/deferred?limit=        |
//! | deferred detail  | GET  /safeguard/deferred/{id}          |
//! | cancel deferred  | POST /safeguard/deferred/{id}/cancel   |
//! | deferred stats   | GET  /safeguard/deferred/stats         |

use crate::approval::types::{ApprovalRequest, ApprovalStatus, DeferredAction, DeferredStats, DeferredStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestListResponse {
    pub success: bool,
    #[serde(default)]
    pub requests: Vec<ApprovalRequest>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetailResponse {
    pub success: bool,
    #[serde(default)]
    pub request: Option<ApprovalRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of an approve or reject call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionBody {
    pub approval_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DecisionBody {
    pub fn new(approval_id: impl Into<String>, comment: Option<&str>) -> Self {
        Self {
            approval_id: approval_id.into(),
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }
}

/// Outcome of an approve or reject call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub success: bool,
    #[serde(default)]
    pub approval_id: Option<String>,
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
    #[serde(default)]
    pub message: Option<String>,
    /// Some failure paths report `error` instead of `message`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionResponse {
    pub fn failure_message(&self) -> Option<&str> {
        non_empty(self.message.as_deref()).or_else(|| non_empty(self.error.as_deref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredListResponse {
    #[serde(default)]
    pub success: Option<bool>,
    /// Absent when the service could not produce a list
    #[serde(default)]
    pub actions: Option<Vec<DeferredAction>>,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DeferredStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredDetailResponse {
    pub success: bool,
    #[serde(default)]
    pub action: Option<DeferredAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelBody {
    pub cancelled_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CancelBody {
    pub fn new(cancelled_by: &str, reason: Option<&str>) -> Self {
        let cancelled_by = cancelled_by.trim();
        Self {
            cancelled_by: if cancelled_by.is_empty() {
                "unknown".to_string()
            } else {
                cancelled_by.to_string()
            },
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(default)]
    pub deferred_id: Option<String>,
    #[serde(default)]
    pub status: Option<DeferredStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CancelResponse {
    pub fn failure_message(&self) -> Option<&str> {
        non_empty(self.message.as_deref()).or_else(|| non_empty(self.error.as_deref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredStatsResponse {
    /// Delay in hours per security level
    #[serde(default)]
    pub delay_config: BTreeMap<String, u32>,
    #[serde(default)]
    pub stats: DeferredStats,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
