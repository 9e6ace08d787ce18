//! Core records of the Safeguard approval flow.
//!
//! Two kinds of records come back from the approval service:
//! - `ApprovalRequest`: a sensitive tool call waiting for a human decision
//! - `DeferredAction`: an approved tool call whose execution is delayed so it
//!   can still be cancelled
//!
//! Timing fields such as `time_remaining_seconds` are computed by the server.
//! The client never derives them from the wall clock, except in demo mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form tool arguments, exactly as the assistant submitted them.
pub type Arguments = Map<String, Value>;

/// Lifecycle status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Executed,
    Failed,
    /// Approved, but handed over to the deferred-action queue
    Scheduled,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Expired => "expired",
            ApprovalStatus::Executed => "executed",
            ApprovalStatus::Failed => "failed",
            ApprovalStatus::Scheduled => "scheduled",
        }
    }

    /// Parse a status from user input. Accepts a few aliases.
    pub fn from_str_loose(s: &str) -> Option<ApprovalStatus> {
        match s.to_lowercase().trim() {
            "pending" | "waiting" => Some(ApprovalStatus::Pending),
            "approved" | "approve" => Some(ApprovalStatus::Approved),
            "rejected" | "reject" | "denied" => Some(ApprovalStatus::Rejected),
            "expired" => Some(ApprovalStatus::Expired),
            "executed" | "done" => Some(ApprovalStatus::Executed),
            "failed" => Some(ApprovalStatus::Failed),
            "scheduled" | "deferred" => Some(ApprovalStatus::Scheduled),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a deferred action.
/// Everything except `Pending` is terminal (see `approval::lifecycle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredStatus {
    Pending,
    Cancelled,
    Executed,
    Failed,
}

impl DeferredStatus {
    pub const ALL: [DeferredStatus; 4] = [
        DeferredStatus::Pending,
        DeferredStatus::Cancelled,
        DeferredStatus::Executed,
        DeferredStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeferredStatus::Pending => "pending",
            DeferredStatus::Cancelled => "cancelled",
            DeferredStatus::Executed => "executed",
            DeferredStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeferredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Support-desk context attached to a request by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionContext {
    pub fn is_empty(&self) -> bool {
        self.ticket_id.is_none() && self.client_name.is_none() && self.description.is_none()
    }
}

/// A tool call waiting for a human decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub approval_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Arguments,
    pub security_level: String,
    pub status: ApprovalStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    /// Only meaningful while `status` is pending
    #[serde(default)]
    pub time_remaining_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ActionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_comment: Option<String>,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

/// An approved tool call whose execution is delayed to allow cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredAction {
    pub deferred_id: String,
    /// The approval request this action originated from
    pub approval_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Arguments,
    pub security_level: String,

    pub delay_hours: u32,
    #[serde(with = "timestamp")]
    pub scheduled_at: DateTime<Utc>,
    /// Seconds left before the backend fires the action
    #[serde(default)]
    pub time_until_execution: i64,

    pub status: DeferredStatus,

    pub approved_by: String,
    #[serde(with = "timestamp")]
    pub approved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_comment: Option<String>,

    // Present iff status == cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    // Present iff status is executed or failed
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ActionContext>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl DeferredAction {
    pub fn is_pending(&self) -> bool {
        self.status == DeferredStatus::Pending
    }
}

/// Per-status counters of the deferred-action queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredStats {
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(default)]
    pub executed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub total: u64,
}

/// Timestamp (de)serialization.
///
/// The approval service emits ISO-8601 timestamps, sometimes without an
/// offset (naive UTC). Both forms are accepted; RFC 3339 is always written.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => s.serialize_str(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                None => Ok(None),
                Some(s) if s.is_empty() => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_naive_and_offset_timestamps() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        assert_eq!(timestamp::parse("2026-03-02T09:30:00Z"), Some(expected));
        assert_eq!(timestamp::parse("2026-03-02T10:30:00+01:00"), Some(expected));
        assert_eq!(timestamp::parse("2026-03-02T09:30:00"), Some(expected));
        assert_eq!(timestamp::parse("2026-03-02 09:30:00.000000"), Some(expected));
        assert_eq!(timestamp::parse("yesterday"), None);
    }

    #[test]
    fn test_deferred_action_from_server_json() {
        let json = r#"{
            "deferred_id": "DEF-2026-004",
            "approval_id": "APR-2026-040",
            "tool_name": "ad_disable_account",
            "parameters": {"username": "old.user"},
            "security_level": "L4",
            "delay_hours": 48,
            "scheduled_at": "2026-03-04T08:00:00.123456",
            "time_until_execution": 7200,
            "status": "cancelled",
            "approved_by": "admin.jean",
            "approved_at": "2026-03-02T08:00:00",
            "cancelled_by": "tech.dupont",
            "cancelled_at": "2026-03-03T08:00:00Z",
            "cancellation_reason": null
        }"#;

        let action: DeferredAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.status, DeferredStatus::Cancelled);
        assert_eq!(action.delay_hours, 48);
        assert_eq!(action.cancelled_by.as_deref(), Some("tech.dupont"));
        assert!(action.cancelled_at.is_some());
        assert!(action.cancellation_reason.is_none());
        assert!(action.executed_at.is_none());
        assert!(action.context.is_none());
    }

    #[test]
    fn test_status_from_str_loose() {
        assert_eq!(
            ApprovalStatus::from_str_loose(" Pending "),
            Some(ApprovalStatus::Pending)
        );
        assert_eq!(
            ApprovalStatus::from_str_loose("deferred"),
            Some(ApprovalStatus::Scheduled)
        );
        assert_eq!(ApprovalStatus::from_str_loose("maybe"), None);
    }
}
