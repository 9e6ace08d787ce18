//! Placeholder records for demo mode.
//!
//! Used when the approval service cannot be reached at startup (or with
//! `--demo`). Timing fields are derived from `now`, since no server is
//! there to compute them.

use crate::approval::lifecycle::delay_hours_for;
use crate::approval::types::{
    ActionContext, ApprovalRequest, ApprovalStatus, Arguments, DeferredAction, DeferredStatus,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Seconds removed from every countdown on each demo tick.
pub const COUNTDOWN_STEP_SECS: i64 = 30;

fn args(value: serde_json::Value) -> Arguments {
    value.as_object().cloned().unwrap_or_default()
}

fn context(ticket_id: i64, client_name: &str, description: &str) -> Option<ActionContext> {
    Some(ActionContext {
        ticket_id: Some(ticket_id),
        client_name: Some(client_name.to_string()),
        description: Some(description.to_string()),
    })
}

fn request(
    now: DateTime<Utc>,
    id: &str,
    tool_name: &str,
    arguments: Arguments,
    age_minutes: i64,
    remaining_minutes: i64,
    context: Option<ActionContext>,
) -> ApprovalRequest {
    ApprovalRequest {
        approval_id: id.to_string(),
        tool_name: tool_name.to_string(),
        arguments,
        security_level: "L3".to_string(),
        status: ApprovalStatus::Pending,
        created_at: now - Duration::minutes(age_minutes),
        expires_at: now + Duration::minutes(remaining_minutes),
        time_remaining_seconds: remaining_minutes * 60,
        requester_ip: None,
        context,
        approver: None,
        approval_comment: None,
    }
}

/// Approval requests shown in demo mode.
pub fn placeholder_requests(now: DateTime<Utc>) -> Vec<ApprovalRequest> {
    vec![
        request(
            now,
            "APR-2026-001",
            "ad_reset_password",
            args(json!({"username": "jdupont", "domain": "corp.local"})),
            15,
            45,
            context(
                1234,
                "Les Tilleuls care home",
                "Password reset requested by the front desk",
            ),
        ),
        request(
            now,
            "APR-2026-002",
            "glpi_close_ticket",
            args(json!({"ticket_id": 5678})),
            28,
            32,
            context(
                5678,
                "Saint Joseph clinic",
                "Close ticket after the printer issue was fixed",
            ),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn deferred(
    now: DateTime<Utc>,
    id: &str,
    approval_id: &str,
    tool_name: &str,
    parameters: Arguments,
    hours_left: i64,
    approved_by: &str,
    approval_comment: Option<&str>,
    context: Option<ActionContext>,
) -> DeferredAction {
    let delay_hours = delay_hours_for("L3");
    let hours_since_approval = i64::from(delay_hours) - hours_left;
    DeferredAction {
        deferred_id: id.to_string(),
        approval_id: approval_id.to_string(),
        tool_name: tool_name.to_string(),
        parameters,
        security_level: "L3".to_string(),
        delay_hours,
        scheduled_at: now + Duration::hours(hours_left),
        time_until_execution: hours_left * 3600,
        status: DeferredStatus::Pending,
        approved_by: approved_by.to_string(),
        approved_at: now - Duration::hours(hours_since_approval),
        approval_comment: approval_comment.map(str::to_string),
        cancelled_by: None,
        cancelled_at: None,
        cancellation_reason: None,
        executed_at: None,
        execution_result: None,
        execution_error: None,
        context,
        created_at: Some(now - Duration::hours(hours_since_approval)),
    }
}

/// Deferred actions shown in demo mode.
pub fn placeholder_deferred(now: DateTime<Utc>) -> Vec<DeferredAction> {
    vec![
        deferred(
            now,
            "DEF-2026-001",
            "APR-2026-010",
            "ad_reset_password",
            args(json!({"username": "mmartin", "domain": "corp.local"})),
            18,
            "tech.dupont",
            None,
            context(
                4521,
                "Les Tilleuls care home",
                "Password reset for an employee back on Monday",
            ),
        ),
        deferred(
            now,
            "DEF-2026-002",
            "APR-2026-011",
            "ad_disable_account",
            args(json!({"username": "former.employee", "domain": "corp.local"})),
            2,
            "admin.jean",
            Some("Departure confirmed by HR, effective Friday"),
            context(
                4498,
                "Saint Joseph clinic",
                "Disable account after an employee left",
            ),
        ),
    ]
}
