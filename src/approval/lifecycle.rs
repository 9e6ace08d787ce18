//! Deferred-action lifecycle.
//!
//! ```text
//!            cancel (client)
//!   pending ────────────────► cancelled
//!      │
//!      ├──── fires (server) ─► executed
//!      └──── fires (server) ─► failed
//! ```
//!
//! All right-hand states are terminal. Only `pending → cancelled` is ever
//! initiated by this client, and the server remains the authority: the gate
//! here decides whether the cancel affordance is offered, it cannot win a
//! race against the backend firing the action.

use crate::approval::types::{DeferredAction, DeferredStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Execution delay policy, per security level (hours).
const DELAY_HOURS: &[(&str, u32)] = &[("L3", 24), ("L4", 48)];
const DEFAULT_DELAY_HOURS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("action {id} cannot be cancelled (status: {status})")]
    NotCancellable { id: String, status: DeferredStatus },

    #[error("action {id} is due for execution and can no longer be cancelled")]
    DeadlineLapsed { id: String },

    #[error("no deferred action with id {id}")]
    UnknownAction { id: String },

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        from: DeferredStatus,
        to: DeferredStatus,
    },
}

impl DeferredStatus {
    /// Whether no further transition can leave this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeferredStatus::Pending)
    }

    /// Whether `self → next` is an edge of the lifecycle.
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: DeferredStatus) -> bool {
        *self == next || (*self == DeferredStatus::Pending && next != DeferredStatus::Pending)
    }

    pub fn transition(self, next: DeferredStatus) -> Result<DeferredStatus, LifecycleError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LifecycleError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Whether the cancel affordance should be offered for this action.
pub fn can_cancel(action: &DeferredAction) -> bool {
    action.status == DeferredStatus::Pending && action.time_until_execution > 0
}

/// Check the cancellation guard, reporting why it fails.
pub fn check_cancellable(action: &DeferredAction) -> Result<(), LifecycleError> {
    if action.status != DeferredStatus::Pending {
        return Err(LifecycleError::NotCancellable {
            id: action.deferred_id.clone(),
            status: action.status,
        });
    }
    if action.time_until_execution <= 0 {
        return Err(LifecycleError::DeadlineLapsed {
            id: action.deferred_id.clone(),
        });
    }
    Ok(())
}

impl DeferredAction {
    /// Apply `pending → cancelled` locally, recording who cancelled and why.
    /// The record is left untouched when the guard fails.
    pub fn cancel(
        &mut self,
        cancelled_by: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        check_cancellable(self)?;
        self.status = self.status.transition(DeferredStatus::Cancelled)?;
        self.cancelled_by = Some(cancelled_by.to_string());
        self.cancelled_at = Some(now);
        self.cancellation_reason = reason.map(str::to_string);
        Ok(())
    }
}

/// Delay applied by the execution engine for a given security level.
pub fn delay_hours_for(security_level: &str) -> u32 {
    DELAY_HOURS
        .iter()
        .find(|(level, _)| level.eq_ignore_ascii_case(security_level.trim()))
        .map(|(_, hours)| *hours)
        .unwrap_or(DEFAULT_DELAY_HOURS)
}

/// Status changes between two observations of the same record that the
/// lifecycle forbids. Returned as (deferred_id, from, to).
pub fn illegal_observed_transitions(
    previous: &[DeferredAction],
    current: &[DeferredAction],
) -> Vec<(String, DeferredStatus, DeferredStatus)> {
    current
        .iter()
        .filter_map(|now| {
            let before = previous
                .iter()
                .find(|p| p.deferred_id == now.deferred_id)?;
            if before.status.can_transition_to(now.status) {
                None
            } else {
                Some((now.deferred_id.clone(), before.status, now.status))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::Arguments;

    fn action(status: DeferredStatus, seconds: i64) -> DeferredAction {
        DeferredAction {
            deferred_id: "DEF-1".to_string(),
            approval_id: "APR-1".to_string(),
            tool_name: "ad_reset_password".to_string(),
            parameters: Arguments::new(),
            security_level: "L3".to_string(),
            delay_hours: 24,
            scheduled_at: Utc::now(),
            time_until_execution: seconds,
            status,
            approved_by: "admin".to_string(),
            approved_at: Utc::now(),
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

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in DeferredStatus::ALL {
            for to in DeferredStatus::ALL {
                let allowed = from.can_transition_to(to);
                if from == to {
                    assert!(allowed);
                } else if from.is_terminal() {
                    assert!(!allowed, "{} -> {} should be rejected", from, to);
                } else {
                    assert!(allowed, "{} -> {} should be allowed", from, to);
                }
            }
        }
    }

    #[test]
    fn test_can_cancel_requires_pending_and_time_left() {
        assert!(can_cancel(&action(DeferredStatus::Pending, 60)));
        assert!(!can_cancel(&action(DeferredStatus::Pending, 0)));
        assert!(!can_cancel(&action(DeferredStatus::Pending, -5)));
        assert!(!can_cancel(&action(DeferredStatus::Executed, 60)));
        assert!(!can_cancel(&action(DeferredStatus::Cancelled, 60)));
        assert!(!can_cancel(&action(DeferredStatus::Failed, 60)));
    }

    #[test]
    fn test_cancel_records_provenance() {
        let mut a = action(DeferredStatus::Pending, 3600);
        let now = Utc::now();
        a.cancel("tech.dupont", Some("client changed their mind"), now)
            .unwrap();

        assert_eq!(a.status, DeferredStatus::Cancelled);
        assert_eq!(a.cancelled_by.as_deref(), Some("tech.dupont"));
        assert_eq!(a.cancelled_at, Some(now));
        assert_eq!(
            a.cancellation_reason.as_deref(),
            Some("client changed their mind")
        );
    }

    #[test]
    fn test_rejected_cancel_leaves_record_untouched() {
        let mut lapsed = action(DeferredStatus::Pending, 0);
        let before = lapsed.clone();
        let err = lapsed.cancel("someone", None, Utc::now()).unwrap_err();
        assert!(matches!(err, LifecycleError::DeadlineLapsed { .. }));
        assert_eq!(lapsed, before);

        let mut executed = action(DeferredStatus::Executed, 100);
        let before = executed.clone();
        let err = executed.cancel("someone", None, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::NotCancellable {
                status: DeferredStatus::Executed,
                ..
            }
        ));
        assert_eq!(executed, before);
    }

    #[test]
    fn test_delay_hours_policy() {
        assert_eq!(delay_hours_for("L3"), 24);
        assert_eq!(delay_hours_for("l4"), 48);
        assert_eq!(delay_hours_for("L2"), 24);
    }

    #[test]
    fn test_illegal_observed_transitions() {
        let previous = vec![action(DeferredStatus::Cancelled, 0)];
        let current = vec![action(DeferredStatus::Pending, 100)];
        let illegal = illegal_observed_transitions(&previous, &current);
        assert_eq!(
            illegal,
            vec![(
                "DEF-1".to_string(),
                DeferredStatus::Cancelled,
                DeferredStatus::Pending
            )]
        );

        let previous = vec![action(DeferredStatus::Pending, 100)];
        let current = vec![action(DeferredStatus::Executed, 0)];
        assert!(illegal_observed_transitions(&previous, &current).is_empty());
    }
}
