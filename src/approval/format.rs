//! Display helpers for approval records.
//!
//! Pure functions only: map raw fields (tool name, seconds left, status) to
//! the strings and colour classes the console and the CLI print.

use crate::approval::types::{Arguments, DeferredStatus};
use serde_json::Value;

/// Human-readable labels for the tools the assistant can request.
pub const TOOL_LABELS: &[(&str, &str)] = &[
    ("ad_reset_password", "AD password reset"),
    ("ad_unlock_account", "AD account unlock"),
    ("ad_disable_account", "AD account disable"),
    ("ad_enable_account", "AD account re-enable"),
    ("glpi_close_ticket", "GLPI ticket closure"),
    ("glpi_assign_ticket", "Ticket assignment"),
    ("glpi_update_ticket_status", "Ticket status change"),
];

/// Colour class of a value, independent of the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Info,
    Caution,
    Warning,
    Critical,
    Expired,
    Success,
    Danger,
    Muted,
}

/// Label for a tool, or the raw tool name when unknown.
pub fn format_tool_name(tool_name: &str) -> &str {
    TOOL_LABELS
        .iter()
        .find(|(name, _)| *name == tool_name)
        .map(|(_, label)| *label)
        .unwrap_or(tool_name)
}

/// Time left before an approval request expires.
pub fn format_time_remaining(seconds: i64) -> String {
    if seconds <= 0 {
        return "Expired".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    format!("{}h {}min", minutes / 60, minutes % 60)
}

pub fn time_tone(seconds: i64) -> Tone {
    if seconds <= 0 {
        Tone::Expired
    } else if seconds < 10 * 60 {
        Tone::Critical
    } else if seconds < 20 * 60 {
        Tone::Warning
    } else {
        Tone::Normal
    }
}

/// Time left before a deferred action fires.
pub fn format_time_until_execution(seconds: i64) -> String {
    if seconds <= 0 {
        return "Imminent".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours >= 24 {
        return format!("{}d {}h", hours / 24, hours % 24);
    }
    if hours > 0 {
        return format!("{}h {}min", hours, minutes);
    }
    format!("{} min", minutes)
}

pub fn execution_tone(seconds: i64) -> Tone {
    if seconds <= 0 {
        Tone::Expired
    } else if seconds < 2 * 3600 {
        Tone::Warning
    } else if seconds < 6 * 3600 {
        Tone::Caution
    } else {
        Tone::Normal
    }
}

pub fn deferred_status_label(status: DeferredStatus) -> &'static str {
    match status {
        DeferredStatus::Pending => "Pending",
        DeferredStatus::Cancelled => "Cancelled",
        DeferredStatus::Executed => "Executed",
        DeferredStatus::Failed => "Failed",
    }
}

pub fn deferred_status_tone(status: DeferredStatus) -> Tone {
    match status {
        DeferredStatus::Pending => Tone::Info,
        DeferredStatus::Cancelled => Tone::Muted,
        DeferredStatus::Executed => Tone::Success,
        DeferredStatus::Failed => Tone::Danger,
    }
}

/// Render one argument value: strings unquoted, everything else as compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `key: value` lines for an argument map, in the map's order.
pub fn format_arguments(arguments: &Arguments) -> Vec<String> {
    arguments
        .iter()
        .map(|(key, value)| format!("{}: {}", key, format_value(value)))
        .collect()
}

/// Cut a string to at most `max` characters, marking the cut with "...".
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
