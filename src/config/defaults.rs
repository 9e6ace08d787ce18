//! Built-in defaults and starter configuration templates.
//!
//! - `standard`: live data, 30 s polling, placeholder data when the backend is down
//! - `strict`: never shows placeholder data, polls faster

pub const BASE_URL: &str = "http://localhost:5678/webhook/wibot";
pub const TIMEOUT_SECS: u64 = 30;
pub const POLL_INTERVAL_SECS: u64 = 30;
pub const DEMO_TICK_SECS: u64 = 30;
pub const LIST_LIMIT: u32 = 50;

/// Starter configuration written by `safeguard init`.
pub const STARTER_YAML: &str = r#"# Safeguard console configuration: standard
# Review, approve and cancel the sensitive actions of the support assistant.

server:
  # Endpoint paths (/safeguard/...) are appended to this URL
  base_url: http://localhost:5678/webhook/wibot
  # Bearer token of an admin session (or set SAFEGUARD_TOKEN)
  token: null
  timeout_secs: 30

session:
  # Recorded as the canceller of deferred actions
  user: admin@example.com
  # Only admin sessions may open the console
  role: admin

polling:
  enabled: true
  # Set to 0 to disable background refresh
  interval_secs: 30

demo:
  # Show placeholder data when the backend cannot be reached at startup
  fallback: true
  tick_secs: 30

limits:
  history: 50
  deferred: 50
"#;

/// Configuration for operators who must never see placeholder data.
pub const STRICT_YAML: &str = r#"# Safeguard console configuration: strict
# Placeholder data is disabled: an unreachable backend is reported as an error.

server:
  base_url: http://localhost:5678/webhook/wibot
  token: null
  timeout_secs: 15

session:
  user: admin@example.com
  role: admin

polling:
  enabled: true
  interval_secs: 15

demo:
  fallback: false
  tick_secs: 30

limits:
  history: 100
  deferred: 100
"#;

/// Get the YAML content for a named template.
pub fn get_template(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "standard" | "default" => Some(STARTER_YAML),
        "strict" => Some(STRICT_YAML),
        _ => None,
    }
}

/// List all available template names.
pub fn available_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "standard",
            "Live data with 30s polling, placeholder data if the backend is down",
        ),
        (
            "strict",
            "No placeholder data, 15s polling and timeouts",
        ),
    ]
}
