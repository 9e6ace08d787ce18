//! Subcommands of the `safeguard` binary.
//!
//! `console` is the default; the others are one-shot commands for scripts
//! and terminals without a TUI.

pub mod check;
pub mod console;
pub mod deferred;
pub mod init;
pub mod requests;

use crate::api::SafeguardClient;
use crate::approval::format::Tone;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

/// HTTP client for the configured server.
pub(crate) fn connect(config: &Config) -> Result<SafeguardClient> {
    SafeguardClient::new(&config.server)
        .with_context(|| format!("Cannot use server URL {}", config.server.base_url))
}

/// Terminal colour for a tone.
pub(crate) fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Normal => text.normal(),
        Tone::Info => text.cyan(),
        Tone::Caution => text.yellow(),
        Tone::Warning => text.bright_yellow().bold(),
        Tone::Critical => text.red().bold(),
        Tone::Expired => text.dimmed().strikethrough(),
        Tone::Success => text.green(),
        Tone::Danger => text.red(),
        Tone::Muted => text.dimmed(),
    }
}

pub(crate) fn local_time(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.with_timezone(&chrono::Local)
        .format("%d/%m/%Y %H:%M")
        .to_string()
}
