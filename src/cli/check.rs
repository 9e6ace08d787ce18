//! `safeguard check`: show the resolved configuration.

use crate::api::SafeguardApi;
use crate::approval::types::ApprovalStatus;
use crate::cli::connect;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Print the configuration in effect (token masked) and where it came from.
/// With `ping`, also make one request to the server.
pub async fn run_check(config: &Config, source: Option<&Path>, ping: bool) -> Result<()> {
    println!();
    println!("  {} Configuration is valid!", "✓".green().bold());
    match source {
        Some(path) => println!("  File: {}", path.display().to_string().cyan()),
        None => println!("  File: {}", "none, using built-in defaults".dimmed()),
    }
    println!();

    let yaml = serde_yaml::to_string(&config.redacted())
        .context("Failed to render configuration")?;
    for line in yaml.lines() {
        println!("    {}", line);
    }

    if !config.session.is_admin() {
        println!();
        println!(
            "  {} Role '{}' cannot open the console (admin only).",
            "⚠".yellow(),
            config.session.role
        );
    }
    if config.server.token.is_none() {
        println!();
        println!(
            "  {} No token configured; the server will likely answer 401.",
            "⚠".yellow()
        );
    }

    if ping {
        let client = connect(config)?;
        let response = client
            .list_requests(ApprovalStatus::Pending)
            .await
            .with_context(|| format!("Server {} is not usable", config.server.base_url))?;
        println!();
        println!(
            "  {} Server reachable: {} pending request(s)",
            "✓".green().bold(),
            response.requests.len()
        );
    }

    println!();
    Ok(())
}
