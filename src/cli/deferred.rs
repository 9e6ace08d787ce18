//! `safeguard deferred list | show | cancel | stats`

use crate::api::protocol::CancelBody;
use crate::api::SafeguardApi;
use crate::approval::format::{
    deferred_status_label, deferred_status_tone, execution_tone, format_arguments,
    format_time_until_execution, format_tool_name,
};
use crate::approval::lifecycle::check_cancellable;
use crate::approval::types::DeferredAction;
use crate::cli::{connect, local_time, paint};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use colored::Colorize;

fn print_row(a: &DeferredAction) {
    let until = if a.is_pending() {
        paint(
            &format_time_until_execution(a.time_until_execution),
            execution_tone(a.time_until_execution),
        )
        .to_string()
    } else {
        String::new()
    };
    println!(
        "  {}  {:<10} {:<4} {:<24} {:<10} {}",
        a.deferred_id.bold(),
        paint(deferred_status_label(a.status), deferred_status_tone(a.status)),
        a.security_level,
        format_tool_name(&a.tool_name),
        until,
        format!("approved by {}", a.approved_by).dimmed()
    );
}

pub async fn run_list(config: &Config, limit: Option<u32>, all: bool) -> Result<()> {
    let client = connect(config)?;
    let response = client
        .list_deferred(limit.unwrap_or(config.limits.deferred))
        .await
        .context("Failed to load deferred actions")?;
    let Some(actions) = response.actions else {
        bail!("Failed to load deferred actions: API returned no actions");
    };

    let shown: Vec<&DeferredAction> = actions.iter().filter(|a| all || a.is_pending()).collect();

    println!();
    if shown.is_empty() {
        println!("  {} No scheduled actions.", "ℹ".blue());
    }
    for a in &shown {
        print_row(a);
    }
    if let Some(stats) = response.stats {
        println!();
        println!(
            "  {} {} pending | {} cancelled | {} executed | {} failed",
            "─".repeat(20).dimmed(),
            stats.pending.to_string().cyan().bold(),
            stats.cancelled.to_string().dimmed(),
            stats.executed.to_string().green(),
            stats.failed.to_string().red(),
        );
    }
    println!();
    Ok(())
}

async fn fetch_action(config: &Config, deferred_id: &str) -> Result<DeferredAction> {
    let client = connect(config)?;
    let response = client
        .deferred_detail(deferred_id)
        .await
        .with_context(|| format!("Failed to load deferred action {}", deferred_id))?;
    match response.action {
        Some(action) if response.success => Ok(action),
        _ => bail!(
            "{}",
            response
                .error
                .unwrap_or_else(|| format!("Deferred action {} not found", deferred_id))
        ),
    }
}

pub async fn run_show(config: &Config, deferred_id: &str) -> Result<()> {
    let a = fetch_action(config, deferred_id).await?;

    println!();
    println!(
        "  {}  {}",
        format_tool_name(&a.tool_name).bold(),
        a.deferred_id.dimmed()
    );
    println!(
        "  Status:        {}",
        paint(deferred_status_label(a.status), deferred_status_tone(a.status))
    );
    println!("  Level:         {} ({}h delay)", a.security_level, a.delay_hours);
    println!("  Scheduled for: {}", local_time(&a.scheduled_at));
    if a.is_pending() {
        println!(
            "  Executes in:   {}",
            paint(
                &format_time_until_execution(a.time_until_execution),
                execution_tone(a.time_until_execution)
            )
        );
    }
    println!(
        "  Approved:      {} by {}",
        local_time(&a.approved_at),
        a.approved_by
    );
    if let Some(ref comment) = a.approval_comment {
        println!("  Comment:       {}", comment);
    }
    if let (Some(by), Some(at)) = (&a.cancelled_by, &a.cancelled_at) {
        println!("  Cancelled:     {} by {}", local_time(at), by);
        if let Some(ref reason) = a.cancellation_reason {
            println!("  Reason:        {}", reason);
        }
    }
    if let Some(ref at) = a.executed_at {
        println!("  Executed:      {}", local_time(at));
    }
    if let Some(ref error) = a.execution_error {
        println!("  Error:         {}", error.red());
    }
    if let Some(ref result) = a.execution_result {
        println!("  Result:        {}", result.to_string().dimmed());
    }
    if let Some(ref ctx) = a.context {
        if let Some(ticket) = ctx.ticket_id {
            println!("  Ticket:        #{}", ticket);
        }
        if let Some(ref client) = ctx.client_name {
            println!("  Client:        {}", client);
        }
        if let Some(ref description) = ctx.description {
            println!("  Description:   {}", description);
        }
    }
    if !a.parameters.is_empty() {
        println!("  Parameters:");
        for line in format_arguments(&a.parameters) {
            println!("    {}", line.dimmed());
        }
    }
    println!();
    Ok(())
}

/// Cancel a deferred action. The action is fetched first so that one that
/// already ran, or is due, is refused locally.
pub async fn run_cancel(
    config: &Config,
    deferred_id: &str,
    reason: Option<&str>,
    by: Option<&str>,
) -> Result<()> {
    let action = fetch_action(config, deferred_id).await?;
    check_cancellable(&action)?;

    let client = connect(config)?;
    let body = CancelBody::new(by.unwrap_or(config.session.actor()), reason);
    let response = client
        .cancel_deferred(deferred_id, &body)
        .await
        .with_context(|| format!("Failed to cancel {}", deferred_id))?;
    if !response.success {
        bail!(
            "{}",
            response
                .failure_message()
                .unwrap_or("Failed to cancel the action")
        );
    }

    println!();
    println!(
        "  {} {} cancelled by {}",
        "✓".green().bold(),
        deferred_id.bold(),
        body.cancelled_by
    );
    if let Some(ref message) = response.message {
        println!("  {}", message.dimmed());
    }
    println!();
    Ok(())
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let client = connect(config)?;
    let response = client
        .deferred_stats()
        .await
        .context("Failed to load deferred statistics")?;
    let stats = response.stats;

    println!();
    println!("  {}", "Deferred actions".bold());
    println!("  Pending:   {}", stats.pending.to_string().cyan().bold());
    println!("  Cancelled: {}", stats.cancelled.to_string().dimmed());
    println!("  Executed:  {}", stats.executed.to_string().green());
    println!("  Failed:    {}", stats.failed.to_string().red());
    println!("  Total:     {}", stats.total);
    if !response.delay_config.is_empty() {
        println!();
        println!("  {}", "Execution delay".bold());
        for (level, hours) in &response.delay_config {
            println!("  {:<10} {}h", level, hours);
        }
    }
    println!();
    Ok(())
}
