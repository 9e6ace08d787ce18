//! `safeguard list | show | history | approve | reject`

use crate::api::protocol::DecisionBody;
use crate::api::SafeguardApi;
use crate::approval::format::{
    format_arguments, format_time_remaining, format_tool_name, time_tone, truncate, Tone,
};
use crate::approval::types::{ApprovalRequest, ApprovalStatus};
use crate::cli::{connect, local_time, paint};
use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;

fn status_tone(status: ApprovalStatus) -> Tone {
    match status {
        ApprovalStatus::Pending => Tone::Info,
        ApprovalStatus::Approved | ApprovalStatus::Executed | ApprovalStatus::Scheduled => {
            Tone::Success
        }
        ApprovalStatus::Rejected | ApprovalStatus::Failed => Tone::Danger,
        ApprovalStatus::Expired => Tone::Muted,
    }
}

fn print_row(r: &ApprovalRequest, show_status: bool) {
    let remaining = if r.is_pending() {
        paint(
            &format_time_remaining(r.time_remaining_seconds),
            time_tone(r.time_remaining_seconds),
        )
        .to_string()
    } else {
        String::new()
    };
    let status = if show_status {
        format!("{:<10} ", paint(r.status.as_str(), status_tone(r.status)))
    } else {
        String::new()
    };
    let client = r
        .context
        .as_ref()
        .and_then(|c| c.client_name.as_deref())
        .map(|c| truncate(c, 28))
        .unwrap_or_default();

    println!(
        "  {}  {}{:<4} {:<24} {:<10} {}",
        r.approval_id.bold(),
        status,
        r.security_level,
        format_tool_name(&r.tool_name),
        remaining,
        client.dimmed()
    );
}

/// List requests with a given status (pending by default).
pub async fn run_list(config: &Config, status: &str) -> Result<()> {
    let status = ApprovalStatus::from_str_loose(status)
        .ok_or_else(|| anyhow!("Unknown status '{}'", status))?;
    let client = connect(config)?;
    let response = client
        .list_requests(status)
        .await
        .context("Failed to load requests")?;
    if !response.success {
        bail!("Failed to load requests: API returned success: false");
    }

    println!();
    if response.requests.is_empty() {
        println!("  {} No {} requests.", "ℹ".blue(), status);
        println!();
        return Ok(());
    }
    for r in &response.requests {
        print_row(r, status != ApprovalStatus::Pending);
    }
    println!();
    println!(
        "  {} {} request(s)",
        "─".repeat(20).dimmed(),
        response.requests.len()
    );
    println!();
    Ok(())
}

/// Print one request in full.
pub async fn run_show(config: &Config, approval_id: &str) -> Result<()> {
    let client = connect(config)?;
    let response = client
        .request_detail(approval_id)
        .await
        .with_context(|| format!("Failed to load request {}", approval_id))?;
    let request = match response.request {
        Some(r) if response.success => r,
        _ => bail!(
            "{}",
            response
                .error
                .unwrap_or_else(|| format!("Request {} not found", approval_id))
        ),
    };

    println!();
    println!(
        "  {}  {}",
        format_tool_name(&request.tool_name).bold(),
        request.approval_id.dimmed()
    );
    println!(
        "  Status:      {}",
        paint(request.status.as_str(), status_tone(request.status))
    );
    println!("  Level:       {}", request.security_level);
    println!("  Created:     {}", local_time(&request.created_at));
    if request.is_pending() {
        println!(
            "  Expires in:  {}",
            paint(
                &format_time_remaining(request.time_remaining_seconds),
                time_tone(request.time_remaining_seconds)
            )
        );
    }
    if let Some(ref ip) = request.requester_ip {
        println!("  From:        {}", ip);
    }
    if let Some(ref approver) = request.approver {
        println!("  Decided by:  {}", approver);
    }
    if let Some(ref comment) = request.approval_comment {
        println!("  Comment:     {}", comment);
    }
    if let Some(ref ctx) = request.context {
        if let Some(ticket) = ctx.ticket_id {
            println!("  Ticket:      #{}", ticket);
        }
        if let Some(ref client) = ctx.client_name {
            println!("  Client:      {}", client);
        }
        if let Some(ref description) = ctx.description {
            println!("  Description: {}", description);
        }
    }
    if !request.arguments.is_empty() {
        println!("  Arguments:");
        for line in format_arguments(&request.arguments) {
            println!("    {}", line.dimmed());
        }
    }
    println!();
    Ok(())
}

/// Recently decided requests.
pub async fn run_history(config: &Config, limit: Option<u32>) -> Result<()> {
    let client = connect(config)?;
    let limit = limit.unwrap_or(config.limits.history);
    let response = client
        .history(limit)
        .await
        .context("Failed to load history")?;
    if !response.success {
        bail!("Failed to load history: API returned success: false");
    }

    println!();
    if response.requests.is_empty() {
        println!("  {} No decisions recorded yet.", "ℹ".blue());
        println!();
        return Ok(());
    }
    for r in &response.requests {
        print_row(r, true);
        if let Some(ref approver) = r.approver {
            println!("      {} {}", "by".dimmed(), approver);
        }
    }
    println!();
    Ok(())
}

/// Approve or reject a request.
pub async fn run_decide(
    config: &Config,
    approval_id: &str,
    comment: Option<&str>,
    approve: bool,
) -> Result<()> {
    let client = connect(config)?;
    let body = DecisionBody::new(approval_id, comment);
    let result = if approve {
        client.approve(&body).await
    } else {
        client.reject(&body).await
    };
    let response =
        result.with_context(|| format!("Failed to submit decision for {}", approval_id))?;

    if !response.success {
        let fallback = if approve {
            "Failed to approve the request"
        } else {
            "Failed to reject the request"
        };
        bail!("{}", response.failure_message().unwrap_or(fallback));
    }

    println!();
    if approve {
        println!(
            "  {} Request {} approved - action scheduled",
            "✓".green().bold(),
            approval_id.bold()
        );
    } else {
        println!(
            "  {} Request {} rejected",
            "✓".yellow().bold(),
            approval_id.bold()
        );
    }
    if let Some(ref message) = response.message {
        println!("  {}", message.dimmed());
    }
    println!();
    Ok(())
}
