use crate::approval::format::{
    self, deferred_status_label, deferred_status_tone, execution_tone, format_time_remaining,
    format_time_until_execution, format_tool_name, time_tone,
};
use crate::approval::lifecycle::can_cancel;
use crate::approval::types::{ActionContext, ApprovalRequest, Arguments, DeferredAction};
use crate::console::app::{App, InputMode};
use crate::console::page::Mode;
use crate::console::theme;
use crate::store::{Snapshot, Tab};
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, snapshot: &Snapshot) {
    let area = f.area();
    let demo = app.page().mode() == Mode::Demo;
    let banner = demo || snapshot.error().is_some();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if banner { 1 } else { 0 }),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(area);

    if banner {
        render_banner(f, snapshot, demo, chunks[0]);
    }
    render_tabs(f, app, snapshot, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);

    if !app.page().is_initialized() || snapshot.is_initial_loading() {
        render_placeholder(f, "Loading approval requests...", chunks[2]);
    } else {
        match snapshot.active_tab() {
            Tab::Pending => {
                render_request_list(f, snapshot, body[0]);
                render_request_detail(f, snapshot.selected_request(), body[1]);
            }
            Tab::Deferred => {
                render_deferred_list(f, snapshot, body[0]);
                render_deferred_detail(f, snapshot.selected_deferred(), body[1]);
            }
        }
    }

    render_footer(f, app, snapshot, chunks[3]);
}

fn render_banner(f: &mut Frame, snapshot: &Snapshot, demo: bool, area: Rect) {
    let line = match snapshot.error() {
        Some(error) => Line::from(Span::styled(
            format!(" {} (press r to retry)", error),
            theme::ERROR_BANNER_STYLE,
        )),
        None if demo => Line::from(Span::styled(
            " Demo mode: approval service unavailable, showing sample data",
            theme::DEMO_BANNER_STYLE,
        )),
        None => Line::default(),
    };
    let style = if snapshot.error().is_some() {
        theme::ERROR_BANNER_STYLE
    } else {
        theme::DEMO_BANNER_STYLE
    };
    f.render_widget(Paragraph::new(line).style(style), area);
}

fn render_tabs(f: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let titles = vec![
        Line::from(format!("Pending ({})", snapshot.pending_count())),
        Line::from(format!("Scheduled ({})", snapshot.deferred_count())),
    ];
    let selected = match snapshot.active_tab() {
        Tab::Pending => 0,
        Tab::Deferred => 1,
    };

    let refresh = if app.page().mode() == Mode::Demo {
        "demo".to_string()
    } else if snapshot.is_polling_enabled() && !snapshot.polling_interval().is_zero() {
        format!("auto-refresh {}s", snapshot.polling_interval().as_secs())
    } else {
        "auto-refresh off".to_string()
    };
    let title = format!(
        " Safeguard | {} | {} ",
        app.page().session().actor(),
        refresh
    );

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(theme::HEADER_STYLE)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, theme::HEADER_STYLE)),
        );
    f.render_widget(tabs, area);
}

fn render_placeholder(f: &mut Frame, message: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let p = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Yellow),
    )))
    .block(block);
    f.render_widget(p, area);
}

fn level_span(level: &str) -> Span<'static> {
    Span::styled(format!("[{}] ", level), theme::level_style(level))
}

fn render_request_list(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let visible = snapshot.visible_requests();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Awaiting approval");

    if visible.is_empty() {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No pending requests",
                theme::tone_style(format::Tone::Success),
            )),
            Line::from(Span::styled(
                "Every sensitive action has been reviewed.",
                theme::LABEL_STYLE,
            )),
        ])
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|r| {
            let mut spans = vec![
                level_span(&r.security_level),
                Span::raw(format_tool_name(&r.tool_name).to_string()),
                Span::raw("  "),
                Span::styled(
                    format_time_remaining(r.time_remaining_seconds),
                    theme::tone_style(time_tone(r.time_remaining_seconds)),
                ),
            ];
            if let Some(client) = r.context.as_ref().and_then(|c| c.client_name.as_deref()) {
                spans.push(Span::styled(
                    format!("  {}", format::truncate(client, 24)),
                    theme::LABEL_STYLE,
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    state.select(
        snapshot
            .selected_request_id()
            .and_then(|id| visible.iter().position(|r| r.approval_id == id)),
    );

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::SELECTED_STYLE)
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn render_deferred_list(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let visible = snapshot.visible_deferred();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Scheduled actions");

    if visible.is_empty() {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No scheduled actions",
                theme::tone_style(format::Tone::Success),
            )),
            Line::from(Span::styled(
                "Approved actions waiting for execution show up here.",
                theme::LABEL_STYLE,
            )),
        ])
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|a| {
            ListItem::new(Line::from(vec![
                level_span(&a.security_level),
                Span::raw(format_tool_name(&a.tool_name).to_string()),
                Span::raw("  "),
                Span::styled(
                    format_time_until_execution(a.time_until_execution),
                    theme::tone_style(execution_tone(a.time_until_execution)),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(
        snapshot
            .selected_deferred_id()
            .and_then(|id| visible.iter().position(|a| a.deferred_id == id)),
    );

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::SELECTED_STYLE)
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state);
}

fn field<'a>(label: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<14}", label), theme::LABEL_STYLE),
        value.into(),
    ])
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

fn context_lines<'a>(context: Option<&'a ActionContext>, lines: &mut Vec<Line<'a>>) {
    let Some(context) = context else {
        return;
    };
    if context.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Context", theme::HEADER_STYLE)));
    if let Some(ticket) = context.ticket_id {
        lines.push(field("Ticket", format!("#{}", ticket)));
    }
    if let Some(ref client) = context.client_name {
        lines.push(field("Client", client.as_str()));
    }
    if let Some(ref description) = context.description {
        lines.push(field("Description", description.as_str()));
    }
}

fn argument_lines<'a>(title: &'a str, arguments: &Arguments, lines: &mut Vec<Line<'a>>) {
    if arguments.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(title, theme::HEADER_STYLE)));
    for line in format::format_arguments(arguments) {
        lines.push(Line::from(Span::raw(format!("  {}", line))));
    }
}

fn render_request_detail(f: &mut Frame, request: Option<&ApprovalRequest>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Details");
    let Some(r) = request else {
        let p = Paragraph::new(Span::styled("Select a request", theme::LABEL_STYLE)).block(block);
        f.render_widget(p, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format_tool_name(&r.tool_name).to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("Request", r.approval_id.as_str()),
        field("Level", Span::styled(r.security_level.as_str(), theme::level_style(&r.security_level))),
        field(
            "Expires in",
            Span::styled(
                format_time_remaining(r.time_remaining_seconds),
                theme::tone_style(time_tone(r.time_remaining_seconds)),
            ),
        ),
        field("Created", local_time(&r.created_at)),
    ];
    if let Some(ref ip) = r.requester_ip {
        lines.push(field("Requested from", ip.as_str()));
    }
    context_lines(r.context.as_ref(), &mut lines);
    argument_lines("Arguments", &r.arguments, &mut lines);

    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_deferred_detail(f: &mut Frame, action: Option<&DeferredAction>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Details");
    let Some(a) = action else {
        let p = Paragraph::new(Span::styled("Select an action", theme::LABEL_STYLE)).block(block);
        f.render_widget(p, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format_tool_name(&a.tool_name).to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("Action", a.deferred_id.as_str()),
        field("Level", Span::styled(a.security_level.as_str(), theme::level_style(&a.security_level))),
        field(
            "Status",
            Span::styled(
                deferred_status_label(a.status),
                theme::tone_style(deferred_status_tone(a.status)),
            ),
        ),
        field(
            "Executes in",
            Span::styled(
                format_time_until_execution(a.time_until_execution),
                theme::tone_style(execution_tone(a.time_until_execution)),
            ),
        ),
        field("Scheduled for", local_time(&a.scheduled_at)),
        field("Delay", format!("{}h", a.delay_hours)),
        Line::from(""),
        field("Approved by", a.approved_by.as_str()),
        field("Approved at", local_time(&a.approved_at)),
    ];
    if let Some(ref comment) = a.approval_comment {
        lines.push(field("Comment", comment.as_str()));
    }
    context_lines(a.context.as_ref(), &mut lines);
    argument_lines("Parameters", &a.parameters, &mut lines);

    lines.push(Line::from(""));
    if can_cancel(a) {
        lines.push(Line::from(Span::styled(
            format!(
                "Runs automatically in {} unless cancelled (c).",
                format_time_until_execution(a.time_until_execution)
            ),
            theme::tone_style(format::Tone::Caution),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Cancellation window closed.",
            theme::tone_style(format::Tone::Muted),
        )));
    }

    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn hint<'a>(key: &'a str, label: &'a str) -> Vec<Span<'a>> {
    vec![
        Span::styled(key, theme::KEY_STYLE),
        Span::raw(format!(" {}  ", label)),
    ]
}

fn render_footer(f: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let input_line = match app.input_mode() {
        InputMode::Comment => Line::from(vec![
            Span::styled("Comment: ", theme::HEADER_STYLE),
            Span::raw(format!("{}_", app.comment())),
        ]),
        InputMode::Reason => Line::from(vec![
            Span::styled("Reason: ", theme::HEADER_STYLE),
            Span::raw(format!("{}_", app.reason())),
        ]),
        InputMode::Normal => {
            let (label, text) = match snapshot.active_tab() {
                Tab::Pending => ("Comment: ", app.comment()),
                Tab::Deferred => ("Reason: ", app.reason()),
            };
            if snapshot.is_action_loading() {
                Line::from(Span::styled("Working...", theme::LABEL_STYLE))
            } else if let Some(notice) = app.notice() {
                Line::from(Span::styled(notice.text().to_string(), theme::notice_style(notice)))
            } else if text.is_empty() {
                Line::from(Span::styled(
                    format!("{}(none, press e to edit)", label),
                    theme::LABEL_STYLE,
                ))
            } else {
                Line::from(vec![
                    Span::styled(label, theme::LABEL_STYLE),
                    Span::raw(text.to_string()),
                ])
            }
        }
    };

    let hints: Vec<Span> = match app.input_mode() {
        InputMode::Comment | InputMode::Reason => {
            [hint("Enter", "done"), hint("Esc", "discard")].concat()
        }
        InputMode::Normal => {
            let mut spans = hint("Tab", "switch");
            spans.extend(hint("j/k", "move"));
            match snapshot.active_tab() {
                Tab::Pending => {
                    spans.extend(hint("a", "approve"));
                    spans.extend(hint("d", "reject"));
                    spans.extend(hint("e", "comment"));
                }
                Tab::Deferred => {
                    spans.extend(hint("c", "cancel"));
                    spans.extend(hint("e", "reason"));
                }
            }
            spans.extend(hint("r", "refresh"));
            spans.extend(hint("p", "polling"));
            spans.extend(hint("q", "quit"));
            spans
        }
    };

    let p = Paragraph::new(vec![input_line, Line::from(hints)]).block(block);
    f.render_widget(p, area);
}
