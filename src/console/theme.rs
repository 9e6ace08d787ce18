use crate::approval::format::Tone;
use crate::console::page::Notice;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const LABEL_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));
pub const KEY_STYLE: Style = Style::new().fg(Color::Cyan);
pub const DEMO_BANNER_STYLE: Style = Style::new()
    .bg(Color::Rgb(250, 189, 47))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const ERROR_BANNER_STYLE: Style = Style::new()
    .bg(Color::Rgb(204, 36, 29))
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Normal => Color::Reset,
        Tone::Info => Color::Rgb(131, 165, 152),
        Tone::Caution => Color::Rgb(250, 189, 47),
        Tone::Warning => Color::Rgb(254, 128, 25),
        Tone::Critical => Color::Rgb(251, 73, 52),
        Tone::Expired => Color::Rgb(146, 131, 116),
        Tone::Success => Color::Rgb(184, 187, 38),
        Tone::Danger => Color::Rgb(204, 36, 29),
        Tone::Muted => Color::Rgb(124, 111, 100),
    }
}

pub fn tone_style(tone: Tone) -> Style {
    let style = Style::new().fg(tone_color(tone));
    match tone {
        Tone::Critical | Tone::Danger => style.add_modifier(Modifier::BOLD),
        Tone::Expired => style.add_modifier(Modifier::CROSSED_OUT),
        _ => style,
    }
}

pub fn notice_style(notice: &Notice) -> Style {
    let tone = match notice {
        Notice::Success(_) => Tone::Success,
        Notice::Warning(_) => Tone::Warning,
        Notice::Error(_) => Tone::Critical,
    };
    tone_style(tone)
}

/// Security level badge: L4 stands out more than L3.
pub fn level_style(level: &str) -> Style {
    match level.trim().to_ascii_uppercase().as_str() {
        "L4" => Style::new()
            .fg(Color::Rgb(251, 73, 52))
            .add_modifier(Modifier::BOLD),
        "L3" => Style::new()
            .fg(Color::Rgb(254, 128, 25))
            .add_modifier(Modifier::BOLD),
        _ => Style::new().fg(Color::Rgb(250, 189, 47)),
    }
}
