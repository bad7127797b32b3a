//! Status bar: bottom lines with stats, mode, and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_COMMAND, C_MODE_EDIT, C_MODE_NORMAL, C_MUTED, C_SECONDARY, C_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into an upload form field.
    Edit,
    Command,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Edit => "EDIT",
            Self::Command => "COMMAND",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Edit => C_MODE_EDIT,
            Self::Command => C_MODE_COMMAND,
        }
    }
}

/// Stats counters line, e.g. `12 videos · 3 users · 1.5K views · 2 online`.
pub fn draw_stats_bar(frame: &mut Frame, area: Rect, stats: Option<&str>) {
    let text = match stats {
        Some(s) if !s.is_empty() => s,
        _ => "stats unavailable",
    };
    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(text, Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let keys = match mode {
        InputMode::Normal => {
            " Tab pane  e edit  j/k field  s submit  x reset  y copy link  r refresh  : command  L logs  q quit"
        }
        InputMode::Edit => " type  Enter save  Esc cancel",
        InputMode::Command => " like <id>  fav <id>  comment <id> <text>  upload <path>  submit  reset  q  ·  Enter run  Esc cancel",
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
