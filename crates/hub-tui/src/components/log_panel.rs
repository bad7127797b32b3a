//! LogPanel: collapsible viewer for forwarded WARN/ERROR log lines.
//!
//! Collapsed it shows the newest line on a single row; expanded it is a
//! bordered pane scrolled with PageUp/PageDown.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    app_state::AppState,
    theme::{C_ACCENT, C_MUTED, C_PENDING, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct LogPanel {
    pub expanded: bool,
    /// Lines scrolled up from the newest entry. 0 follows the tail.
    offset: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            offset: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        self.offset = 0;
    }

    pub fn scroll(&mut self, delta: isize, total: usize) {
        let max = total.saturating_sub(1);
        self.offset = self.offset.saturating_add_signed(delta).min(max);
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        let logs = &state.log_lines;
        if !self.expanded || area.height <= 2 {
            let last = logs
                .last()
                .map(|s| compact_log_line(s))
                .unwrap_or_else(|| "(no warnings)".to_string());
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(" log ", Style::default().fg(C_MUTED)),
                    Span::styled(last, Style::default().fg(C_SECONDARY)),
                ])),
                area,
            );
            return;
        }

        let count = logs.len().to_string();
        let block = pane_chrome("log", false, (!logs.is_empty()).then(|| Badge {
            text: &count,
            color: C_MUTED,
        }));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let height = inner.height as usize;
        self.offset = self.offset.min(logs.len().saturating_sub(1));
        let end = logs.len() - self.offset.min(logs.len());
        let start = end.saturating_sub(height);

        let lines: Vec<Line> = logs[start..end]
            .iter()
            .map(|raw| {
                let text = compact_log_line(raw);
                let color = if text.contains("ERROR") {
                    C_ACCENT
                } else {
                    C_PENDING
                };
                Line::from(Span::styled(format!(" {}", text), Style::default().fg(color)))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop ANSI escapes and the `module::path: ` prefix, keep time and level.
fn compact_log_line(raw: &str) -> String {
    let clean = strip_ansi(raw);
    let mut rest = clean.trim();
    let mut head: Vec<&str> = Vec::new();

    if let Some((tok, rem)) = split_first_token(rest) {
        if chrono::NaiveTime::parse_from_str(tok, "%H:%M:%S").is_ok() {
            head.push(tok);
            rest = rem.trim_start();
        }
    }

    if let Some((tok, rem)) = split_first_token(rest) {
        let level = tok.trim_matches(|c| c == '[' || c == ']');
        if matches!(level, "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR") {
            head.push(level);
            rest = rem.trim_start();
        }
    }

    if let Some((left, msg)) = rest.split_once(": ") {
        if !left.is_empty()
            && left.len() <= 48
            && left.contains("::")
            && left
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':'))
        {
            rest = msg.trim_start();
        }
    }

    if head.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        head.join(" ")
    } else {
        format!("{} {}", head.join(" "), rest)
    }
}

fn split_first_token(s: &str) -> Option<(&str, &str)> {
    let mut parts = s.splitn(2, char::is_whitespace);
    let first = parts.next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some((first, parts.next().unwrap_or("")))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for ch in s.chars() {
        if in_escape {
            if ('@'..='~').contains(&ch) && ch != '[' {
                in_escape = false;
            }
            continue;
        }
        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }
        out.push(ch);
    }
    out
}
