//! Notifications: scrollable feed of timestamped live-channel and client events.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_MUTED, C_PRIMARY, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct Notifications {
    /// Lines scrolled up from the newest entry. 0 follows the tail.
    offset: usize,
}

impl Notifications {
    pub fn new() -> Self {
        Self { offset: 0 }
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Notifications {
    fn id(&self) -> ComponentId {
        ComponentId::Notifications
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let max = state.notifications.len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.offset = (self.offset + 1).min(max),
            KeyCode::Down | KeyCode::Char('j') => self.offset = self.offset.saturating_sub(1),
            KeyCode::PageUp => self.offset = (self.offset + 10).min(max),
            KeyCode::PageDown => self.offset = self.offset.saturating_sub(10),
            KeyCode::Home | KeyCode::Char('g') => self.offset = max,
            KeyCode::End | KeyCode::Char('G') => self.offset = 0,
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let count = state.notifications.len().to_string();
        let badge = (!state.notifications.is_empty()).then(|| Badge {
            text: &count,
            color: C_SECONDARY,
        });
        let block = pane_chrome("events", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.notifications.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  waiting for hub events",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let total = state.notifications.len();
        self.offset = self.offset.min(total.saturating_sub(1));
        let end = total - self.offset;
        let start = end.saturating_sub(height);

        let lines: Vec<Line> = state
            .notifications
            .iter()
            .skip(start)
            .take(end - start)
            .map(|n| {
                let color = if n.text.starts_with("alert:") {
                    C_ACCENT
                } else {
                    C_PRIMARY
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", n.time), Style::default().fg(C_MUTED)),
                    Span::styled(n.text.clone(), Style::default().fg(color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}
