//! TextInput: a single-line tui-input field used for the command prompt and
//! the upload form.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthStr;

use crate::theme::{style_input, C_INPUT_BG, C_MUTED, C_SECONDARY};

pub enum InputAction {
    Changed,
    Confirmed(String),
    Cancelled,
}

pub struct TextInput {
    input: Input,
    prefix: String,
    placeholder: String,
}

impl TextInput {
    pub fn new(prefix: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            prefix: prefix.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Enter confirms, Esc cancels, everything else edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => InputAction::Cancelled,
            KeyCode::Enter => InputAction::Confirmed(self.input.value().to_string()),
            _ => {
                self.input.handle_event(&Event::Key(key));
                InputAction::Changed
            }
        }
    }

    /// Render into `area`; shows the cursor when `active`.
    pub fn draw(&self, frame: &mut Frame, area: Rect, active: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let prefix_w = self.prefix.width() as u16;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prefix_w + 1) as usize);
        let value = self.input.value();

        let mut spans = vec![Span::styled(
            self.prefix.clone(),
            Style::default().fg(C_SECONDARY),
        )];
        if value.is_empty() && !active {
            spans.push(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(C_MUTED),
            ));
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            spans.push(Span::styled(visible, style_input()));
        }

        let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(C_INPUT_BG));
        frame.render_widget(paragraph, area);

        if active {
            let cursor_x = area.x + prefix_w + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
