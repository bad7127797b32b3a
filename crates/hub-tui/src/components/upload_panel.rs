//! UploadPanel: path prompt, metadata form, progress bar and success link,
//! drawn from the session's `UploadView`.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use hub_client::upload::{FormField, UploadView};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_muted, style_secondary, style_selected, C_LINK, C_MUTED, C_OK, C_PENDING, C_PRIMARY,
        C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
        text_input::{InputAction, TextInput},
    },
};

const FIELDS: [FormField; 3] = [FormField::Title, FormField::Description, FormField::Tags];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Editing {
    Path,
    Field(FormField),
}

pub struct UploadPanel {
    path_input: TextInput,
    field_input: TextInput,
    cursor: usize,
    editing: Option<Editing>,
}

fn field_label(field: FormField) -> &'static str {
    match field {
        FormField::Title => "Title",
        FormField::Description => "Description",
        FormField::Tags => "Tags",
    }
}

fn field_value(view: &UploadView, field: FormField) -> &str {
    match field {
        FormField::Title => &view.title,
        FormField::Description => &view.description,
        FormField::Tags => &view.tags,
    }
}

impl UploadPanel {
    pub fn new() -> Self {
        Self {
            path_input: TextInput::new("path: ", "press e to enter a video file path"),
            field_input: TextInput::new("", ""),
            cursor: 0,
            editing: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Open `field` for editing, pre-filled with its current value.
    pub fn edit_field(&mut self, field: FormField, view: &UploadView) {
        self.cursor = FIELDS.iter().position(|f| *f == field).unwrap_or(0);
        self.field_input.set_value(field_value(view, field));
        self.editing = Some(Editing::Field(field));
    }

    fn edit_path(&mut self) {
        self.path_input.clear();
        self.editing = Some(Editing::Path);
    }

    fn handle_editing(&mut self, key: KeyEvent, editing: Editing) -> Vec<Action> {
        let input = match editing {
            Editing::Path => &mut self.path_input,
            Editing::Field(_) => &mut self.field_input,
        };
        match input.handle_key(key) {
            InputAction::Changed => vec![],
            InputAction::Cancelled => {
                self.editing = None;
                vec![Action::SetEditing(false)]
            }
            InputAction::Confirmed(text) => {
                self.editing = None;
                let action = match editing {
                    Editing::Path if text.trim().is_empty() => return vec![Action::SetEditing(false)],
                    Editing::Path => Action::SelectFile(text.trim().into()),
                    Editing::Field(field) => Action::SetField(field, text),
                };
                vec![Action::SetEditing(false), action]
            }
        }
    }
}

impl Default for UploadPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for UploadPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Upload
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if let Some(editing) = self.editing {
            return self.handle_editing(key, editing);
        }

        let view = &state.upload;
        if view.progress_visible {
            return vec![];
        }
        if view.success_visible {
            return match key.code {
                KeyCode::Char('x') => vec![Action::ResetUpload],
                _ => vec![],
            };
        }

        if !view.form_visible {
            return match key.code {
                KeyCode::Char('e') | KeyCode::Enter => {
                    self.edit_path();
                    vec![Action::SetEditing(true)]
                }
                _ => vec![],
            };
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1) % FIELDS.len();
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = (self.cursor + FIELDS.len() - 1) % FIELDS.len();
                vec![]
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.edit_field(FIELDS[self.cursor], view);
                vec![Action::SetEditing(true)]
            }
            KeyCode::Char('o') => {
                self.edit_path();
                vec![Action::SetEditing(true)]
            }
            KeyCode::Char('s') if view.submit_enabled => vec![Action::SubmitUpload],
            KeyCode::Char('x') => vec![Action::ResetUpload],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let view = &state.upload;
        let percent = format!("{}%", view.progress_percent);
        let badge = if view.progress_visible {
            Some(Badge {
                text: &percent,
                color: C_PENDING,
            })
        } else if view.success_visible {
            Some(Badge {
                text: "DONE",
                color: C_OK,
            })
        } else {
            None
        };

        let block = pane_chrome("upload", focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut rows = RowCursor::new(inner);

        if view.dropzone_visible {
            if view.dropzone_content_visible || self.editing == Some(Editing::Path) {
                if let Some(row) = rows.next() {
                    self.path_input
                        .draw(frame, row, self.editing == Some(Editing::Path));
                }
            } else if let Some(path) = &view.file_input {
                rows.line(
                    frame,
                    Line::from(vec![
                        Span::styled("file: ", style_secondary()),
                        Span::styled(path.display().to_string(), Style::default().fg(C_PRIMARY)),
                    ]),
                );
                if let Some(preview) = &view.preview {
                    rows.line(
                        frame,
                        Line::from(Span::styled(format!("      {}", preview.url), style_muted())),
                    );
                }
            }
            rows.skip();
        }

        if view.form_visible {
            for (i, field) in FIELDS.iter().enumerate() {
                let Some(row) = rows.next() else { break };
                let label = format!("{:>12}: ", field_label(*field));
                if self.editing == Some(Editing::Field(*field)) {
                    let label_w = label.chars().count() as u16;
                    frame.render_widget(
                        Paragraph::new(Span::styled(label, style_secondary())),
                        row,
                    );
                    let input_area = Rect {
                        x: row.x + label_w,
                        width: row.width.saturating_sub(label_w),
                        ..row
                    };
                    self.field_input.draw(frame, input_area, true);
                    continue;
                }
                let value = field_value(view, *field);
                let value_span = if value.is_empty() {
                    Span::styled("(empty)", style_muted())
                } else {
                    Span::styled(value.to_string(), Style::default().fg(C_PRIMARY))
                };
                let mut line = Line::from(vec![Span::styled(label, style_secondary()), value_span]);
                let highlighted = focused && i == self.cursor;
                if highlighted {
                    line = line.style(style_selected());
                }
                if view.focus == Some(*field) && !highlighted {
                    line = line.style(Style::default().add_modifier(Modifier::UNDERLINED));
                }
                frame.render_widget(Paragraph::new(line), row);
            }
            rows.skip();
        }

        if view.actions_visible {
            let submit_style = if view.submit_enabled {
                Style::default().fg(C_OK).add_modifier(Modifier::BOLD)
            } else {
                style_muted()
            };
            rows.line(
                frame,
                Line::from(vec![
                    Span::styled(" [s] upload ", submit_style),
                    Span::styled(" [x] cancel ", Style::default().fg(C_SECONDARY)),
                    Span::styled(" [o] other file ", Style::default().fg(C_MUTED)),
                ]),
            );
        }

        if view.progress_visible {
            rows.line(
                frame,
                Line::from(vec![
                    Span::styled("uploading ", style_secondary()),
                    Span::styled(view.progress_filename.clone(), Style::default().fg(C_PRIMARY)),
                ]),
            );
            if let Some(row) = rows.next() {
                draw_progress(
                    frame,
                    row,
                    view.progress_ratio(),
                    &percent,
                    &view.progress_size,
                );
            }
        }

        if view.success_visible {
            rows.line(
                frame,
                Line::from(Span::styled(
                    "✓ Upload complete",
                    Style::default().fg(C_OK).add_modifier(Modifier::BOLD),
                )),
            );
            match &view.watch_link {
                Some(link) => rows.line(
                    frame,
                    Line::from(vec![
                        Span::styled("watch: ", style_secondary()),
                        Span::styled(
                            link.clone(),
                            Style::default()
                                .fg(C_LINK)
                                .add_modifier(Modifier::UNDERLINED),
                        ),
                    ]),
                ),
                None => rows.line(frame, Line::from(Span::styled("(no link)", style_muted()))),
            }
            rows.skip();
            rows.line(
                frame,
                Line::from(Span::styled(
                    "[y] copy link  [x] upload another",
                    Style::default().fg(C_MUTED),
                )),
            );
        }
    }
}

/// Hands out one-row rects from the top of an area.
struct RowCursor {
    area: Rect,
    next_y: u16,
}

impl RowCursor {
    fn new(area: Rect) -> Self {
        Self {
            area,
            next_y: area.y,
        }
    }

    fn next(&mut self) -> Option<Rect> {
        if self.next_y >= self.area.y + self.area.height {
            return None;
        }
        let row = Rect {
            x: self.area.x,
            y: self.next_y,
            width: self.area.width,
            height: 1,
        };
        self.next_y += 1;
        Some(row)
    }

    fn skip(&mut self) {
        let _ = self.next();
    }

    fn line(&mut self, frame: &mut Frame, line: Line<'_>) {
        if let Some(row) = self.next() {
            frame.render_widget(Paragraph::new(line), row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_proto::config::Profile;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn enter() -> KeyEvent {
        KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
    }

    fn state() -> AppState {
        AppState::new("http://hub".to_string(), Profile::Videos)
    }

    #[test]
    fn test_idle_path_entry_selects_file() {
        let mut panel = UploadPanel::new();
        let s = state();
        assert_eq!(panel.handle_key(key('e'), &s), vec![Action::SetEditing(true)]);
        for c in "/tmp/a.mp4".chars() {
            panel.handle_key(key(c), &s);
        }
        assert_eq!(
            panel.handle_key(enter(), &s),
            vec![
                Action::SetEditing(false),
                Action::SelectFile("/tmp/a.mp4".into())
            ]
        );
        assert!(!panel.is_editing());
    }

    #[test]
    fn test_form_navigation_and_submit() {
        let mut panel = UploadPanel::new();
        let mut s = state();
        s.upload.form_visible = true;
        s.upload.actions_visible = true;
        s.upload.description = "old".to_string();

        panel.handle_key(key('j'), &s);
        assert_eq!(panel.handle_key(key('e'), &s), vec![Action::SetEditing(true)]);
        panel.handle_key(key('!'), &s);
        assert_eq!(
            panel.handle_key(enter(), &s),
            vec![
                Action::SetEditing(false),
                Action::SetField(FormField::Description, "old!".to_string())
            ]
        );

        assert_eq!(panel.handle_key(key('s'), &s), vec![Action::SubmitUpload]);
        s.upload.submit_enabled = false;
        assert!(panel.handle_key(key('s'), &s).is_empty());
    }

    #[test]
    fn test_keys_ignored_while_uploading() {
        let mut panel = UploadPanel::new();
        let mut s = state();
        s.upload.progress_visible = true;
        assert!(panel.handle_key(key('x'), &s).is_empty());
        assert!(panel.handle_key(key('e'), &s).is_empty());
    }
}
