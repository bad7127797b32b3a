//! App: component-based event loop around a `ClientSession`.
//!
//! - Terminal input is read on a blocking task and arrives as `AppMessage`s.
//! - `ClientEvent`s from the session's background tasks go through
//!   `ClientSession::apply_event` first, then into `AppState`.
//! - Components return `Vec<Action>`; `dispatch` turns them into session calls.
//!   Network round-trips (uploads, likes, favorites) run on spawned tasks and
//!   report back over the same event channel, so the loop never waits on I/O.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hub_client::event::{ClientEvent, EventReceiver, EventSender};
use hub_client::interaction;
use hub_client::upload::{FormField, UploadOutcome};
use hub_client::ClientSession;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    command,
    component::Component,
    components::{
        header::draw_header, log_panel::LogPanel, notifications::Notifications,
        upload_panel::UploadPanel,
    },
    theme::C_BG,
    widgets::{
        status_bar::{self, InputMode},
        text_input::{InputAction, TextInput},
        toast::ToastManager,
    },
};

enum AppMessage {
    Event(Event),
}

/// Client events folded per wakeup before the next redraw.
const MAX_DRAIN: usize = 256;

pub struct App {
    pub state: AppState,
    session: ClientSession,
    events: EventSender,

    upload_panel: UploadPanel,
    notifications: Notifications,
    log_panel: LogPanel,
    command: TextInput,

    focus: ComponentId,
    toast: ToastManager,
    upload_task: Option<JoinHandle<()>>,
    should_quit: bool,
}

impl App {
    pub fn new(session: ClientSession, events: EventSender) -> Self {
        let state = AppState::new(
            session.api().base_url().to_string(),
            session.config().hub.profile,
        );
        Self {
            state,
            session,
            events,
            upload_panel: UploadPanel::new(),
            notifications: Notifications::new(),
            log_panel: LogPanel::new(),
            command: TextInput::new(":", ""),
            focus: ComponentId::Upload,
            toast: ToastManager::new(),
            upload_task: None,
            should_quit: false,
        }
    }

    pub async fn run(
        mut self,
        mut client_rx: EventReceiver,
        mut log_rx: mpsc::UnboundedReceiver<String>,
    ) -> anyhow::Result<()> {
        self.session.start()?;

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(AppMessage::Event(ev)) = rx.recv() => {
                    needs_redraw = self.handle_terminal_event(ev).await;
                }

                Some(ev) = client_rx.recv() => {
                    self.handle_client_event(ev);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        match client_rx.try_recv() {
                            Ok(ev) => self.handle_client_event(ev),
                            Err(_) => break,
                        }
                        drained += 1;
                    }
                    needs_redraw = true;
                }

                Some(line) = log_rx.recv() => {
                    self.state.push_log(line);
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(task) = self.upload_task.take() {
            task.abort();
        }
        self.session.shutdown();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("hub tui exited");

        Ok(())
    }

    // ── Events ────────────────────────────────────────────────────────────────

    async fn handle_terminal_event(&mut self, ev: Event) -> bool {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let actions = self.handle_key(key);
                for action in actions {
                    self.dispatch(action).await;
                }
                true
            }
            Event::Resize(_, _) => true,
            _ => false,
        }
    }

    fn handle_client_event(&mut self, ev: ClientEvent) {
        self.session.apply_event(&ev);
        match &ev {
            ClientEvent::Alert(text) => self.toast.error(text.clone()),
            ClientEvent::Redirect(url) => self.toast.warning(format!("login required: {}", url)),
            ClientEvent::UploadFinished(UploadOutcome::Succeeded { .. }) => {
                self.upload_task = None;
                self.toast.success("upload complete");
            }
            ClientEvent::UploadFinished(UploadOutcome::Failed { .. }) => {
                self.upload_task = None;
            }
            _ => {}
        }
        self.state.apply(&ev);
        self.sync_upload();
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if self.state.input_mode == InputMode::Command {
            return match self.command.handle_key(key) {
                InputAction::Changed => vec![],
                InputAction::Cancelled => {
                    self.state.input_mode = InputMode::Normal;
                    vec![]
                }
                InputAction::Confirmed(line) => {
                    self.state.input_mode = InputMode::Normal;
                    self.command.clear();
                    match command::parse(&line) {
                        Ok(action) => vec![action],
                        Err(msg) => {
                            self.toast.warning(msg);
                            vec![]
                        }
                    }
                }
            };
        }

        // While a form field is open every key belongs to the upload panel.
        if self.upload_panel.is_editing() {
            return self.upload_panel.handle_key(key, &self.state);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char(':') => return vec![Action::OpenCommand],
            KeyCode::Tab | KeyCode::BackTab => return vec![Action::FocusNext],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            KeyCode::Char('y') => return vec![Action::CopyWatchLink],
            KeyCode::Char('r') => return vec![Action::RefreshStats],
            KeyCode::PageUp if self.log_panel.expanded => {
                self.log_panel.scroll(10, self.state.log_lines.len());
                return vec![];
            }
            KeyCode::PageDown if self.log_panel.expanded => {
                self.log_panel.scroll(-10, self.state.log_lines.len());
                return vec![];
            }
            _ => {}
        }

        match self.focus {
            ComponentId::Upload => self.upload_panel.handle_key(key, &self.state),
            ComponentId::Notifications => self.notifications.handle_key(key, &self.state),
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        debug!("dispatch {:?}", action);
        match action {
            Action::SelectFile(path) => {
                // Rejections arrive as Alert events.
                if self.session.select_file(&path, None).await.is_ok() {
                    self.sync_upload();
                    if self.state.upload.focus == Some(FormField::Title) {
                        self.focus = ComponentId::Upload;
                        self.upload_panel
                            .edit_field(FormField::Title, &self.state.upload);
                        self.state.input_mode = InputMode::Edit;
                    }
                }
            }
            Action::SetField(field, value) => {
                match field {
                    FormField::Title => self.session.set_title(value),
                    FormField::Description => self.session.set_description(value),
                    FormField::Tags => self.session.set_tags(value),
                }
                self.sync_upload();
            }
            Action::SubmitUpload => {
                if let Ok(pending) = self.session.begin_upload() {
                    info!("uploading {}", pending.request().file_name);
                    self.upload_task = Some(pending.spawn());
                }
                self.sync_upload();
            }
            Action::ResetUpload => {
                if self.upload_task.is_some() {
                    self.toast.warning("upload in progress");
                    return;
                }
                self.session.reset_upload();
                self.sync_upload();
            }

            Action::Like(video_id) => {
                let api = self.session.api().clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    interaction::toggle_like(&api, &events, video_id).await;
                });
            }
            Action::Favorite(stream_id) => {
                let api = self.session.api().clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    interaction::toggle_favorite(&api, &events, stream_id).await;
                });
            }
            Action::Comment(stream_id, text) => {
                let api = self.session.api().clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    interaction::post_comment(&api, &events, stream_id, &text).await;
                });
            }

            Action::FocusNext => {
                self.focus = match self.focus {
                    ComponentId::Upload => ComponentId::Notifications,
                    ComponentId::Notifications => ComponentId::Upload,
                };
            }
            Action::OpenCommand => {
                self.command.clear();
                self.state.input_mode = InputMode::Command;
            }
            Action::SetEditing(editing) => {
                self.state.input_mode = if editing {
                    InputMode::Edit
                } else {
                    InputMode::Normal
                };
            }
            Action::ToggleLogs => self.log_panel.toggle(),
            Action::CopyWatchLink => match self.state.upload.watch_link.clone() {
                Some(link) => {
                    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(link.clone())) {
                        Ok(()) => self.toast.success(format!("copied: {}", link)),
                        Err(e) => {
                            warn!("clipboard error: {}", e);
                            self.toast.error(format!("clipboard error: {}", e));
                        }
                    }
                }
                None => self.toast.info("no watch link yet"),
            },
            Action::RefreshStats => self.session.refresh_stats(),
            Action::Quit => self.should_quit = true,
        }
    }

    fn sync_upload(&mut self) {
        if self.state.upload != *self.session.upload().view() {
            self.state.upload = self.session.upload().view().clone();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let log_h = if self.log_panel.expanded { 10 } else { 1 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        draw_header(frame, outer[0], &self.state);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer[1]);
        let upload_focused = self.focus == ComponentId::Upload;
        self.upload_panel
            .draw(frame, body[0], upload_focused, &self.state);
        self.notifications
            .draw(frame, body[1], !upload_focused, &self.state);

        self.log_panel.draw(frame, outer[2], &self.state);
        status_bar::draw_stats_bar(frame, outer[3], self.state.stats_line.as_deref());
        status_bar::draw_separator(frame, outer[4]);
        if self.state.input_mode == InputMode::Command {
            self.command.draw(frame, outer[5], true);
        } else {
            status_bar::draw_keys_bar(frame, outer[5], self.state.input_mode);
        }

        self.toast.draw(frame, area);
    }
}
