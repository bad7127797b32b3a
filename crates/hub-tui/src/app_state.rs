//! AppState: shared read-only data passed to components during render/event.
//!
//! The App event loop is the only writer; it folds every `ClientEvent` in
//! through [`AppState::apply`].

use std::collections::VecDeque;

use hub_client::event::ClientEvent;
use hub_client::interaction::LikeState;
use hub_client::live::ConnectionState;
use hub_client::upload::{UploadOutcome, UploadView};
use hub_proto::config::Profile;
use hub_proto::protocol::{FavoriteAction, LiveMessage, ResourceId};

use crate::widgets::status_bar::InputMode;

const MAX_NOTIFICATIONS: usize = 200;
const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub time: String,
    pub text: String,
}

pub struct AppState {
    pub base_url: String,
    pub profile: Profile,
    pub connection: ConnectionState,
    /// Rendered footer line; `None` until the first successful poll.
    pub stats_line: Option<String>,
    /// Hub's live client count from the last pong.
    pub live_clients: Option<u64>,
    pub like: Option<(ResourceId, LikeState)>,
    pub upload: UploadView,
    pub notifications: VecDeque<Notification>,
    pub log_lines: Vec<String>,
    pub input_mode: InputMode,
}

impl AppState {
    pub fn new(base_url: String, profile: Profile) -> Self {
        Self {
            base_url,
            profile,
            connection: ConnectionState::Absent,
            stats_line: None,
            live_clients: None,
            like: None,
            upload: UploadView::default(),
            notifications: VecDeque::new(),
            log_lines: Vec::new(),
            input_mode: InputMode::Normal,
        }
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notifications.push_back(Notification {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            text: text.into(),
        });
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    pub fn push_log(&mut self, line: String) {
        self.log_lines.push(line);
        if self.log_lines.len() > MAX_LOG_LINES {
            self.log_lines.remove(0);
        }
    }

    /// Fold a client event into display state. Returns true if a redraw is needed.
    pub fn apply(&mut self, event: &ClientEvent) -> bool {
        match event {
            ClientEvent::Connection(state) => {
                if *state != self.connection {
                    if state.is_open() {
                        self.notify("connected to live channel");
                    } else if self.connection.is_open() {
                        self.notify("live channel closed, retrying");
                    }
                }
                self.connection = *state;
            }
            ClientEvent::Live(LiveMessage::Pong { connections }) => {
                self.live_clients = *connections;
            }
            ClientEvent::Live(_) => {}
            ClientEvent::Notice(text) => self.notify(text.clone()),
            ClientEvent::Reload => self.notify("content changed, refreshing"),
            ClientEvent::Stats(snapshot) => {
                self.stats_line = Some(hub_client::stats::render_footer(self.profile, snapshot));
            }
            ClientEvent::Like { video_id, state } => {
                let verb = if state.liked { "liked" } else { "unliked" };
                self.notify(format!("{} #{} ({} likes)", verb, video_id, state.likes));
                self.like = Some((video_id.clone(), *state));
            }
            ClientEvent::Favorite { stream_id, action } => {
                let text = match action {
                    Some(FavoriteAction::Added) => format!("#{} added to favorites", stream_id),
                    Some(FavoriteAction::Removed) => {
                        format!("#{} removed from favorites", stream_id)
                    }
                    None => format!("favorites updated for #{}", stream_id),
                };
                self.notify(text);
            }
            ClientEvent::Alert(text) => self.notify(format!("alert: {}", text)),
            ClientEvent::Redirect(url) => self.notify(format!("login required: {}", url)),
            ClientEvent::UploadFinished(UploadOutcome::Succeeded { watch_url, .. }) => {
                match watch_url {
                    Some(url) => self.notify(format!("upload complete: {}", url)),
                    None => self.notify("upload complete"),
                }
            }
            ClientEvent::UploadFinished(UploadOutcome::Failed { .. }) => {}
            ClientEvent::UploadProgress(_) | ClientEvent::UploadResponse(_) => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new("http://127.0.0.1:8000".to_string(), Profile::Videos)
    }

    #[test]
    fn test_connection_transitions_are_logged_once() {
        let mut s = state();
        s.apply(&ClientEvent::Connection(ConnectionState::Connecting));
        s.apply(&ClientEvent::Connection(ConnectionState::Open));
        s.apply(&ClientEvent::Connection(ConnectionState::Open));
        s.apply(&ClientEvent::Connection(ConnectionState::ClosedPendingRetry));
        let texts: Vec<_> = s.notifications.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["connected to live channel", "live channel closed, retrying"]
        );
        assert_eq!(s.connection, ConnectionState::ClosedPendingRetry);
    }

    #[test]
    fn test_like_and_pong() {
        let mut s = state();
        s.apply(&ClientEvent::Like {
            video_id: ResourceId::from("42"),
            state: LikeState {
                liked: true,
                likes: 5,
            },
        });
        assert_eq!(
            s.like,
            Some((
                ResourceId::from("42"),
                LikeState {
                    liked: true,
                    likes: 5
                }
            ))
        );
        s.apply(&ClientEvent::Live(LiveMessage::Pong {
            connections: Some(3),
        }));
        assert_eq!(s.live_clients, Some(3));
    }

    #[test]
    fn test_notifications_are_capped() {
        let mut s = state();
        for i in 0..(MAX_NOTIFICATIONS + 10) {
            s.notify(format!("n{}", i));
        }
        assert_eq!(s.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(s.notifications.front().map(|n| n.text.as_str()), Some("n10"));
    }
}
