//! Like / favorite toggles: one POST each, no retry.

use hub_proto::protocol::{FavoriteAction, LikeAction, LikeResponse, ResourceId};
use tracing::{info, warn};

use crate::api::HubApi;
use crate::error::ApiError;
use crate::event::{ClientEvent, EventSender};

/// Like button state after the hub answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

impl From<&LikeResponse> for LikeState {
    fn from(r: &LikeResponse) -> Self {
        Self {
            liked: r.action == LikeAction::Liked,
            likes: r.likes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome<T> {
    Applied(T),
    /// 401; a redirect to the login page was emitted.
    LoginRequired,
    Failed(String),
}

impl<T> ToggleOutcome<T> {
    pub fn applied(&self) -> Option<&T> {
        match self {
            Self::Applied(v) => Some(v),
            _ => None,
        }
    }
}

/// Failures are logged only; the like button just stays as it was.
pub async fn toggle_like(
    api: &HubApi,
    events: &EventSender,
    video_id: ResourceId,
) -> ToggleOutcome<LikeState> {
    match api.like(&video_id).await {
        Ok(response) => {
            let state = LikeState::from(&response);
            info!("[like] #{} liked={} ({})", video_id, state.liked, state.likes);
            let _ = events.send(ClientEvent::Like { video_id, state });
            ToggleOutcome::Applied(state)
        }
        Err(e) => fail(api, events, "like", &video_id, e, false),
    }
}

/// Success reloads the displayed data; failures also raise an alert.
pub async fn toggle_favorite(
    api: &HubApi,
    events: &EventSender,
    stream_id: ResourceId,
) -> ToggleOutcome<Option<FavoriteAction>> {
    match api.favorite(&stream_id).await {
        Ok(response) if response.is_success() => {
            info!("[favorite] #{} {:?}", stream_id, response.action);
            let _ = events.send(ClientEvent::Favorite {
                stream_id,
                action: response.action,
            });
            let _ = events.send(ClientEvent::Reload);
            ToggleOutcome::Applied(response.action)
        }
        Ok(response) => {
            let reason = format!("hub answered {:?}", response.status);
            warn!("[favorite] #{} {}", stream_id, reason);
            let _ = events.send(ClientEvent::Alert(format!(
                "Could not update favorite: {}",
                reason
            )));
            ToggleOutcome::Failed(reason)
        }
        Err(e) => fail(api, events, "favorite", &stream_id, e, true),
    }
}

/// One comment on a stream. Success reloads the stream view; blank text is
/// rejected locally, other failures alert.
pub async fn post_comment(
    api: &HubApi,
    events: &EventSender,
    stream_id: ResourceId,
    text: &str,
) -> ToggleOutcome<()> {
    let text = text.trim();
    if text.is_empty() {
        let _ = events.send(ClientEvent::Alert("Please enter a comment".to_string()));
        return ToggleOutcome::Failed("empty comment".to_string());
    }
    match api.comment(&stream_id, text).await {
        Ok(()) => {
            info!("[comment] posted on #{}", stream_id);
            let _ = events.send(ClientEvent::Notice(format!("comment posted on #{}", stream_id)));
            let _ = events.send(ClientEvent::Reload);
            ToggleOutcome::Applied(())
        }
        Err(e) => {
            let outcome = fail(api, events, "comment", &stream_id, e, false);
            if let ToggleOutcome::Failed(reason) = &outcome {
                let _ = events.send(ClientEvent::Alert(format!(
                    "Could not post comment: {}",
                    reason
                )));
            }
            outcome
        }
    }
}

fn fail<T>(
    api: &HubApi,
    events: &EventSender,
    what: &str,
    id: &ResourceId,
    err: ApiError,
    alert_on_failure: bool,
) -> ToggleOutcome<T> {
    if let ApiError::Unauthorized = err {
        info!("[{}] #{} needs login", what, id);
        let _ = events.send(ClientEvent::Redirect(api.login_url()));
        return ToggleOutcome::LoginRequired;
    }
    warn!("[{}] #{} failed: {}", what, id, err);
    if alert_on_failure {
        let _ = events.send(ClientEvent::Alert(format!("Could not update {}: {}", what, err)));
    }
    ToggleOutcome::Failed(err.to_string())
}
