//! Events the client engine emits for front-ends to render.

use hub_proto::protocol::{FavoriteAction, LiveMessage, ResourceId, StatsSnapshot};
use tokio::sync::mpsc;

use crate::interaction::LikeState;
use crate::live::ConnectionState;
use crate::upload::{SubmitResult, UploadOutcome, UploadProgress};

pub type EventSender = mpsc::UnboundedSender<ClientEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The live channel changed state.
    Connection(ConnectionState),
    /// A decoded live-channel message (unknown kinds are never forwarded).
    Live(LiveMessage),
    /// Log-only notice about new content.
    Notice(String),
    /// Displayed data is stale; re-fetch it.
    Reload,
    /// Fresh counters from the stats poller.
    Stats(StatsSnapshot),
    Like {
        video_id: ResourceId,
        state: LikeState,
    },
    Favorite {
        stream_id: ResourceId,
        action: Option<FavoriteAction>,
    },
    /// A message the user has to acknowledge.
    Alert(String),
    /// The hub wants the user somewhere else (login page).
    Redirect(String),
    UploadProgress(UploadProgress),
    /// The upload request returned; the owner of the flow should apply it.
    UploadResponse(SubmitResult),
    UploadFinished(UploadOutcome),
}
