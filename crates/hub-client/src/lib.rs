//! Native client for a video / live-stream hub.
//!
//! The pieces mirror what a hub web page does in the browser: a reconnecting
//! live channel with heartbeats ([`live`]), a stats poller ([`stats`]),
//! like/favorite toggles ([`interaction`]) and the upload flow state machine
//! ([`upload`]). [`session::ClientSession`] owns all of them; front-ends
//! drain [`event::ClientEvent`]s to render.

pub mod api;
pub mod error;
pub mod event;
pub mod interaction;
pub mod live;
pub mod session;
pub mod stats;
pub mod upload;

pub use api::HubApi;
pub use error::ApiError;
pub use event::{ClientEvent, EventSender};
pub use session::ClientSession;
