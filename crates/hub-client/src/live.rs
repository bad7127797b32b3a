//! Live channel: one reconnecting WebSocket to the hub.
//!
//! The channel is a single task that loops forever:
//!
//! ```text
//!  Absent -> Connecting -> Open -> ClosedPendingRetry -> Connecting ...
//!                 \__________________/
//!                   (connect failed)
//! ```
//!
//! While `Open`, a heartbeat ticker sends `{"type":"ping"}`. The ticker is
//! owned by the open-connection loop, so it stops the moment the socket
//! closes. Every close (clean, server-initiated, transport error, failed
//! connect) schedules exactly one reconnect after the policy's delay.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hub_proto::config::{BackoffKind, Config, RefreshPolicy};
use hub_proto::protocol::{ClientMessage, LiveMessage};
use rand::Rng;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::api::HubApi;
use crate::error::ApiError;
use crate::event::{ClientEvent, EventSender};

/// Lower bound for the heartbeat period and reconnect delay.
const MIN_PERIOD: Duration = Duration::from_millis(100);

type LiveStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection has been attempted yet.
    #[default]
    Absent,
    Connecting,
    Open,
    /// Closed; a reconnect is scheduled.
    ClosedPendingRetry,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Absent => "offline",
            Self::Connecting => "connecting",
            Self::Open => "live",
            Self::ClosedPendingRetry => "retrying",
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// Delay before reconnecting after a close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconnectPolicy {
    /// Same delay every time, retried forever.
    Fixed(Duration),
    /// `base * 2^(attempt-1)` capped at `max`, with the upper half jittered.
    Exponential { base: Duration, max: Duration },
}

impl ReconnectPolicy {
    pub fn from_config(config: &Config) -> Self {
        match config.live.backoff {
            BackoffKind::Fixed => Self::Fixed(config.live.reconnect_delay()),
            BackoffKind::Exponential => Self::Exponential {
                base: config.live.reconnect_delay(),
                max: config.live.max_backoff(),
            },
        }
    }

    /// Delay for the `attempt`-th consecutive close (1-based; reset to 1
    /// after every successful open).
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let shift = attempt.saturating_sub(1).min(16);
                let capped = base.saturating_mul(1u32 << shift).min(max);
                let half = capped / 2;
                let spread = (capped - half).as_millis() as u64;
                let jitter = rand::thread_rng().gen_range(0..=spread);
                half + Duration::from_millis(jitter)
            }
        };
        delay.max(MIN_PERIOD)
    }
}

/// Everything the live channel needs to run.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub url: Url,
    pub cookie: Option<String>,
    pub heartbeat: Duration,
    pub reconnect: ReconnectPolicy,
    pub refresh_policy: RefreshPolicy,
    /// Message kinds that trigger `refresh_policy`.
    pub refresh_kinds: &'static [&'static str],
}

impl LiveOptions {
    pub fn from_config(config: &Config, api: &HubApi) -> Result<Self, ApiError> {
        Ok(Self {
            url: api.live_url(&config.live.path)?,
            cookie: api.cookie().map(str::to_string),
            heartbeat: config.live.heartbeat(),
            reconnect: ReconnectPolicy::from_config(config),
            refresh_policy: config.refresh_policy(),
            refresh_kinds: config.hub.profile.refresh_kinds(),
        })
    }
}

pub struct LiveChannel {
    options: LiveOptions,
    events: EventSender,
    state_tx: watch::Sender<ConnectionState>,
    /// Poked on `Reload` so the stats poller re-fetches right away.
    refresh: Option<Arc<Notify>>,
}

/// Handle to a running live channel task.
pub struct LiveHandle {
    task: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
}

impl LiveHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl LiveChannel {
    pub fn new(options: LiveOptions, events: EventSender) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Absent);
        Self {
            options,
            events,
            state_tx,
            refresh: None,
        }
    }

    pub fn with_refresh_trigger(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn spawn(self) -> LiveHandle {
        let state = self.state_tx.subscribe();
        let task = tokio::spawn(self.run());
        LiveHandle { task, state }
    }

    async fn run(self) {
        let mut attempt = 0u32;
        loop {
            self.set_state(ConnectionState::Connecting);
            match self.connect().await {
                Ok(stream) => {
                    info!("[live] connected to {}", self.options.url);
                    attempt = 0;
                    self.set_state(ConnectionState::Open);
                    self.serve(stream).await;
                    info!("[live] disconnected");
                }
                Err(e) => {
                    warn!("[live] connect to {} failed: {}", self.options.url, e);
                }
            }

            attempt = attempt.saturating_add(1);
            self.set_state(ConnectionState::ClosedPendingRetry);
            let delay = self.options.reconnect.delay(attempt);
            debug!("[live] reconnecting in {:?} (attempt {})", delay, attempt);
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect(&self) -> anyhow::Result<LiveStream> {
        let mut request = self.options.url.as_str().into_client_request()?;
        if let Some(cookie) = &self.options.cookie {
            request
                .headers_mut()
                .insert(COOKIE, HeaderValue::from_str(cookie)?);
        }
        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        Ok(stream)
    }

    /// Pump one open connection until it closes.
    async fn serve(&self, stream: LiveStream) {
        let (mut write, mut read) = stream.split();

        let period = self.options.heartbeat.max(MIN_PERIOD);
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Close(frame))) => {
                        debug!("[live] server closed: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("[live] transport error: {}", e);
                        let _ = write.close().await;
                        break;
                    }
                    None => break,
                },

                _ = heartbeat.tick() => {
                    let ping = match ClientMessage::Ping.encode() {
                        Ok(p) => p,
                        Err(e) => {
                            warn!("[live] failed to encode ping: {}", e);
                            continue;
                        }
                    };
                    trace!("[live] ping");
                    if let Err(e) = write.send(Message::Text(ping)).await {
                        warn!("[live] heartbeat send failed: {}", e);
                        break;
                    }
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let msg = match LiveMessage::decode(text) {
            Some(LiveMessage::Unknown) => {
                debug!("[live] ignoring unknown message: {}", text);
                return;
            }
            Some(msg) => msg,
            None => {
                trace!("[live] ignoring malformed frame");
                return;
            }
        };

        let kind = msg.kind();
        let summary = msg.summary();
        let _ = self.events.send(ClientEvent::Live(msg));

        if !self.options.refresh_kinds.contains(&kind) {
            return;
        }
        match self.options.refresh_policy {
            RefreshPolicy::Notify => {
                info!("[live] new content: {}", summary);
                let _ = self.events.send(ClientEvent::Notice(summary));
            }
            RefreshPolicy::Reload => {
                info!("[live] {}, reloading", summary);
                let _ = self.events.send(ClientEvent::Reload);
                if let Some(refresh) = &self.refresh {
                    refresh.notify_one();
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
        let _ = self.events.send(ClientEvent::Connection(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_never_grows() {
        let policy = ReconnectPolicy::Fixed(Duration::from_secs(5));
        for attempt in [1, 2, 10, 1000, u32::MAX] {
            assert_eq!(policy.delay(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_zero_delay_does_not_spin() {
        for policy in [
            ReconnectPolicy::Fixed(Duration::ZERO),
            ReconnectPolicy::Exponential {
                base: Duration::ZERO,
                max: Duration::ZERO,
            },
        ] {
            assert_eq!(policy.delay(1), MIN_PERIOD);
        }
    }

    #[test]
    fn test_exponential_delay_is_bounded() {
        let policy = ReconnectPolicy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        for _ in 0..50 {
            let first = policy.delay(1);
            assert!(first >= Duration::from_millis(500) && first <= Duration::from_secs(1));
            let late = policy.delay(40);
            assert!(late >= Duration::from_secs(15) && late <= Duration::from_secs(30));
        }
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = Config::default();
        assert_eq!(
            ReconnectPolicy::from_config(&config),
            ReconnectPolicy::Fixed(Duration::from_secs(5))
        );
        config.live.backoff = BackoffKind::Exponential;
        assert!(matches!(
            ReconnectPolicy::from_config(&config),
            ReconnectPolicy::Exponential { .. }
        ));
    }

    fn channel_with(policy: RefreshPolicy) -> (LiveChannel, crate::event::EventReceiver) {
        let (tx, rx) = crate::event::channel();
        let options = LiveOptions {
            url: Url::parse("ws://127.0.0.1:1/ws").unwrap(),
            cookie: None,
            heartbeat: Duration::from_secs(30),
            reconnect: ReconnectPolicy::Fixed(Duration::from_secs(5)),
            refresh_policy: policy,
            refresh_kinds: &["new_video", "video_published"],
        };
        (LiveChannel::new(options, tx), rx)
    }

    #[test]
    fn test_dispatch_ignores_unknown_and_malformed() {
        let (channel, mut rx) = channel_with(RefreshPolicy::Notify);
        channel.dispatch("garbage");
        channel.dispatch(r#"{"type":"mystery"}"#);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_notify_policy() {
        let (channel, mut rx) = channel_with(RefreshPolicy::Notify);
        channel.dispatch(r#"{"type":"new_video","title":"Cats"}"#);
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Live(LiveMessage::NewVideo { .. }))));
        match rx.try_recv() {
            Ok(ClientEvent::Notice(text)) => assert_eq!(text, "new video: Cats"),
            other => panic!("expected notice, got {:?}", other),
        }

        // pong is forwarded but triggers nothing
        channel.dispatch(r#"{"type":"pong","connections":2}"#);
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Live(LiveMessage::Pong { .. }))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_reload_policy_pokes_refresh() {
        let (channel, mut rx) = channel_with(RefreshPolicy::Reload);
        let refresh = Arc::new(Notify::new());
        let channel = channel.with_refresh_trigger(refresh.clone());
        channel.dispatch(r#"{"type":"video_published","video_id":9}"#);
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Live(_))));
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Reload)));

        // notify_one stores a permit, so this resolves immediately
        tokio::time::timeout(Duration::from_millis(100), refresh.notified())
            .await
            .expect("refresh trigger was not notified");
    }
}
