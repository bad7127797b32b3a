//! Stats poller and the footer slots it feeds.

use std::sync::Arc;
use std::time::Duration;

use hub_proto::config::Profile;
use hub_proto::format::fmt_num;
use hub_proto::protocol::StatsSnapshot;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::HubApi;
use crate::event::{ClientEvent, EventSender};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub struct StatsPoller {
    api: HubApi,
    interval: Duration,
    events: EventSender,
    refresh: Arc<Notify>,
}

pub struct StatsHandle {
    task: JoinHandle<()>,
    refresh: Arc<Notify>,
}

impl StatsHandle {
    /// Poll now instead of waiting for the next tick.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl StatsPoller {
    pub fn new(api: HubApi, interval: Duration, events: EventSender) -> Self {
        Self {
            api,
            interval: interval.max(MIN_INTERVAL),
            events,
            refresh: Arc::new(Notify::new()),
        }
    }

    /// Shared trigger that makes the running poller fetch immediately.
    pub fn refresh_trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh)
    }

    pub fn spawn(self) -> StatsHandle {
        let refresh = self.refresh_trigger();
        let task = tokio::spawn(self.run());
        StatsHandle { task, refresh }
    }

    async fn run(self) {
        // First tick fires immediately: stats are fetched on start.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {
                    debug!("[stats] out-of-band refresh");
                }
            }
            self.poll_once().await;
        }
    }

    /// One fetch. On failure the last published snapshot stays current.
    pub async fn poll_once(&self) -> Option<StatsSnapshot> {
        match self.api.stats().await {
            Ok(snapshot) => {
                debug!("[stats] {:?}", snapshot.counters);
                let _ = self.events.send(ClientEvent::Stats(snapshot.clone()));
                Some(snapshot)
            }
            Err(e) => {
                warn!("[stats] poll failed: {}", e);
                None
            }
        }
    }
}

// ── Footer slots ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatFormat {
    /// Plain integer.
    Count,
    /// `1.5K` / `2.3M`.
    Compact,
}

/// One fixed display slot: which counter, how to label and format it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSlot {
    pub key: &'static str,
    pub label: &'static str,
    pub format: StatFormat,
}

const VIDEO_SLOTS: &[StatSlot] = &[
    StatSlot { key: "videos", label: "videos", format: StatFormat::Count },
    StatSlot { key: "users", label: "users", format: StatFormat::Count },
    StatSlot { key: "views", label: "views", format: StatFormat::Compact },
    StatSlot { key: "active", label: "online", format: StatFormat::Count },
];

const STREAM_SLOTS: &[StatSlot] = &[
    StatSlot { key: "total_viewers", label: "watching", format: StatFormat::Compact },
    StatSlot { key: "approved_streams", label: "streams", format: StatFormat::Count },
    StatSlot { key: "pending_streams", label: "pending", format: StatFormat::Count },
    StatSlot { key: "users", label: "users", format: StatFormat::Count },
    StatSlot { key: "active_connections", label: "online", format: StatFormat::Count },
];

pub fn slots_for(profile: Profile) -> &'static [StatSlot] {
    match profile {
        Profile::Videos => VIDEO_SLOTS,
        Profile::Streams => STREAM_SLOTS,
    }
}

impl StatSlot {
    /// `"12 videos"`, or `None` if the snapshot lacks this counter.
    pub fn render(&self, snapshot: &StatsSnapshot) -> Option<String> {
        let value = snapshot.get(self.key)?;
        let text = match self.format {
            StatFormat::Count => fmt_count(value),
            StatFormat::Compact => fmt_num(value),
        };
        Some(format!("{} {}", text, self.label))
    }
}

/// Footer line for `profile`, e.g. `12 videos · 3 users · 1.5K views · 2 online`.
pub fn render_footer(profile: Profile, snapshot: &StatsSnapshot) -> String {
    slots_for(profile)
        .iter()
        .filter_map(|slot| slot.render(snapshot))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn fmt_count(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> StatsSnapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_video_footer() {
        let s = snapshot(r#"{"videos":12,"users":3,"views":1500,"active":2}"#);
        assert_eq!(
            render_footer(Profile::Videos, &s),
            "12 videos · 3 users · 1.5K views · 2 online"
        );
    }

    #[test]
    fn test_stream_footer_skips_missing_counters() {
        let s = snapshot(r#"{"total_viewers":2500000,"approved_streams":7}"#);
        assert_eq!(
            render_footer(Profile::Streams, &s),
            "2.5M watching · 7 streams"
        );
    }

    #[test]
    fn test_stream_footer_counts_pending_review() {
        let s = snapshot(
            r#"{"approved_streams":4,"pending_streams":2,"users":9,"total_viewers":30,"active_connections":5}"#,
        );
        assert_eq!(
            render_footer(Profile::Streams, &s),
            "30 watching · 4 streams · 2 pending · 9 users · 5 online"
        );
    }

    #[test]
    fn test_empty_snapshot_renders_nothing() {
        assert_eq!(render_footer(Profile::Videos, &StatsSnapshot::default()), "");
    }
}
