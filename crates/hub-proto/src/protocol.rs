use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a server-side resource (video, stream).
///
/// The hub hands these out as strings, but older endpoints answer with bare
/// integers, so both forms are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

// ── Live channel ──────────────────────────────────────────────────────────────

/// Messages sent from client to hub over the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat keep-alive.
    Ping,
}

impl ClientMessage {
    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages pushed by the hub over the live channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    NewVideo {
        #[serde(default)]
        video_id: Option<ResourceId>,
        #[serde(default)]
        title: Option<String>,
    },
    VideoPublished {
        #[serde(default)]
        video_id: Option<ResourceId>,
        #[serde(default)]
        title: Option<String>,
    },
    /// Heartbeat reply; `connections` is the hub's live client count.
    Pong {
        #[serde(default)]
        connections: Option<u64>,
    },
    StreamApproved {
        #[serde(default)]
        stream_id: Option<ResourceId>,
    },
    FeaturedChanged {
        #[serde(default)]
        stream_id: Option<ResourceId>,
    },
    /// A stream was submitted for review.
    NewStream {
        #[serde(default)]
        title: Option<String>,
    },
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl LiveMessage {
    /// Decode a text frame. Returns `None` for anything that is not a JSON
    /// object with a string `type` field.
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// The wire name of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewVideo { .. } => "new_video",
            Self::VideoPublished { .. } => "video_published",
            Self::Pong { .. } => "pong",
            Self::StreamApproved { .. } => "stream_approved",
            Self::FeaturedChanged { .. } => "featured_changed",
            Self::NewStream { .. } => "new_stream",
            Self::Unknown => "unknown",
        }
    }

    /// One-line human summary, used for notices and logs.
    pub fn summary(&self) -> String {
        match self {
            Self::NewVideo { title, video_id } | Self::VideoPublished { title, video_id } => {
                let what = if matches!(self, Self::NewVideo { .. }) {
                    "new video"
                } else {
                    "video published"
                };
                match (title, video_id) {
                    (Some(t), _) => format!("{}: {}", what, t),
                    (None, Some(id)) => format!("{} #{}", what, id),
                    (None, None) => what.to_string(),
                }
            }
            Self::Pong { connections } => match connections {
                Some(n) => format!("pong ({} connected)", n),
                None => "pong".to_string(),
            },
            Self::StreamApproved { stream_id } => match stream_id {
                Some(id) => format!("stream #{} approved", id),
                None => "stream approved".to_string(),
            },
            Self::FeaturedChanged { stream_id } => match stream_id {
                Some(id) => format!("featured stream is now #{}", id),
                None => "featured stream changed".to_string(),
            },
            Self::NewStream { title } => match title {
                Some(t) => format!("new stream submitted: {}", t),
                None => "new stream submitted".to_string(),
            },
            Self::Unknown => "unknown message".to_string(),
        }
    }
}

// ── HTTP payloads ─────────────────────────────────────────────────────────────

/// Aggregate counters from `GET /api/stats`.
///
/// The set of counters differs between hub deployments, so the snapshot is a
/// plain name → value map. Non-numeric fields are dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, serde_json::Value>")]
pub struct StatsSnapshot {
    pub counters: BTreeMap<String, f64>,
}

impl From<serde_json::Map<String, serde_json::Value>> for StatsSnapshot {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let counters = map
            .into_iter()
            .filter_map(|(k, v)| v.as_f64().map(|n| (k, n)))
            .collect();
        Self { counters }
    }
}

impl StatsSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.counters.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

/// Response of `POST /api/like/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub action: LikeAction,
    pub likes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Added,
    Removed,
}

/// Response of `POST /stream/{id}/favorite`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub status: String,
    #[serde(default)]
    pub action: Option<FavoriteAction>,
}

impl FavoriteResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub video_id: ResourceId,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}
