use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::platform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Which hub front-end this client talks to. The two deployments expose
/// different counters and react differently to live events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Video hosting: uploads, likes, `new_video` notices.
    #[default]
    Videos,
    /// Live-stream directory: favorites, moderation broadcasts.
    Streams,
}

/// What to do when a live event announces new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Log a notice; leave displayed data alone.
    Notify,
    /// Re-fetch everything on display.
    Reload,
}

impl Profile {
    pub fn default_refresh_policy(self) -> RefreshPolicy {
        match self {
            Profile::Videos => RefreshPolicy::Notify,
            Profile::Streams => RefreshPolicy::Reload,
        }
    }

    /// Live message kinds that trigger the refresh policy.
    pub fn refresh_kinds(self) -> &'static [&'static str] {
        match self {
            Profile::Videos => &["new_video", "video_published"],
            Profile::Streams => &["stream_approved", "featured_changed", "new_stream"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub profile: Profile,
    /// Raw `Cookie` header value carrying the hub session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay after every close, forever.
    #[default]
    Fixed,
    /// Doubling delay with jitter, capped at `max_backoff_secs`.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_live_path")]
    pub path: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default)]
    pub backoff: BackoffKind,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Overrides the profile's refresh policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_policy: Option<RefreshPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overall upload timeout; 0 disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            profile: Profile::default(),
            session_cookie: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            path: default_live_path(),
            heartbeat_secs: default_heartbeat_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            backoff: BackoffKind::default(),
            max_backoff_secs: default_max_backoff_secs(),
            refresh_policy: None,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_types: default_allowed_types(),
            chunk_size: default_chunk_size(),
            timeout_secs: 0,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("hubclient/{}", env!("CARGO_PKG_VERSION"))
}

fn default_live_path() -> String {
    "/ws".to_string()
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_max_size_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    [
        "video/mp4",
        "video/webm",
        "video/ogg",
        "video/quicktime",
        "video/x-matroska",
        "video/x-msvideo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_chunk_size() -> usize {
    64 * 1024
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Floor for every configured period; `0` would stall or spin the timers.
fn at_least_one_sec(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

impl LiveConfig {
    pub fn heartbeat(&self) -> Duration {
        at_least_one_sec(self.heartbeat_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        at_least_one_sec(self.reconnect_delay_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        at_least_one_sec(self.max_backoff_secs).max(self.reconnect_delay())
    }
}

impl StatsConfig {
    pub fn poll_interval(&self) -> Duration {
        at_least_one_sec(self.poll_interval_secs)
    }
}

impl UploadConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing the defaults there first if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            debug!("wrote default config to {:?}", path);
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// The refresh policy in effect: explicit override, else the profile's.
    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.live
            .refresh_policy
            .unwrap_or_else(|| self.hub.profile.default_refresh_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hub.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.hub.profile, Profile::Videos);
        assert_eq!(config.live.path, "/ws");
        assert_eq!(config.live.heartbeat(), Duration::from_secs(30));
        assert_eq!(config.live.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.live.backoff, BackoffKind::Fixed);
        assert_eq!(config.stats.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.upload.max_size_bytes, 524_288_000);
        assert_eq!(config.upload.allowed_types.len(), 6);
        assert_eq!(config.upload.timeout(), None);
    }

    #[test]
    fn test_refresh_policy_follows_profile() {
        let mut config = Config::default();
        assert_eq!(config.refresh_policy(), RefreshPolicy::Notify);

        config.hub.profile = Profile::Streams;
        assert_eq!(config.refresh_policy(), RefreshPolicy::Reload);

        config.live.refresh_policy = Some(RefreshPolicy::Notify);
        assert_eq!(config.refresh_policy(), RefreshPolicy::Notify);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [hub]
            base_url = "https://hub.example"
            profile = "streams"

            [live]
            backoff = "exponential"
            "#,
        )
        .unwrap();
        assert_eq!(config.hub.base_url, "https://hub.example");
        assert_eq!(config.hub.profile, Profile::Streams);
        assert_eq!(config.live.backoff, BackoffKind::Exponential);
        assert_eq!(config.live.heartbeat_secs, 30);
        assert_eq!(config.upload, UploadConfig::default());
    }

    #[test]
    fn test_load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());

        let mut edited = config.clone();
        edited.hub.session_cookie = Some("session=abc".to_string());
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), edited);
    }

    #[test]
    fn test_zero_periods_are_clamped() {
        let config: Config = toml::from_str(
            r#"
            [live]
            heartbeat_secs = 0
            reconnect_delay_secs = 0
            max_backoff_secs = 0

            [stats]
            poll_interval_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.live.heartbeat(), Duration::from_secs(1));
        assert_eq!(config.live.reconnect_delay(), Duration::from_secs(1));
        assert_eq!(config.live.max_backoff(), Duration::from_secs(1));
        assert_eq!(config.stats.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hub\nbase_url = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(
            format!("{}", err).contains("config.toml"),
            "missing path in: {:#}",
            err
        );
    }
}
