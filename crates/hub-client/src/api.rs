//! HTTP client for the hub's JSON endpoints.

use std::time::Duration;

use futures_util::StreamExt;
use hub_proto::config::Config;
use hub_proto::protocol::{
    FavoriteResponse, HealthResponse, LikeResponse, ResourceId, StatsSnapshot, UploadResponse,
};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ApiError;
use crate::upload::{UploadProgress, UploadRequest};

#[derive(Debug, Clone)]
pub struct HubApi {
    client: reqwest::Client,
    base: Url,
    cookie: Option<String>,
    timeout: Duration,
    upload_timeout: Option<Duration>,
    chunk_size: usize,
}

impl HubApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut base = Url::parse(&config.hub.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.hub.base_url, e)))?;
        // Endpoints are joined relative to the base, so keep a trailing slash
        // to preserve any path prefix the hub is mounted under.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.hub.session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|_| ApiError::InvalidCookie)?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .connect_timeout(config.http.connect_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            cookie: config.hub.session_cookie.clone(),
            timeout: config.http.timeout(),
            upload_timeout: config.upload.timeout(),
            chunk_size: config.upload.chunk_size.max(1024),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Session cookie, for transports that do not go through `reqwest`.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// `ws://` / `wss://` form of `path` on the hub.
    pub fn live_url(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ApiError::InvalidUrl(format!("cannot use {} for websockets", url)))?;
        Ok(url)
    }

    pub fn watch_url(&self, video_id: &ResourceId) -> String {
        self.endpoint(&format!("watch/{}", video_id))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("/watch/{}", video_id))
    }

    pub fn login_url(&self) -> String {
        self.endpoint("login")
            .map(|u| u.to_string())
            .unwrap_or_else(|_| "/login".to_string())
    }

    pub async fn stats(&self) -> Result<StatsSnapshot, ApiError> {
        let response = self
            .client
            .get(self.endpoint("api/stats")?)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn like(&self, video_id: &ResourceId) -> Result<LikeResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("api/like/{}", video_id))?)
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn favorite(&self, stream_id: &ResourceId) -> Result<FavoriteResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("stream/{}/favorite", stream_id))?)
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(response).await
    }

    /// Form post of one comment. The hub answers with a redirect back to the
    /// stream page, so only the status matters.
    pub async fn comment(&self, stream_id: &ResourceId, text: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(&format!("stream/{}/comment", stream_id))?)
            .form(&[("comment", text)])
            .timeout(self.timeout)
            .send()
            .await?;
        check_status(response.status())
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint("health")?)
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(response).await
    }

    /// Multipart upload of `request`. The file is streamed from disk and
    /// `on_progress` sees the running byte count after every chunk.
    pub async fn upload<F>(
        &self,
        request: &UploadRequest,
        mut on_progress: F,
    ) -> Result<UploadResponse, ApiError>
    where
        F: FnMut(UploadProgress) + Send + Sync + 'static,
    {
        let file = tokio::fs::File::open(&request.path).await?;
        let total = file.metadata().await?.len();

        let mut loaded = 0u64;
        let stream = ReaderStream::with_capacity(file, self.chunk_size).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                loaded += bytes.len() as u64;
                on_progress(UploadProgress {
                    loaded,
                    total: Some(total),
                });
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(request.file_name.clone())
            .mime_str(&request.media_type)?;
        let form = Form::new()
            .part("video", part)
            .text("title", request.title.clone())
            .text("description", request.description.clone())
            .text("tags", request.tags.clone());

        debug!(
            "uploading {} ({} bytes) as {:?}",
            request.file_name, total, request.title
        );

        let mut builder = self.client.post(self.endpoint("api/upload")?).multipart(form);
        if let Some(timeout) = self.upload_timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await?;
        read_json(response).await
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("error").to_string(),
        });
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    check_status(response.status())?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HubApi {
        let mut config = Config::default();
        config.hub.base_url = base.to_string();
        HubApi::new(&config).unwrap()
    }

    #[test]
    fn test_endpoints_keep_path_prefix() {
        let api = api("https://example.com/hub");
        assert_eq!(
            api.endpoint("/api/stats").unwrap().as_str(),
            "https://example.com/hub/api/stats"
        );
        assert_eq!(api.login_url(), "https://example.com/hub/login");
        assert_eq!(
            api.watch_url(&ResourceId::from("abc")),
            "https://example.com/hub/watch/abc"
        );
    }

    #[test]
    fn test_live_url_scheme() {
        assert_eq!(
            api("http://127.0.0.1:8000").live_url("/ws").unwrap().as_str(),
            "ws://127.0.0.1:8000/ws"
        );
        assert_eq!(
            api("https://hub.example").live_url("/ws").unwrap().as_str(),
            "wss://hub.example/ws"
        );
    }

    #[test]
    fn test_rejects_bad_base_url_and_cookie() {
        let mut config = Config::default();
        config.hub.base_url = "not a url".to_string();
        assert!(matches!(HubApi::new(&config), Err(ApiError::InvalidUrl(_))));

        let mut config = Config::default();
        config.hub.session_cookie = Some("bad\ncookie".to_string());
        assert!(matches!(HubApi::new(&config), Err(ApiError::InvalidCookie)));
    }
}
