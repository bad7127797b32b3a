//! `ClientSession` owns every piece of client state a hub page would keep.

use std::path::Path;

use hub_proto::config::Config;
use hub_proto::protocol::{FavoriteAction, ResourceId};
use tracing::{debug, info};

use crate::api::HubApi;
use crate::error::ApiError;
use crate::event::{self, ClientEvent, EventSender};
use crate::interaction::{self, LikeState, ToggleOutcome};
use crate::live::{ConnectionState, LiveChannel, LiveHandle, LiveOptions};
use crate::stats::{StatsHandle, StatsPoller};
use crate::upload::{
    PendingUpload, SubmitResult, UploadCandidate, UploadError, UploadFlow, UploadOutcome,
    UploadProgress, UploadRequest, UploadRules,
};

pub struct ClientSession {
    config: Config,
    api: HubApi,
    events: EventSender,
    live: Option<LiveHandle>,
    stats: Option<StatsHandle>,
    upload: UploadFlow,
    like: Option<(ResourceId, LikeState)>,
}

impl ClientSession {
    pub fn new(config: Config, events: EventSender) -> Result<Self, ApiError> {
        let api = HubApi::new(&config)?;
        let upload = UploadFlow::new(UploadRules::from(&config.upload));
        Ok(Self {
            config,
            api,
            events,
            live: None,
            stats: None,
            upload,
            like: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &HubApi {
        &self.api
    }

    pub fn upload(&self) -> &UploadFlow {
        &self.upload
    }

    /// Last like state the hub reported, with the video it belongs to.
    pub fn like(&self) -> Option<&(ResourceId, LikeState)> {
        self.like.as_ref()
    }

    /// Spawn the stats poller and the live channel. Calling twice is a no-op.
    pub fn start(&mut self) -> Result<(), ApiError> {
        if self.live.is_some() {
            return Ok(());
        }
        let poller = StatsPoller::new(
            self.api.clone(),
            self.config.stats.poll_interval(),
            self.events.clone(),
        );
        let refresh = poller.refresh_trigger();
        let options = LiveOptions::from_config(&self.config, &self.api)?;

        self.stats = Some(poller.spawn());
        self.live = Some(
            LiveChannel::new(options, self.events.clone())
                .with_refresh_trigger(refresh)
                .spawn(),
        );
        info!("session started against {}", self.api.base_url());
        Ok(())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.live
            .as_ref()
            .map(LiveHandle::state)
            .unwrap_or_default()
    }

    pub fn refresh_stats(&self) {
        if let Some(stats) = &self.stats {
            stats.refresh();
        }
    }

    // ── Upload ────────────────────────────────────────────────────────────────

    /// Stat `path` and offer it to the upload flow. `media_type` overrides the
    /// type guessed from the extension.
    pub async fn select_file(
        &mut self,
        path: impl AsRef<Path>,
        media_type: Option<String>,
    ) -> Result<(), UploadError> {
        let candidate = match UploadCandidate::from_path(path).await {
            Ok(c) => c,
            Err(e) => return Err(self.alert(e)),
        };
        let candidate = match media_type {
            Some(t) => candidate.with_media_type(t),
            None => candidate,
        };
        self.select_candidate(candidate)
    }

    pub fn select_candidate(&mut self, candidate: UploadCandidate) -> Result<(), UploadError> {
        self.upload.select(candidate).map_err(|e| self.alert(e))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.upload.set_title(title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.upload.set_description(description);
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.upload.set_tags(tags);
    }

    fn begin_request(&mut self) -> Result<UploadRequest, UploadError> {
        self.upload.begin_submit().map_err(|e| self.alert(e))
    }

    /// Start an upload without waiting for it. Progress and the final
    /// [`ClientEvent::UploadResponse`] arrive on the session's event channel;
    /// feed them back through [`Self::apply_event`].
    pub fn begin_upload(&mut self) -> Result<PendingUpload, UploadError> {
        let request = self.begin_request()?;
        Ok(PendingUpload::new(
            self.api.clone(),
            request,
            self.events.clone(),
        ))
    }

    pub fn apply_upload_progress(&mut self, progress: UploadProgress) {
        self.upload.on_progress(progress);
    }

    /// Hand the request result to the flow and announce the outcome.
    pub fn complete_upload(&mut self, result: SubmitResult) -> Option<UploadOutcome> {
        let report = self.upload.finish(result)?;
        if let Some(alert) = report.alert {
            let _ = self.events.send(ClientEvent::Alert(alert));
        }
        let _ = self
            .events
            .send(ClientEvent::UploadFinished(report.outcome.clone()));
        Some(report.outcome)
    }

    /// Upload and wait for the result, updating progress along the way.
    pub async fn submit_upload(&mut self) -> Result<UploadOutcome, UploadError> {
        let request = self.begin_request()?;
        let (tx, mut rx) = event::channel();
        let run = PendingUpload::new(self.api.clone(), request, tx).run();
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                Some(ev) = rx.recv() => self.forward_progress(ev),
            }
        };
        while let Ok(ev) = rx.try_recv() {
            self.forward_progress(ev);
        }

        self.complete_upload(result)
            .ok_or(UploadError::NothingSelected)
    }

    fn forward_progress(&mut self, ev: ClientEvent) {
        if let ClientEvent::UploadProgress(p) = ev {
            self.upload.on_progress(p);
            let _ = self.events.send(ClientEvent::UploadProgress(p));
        }
    }

    pub fn reset_upload(&mut self) {
        self.upload.reset();
    }

    /// Route events that carry state the session owns. Front-ends call this
    /// for everything they drain from the event channel.
    pub fn apply_event(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::UploadProgress(p) => self.apply_upload_progress(*p),
            ClientEvent::UploadResponse(result) => {
                self.complete_upload(result.clone());
            }
            ClientEvent::Reload => self.refresh_stats(),
            ClientEvent::Like { video_id, state } => {
                self.like = Some((video_id.clone(), *state));
            }
            _ => {}
        }
    }

    // ── Interaction ───────────────────────────────────────────────────────────

    pub async fn toggle_like(&mut self, video_id: ResourceId) -> ToggleOutcome<LikeState> {
        let outcome = interaction::toggle_like(&self.api, &self.events, video_id.clone()).await;
        if let Some(state) = outcome.applied() {
            self.like = Some((video_id, *state));
        }
        outcome
    }

    pub async fn toggle_favorite(
        &mut self,
        stream_id: ResourceId,
    ) -> ToggleOutcome<Option<FavoriteAction>> {
        interaction::toggle_favorite(&self.api, &self.events, stream_id).await
    }

    pub async fn post_comment(&self, stream_id: ResourceId, text: &str) -> ToggleOutcome<()> {
        interaction::post_comment(&self.api, &self.events, stream_id, text).await
    }

    pub fn shutdown(&mut self) {
        if let Some(live) = self.live.take() {
            live.shutdown();
        }
        if let Some(stats) = self.stats.take() {
            stats.shutdown();
        }
        debug!("session shut down");
    }

    fn alert(&self, err: UploadError) -> UploadError {
        let _ = self.events.send(ClientEvent::Alert(err.to_string()));
        err
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
