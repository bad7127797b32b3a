//! Upload flow: pick a file, fill in metadata, submit, watch progress.
//!
//! [`UploadFlow`] is a plain state machine owned by the session. It never
//! touches the network; [`PendingUpload`] carries the request it hands out
//! and reports back through [`ClientEvent`]s.
//!
//! ```text
//! Idle ──select──▶ Selected ──begin_submit──▶ Submitting ──finish──▶ Succeeded
//!  ▲                                              │
//!  └───────────────── failed (full reset) ◀───────┘
//! ```

mod candidate;

pub use candidate::{title_from_filename, UploadCandidate, UploadRules};

use std::path::PathBuf;

use hub_proto::format::fmt_size;
use hub_proto::protocol::{ResourceId, UploadResponse};
use reqwest::Url;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::HubApi;
use crate::error::ApiError;
use crate::event::{ClientEvent, EventSender};

/// Validation failures. The `Display` text is what the user is shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please select a video file (MP4, WebM, OGG, MOV)")]
    UnsupportedType,
    #[error("File too large. Maximum size is {max_mb}MB.")]
    TooLarge { max_mb: u64 },
    #[error("Please enter a title")]
    MissingTitle,
    #[error("No file selected")]
    NothingSelected,
    #[error("An upload is already in progress")]
    Busy,
    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected,
    Submitting,
    Succeeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Tags,
}

/// Local handle to the selected file for previewing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub url: String,
}

/// Everything a front-end needs to draw the upload panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub dropzone_visible: bool,
    /// The "drop a file here" prompt inside the dropzone.
    pub dropzone_content_visible: bool,
    pub form_visible: bool,
    pub actions_visible: bool,
    pub progress_visible: bool,
    pub success_visible: bool,
    pub progress_filename: String,
    pub progress_percent: u8,
    pub progress_size: String,
    pub submit_enabled: bool,
    pub file_input: Option<PathBuf>,
    pub preview: Option<Preview>,
    pub watch_link: Option<String>,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub focus: Option<FormField>,
}

impl Default for UploadView {
    fn default() -> Self {
        Self {
            dropzone_visible: true,
            dropzone_content_visible: true,
            form_visible: false,
            actions_visible: false,
            progress_visible: false,
            success_visible: false,
            progress_filename: String::new(),
            progress_percent: 0,
            progress_size: String::new(),
            submit_enabled: true,
            file_input: None,
            preview: None,
            watch_link: None,
            title: String::new(),
            description: String::new(),
            tags: String::new(),
            focus: None,
        }
    }
}

impl UploadView {
    pub fn progress_ratio(&self) -> f64 {
        f64::from(self.progress_percent) / 100.0
    }
}

/// What gets sent to `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub file_name: String,
    pub media_type: String,
    pub size: u64,
    pub title: String,
    pub description: String,
    pub tags: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    /// `None` (or zero) when the length is not computable.
    pub total: Option<u64>,
}

impl UploadProgress {
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let pct = (self.loaded as f64 / total as f64 * 100.0).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

/// How the upload request ended, before the flow interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Created {
        video_id: ResourceId,
        watch_url: String,
    },
    /// 2xx with a body we could not read.
    Unparseable,
    /// Non-2xx; `status_text` is the HTTP reason phrase.
    Rejected { status_text: String },
    TransportFailed { reason: String },
}

impl SubmitResult {
    pub fn from_api(result: Result<UploadResponse, ApiError>, api: &HubApi) -> Self {
        match result {
            Ok(response) => Self::Created {
                watch_url: api.watch_url(&response.video_id),
                video_id: response.video_id,
            },
            Err(ApiError::Decode(e)) => {
                warn!("[upload] unreadable response: {}", e);
                Self::Unparseable
            }
            Err(ApiError::Status { code, reason }) => {
                warn!("[upload] rejected with {}", code);
                Self::Rejected {
                    status_text: reason,
                }
            }
            Err(ApiError::Unauthorized) => Self::Rejected {
                status_text: "Unauthorized".to_string(),
            },
            Err(e) => {
                warn!("[upload] request failed: {}", e);
                Self::TransportFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded {
        video_id: Option<ResourceId>,
        watch_url: Option<String>,
    },
    Failed {
        reason: String,
    },
}

/// Result of [`UploadFlow::finish`]: the outcome plus an alert to show, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishReport {
    pub outcome: UploadOutcome,
    pub alert: Option<String>,
}

pub struct UploadFlow {
    rules: UploadRules,
    phase: UploadPhase,
    selected: Option<UploadCandidate>,
    view: UploadView,
}

impl UploadFlow {
    pub fn new(rules: UploadRules) -> Self {
        Self {
            rules,
            phase: UploadPhase::Idle,
            selected: None,
            view: UploadView::default(),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn view(&self) -> &UploadView {
        &self.view
    }

    pub fn selected(&self) -> Option<&UploadCandidate> {
        self.selected.as_ref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.view.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.view.description = description.into();
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.view.tags = tags.into();
    }

    /// Accept `candidate` if it passes the rules. A rejected file leaves the
    /// flow exactly as it was.
    pub fn select(&mut self, candidate: UploadCandidate) -> Result<(), UploadError> {
        if self.phase == UploadPhase::Submitting {
            return Err(UploadError::Busy);
        }
        self.rules.validate(&candidate)?;
        if self.phase == UploadPhase::Succeeded {
            self.reset();
        }

        if self.view.title.is_empty() {
            self.view.title = title_from_filename(&candidate.name);
        }
        self.view.dropzone_content_visible = false;
        self.view.form_visible = true;
        self.view.actions_visible = true;
        self.view.file_input = Some(candidate.path.clone());
        self.view.preview = Url::from_file_path(&candidate.path)
            .ok()
            .map(|u| Preview { url: u.to_string() });

        info!("[upload] selected {} ({})", candidate.name, fmt_size(candidate.size));
        self.selected = Some(candidate);
        self.phase = UploadPhase::Selected;
        Ok(())
    }

    /// Freeze the form into a request and switch to the progress view.
    pub fn begin_submit(&mut self) -> Result<UploadRequest, UploadError> {
        match self.phase {
            UploadPhase::Selected => {}
            UploadPhase::Submitting => return Err(UploadError::Busy),
            UploadPhase::Idle | UploadPhase::Succeeded => return Err(UploadError::NothingSelected),
        }
        let candidate = self.selected.as_ref().ok_or(UploadError::NothingSelected)?;

        let title = self.view.title.trim();
        if title.is_empty() {
            self.view.focus = Some(FormField::Title);
            return Err(UploadError::MissingTitle);
        }

        let request = UploadRequest {
            path: candidate.path.clone(),
            file_name: candidate.name.clone(),
            media_type: candidate
                .media_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: candidate.size,
            title: title.to_string(),
            description: self.view.description.trim().to_string(),
            tags: self.view.tags.trim().to_string(),
        };

        self.view.submit_enabled = false;
        self.view.dropzone_visible = false;
        self.view.form_visible = false;
        self.view.actions_visible = false;
        self.view.progress_visible = true;
        self.view.progress_filename = candidate.name.clone();
        self.view.progress_percent = 0;
        self.view.progress_size.clear();
        self.view.focus = None;
        self.phase = UploadPhase::Submitting;
        info!("[upload] submitting {:?}", request.title);
        Ok(request)
    }

    /// Progress is ignored outside `Submitting` and while the total is unknown.
    pub fn on_progress(&mut self, progress: UploadProgress) {
        if self.phase != UploadPhase::Submitting {
            return;
        }
        let (Some(percent), Some(total)) = (progress.percent(), progress.total) else {
            return;
        };
        self.view.progress_percent = percent;
        self.view.progress_size = format!("{} / {}", fmt_size(progress.loaded), fmt_size(total));
    }

    /// Apply the result of the in-flight request. `None` if nothing was in flight.
    pub fn finish(&mut self, result: SubmitResult) -> Option<FinishReport> {
        if self.phase != UploadPhase::Submitting {
            warn!("[upload] result arrived with no upload in flight");
            return None;
        }

        let report = match result {
            SubmitResult::Created {
                video_id,
                watch_url,
            } => {
                info!("[upload] created video {}", video_id);
                self.succeed(Some(watch_url.clone()));
                FinishReport {
                    outcome: UploadOutcome::Succeeded {
                        video_id: Some(video_id),
                        watch_url: Some(watch_url),
                    },
                    alert: None,
                }
            }
            SubmitResult::Unparseable => {
                self.succeed(None);
                FinishReport {
                    outcome: UploadOutcome::Succeeded {
                        video_id: None,
                        watch_url: None,
                    },
                    alert: Some("Upload completed but response was unexpected".to_string()),
                }
            }
            SubmitResult::Rejected { status_text } => {
                self.reset();
                let alert = format!("Upload failed: {}", status_text);
                FinishReport {
                    outcome: UploadOutcome::Failed {
                        reason: alert.clone(),
                    },
                    alert: Some(alert),
                }
            }
            SubmitResult::TransportFailed { .. } => {
                self.reset();
                let alert = "Upload failed. Please try again.".to_string();
                FinishReport {
                    outcome: UploadOutcome::Failed {
                        reason: alert.clone(),
                    },
                    alert: Some(alert),
                }
            }
        };
        Some(report)
    }

    fn succeed(&mut self, watch_link: Option<String>) {
        self.view.progress_visible = false;
        self.view.success_visible = true;
        self.view.watch_link = watch_link;
        self.selected = None;
        self.phase = UploadPhase::Succeeded;
    }

    /// Back to `Idle` from anywhere. Form text is kept.
    pub fn reset(&mut self) {
        let title = std::mem::take(&mut self.view.title);
        let description = std::mem::take(&mut self.view.description);
        let tags = std::mem::take(&mut self.view.tags);
        self.view = UploadView {
            title,
            description,
            tags,
            ..UploadView::default()
        };
        self.selected = None;
        self.phase = UploadPhase::Idle;
    }
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new(UploadRules::default())
    }
}

/// A request handed out by [`UploadFlow::begin_submit`], ready to send.
pub struct PendingUpload {
    api: HubApi,
    request: UploadRequest,
    events: EventSender,
}

impl PendingUpload {
    pub fn new(api: HubApi, request: UploadRequest, events: EventSender) -> Self {
        Self {
            api,
            request,
            events,
        }
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    /// Send the request, forwarding progress as [`ClientEvent::UploadProgress`].
    pub async fn run(self) -> SubmitResult {
        let progress = self.events.clone();
        let result = self
            .api
            .upload(&self.request, move |p| {
                let _ = progress.send(ClientEvent::UploadProgress(p));
            })
            .await;
        SubmitResult::from_api(result, &self.api)
    }

    /// Run in the background; the result arrives as [`ClientEvent::UploadResponse`].
    pub fn spawn(self) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = self.run().await;
            let _ = events.send(ClientEvent::UploadResponse(result));
        })
    }
}
