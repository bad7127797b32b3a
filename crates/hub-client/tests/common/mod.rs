//! In-process fake hub for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Form, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hub_client::event::{ClientEvent, EventReceiver};
use hub_proto::config::Config;
use serde_json::json;
use tokio::task::JoinHandle;

/// How the fake hub misbehaves.
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    /// Answer uploads with this status and an empty body.
    pub upload_status: Option<u16>,
    /// Answer uploads with 200 and this raw body.
    pub upload_body: Option<String>,
    pub like_unauthorized: bool,
    pub comment_unauthorized: bool,
    /// Close every websocket this long after accepting it.
    pub close_ws_after: Option<Duration>,
    pub reply_pong: bool,
    /// Text frame pushed right after a websocket connects.
    pub push_on_connect: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadRecord {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: usize,
    pub title: String,
    pub description: String,
    pub tags: String,
}

#[derive(Default)]
pub struct HubState {
    pub behaviour: Behaviour,
    pub ws_connections: AtomicUsize,
    pub pings: AtomicUsize,
    pub uploads: AtomicUsize,
    pub likes: AtomicUsize,
    pub stats: AtomicUsize,
    pub connect_times: Mutex<Vec<Instant>>,
    pub last_upload: Mutex<Option<UploadRecord>>,
    /// `(stream id, comment)` in arrival order.
    pub comments: Mutex<Vec<(String, String)>>,
    liked: Mutex<HashMap<String, bool>>,
}

pub struct FakeHub {
    pub addr: SocketAddr,
    pub state: Arc<HubState>,
    task: JoinHandle<()>,
}

impl Drop for FakeHub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FakeHub {
    pub async fn start(behaviour: Behaviour) -> Self {
        let state = Arc::new(HubState {
            behaviour,
            ..HubState::default()
        });

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .route("/api/stats", get(stats_handler))
            .route("/api/like/:id", post(like_handler))
            .route("/stream/:id/favorite", post(favorite_handler))
            .route("/stream/:id/comment", post(comment_handler))
            .route("/stream/:id", get(stream_page_handler))
            .route("/api/upload", post(upload_handler))
            .route("/health", get(health_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.hub.base_url = self.base_url();
        config
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<HubState>>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: Arc<HubState>) {
    state.ws_connections.fetch_add(1, Ordering::SeqCst);
    state.connect_times.lock().unwrap().push(Instant::now());

    if let Some(text) = state.behaviour.push_on_connect.clone() {
        let _ = socket.send(Message::Text(text)).await;
    }

    let deadline = state
        .behaviour
        .close_ws_after
        .map(|d| tokio::time::Instant::now() + d);

    loop {
        let frame = match deadline {
            Some(at) => tokio::time::timeout_at(at, socket.recv()).await.ok(),
            None => Some(socket.recv().await),
        };
        match frame {
            // deadline passed
            None => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            Some(Some(Ok(Message::Text(text)))) => {
                if text.contains("\"ping\"") {
                    state.pings.fetch_add(1, Ordering::SeqCst);
                    if state.behaviour.reply_pong {
                        let pong = json!({"type": "pong", "connections": 1}).to_string();
                        let _ = socket.send(Message::Text(pong)).await;
                    }
                }
            }
            Some(Some(Ok(Message::Close(_)))) | Some(Some(Err(_))) | Some(None) => return,
            Some(Some(Ok(_))) => {}
        }
    }
}

async fn stats_handler(State(state): State<Arc<HubState>>) -> Json<serde_json::Value> {
    state.stats.fetch_add(1, Ordering::SeqCst);
    Json(json!({"videos": 12, "users": 3, "views": 1500, "active": 2}))
}

async fn like_handler(Path(id): Path<String>, State(state): State<Arc<HubState>>) -> Response {
    state.likes.fetch_add(1, Ordering::SeqCst);
    if state.behaviour.like_unauthorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut liked = state.liked.lock().unwrap();
    let now_liked = !liked.get(&id).copied().unwrap_or(false);
    liked.insert(id, now_liked);
    let (action, likes) = if now_liked { ("liked", 5) } else { ("unliked", 4) };
    Json(json!({"action": action, "likes": likes})).into_response()
}

async fn favorite_handler(Path(_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({"status": "success", "action": "added"}))
}

async fn comment_handler(
    Path(id): Path<String>,
    State(state): State<Arc<HubState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if state.behaviour.comment_unauthorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let text = form.get("comment").cloned().unwrap_or_default();
    state.comments.lock().unwrap().push((id.clone(), text));
    Redirect::to(&format!("/stream/{}", id)).into_response()
}

async fn stream_page_handler(Path(id): Path<String>) -> String {
    format!("stream {}", id)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": "test"}))
}

async fn upload_handler(State(state): State<Arc<HubState>>, mut multipart: Multipart) -> Response {
    state.uploads.fetch_add(1, Ordering::SeqCst);

    let mut record = UploadRecord::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                record.file_name = field.file_name().map(str::to_string);
                record.content_type = field.content_type().map(str::to_string);
                record.bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
            "title" => record.title = field.text().await.unwrap_or_default(),
            "description" => record.description = field.text().await.unwrap_or_default(),
            "tags" => record.tags = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }
    *state.last_upload.lock().unwrap() = Some(record);

    if let Some(code) = state.behaviour.upload_status {
        let status = StatusCode::from_u16(code).unwrap();
        return status.into_response();
    }
    if let Some(body) = state.behaviour.upload_body.clone() {
        return (StatusCode::OK, body).into_response();
    }
    Json(json!({"video_id": 42})).into_response()
}

/// Wait for the first event matching `pred`, up to `within`.
pub async fn wait_for<F>(rx: &mut EventReceiver, within: Duration, mut pred: F) -> Option<ClientEvent>
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(within, async {
        while let Some(ev) = rx.recv().await {
            if pred(&ev) {
                return Some(ev);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Everything currently queued on `rx`.
pub fn drain(rx: &mut EventReceiver) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}
