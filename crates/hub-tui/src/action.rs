//! Action enum: all user-initiated intents.

use std::path::PathBuf;

use hub_client::upload::FormField;
use hub_proto::protocol::ResourceId;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Upload,
    Notifications,
}

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Upload ───────────────────────────────────────────────────────────────
    SelectFile(PathBuf),
    SetField(FormField, String),
    SubmitUpload,
    ResetUpload,

    // ── Interaction ──────────────────────────────────────────────────────────
    Like(ResourceId),
    Favorite(ResourceId),
    Comment(ResourceId, String),

    // ── UI ───────────────────────────────────────────────────────────────────
    FocusNext,
    OpenCommand,
    /// Editing started or stopped inside a component.
    SetEditing(bool),
    ToggleLogs,
    CopyWatchLink,
    RefreshStats,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
