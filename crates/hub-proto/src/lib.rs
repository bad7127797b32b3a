//! Shared types for the hub client: wire protocol, configuration, platform
//! paths and the small formatting helpers every front-end needs.

pub mod config;
pub mod format;
pub mod media;
pub mod platform;
pub mod protocol;
