pub mod header;
pub mod log_panel;
pub mod notifications;
pub mod upload_panel;
