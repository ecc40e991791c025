// Presentation layer - Session scripts and event output
pub mod app_state;
pub mod event_log;
pub mod handlers;
pub mod session_script;
