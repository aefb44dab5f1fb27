//! Client-side orchestration of an incremental, example-driven model training session.
/// Application directory resolution.
pub mod app_dirs;
/// Persisted session settings.
pub mod config;
/// Local examples, identity resolution and reconciliation.
pub mod dataset;
/// Remote training service boundary.
pub mod gateway;
mod http_client;
/// Tracing setup.
pub mod logging;
/// Session controller and background jobs.
pub mod session;

pub use session::{SessionController, SessionError, SessionEvent};
