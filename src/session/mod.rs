//! Training session orchestration: selection, the multi-step training
//! protocol, history navigation and reconciliation with the server.
//!
//! All state lives on the [`SessionController`]; network work runs on worker
//! threads and is applied back in [`SessionController::poll_background_jobs`].

mod background_jobs;
mod controller;
pub mod history;
mod jobs;
mod notifications;
mod state;
mod validation;
mod workers;

pub use controller::SessionController;
pub use history::{HistoryNavigator, ModelHistory, StepDirection};
pub use notifications::{Notification, NotificationLog, StatusTone};
pub use state::{
    ModelStatus, SessionEvent, SyncReport, TrainingMode, TrainingProgress, TrainingResult,
};
pub use validation::ValidationError;

use crate::config::ConfigError;
use crate::dataset::ResolutionError;
use crate::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Another training or model update is still running")]
    Busy,
    #[error("{}", upload_failure(.0))]
    Upload(GatewayError),
    #[error("{}", gateway_failure(.0))]
    Gateway(GatewayError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn upload_failure(err: &GatewayError) -> String {
    match err.server_message() {
        Some(message) => message.to_string(),
        None => format!("Dataset upload failed: {err}"),
    }
}

fn gateway_failure(err: &GatewayError) -> String {
    match err.server_message() {
        Some(message) => message.to_string(),
        None => err.to_string(),
    }
}
