//! Thin boundary to the remote training service.
//!
//! Every call returns a normalized payload or a [`GatewayError`]; a 2xx reply
//! whose body says `success: false` is surfaced as [`GatewayError::Rejected`]
//! so callers never have to inspect success flags themselves.

pub mod api;
mod wire;

pub use api::HttpGateway;
pub use wire::{
    AckResponse, CompareRequest, ComparisonResult, DatasetResponse, HistoryStepResponse,
    LabelCounts, ModelHistory, ModelInfoResponse, ModelStatusResponse, ModelVisualization,
    NetworkLink, NetworkNode, ServerExample, TrainRequest, TrainResponse, TrainingStep,
    UploadExample,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Server returned HTTP {code}: {message}")]
    Status { code: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The message a server put in its reply, when there was one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } if !message.is_empty() => Some(message),
            Self::Rejected(message) if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Operations the session needs from the training service.
///
/// Implementations are shared with background workers, hence `Send + Sync`.
pub trait TrainingGateway: Send + Sync {
    fn fetch_model_status(&self) -> Result<ModelStatusResponse, GatewayError>;

    fn fetch_dataset(&self) -> Result<Vec<ServerExample>, GatewayError>;

    fn upload_dataset(&self, examples: &[UploadExample]) -> Result<AckResponse, GatewayError>;

    fn train(&self, request: &TrainRequest) -> Result<TrainResponse, GatewayError>;

    fn reset(&self) -> Result<AckResponse, GatewayError>;

    fn step_back(&self) -> Result<HistoryStepResponse, GatewayError>;

    fn step_forward(&self) -> Result<HistoryStepResponse, GatewayError>;

    fn fetch_model_info(&self) -> Result<ModelInfoResponse, GatewayError>;

    fn compare_example(&self, request: &CompareRequest) -> Result<ComparisonResult, GatewayError>;
}
