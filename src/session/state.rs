use std::collections::BTreeMap;

use crate::gateway::{
    ComparisonResult, ModelHistory, ModelStatusResponse, ModelVisualization, TrainResponse,
    TrainingStep,
};

use super::SessionError;
use super::history::StepDirection;

/// Snapshot of the server model as reported by `/model-status`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelStatus {
    pub model_initialized: bool,
    pub used_examples_count: u64,
    pub total_examples_count: u64,
    pub objects_count: u64,
    pub links_count: u64,
    pub positive_examples_count: u64,
    pub negative_examples_count: u64,
}

impl From<ModelStatusResponse> for ModelStatus {
    fn from(response: ModelStatusResponse) -> Self {
        Self {
            model_initialized: response.object_count > 0,
            used_examples_count: response.used_examples,
            total_examples_count: response.total_examples,
            objects_count: response.object_count,
            links_count: response.link_count,
            positive_examples_count: response.positive_examples.used,
            negative_examples_count: response.negative_examples.used,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrainingMode {
    #[default]
    Incremental,
    RetrainAll,
}

impl TrainingMode {
    pub fn from_retrain_all(retrain_all: bool) -> Self {
        if retrain_all {
            Self::RetrainAll
        } else {
            Self::Incremental
        }
    }

    pub fn retrain_all(self) -> bool {
        matches!(self, Self::RetrainAll)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::RetrainAll => "full retrain",
        }
    }
}

/// Outcome of the last training call, kept until the next one or a reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingResult {
    pub success: bool,
    pub message: Option<String>,
    pub model_updated: bool,
    pub model_hypothesis: Option<String>,
    pub model_rules: Option<BTreeMap<String, String>>,
    pub model_visualization: Option<ModelVisualization>,
    pub training_steps: Option<Vec<TrainingStep>>,
    pub used_examples_count: Option<u64>,
    pub total_examples_count: Option<u64>,
    pub training_mode: TrainingMode,
}

impl TrainingResult {
    pub(crate) fn from_response(response: TrainResponse, training_mode: TrainingMode) -> Self {
        Self {
            success: response.success,
            message: response.message,
            model_updated: response.model_updated,
            model_hypothesis: response.model_hypothesis,
            model_rules: response.model_rules,
            model_visualization: response.model_visualization,
            training_steps: response.training_steps,
            used_examples_count: response.used_examples_count,
            total_examples_count: response.total_examples_count,
            training_mode,
        }
    }

    pub(crate) fn failed(message: impl Into<String>, training_mode: TrainingMode) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            model_updated: false,
            training_mode,
            ..Self::default()
        }
    }
}

/// One of the four phases of a training run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingProgress {
    pub step: u8,
    pub total: u8,
    pub detail: String,
}

impl TrainingProgress {
    pub const STEPS: u8 = 4;

    pub(crate) fn new(step: u8, detail: impl Into<String>) -> Self {
        Self {
            step,
            total: Self::STEPS,
            detail: detail.into(),
        }
    }

    pub fn text(&self) -> String {
        format!("{}/{} {}", self.step, self.total, self.detail)
    }
}

/// What a sync pass changed locally. Fetch failures are only logged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub reconciled: usize,
    pub dataset_refreshed: bool,
    pub status_refreshed: bool,
    pub history_refreshed: bool,
}

/// Completion of a background operation.
#[derive(Debug)]
pub enum SessionEvent {
    TrainingFinished(Result<TrainingMode, SessionError>),
    Synced(SyncReport),
    HistoryStepped {
        direction: StepDirection,
        result: Result<ModelHistory, SessionError>,
    },
    ResetFinished(Result<(), SessionError>),
    Compared(Result<ComparisonResult, SessionError>),
}
