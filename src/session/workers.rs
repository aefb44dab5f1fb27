//! Network protocols run on background threads. Each function is sequential
//! and owns nothing but its job description.

use std::thread;
use std::time::Duration;

use crate::dataset::{Example, ExampleKey, FormulaMatch, ServerIndex, resolve_ids};
use crate::gateway::{
    CompareRequest, ComparisonResult, GatewayError, HistoryStepResponse, ModelInfoResponse,
    ModelStatusResponse, ServerExample, TrainRequest, TrainResponse, TrainingGateway,
    UploadExample,
};

use super::SessionError;
use super::history::StepDirection;
use super::state::{TrainingMode, TrainingProgress};

pub(crate) const COMPARE_EXAMPLE_NAME: &str = "Compared example";

#[derive(Clone, Debug)]
pub(crate) struct TrainingJob {
    pub(crate) selection: Vec<Example>,
    pub(crate) mode: TrainingMode,
    pub(crate) matcher: FormulaMatch,
    pub(crate) upload_settle: Duration,
}

#[derive(Debug)]
pub(crate) struct TrainingOutcome {
    pub(crate) response: TrainResponse,
    pub(crate) mode: TrainingMode,
    /// Selected examples the server resolved and trained on.
    pub(crate) submitted: Vec<ExampleKey>,
}

/// Fetches behind every reconciliation; each may fail on its own.
#[derive(Debug)]
pub(crate) struct SyncOutcome {
    pub(crate) dataset: Result<Vec<ServerExample>, GatewayError>,
    pub(crate) status: Result<ModelStatusResponse, GatewayError>,
    pub(crate) info: Result<ModelInfoResponse, GatewayError>,
}

#[derive(Debug)]
pub(crate) struct StepOutcome {
    pub(crate) response: HistoryStepResponse,
    pub(crate) sync: SyncOutcome,
}

#[derive(Debug)]
pub(crate) struct ResetOutcome {
    pub(crate) status: Result<ModelStatusResponse, GatewayError>,
}

/// Upload, settle, resolve ids, train. Stops at the first hard failure.
pub(crate) fn run_training(
    gateway: &dyn TrainingGateway,
    job: &TrainingJob,
    mut report: impl FnMut(TrainingProgress),
) -> Result<TrainingOutcome, SessionError> {
    report(TrainingProgress::new(1, "Uploading dataset…"));
    let upload: Vec<UploadExample> = job
        .selection
        .iter()
        .map(|example| UploadExample {
            formula: example.formula.clone(),
            is_positive: example.is_positive,
            name: example.name.clone(),
        })
        .collect();
    gateway
        .upload_dataset(&upload)
        .map_err(SessionError::Upload)?;
    pause(job.upload_settle);

    report(TrainingProgress::new(2, "Resolving example ids…"));
    let server_examples = gateway.fetch_dataset().map_err(SessionError::Gateway)?;
    let example_ids = resolve_ids(&job.selection, &server_examples, job.matcher)?;
    let index = ServerIndex::new(&server_examples, job.matcher);
    let submitted: Vec<ExampleKey> = job
        .selection
        .iter()
        .map(Example::key)
        .filter(|key| index.lookup_key(key).is_some())
        .collect();

    report(TrainingProgress::new(
        3,
        format!(
            "Training model with {} examples ({})…",
            example_ids.len(),
            job.mode.label()
        ),
    ));
    let response = gateway
        .train(&TrainRequest {
            example_ids,
            retrain_all: job.mode.retrain_all(),
        })
        .map_err(SessionError::Gateway)?;
    Ok(TrainingOutcome {
        response,
        mode: job.mode,
        submitted,
    })
}

pub(crate) fn run_sync(gateway: &dyn TrainingGateway, delay: Duration) -> SyncOutcome {
    pause(delay);
    SyncOutcome {
        dataset: gateway.fetch_dataset(),
        status: gateway.fetch_model_status(),
        info: gateway.fetch_model_info(),
    }
}

pub(crate) fn run_history_step(
    gateway: &dyn TrainingGateway,
    direction: StepDirection,
) -> Result<StepOutcome, GatewayError> {
    let response = match direction {
        StepDirection::Back => gateway.step_back()?,
        StepDirection::Forward => gateway.step_forward()?,
    };
    let sync = run_sync(gateway, Duration::ZERO);
    Ok(StepOutcome { response, sync })
}

pub(crate) fn run_reset(gateway: &dyn TrainingGateway) -> Result<ResetOutcome, GatewayError> {
    gateway.reset()?;
    Ok(ResetOutcome {
        status: gateway.fetch_model_status(),
    })
}

pub(crate) fn run_compare(
    gateway: &dyn TrainingGateway,
    formula: String,
) -> Result<ComparisonResult, GatewayError> {
    gateway.compare_example(&CompareRequest {
        formula,
        is_positive: true,
        name: COMPARE_EXAMPLE_NAME.to_string(),
    })
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
