use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, SessionSettings};
use crate::dataset::{Example, ExampleDraft, ExampleStore, SelectionCounts, ToggleOutcome};
use crate::gateway::{
    ComparisonResult, HttpGateway, ModelHistory, ModelVisualization, TrainingGateway,
    TrainingStep,
};

use super::SessionError;
use super::history::{HistoryNavigator, StepDirection};
use super::jobs::{SessionJobs, SyncReason};
use super::notifications::{NotificationLog, StatusTone};
use super::state::{ModelStatus, SessionEvent, TrainingMode, TrainingProgress, TrainingResult};
use super::validation::{ValidationError, validate_training};
use super::workers::TrainingJob;

/// Owns the session state and drives every server interaction.
///
/// Actions return `Err` only for synchronous rejections. Completions of
/// background work arrive through [`poll_background_jobs`](Self::poll_background_jobs)
/// and are queued as [`SessionEvent`]s.
pub struct SessionController {
    pub(super) settings: SessionSettings,
    pub(super) store: ExampleStore,
    pub(super) history: HistoryNavigator,
    pub(super) model_status: Option<ModelStatus>,
    pub(super) training_result: Option<TrainingResult>,
    pub(super) visualization: ModelVisualization,
    pub(super) hypothesis: Option<String>,
    pub(super) training_steps: Vec<TrainingStep>,
    pub(super) last_comparison: Option<ComparisonResult>,
    pub(super) progress: Option<TrainingProgress>,
    pub(super) notifications: NotificationLog,
    pub(super) events: Vec<SessionEvent>,
    pub(super) jobs: SessionJobs,
}

impl SessionController {
    pub fn new(gateway: Arc<dyn TrainingGateway>, settings: SessionSettings) -> Self {
        let notifications = NotificationLog::new(settings.notifications.max_log);
        Self {
            settings,
            store: ExampleStore::new(),
            history: HistoryNavigator::new(),
            model_status: None,
            training_result: None,
            visualization: ModelVisualization::default(),
            hypothesis: None,
            training_steps: Vec::new(),
            last_comparison: None,
            progress: None,
            notifications,
            events: Vec::new(),
            jobs: SessionJobs::new(gateway),
        }
    }

    /// Talk to the HTTP service described by `settings`.
    pub fn connect(settings: SessionSettings) -> Result<Self, SessionError> {
        let gateway = HttpGateway::new(&settings.server)?;
        tracing::info!("Training service at {}", gateway.root());
        Ok(Self::new(Arc::new(gateway), settings))
    }

    /// Load settings from the config file (or defaults) and connect.
    pub fn from_config() -> Result<Self, SessionError> {
        let settings = config::load_or_default()?;
        Self::connect(settings)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn examples(&self) -> &[Example] {
        self.store.examples()
    }

    pub fn selected_counts(&self) -> SelectionCounts {
        self.store.selected_counts()
    }

    pub fn history(&self) -> ModelHistory {
        self.history.snapshot()
    }

    pub fn can_step_back(&self) -> bool {
        !self.is_busy() && self.history.can_step_back()
    }

    pub fn can_step_forward(&self) -> bool {
        !self.is_busy() && self.history.can_step_forward()
    }

    pub fn model_status(&self) -> Option<&ModelStatus> {
        self.model_status.as_ref()
    }

    pub fn training_result(&self) -> Option<&TrainingResult> {
        self.training_result.as_ref()
    }

    pub fn visualization(&self) -> &ModelVisualization {
        &self.visualization
    }

    pub fn hypothesis(&self) -> Option<&str> {
        self.hypothesis.as_deref()
    }

    pub fn training_steps(&self) -> &[TrainingStep] {
        &self.training_steps
    }

    pub fn last_comparison(&self) -> Option<&ComparisonResult> {
        self.last_comparison.as_ref()
    }

    pub fn progress(&self) -> Option<&TrainingProgress> {
        self.progress.as_ref()
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    /// Drain completed background operations, oldest first.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_training(&self) -> bool {
        self.jobs.training_in_progress()
    }

    pub fn is_updating_model(&self) -> bool {
        self.jobs.updating_model_in_progress()
    }

    pub fn is_comparing(&self) -> bool {
        self.jobs.compare_in_progress()
    }

    /// True while training or a model update is in flight.
    pub fn is_busy(&self) -> bool {
        self.jobs.busy()
    }

    pub fn toggle_selection(&mut self, local_id: usize, explicit: Option<bool>) -> ToggleOutcome {
        let outcome = self.store.toggle_selection(local_id, explicit);
        if outcome == ToggleOutcome::Locked {
            self.notify(
                "This example is already used in the current model and cannot be deselected",
                StatusTone::Info,
            );
        }
        outcome
    }

    pub fn select_all(&mut self, value: bool) {
        self.store.select_all(value);
    }

    /// Replace the example list and sync its flags with the server.
    pub fn load_examples(
        &mut self,
        drafts: impl IntoIterator<Item = ExampleDraft>,
    ) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.store.replace(drafts);
        tracing::info!("Loaded {} examples", self.store.len());
        self.jobs.begin_sync(SyncReason::Load, Duration::ZERO);
        Ok(())
    }

    /// Re-read dataset flags, model status and history for the current list.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.jobs.begin_sync(SyncReason::Refresh, Duration::ZERO);
        Ok(())
    }

    /// Drop the local list and model views. The server is left alone.
    pub fn return_to_upload(&mut self) {
        self.store.clear();
        self.training_result = None;
        self.model_status = None;
        self.visualization = ModelVisualization::default();
        self.hypothesis = None;
        self.training_steps.clear();
        self.progress = None;
    }

    pub fn train(&mut self, retrain_all: bool) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let mode = TrainingMode::from_retrain_all(retrain_all);
        let selection = match validate_training(&self.store, self.model_status.as_ref(), mode) {
            Ok(selection) => selection,
            Err(err) => return Err(self.reject(err)),
        };
        tracing::info!(
            "Starting {} training with {} selected examples",
            mode.label(),
            selection.len()
        );
        self.jobs.begin_training(TrainingJob {
            selection,
            mode,
            matcher: self.settings.matching.formula,
            upload_settle: self.settings.timing.upload_settle(),
        });
        Ok(())
    }

    pub fn step_back(&mut self) -> Result<(), SessionError> {
        self.step(StepDirection::Back)
    }

    pub fn step_forward(&mut self) -> Result<(), SessionError> {
        self.step(StepDirection::Forward)
    }

    /// Reset the server model; local state is cleared once the server confirms.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        tracing::info!("Resetting model");
        self.jobs.begin_reset();
        Ok(())
    }

    /// Ask the server whether `formula` is covered by the current model.
    pub fn compare_example(&mut self, formula: &str) -> Result<(), SessionError> {
        if self.jobs.compare_in_progress() {
            return Err(SessionError::Busy);
        }
        let formula = formula.trim();
        if formula.is_empty() {
            return Err(self.reject(ValidationError::EmptyFormula));
        }
        self.jobs.begin_compare(formula.to_string());
        Ok(())
    }

    fn step(&mut self, direction: StepDirection) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if !self.history.can_step(direction) {
            let err = match direction {
                StepDirection::Back => ValidationError::NoEarlierModel,
                StepDirection::Forward => ValidationError::NoLaterModel,
            };
            return Err(self.reject(err));
        }
        tracing::info!("Stepping {} in model history", direction.label());
        self.jobs.begin_history_step(direction);
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.jobs.busy() {
            tracing::debug!("Refusing action while another operation runs");
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn reject(&mut self, err: ValidationError) -> SessionError {
        self.notify(err.to_string(), StatusTone::Warning);
        SessionError::Validation(err)
    }

    pub(super) fn notify(&mut self, text: impl Into<String>, tone: StatusTone) {
        let text = text.into();
        match tone {
            StatusTone::Error => tracing::error!("{text}"),
            StatusTone::Warning => tracing::warn!("{text}"),
            StatusTone::Info | StatusTone::Success => tracing::info!("{text}"),
        }
        self.notifications.push(text, tone);
    }
}
