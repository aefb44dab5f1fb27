use std::sync::mpsc::TryRecvError;

use crate::gateway::{GatewayError, ModelVisualization};

use super::SessionError;
use super::controller::SessionController;
use super::history::StepDirection;
use super::jobs::{JobMessage, SyncReason};
use super::notifications::StatusTone;
use super::state::{SessionEvent, SyncReport, TrainingMode, TrainingProgress, TrainingResult};
use super::workers::{ResetOutcome, StepOutcome, SyncOutcome, TrainingOutcome};

impl SessionController {
    /// Apply every finished background message. Call from the host event loop.
    pub fn poll_background_jobs(&mut self) {
        loop {
            let message = match self.jobs.try_recv_message() {
                Ok(message) => message,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            match message {
                JobMessage::TrainingProgress(progress) => self.handle_training_progress(progress),
                JobMessage::TrainingFinished { mode, result } => {
                    self.jobs.clear_training();
                    match result {
                        Ok(outcome) => self.handle_training_finished(outcome),
                        Err(err) => self.handle_training_failed(mode, err),
                    }
                }
                JobMessage::Synced { reason, outcome } => {
                    self.jobs.clear_updating_model();
                    self.handle_synced(reason, outcome);
                }
                JobMessage::HistoryStepped { direction, result } => {
                    self.jobs.clear_updating_model();
                    match result {
                        Ok(outcome) => self.handle_history_stepped(direction, outcome),
                        Err(err) => self.handle_history_step_failed(direction, err),
                    }
                }
                JobMessage::ResetFinished(result) => {
                    self.jobs.clear_updating_model();
                    match result {
                        Ok(outcome) => self.handle_reset_finished(outcome),
                        Err(err) => self.handle_reset_failed(err),
                    }
                }
                JobMessage::Compared { generation, result } => {
                    self.jobs.clear_compare();
                    if !self.jobs.is_current_model(generation) {
                        tracing::debug!("Dropping comparison made against a reset model");
                        continue;
                    }
                    match result {
                        Ok(comparison) => {
                            self.last_comparison = Some(comparison.clone());
                            self.events.push(SessionEvent::Compared(Ok(comparison)));
                        }
                        Err(err) => {
                            let err = SessionError::Gateway(err);
                            self.notify(format!("Comparison failed: {err}"), StatusTone::Error);
                            self.events.push(SessionEvent::Compared(Err(err)));
                        }
                    }
                }
            }
        }
    }

    fn handle_training_progress(&mut self, progress: TrainingProgress) {
        self.notify(progress.text(), StatusTone::Info);
        self.progress = Some(progress);
    }

    fn handle_training_finished(&mut self, outcome: TrainingOutcome) {
        let TrainingOutcome {
            response,
            mode,
            submitted,
        } = outcome;
        self.handle_training_progress(TrainingProgress::new(
            4,
            "Training finished, updating state…",
        ));
        let result = TrainingResult::from_response(response, mode);
        if let Some(visualization) = &result.model_visualization {
            self.visualization = visualization.clone();
        }
        if result.model_hypothesis.is_some() {
            self.hypothesis = result.model_hypothesis.clone();
        }
        self.training_steps = result.training_steps.clone().unwrap_or_default();
        let message = result
            .message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Model trained".to_string());
        self.training_result = Some(result);
        self.store.mark_used(&submitted);
        self.history.record_training();
        self.notify(message, StatusTone::Success);
        self.events.push(SessionEvent::TrainingFinished(Ok(mode)));
        self.jobs.begin_sync(
            SyncReason::AfterTraining,
            self.settings.timing.reconcile_delay(),
        );
    }

    fn handle_training_failed(&mut self, mode: TrainingMode, err: SessionError) {
        self.progress = None;
        self.training_result = Some(TrainingResult::failed(err.to_string(), mode));
        self.notify(format!("Training failed: {err}"), StatusTone::Error);
        self.events.push(SessionEvent::TrainingFinished(Err(err)));
    }

    fn handle_synced(&mut self, reason: SyncReason, outcome: SyncOutcome) {
        let report = self.apply_sync(outcome);
        if reason == SyncReason::AfterTraining {
            self.progress = None;
        }
        tracing::info!(
            "Sync ({reason:?}) finished: {} examples changed",
            report.reconciled
        );
        self.events.push(SessionEvent::Synced(report));
    }

    /// Fold server snapshots into local state. Failed fetches only get logged.
    fn apply_sync(&mut self, outcome: SyncOutcome) -> SyncReport {
        let mut report = SyncReport::default();
        match outcome.dataset {
            Ok(examples) => {
                report.reconciled = self
                    .store
                    .reconcile(&examples, self.settings.matching.formula);
                report.dataset_refreshed = true;
            }
            Err(err) => tracing::warn!("Dataset refresh failed: {err}"),
        }
        match outcome.status {
            Ok(status) => {
                self.model_status = Some(status.into());
                report.status_refreshed = true;
            }
            Err(err) => tracing::warn!("Model status refresh failed: {err}"),
        }
        match outcome.info {
            Ok(info) => {
                self.history.apply_server(info.history);
                report.history_refreshed = true;
            }
            Err(err) => tracing::warn!("Model history refresh failed: {err}"),
        }
        report
    }

    fn handle_history_stepped(&mut self, direction: StepDirection, outcome: StepOutcome) {
        let StepOutcome { response, sync } = outcome;
        let current_index = response
            .current_index
            .unwrap_or_else(|| self.history.current_index());
        self.history.apply_step(current_index);
        if response.model_hypothesis.is_some() {
            self.hypothesis = response.model_hypothesis;
        }
        if let Some(visualization) = response.model_visualization {
            if let Some(result) = self.training_result.as_mut() {
                result.model_visualization = Some(visualization.clone());
            }
            self.visualization = visualization;
        }
        if let Some(steps) = response.training_steps {
            if let Some(result) = self.training_result.as_mut() {
                result.training_steps = Some(steps.clone());
            }
            self.training_steps = steps;
        }
        self.apply_sync(sync);
        let history = self.history.snapshot();
        self.notify(
            format!(
                "Moved {} to model {} of {}",
                direction.label(),
                history.current_index.saturating_add(1),
                history.total_entries
            ),
            StatusTone::Info,
        );
        self.events.push(SessionEvent::HistoryStepped {
            direction,
            result: Ok(history),
        });
    }

    fn handle_history_step_failed(&mut self, direction: StepDirection, err: GatewayError) {
        let err = SessionError::Gateway(err);
        self.notify(
            format!("Could not step {}: {err}", direction.label()),
            StatusTone::Warning,
        );
        self.events.push(SessionEvent::HistoryStepped {
            direction,
            result: Err(err),
        });
    }

    fn handle_reset_finished(&mut self, outcome: ResetOutcome) {
        self.jobs.retire_model();
        self.history.reset();
        self.visualization = ModelVisualization::default();
        self.hypothesis = None;
        self.training_steps.clear();
        self.training_result = None;
        self.last_comparison = None;
        self.progress = None;
        self.store.reset();
        self.model_status = match outcome.status {
            Ok(status) => Some(status.into()),
            Err(err) => {
                tracing::warn!("Model status refresh after reset failed: {err}");
                None
            }
        };
        self.notify("Model reset", StatusTone::Success);
        self.events.push(SessionEvent::ResetFinished(Ok(())));
    }

    fn handle_reset_failed(&mut self, err: GatewayError) {
        let err = SessionError::Gateway(err);
        self.notify(format!("Reset failed: {err}"), StatusTone::Error);
        self.events.push(SessionEvent::ResetFinished(Err(err)));
    }
}
