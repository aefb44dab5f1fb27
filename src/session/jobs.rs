use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::gateway::{ComparisonResult, GatewayError, TrainingGateway};

use super::SessionError;
use super::history::StepDirection;
use super::state::{TrainingMode, TrainingProgress};
use super::workers::{
    self, ResetOutcome, StepOutcome, SyncOutcome, TrainingJob, TrainingOutcome,
};

/// Why a sync pass was started; decides how its result is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncReason {
    AfterTraining,
    Load,
    Refresh,
}

pub(crate) enum JobMessage {
    TrainingProgress(TrainingProgress),
    TrainingFinished {
        mode: TrainingMode,
        result: Result<TrainingOutcome, SessionError>,
    },
    Synced {
        reason: SyncReason,
        outcome: SyncOutcome,
    },
    HistoryStepped {
        direction: StepDirection,
        result: Result<StepOutcome, GatewayError>,
    },
    ResetFinished(Result<ResetOutcome, GatewayError>),
    Compared {
        generation: u64,
        result: Result<ComparisonResult, GatewayError>,
    },
}

/// Worker threads plus the single-flight flags guarding them.
pub(crate) struct SessionJobs {
    gateway: Arc<dyn TrainingGateway>,
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
    training_in_progress: bool,
    updating_model_in_progress: bool,
    compare_in_progress: bool,
    model_generation: u64,
}

impl SessionJobs {
    pub(crate) fn new(gateway: Arc<dyn TrainingGateway>) -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel::<JobMessage>();
        Self {
            gateway,
            message_tx,
            message_rx,
            training_in_progress: false,
            updating_model_in_progress: false,
            compare_in_progress: false,
            model_generation: 0,
        }
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    pub(crate) fn training_in_progress(&self) -> bool {
        self.training_in_progress
    }

    pub(crate) fn updating_model_in_progress(&self) -> bool {
        self.updating_model_in_progress
    }

    pub(crate) fn compare_in_progress(&self) -> bool {
        self.compare_in_progress
    }

    pub(crate) fn busy(&self) -> bool {
        self.training_in_progress || self.updating_model_in_progress
    }

    pub(crate) fn begin_training(&mut self, job: TrainingJob) {
        if self.training_in_progress {
            return;
        }
        self.training_in_progress = true;
        let tx = self.message_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = workers::run_training(gateway.as_ref(), &job, |progress| {
                let _ = progress_tx.send(JobMessage::TrainingProgress(progress));
            });
            let _ = tx.send(JobMessage::TrainingFinished {
                mode: job.mode,
                result,
            });
        });
    }

    pub(crate) fn clear_training(&mut self) {
        self.training_in_progress = false;
    }

    pub(crate) fn begin_sync(&mut self, reason: SyncReason, delay: Duration) {
        if self.updating_model_in_progress {
            return;
        }
        self.updating_model_in_progress = true;
        let tx = self.message_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        thread::spawn(move || {
            let outcome = workers::run_sync(gateway.as_ref(), delay);
            let _ = tx.send(JobMessage::Synced { reason, outcome });
        });
    }

    pub(crate) fn begin_history_step(&mut self, direction: StepDirection) {
        if self.updating_model_in_progress {
            return;
        }
        self.updating_model_in_progress = true;
        let tx = self.message_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        thread::spawn(move || {
            let result = workers::run_history_step(gateway.as_ref(), direction);
            let _ = tx.send(JobMessage::HistoryStepped { direction, result });
        });
    }

    pub(crate) fn begin_reset(&mut self) {
        if self.updating_model_in_progress {
            return;
        }
        self.updating_model_in_progress = true;
        let tx = self.message_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        thread::spawn(move || {
            let result = workers::run_reset(gateway.as_ref());
            let _ = tx.send(JobMessage::ResetFinished(result));
        });
    }

    pub(crate) fn clear_updating_model(&mut self) {
        self.updating_model_in_progress = false;
    }

    pub(crate) fn begin_compare(&mut self, formula: String) {
        if self.compare_in_progress {
            return;
        }
        self.compare_in_progress = true;
        let generation = self.model_generation;
        let tx = self.message_tx.clone();
        let gateway = Arc::clone(&self.gateway);
        thread::spawn(move || {
            let result = workers::run_compare(gateway.as_ref(), formula);
            let _ = tx.send(JobMessage::Compared { generation, result });
        });
    }

    pub(crate) fn clear_compare(&mut self) {
        self.compare_in_progress = false;
    }

    /// Comparisons started before a reset answer for a model that no longer exists.
    pub(crate) fn retire_model(&mut self) {
        self.model_generation = self.model_generation.wrapping_add(1);
    }

    pub(crate) fn is_current_model(&self, generation: u64) -> bool {
        generation == self.model_generation
    }
}
