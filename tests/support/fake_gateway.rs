//! In-memory training service with a server-side history arena.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use winston_session::gateway::{
    AckResponse, CompareRequest, ComparisonResult, GatewayError, HistoryStepResponse,
    LabelCounts, ModelHistory, ModelInfoResponse, ModelStatusResponse, ModelVisualization,
    NetworkNode, ServerExample, TrainRequest, TrainResponse, TrainingGateway, UploadExample,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ModelStatus,
    Dataset,
    Upload,
    Train,
    Reset,
    StepBack,
    StepForward,
    ModelInfo,
    Compare,
}

#[derive(Clone, Debug)]
struct Snapshot {
    used: BTreeSet<u64>,
    hypothesis: String,
}

#[derive(Default)]
struct ServerState {
    dataset: Vec<ServerExample>,
    next_id: u64,
    history: Vec<Snapshot>,
    current: i64,
    trainings: usize,
    strip_formula_spaces: bool,
    failures: HashMap<Endpoint, (usize, GatewayError)>,
    delays: HashMap<Endpoint, Duration>,
    calls: Vec<Endpoint>,
    train_requests: Vec<TrainRequest>,
    uploads: Vec<Vec<UploadExample>>,
}

impl ServerState {
    fn used(&self) -> BTreeSet<u64> {
        usize::try_from(self.current)
            .ok()
            .and_then(|index| self.history.get(index))
            .map(|snapshot| snapshot.used.clone())
            .unwrap_or_default()
    }

    fn record(&mut self, endpoint: Endpoint) -> Result<(), GatewayError> {
        self.calls.push(endpoint);
        let Some((skip, _)) = self.failures.get_mut(&endpoint) else {
            return Ok(());
        };
        if *skip > 0 {
            *skip -= 1;
            return Ok(());
        }
        match self.failures.remove(&endpoint) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn visualization(&self) -> ModelVisualization {
        ModelVisualization {
            nodes: self
                .used()
                .into_iter()
                .map(|id| NetworkNode {
                    id: format!("example-{id}"),
                    name: format!("Example {id}"),
                    class: "example".into(),
                    category: "object".into(),
                    ..NetworkNode::default()
                })
                .collect(),
            links: Vec::new(),
        }
    }

    fn step_response(&self) -> HistoryStepResponse {
        let snapshot = usize::try_from(self.current)
            .ok()
            .and_then(|index| self.history.get(index));
        HistoryStepResponse {
            success: true,
            current_index: Some(self.current),
            used_example_ids: Some(self.used().into_iter().collect()),
            model_hypothesis: snapshot.map(|snapshot| snapshot.hypothesis.clone()),
            model_visualization: Some(self.visualization()),
            training_steps: None,
            message: None,
        }
    }
}

pub struct FakeGateway {
    state: Mutex<ServerState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState {
                next_id: 1,
                current: -1,
                ..ServerState::default()
            }),
        }
    }

    /// Server that already knows `(id, name, formula, is_positive)` records.
    pub fn with_dataset(entries: &[(u64, &str, &str, bool)]) -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.lock();
            for &(id, name, formula, is_positive) in entries {
                state.dataset.push(ServerExample {
                    id,
                    name: name.into(),
                    formula: formula.into(),
                    is_positive,
                    used_in_training: None,
                });
                state.next_id = state.next_id.max(id + 1);
            }
        }
        gateway
    }

    /// Store uploaded formulas without spaces, as a normalizing server would.
    pub fn stripping_formula_spaces(self) -> Self {
        self.lock().strip_formula_spaces = true;
        self
    }

    pub fn fail_next(&self, endpoint: Endpoint, err: GatewayError) {
        self.fail_after(endpoint, 0, err);
    }

    /// Let `skip` calls through, then fail the next one.
    pub fn fail_after(&self, endpoint: Endpoint, skip: usize, err: GatewayError) {
        self.lock().failures.insert(endpoint, (skip, err));
    }

    /// Make every call to `endpoint` take at least `delay` before answering.
    pub fn slow_down(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().delays.insert(endpoint, delay);
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == endpoint)
            .count()
    }

    pub fn train_requests(&self) -> Vec<TrainRequest> {
        self.lock().train_requests.clone()
    }

    pub fn uploads(&self) -> Vec<Vec<UploadExample>> {
        self.lock().uploads.clone()
    }

    /// Hypotheses of every stored history entry, oldest first.
    pub fn history_hypotheses(&self) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .map(|snapshot| snapshot.hypothesis.clone())
            .collect()
    }

    pub fn current_index(&self) -> i64 {
        self.lock().current
    }

    pub fn id_of(&self, name: &str) -> Option<u64> {
        self.lock()
            .dataset
            .iter()
            .find(|example| example.name == name)
            .map(|example| example.id)
    }

    fn wait_for(&self, endpoint: Endpoint) {
        let delay = self.lock().delays.get(&endpoint).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl TrainingGateway for FakeGateway {
    fn fetch_model_status(&self) -> Result<ModelStatusResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::ModelStatus)?;
        let used = state.used();
        let (positive, negative): (Vec<&ServerExample>, Vec<&ServerExample>) = state
            .dataset
            .iter()
            .filter(|example| used.contains(&example.id))
            .partition(|example| example.is_positive);
        Ok(ModelStatusResponse {
            object_count: if state.current >= 0 {
                used.len() as u64 + 1
            } else {
                0
            },
            used_examples: used.len() as u64,
            total_examples: state.dataset.len() as u64,
            link_count: used.len() as u64,
            positive_examples: LabelCounts {
                used: positive.len() as u64,
                total: None,
            },
            negative_examples: LabelCounts {
                used: negative.len() as u64,
                total: None,
            },
        })
    }

    fn fetch_dataset(&self) -> Result<Vec<ServerExample>, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::Dataset)?;
        let used = state.used();
        Ok(state
            .dataset
            .iter()
            .map(|example| ServerExample {
                used_in_training: Some(used.contains(&example.id)),
                ..example.clone()
            })
            .collect())
    }

    fn upload_dataset(&self, examples: &[UploadExample]) -> Result<AckResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::Upload)?;
        state.uploads.push(examples.to_vec());
        for example in examples {
            let formula = if state.strip_formula_spaces {
                example.formula.replace(' ', "")
            } else {
                example.formula.clone()
            };
            let known = state.dataset.iter().any(|existing| {
                existing.name == example.name
                    && existing.formula == formula
                    && existing.is_positive == example.is_positive
            });
            if known {
                continue;
            }
            let id = state.next_id;
            state.next_id += 1;
            state.dataset.push(ServerExample {
                id,
                name: example.name.clone(),
                formula,
                is_positive: example.is_positive,
                used_in_training: None,
            });
        }
        Ok(AckResponse {
            success: true,
            message: Some(format!("Uploaded {} examples", examples.len())),
        })
    }

    fn train(&self, request: &TrainRequest) -> Result<TrainResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::Train)?;
        state.train_requests.push(request.clone());
        let mut used = if request.retrain_all {
            BTreeSet::new()
        } else {
            state.used()
        };
        used.extend(request.example_ids.iter().copied());
        state.trainings += 1;
        let hypothesis = format!("model-{}", state.trainings);
        let keep = usize::try_from(state.current + 1).unwrap_or(0);
        state.history.truncate(keep);
        state.history.push(Snapshot {
            used: used.clone(),
            hypothesis: hypothesis.clone(),
        });
        state.current = state.history.len() as i64 - 1;
        Ok(TrainResponse {
            success: true,
            message: Some("Model trained".into()),
            model_updated: true,
            model_hypothesis: Some(hypothesis),
            model_rules: None,
            model_visualization: Some(state.visualization()),
            training_steps: None,
            used_examples_count: Some(used.len() as u64),
            total_examples_count: Some(state.dataset.len() as u64),
        })
    }

    fn reset(&self) -> Result<AckResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::Reset)?;
        state.history.clear();
        state.current = -1;
        Ok(AckResponse {
            success: true,
            message: Some("Model reset".into()),
        })
    }

    fn step_back(&self) -> Result<HistoryStepResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::StepBack)?;
        if state.history.is_empty() {
            return Ok(state.step_response());
        }
        if state.current <= 0 {
            return Err(GatewayError::Rejected("Already at the oldest model".into()));
        }
        state.current -= 1;
        Ok(state.step_response())
    }

    fn step_forward(&self) -> Result<HistoryStepResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::StepForward)?;
        if state.history.is_empty() {
            return Ok(state.step_response());
        }
        if state.current >= state.history.len() as i64 - 1 {
            return Err(GatewayError::Rejected("Already at the newest model".into()));
        }
        state.current += 1;
        Ok(state.step_response())
    }

    fn fetch_model_info(&self) -> Result<ModelInfoResponse, GatewayError> {
        let mut state = self.lock();
        state.record(Endpoint::ModelInfo)?;
        Ok(ModelInfoResponse {
            history: ModelHistory {
                current_index: state.current,
                total_entries: state.history.len() as u64,
            },
        })
    }

    fn compare_example(&self, request: &CompareRequest) -> Result<ComparisonResult, GatewayError> {
        self.wait_for(Endpoint::Compare);
        let mut state = self.lock();
        state.record(Endpoint::Compare)?;
        if state.current < 0 {
            return Err(GatewayError::Status {
                code: 400,
                message: "Model is not trained yet".into(),
            });
        }
        let is_valid = request.formula.contains("BMW");
        Ok(ComparisonResult {
            is_valid,
            explanation: if is_valid {
                "Formula satisfies the model".into()
            } else {
                "Formula misses a required BMW object".into()
            },
            symbolic_differences: if is_valid {
                Vec::new()
            } else {
                vec!["missing IS(_, BMW)".into()]
            },
        })
    }
}
