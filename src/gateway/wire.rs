//! JSON shapes exchanged with the training service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-side twin of a local example.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerExample {
    pub id: u64,
    pub name: String,
    pub formula: String,
    pub is_positive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_in_training: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatasetResponse {
    #[serde(default)]
    pub examples: Vec<ServerExample>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    #[serde(default)]
    pub used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Raw `/model-status` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatusResponse {
    #[serde(default)]
    pub object_count: u64,
    #[serde(default)]
    pub used_examples: u64,
    #[serde(default)]
    pub total_examples: u64,
    #[serde(default)]
    pub link_count: u64,
    #[serde(default)]
    pub positive_examples: LabelCounts,
    #[serde(default)]
    pub negative_examples: LabelCounts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadExample {
    pub formula: String,
    pub is_positive: bool,
    pub name: String,
}

/// Generic `{success, message}` acknowledgement.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub example_ids: Vec<u64>,
    pub retrain_all: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Semantic network of the learned concept, handed to the renderer untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelVisualization {
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub links: Vec<NetworkLink>,
}

impl ModelVisualization {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// One explanatory step the learner reports for a training call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStep {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_updated: bool,
    #[serde(default)]
    pub model_hypothesis: Option<String>,
    #[serde(default)]
    pub model_rules: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub model_visualization: Option<ModelVisualization>,
    #[serde(default)]
    pub training_steps: Option<Vec<TrainingStep>>,
    #[serde(default)]
    pub used_examples_count: Option<u64>,
    #[serde(default)]
    pub total_examples_count: Option<u64>,
}

/// Payload of `/model-history/step-back` and `/model-history/step-forward`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStepResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub current_index: Option<i64>,
    #[serde(default)]
    pub used_example_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub model_hypothesis: Option<String>,
    #[serde(default)]
    pub model_visualization: Option<ModelVisualization>,
    #[serde(default)]
    pub training_steps: Option<Vec<TrainingStep>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Server-held position in the training history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHistory {
    pub current_index: i64,
    pub total_entries: u64,
}

impl Default for ModelHistory {
    fn default() -> Self {
        Self {
            current_index: -1,
            total_entries: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    #[serde(default)]
    pub history: ModelHistory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub formula: String,
    pub is_positive: bool,
    pub name: String,
}

/// Whether a formula is covered by the current model, and why not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub symbolic_differences: Vec<String>,
}
