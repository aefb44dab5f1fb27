//! HTTP implementation of [`TrainingGateway`] over a shared `ureq` agent.

use serde::{Serialize, de::DeserializeOwned};

use super::{
    AckResponse, CompareRequest, ComparisonResult, DatasetResponse, GatewayError,
    HistoryStepResponse, ModelInfoResponse, ModelStatusResponse, ServerExample, TrainRequest,
    TrainResponse, TrainingGateway, UploadExample,
};
use crate::config::{ConfigError, ServerSettings};
use crate::http_client;

/// Blocking client for the training service endpoints.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    agent: ureq::Agent,
    root: String,
    max_response_bytes: usize,
}

impl HttpGateway {
    pub fn new(settings: &ServerSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: http_client::agent(settings.connect_timeout(), settings.read_timeout()),
            root: settings.endpoint_root()?,
            max_response_bytes: settings.max_response_bytes,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path);
        tracing::debug!("GET {url}");
        let result = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call();
        self.finish(result)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        tracing::debug!("POST {url}");
        let request = self
            .agent
            .post(&url)
            .set("Accept", "application/json");
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        self.finish(result)
    }

    fn finish<T: DeserializeOwned>(
        &self,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, GatewayError> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = http_client::read_response_text(response, self.max_response_bytes)
                    .unwrap_or_else(|err| err);
                return Err(GatewayError::Status {
                    code,
                    message: extract_error_message(&body),
                });
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(GatewayError::Transport(err.to_string()));
            }
        };
        let body = http_client::read_response_text(response, self.max_response_bytes)
            .map_err(GatewayError::Decode)?;
        parse_body(&body)
    }
}

impl TrainingGateway for HttpGateway {
    fn fetch_model_status(&self) -> Result<ModelStatusResponse, GatewayError> {
        self.get_json("model-status")
    }

    fn fetch_dataset(&self) -> Result<Vec<ServerExample>, GatewayError> {
        let response: DatasetResponse = self.get_json("dataset")?;
        Ok(response.examples)
    }

    fn upload_dataset(&self, examples: &[UploadExample]) -> Result<AckResponse, GatewayError> {
        let ack: AckResponse = self.post_json("upload-dataset", Some(&examples))?;
        require_success(ack.success, ack.message.as_deref())?;
        Ok(ack)
    }

    fn train(&self, request: &TrainRequest) -> Result<TrainResponse, GatewayError> {
        let response: TrainResponse = self.post_json("train", Some(request))?;
        require_success(response.success, response.message.as_deref())?;
        Ok(response)
    }

    fn reset(&self) -> Result<AckResponse, GatewayError> {
        let ack: AckResponse = self.post_json::<(), _>("reset", None)?;
        require_success(ack.success, ack.message.as_deref())?;
        Ok(ack)
    }

    fn step_back(&self) -> Result<HistoryStepResponse, GatewayError> {
        let response: HistoryStepResponse =
            self.post_json::<(), _>("model-history/step-back", None)?;
        require_success(response.success, response.message.as_deref())?;
        Ok(response)
    }

    fn step_forward(&self) -> Result<HistoryStepResponse, GatewayError> {
        let response: HistoryStepResponse =
            self.post_json::<(), _>("model-history/step-forward", None)?;
        require_success(response.success, response.message.as_deref())?;
        Ok(response)
    }

    fn fetch_model_info(&self) -> Result<ModelInfoResponse, GatewayError> {
        self.get_json("model/info")
    }

    fn compare_example(&self, request: &CompareRequest) -> Result<ComparisonResult, GatewayError> {
        self.post_json("compare", Some(request))
    }
}

fn require_success(success: bool, message: Option<&str>) -> Result<(), GatewayError> {
    if success {
        return Ok(());
    }
    Err(GatewayError::Rejected(
        message.map(str::trim).unwrap_or_default().to_string(),
    ))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Decode("Empty response body".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|err| GatewayError::Decode(format!("{err}: {trimmed}")))
}

/// Pull `message` or `detail` out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            for field in ["message", "detail"] {
                if let Some(text) = value.get(field).and_then(|text| text.as_str()) {
                    return text.to_string();
                }
            }
        }
    }
    trimmed.to_string()
}
