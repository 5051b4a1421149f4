//! Client for the external pulse analysis pipeline
//!
//! The pipeline is called once per request with no retries. Its answer is
//! read field by field so a partial analysis still produces a record.

use super::MetricsRecord;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Metrics proxy errors
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The pipeline answered with anything but 200 OK; body kept verbatim
    #[error("Analysis service returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("Analysis service did not respond within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed analysis response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    vid_idx: &'a str,
    dataset: &'a str,
}

/// Pipeline answer with every field optional
#[derive(Debug, Default, PartialEq)]
struct PipelineResponse {
    gt_hr: Option<f64>,
    pd_hr: Option<f64>,
    gt_spo2: Option<f64>,
    pd_spo2: Option<f64>,
    mae: Option<f64>,
    rmse: Option<f64>,
    gt_ppg: Option<Vec<f64>>,
    pd_ppg: Option<Vec<f64>>,
}

impl PipelineResponse {
    fn from_body(body: &str) -> Result<Self, ProxyError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ProxyError::Malformed(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ProxyError::Malformed(
                "expected a JSON object".to_string(),
            ));
        };

        Ok(Self {
            gt_hr: number(&fields, "gt_hr"),
            pd_hr: number(&fields, "pd_hr"),
            gt_spo2: number(&fields, "gt_spo2"),
            pd_spo2: number(&fields, "pd_spo2"),
            mae: number(&fields, "mae"),
            rmse: number(&fields, "rmse"),
            gt_ppg: series(&fields, "gt_ppg"),
            pd_ppg: series(&fields, "pd_ppg"),
        })
    }
}

impl From<PipelineResponse> for MetricsRecord {
    fn from(response: PipelineResponse) -> Self {
        Self {
            gt_heart_rate: response.gt_hr,
            pd_heart_rate: response.pd_hr,
            gt_spo2: response.gt_spo2,
            pd_spo2: response.pd_spo2,
            mean_abs_error: response.mae,
            root_mean_sq_error: response.rmse,
            gt_ppg: response.gt_ppg,
            pd_ppg: response.pd_ppg,
        }
    }
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Null => None,
        value => {
            let number = value.as_f64();
            if number.is_none() {
                warn!("Ignoring non-numeric {}: {}", key, value);
            }
            number
        }
    }
}

fn series(fields: &Map<String, Value>, key: &str) -> Option<Vec<f64>> {
    match fields.get(key)? {
        Value::Null => None,
        Value::Array(items) => {
            let samples: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            if samples.is_none() {
                warn!("Ignoring {} with non-numeric samples", key);
            }
            samples
        }
        value => {
            warn!("Ignoring non-array {}: {}", key, value);
            None
        }
    }
}

/// Forwards metrics requests to the analysis pipeline
#[derive(Debug, Clone)]
pub struct MetricsProxy {
    client: HttpClient,
    endpoint: Url,
    timeout: Duration,
}

impl MetricsProxy {
    /// Create a proxy whose calls give up after `timeout`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ProxyError> {
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Run the pipeline for `video_id` and map its answer into a
    /// [`MetricsRecord`]
    ///
    /// # Errors
    /// - [`ProxyError::Upstream`] if the pipeline answers with any status but 200
    /// - [`ProxyError::Timeout`] if no answer arrives in time
    /// - [`ProxyError::Transport`] / [`ProxyError::Malformed`] for anything else
    pub async fn fetch(&self, video_id: &str, dataset: &str) -> Result<MetricsRecord, ProxyError> {
        info!("Requesting metrics for {} ({})", video_id, dataset);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&PipelineRequest {
                vid_idx: video_id,
                dataset,
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if status != StatusCode::OK {
            warn!("Analysis service returned {} for {}", status, video_id);
            return Err(ProxyError::Upstream { status, body });
        }

        let parsed = PipelineResponse::from_body(&body)?;
        debug!("Analysis response for {}: {:?}", video_id, parsed);

        Ok(parsed.into())
    }

    fn classify(&self, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout(self.timeout)
        } else {
            ProxyError::Transport(err)
        }
    }
}
