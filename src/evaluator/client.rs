//! HTTP client for the evaluation service.

use super::{Evaluator, EvaluatorError};
use crate::config::EvaluatorConfig;
use crate::models::EvaluationReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Request body the evaluation endpoint expects.
#[derive(Debug, Serialize)]
struct EvaluationRequest<'a> {
    metadata_service_endpoint: &'a str,
    metadata_service_type: &'a str,
    object_identifier: &'a str,
    test_debug: bool,
    use_datacite: bool,
}

/// Client for the evaluation endpoint.
///
/// One blocking-style POST per dataset with basic auth and a hard
/// client timeout; an evaluation that exceeds the timeout fails rather
/// than blocking the scan indefinitely.
pub struct EvaluatorClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
    timeout_seconds: u64,
}

impl EvaluatorClient {
    pub fn new(cfg: &EvaluatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .context("Failed to create HTTP client for the evaluation service")?;

        Ok(Self {
            client,
            url: cfg.url.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            timeout_seconds: cfg.timeout_seconds,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> EvaluatorError {
        if err.is_timeout() {
            EvaluatorError::Timeout(self.timeout_seconds)
        } else if err.is_connect() {
            EvaluatorError::Unreachable(err.to_string())
        } else {
            EvaluatorError::Transport(err.to_string())
        }
    }
}

impl Evaluator for EvaluatorClient {
    async fn evaluate(
        &self,
        identifier: &str,
        use_datacite: bool,
    ) -> Result<EvaluationReport, EvaluatorError> {
        info!(%identifier, use_datacite, "submitting for evaluation");

        let request = EvaluationRequest {
            metadata_service_endpoint: "",
            metadata_service_type: "",
            object_identifier: identifier,
            test_debug: true,
            use_datacite,
        };

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!(bytes = body.len(), "evaluation response received");

        serde_json::from_str(&body).map_err(|e| EvaluatorError::MalformedReport(e.to_string()))
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    }
}
