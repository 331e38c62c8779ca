//! Remote FAIRness-evaluation service access.

mod client;

pub use client::EvaluatorClient;

use crate::models::EvaluationReport;
use thiserror::Error;

/// Failures talking to the evaluation service. All of them are fatal
/// to the row being processed, never to the scan.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluation timed out after {0}s")]
    Timeout(u64),

    #[error("evaluation service unreachable: {0}")]
    Unreachable(String),

    #[error("transport error talking to the evaluation service: {0}")]
    Transport(String),

    #[error("evaluation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed evaluation report: {0}")]
    MalformedReport(String),
}

/// A synchronous (one call, one report) evaluation backend.
#[allow(async_fn_in_trait)] // single-crate use, generic dispatch only
pub trait Evaluator {
    async fn evaluate(
        &self,
        identifier: &str,
        use_datacite: bool,
    ) -> Result<EvaluationReport, EvaluatorError>;
}
