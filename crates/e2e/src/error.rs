//! Error types for E2E testing

use erpqa_common::{ConvergenceTimeout, PollError, Quantity};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("ERP target {url} not healthy after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Suite not found: {0}")]
    SuiteNotFound(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Suite include cycle: {0}")]
    SuiteCycle(String),

    #[error("Case catalog parse error: {0}")]
    SpecParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Stock did not converge: {0}")]
    Convergence(ConvergenceTimeout<Quantity>),

    #[error("Request to {url} rejected with {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Common(#[from] erpqa_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<PollError<Quantity, E2eError>> for E2eError {
    fn from(err: PollError<Quantity, E2eError>) -> Self {
        match err {
            PollError::Timeout(timeout) => E2eError::Convergence(timeout),
            PollError::Read(e) => e,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
