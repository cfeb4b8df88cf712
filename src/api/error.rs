use reqwest::StatusCode;
use thiserror::Error;

use super::backend::ProblemDetail;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("backend returned {status}: {}", problem.describe())]
    Status { status: StatusCode, problem: ProblemDetail },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Url(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status of a backend rejection, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn problem(&self) -> Option<&ProblemDetail> {
        match self {
            ApiError::Status { problem, .. } => Some(problem),
            _ => None,
        }
    }
}
