//! Error shaping at the HTTP boundary.
//!
//! Upstream failures all collapse into one fixed body so clients cannot tell
//! which service failed; the tagged cause only goes to the logs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::chat::HistoryError;
use crate::pipeline::PipelineError;
use crate::upstream::UpstreamError;

/// Body returned for every upstream failure
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The body was not a usable conversation
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// An upstream service failed
    #[error(transparent)]
    Upstream(PipelineError),
}

impl ApiError {
    #[inline]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[inline]
    pub fn public_message(&self) -> String {
        match self {
            Self::MalformedRequest(_) => self.to_string(),
            Self::Upstream(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Log the error with the detail that the response hides
    #[inline]
    pub fn log(&self) {
        match self {
            Self::MalformedRequest(message) => warn!("Rejected malformed request: {}", message),
            Self::Upstream(e) => {
                let upstream_status = e.upstream().and_then(UpstreamError::status);
                error!(
                    stage = %e.stage(),
                    upstream_status = ?upstream_status,
                    "Chat request failed: {}",
                    e
                );
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    #[inline]
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::MalformedRequest(e) => e.into(),
            upstream => Self::Upstream(upstream),
        }
    }
}

impl From<HistoryError> for ApiError {
    #[inline]
    fn from(error: HistoryError) -> Self {
        Self::MalformedRequest(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
