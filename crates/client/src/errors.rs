use std::time::Duration;

use models::errors::ModelError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::operation::Operation;
use crate::transport::TransportError;

/// Longest slice of a response body kept in an error.
const MAX_BODY_SNIPPET: usize = 512;

#[derive(Debug, Error)]
pub enum ApiKeyClientError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid client config: {0}")]
    InvalidConfig(String),
    #[error("failed to build http transport: {0}")]
    TransportSetup(#[source] TransportError),
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ModelError),
    #[error("failed to encode request body: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("{operation}: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: TransportError,
    },
    #[error("{operation}: deadline of {deadline:?} exceeded")]
    DeadlineExceeded { operation: Operation, deadline: Duration },
    #[error("{operation}: api key not found")]
    NotFound { operation: Operation, body: String },
    #[error("{operation}: conflict: {body}")]
    Conflict { operation: Operation, body: String },
    #[error("{operation}: rejected with status {status}: {body}")]
    Validation { operation: Operation, status: StatusCode, body: String },
    #[error("{operation}: unexpected status {status}")]
    UnexpectedStatus { operation: Operation, status: StatusCode, body: String },
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiKeyClientError {
    /// Map a non-success status to its error kind.
    pub fn from_status(operation: Operation, status: StatusCode, body: &[u8]) -> Self {
        let body = body_snippet(body);
        match status {
            StatusCode::NOT_FOUND => Self::NotFound { operation, body },
            StatusCode::CONFLICT => Self::Conflict { operation, body },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation { operation, status, body }
            }
            _ => Self::UnexpectedStatus { operation, status, body },
        }
    }

    /// The HTTP status the service answered with, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Conflict { .. } => Some(StatusCode::CONFLICT),
            Self::Validation { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Failures worth repeating for an idempotent read.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::UnexpectedStatus { status, .. } => matches!(
                *status,
                StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            _ => false,
        }
    }

    /// Stable short name, used as the metrics outcome label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBaseUrl(_) => "invalid_base_url",
            Self::InvalidConfig(_) => "invalid_config",
            Self::TransportSetup(_) => "transport_setup",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Serialize(_) => "serialize",
            Self::Transport { .. } => "transport",
            Self::DeadlineExceeded { .. } => "deadline",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Validation { .. } => "validation",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Decode { .. } => "decode",
        }
    }
}

fn body_snippet(body: &[u8]) -> String {
    let end = body.len().min(MAX_BODY_SNIPPET);
    String::from_utf8_lossy(&body[..end]).trim().to_string()
}
