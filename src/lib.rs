//! Client for the remote API-key management service.
//!
//! Re-exports the workspace crates so callers only need one dependency.

pub use client::{
    errors::ApiKeyClientError,
    retry::RetryPolicy,
    transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError},
    ApiKeyClient, Operation,
};
pub use common::utils::logging;
pub use configs::{AppConfig, ClientConfig};
pub use models::{apikey::{ApiKey, ValidateResponse}, errors::ModelError};
