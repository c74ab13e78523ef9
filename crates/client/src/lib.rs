//! Async client for the remote API-key management service.
//! - One HTTP exchange per operation; reads may opt into retries.
//! - Pluggable transport (`HttpTransport`), reqwest by default.
//! - Tagged errors distinguishing transport, status and decode failures.

pub mod errors;
pub mod operation;
pub mod transport;
pub mod retry;
pub mod observability;
pub mod apikeys;

pub use apikeys::ApiKeyClient;
pub use errors::ApiKeyClientError;
pub use operation::Operation;
