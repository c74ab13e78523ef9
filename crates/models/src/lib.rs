//! Wire records exchanged with the API-key service.

pub mod errors;
pub mod apikey;

pub use apikey::{validate_id, validate_secret, ApiKey, ValidateResponse};
