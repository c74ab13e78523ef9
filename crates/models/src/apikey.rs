use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Seconds between the Unix epoch and `0001-01-01T00:00:00Z`, the service's zero time.
const ZERO_TIME_UNIX_SECS: i64 = -62_135_596_800;

/// An API key record as stored by the remote service.
///
/// Field names on the wire are the service's own (`ID`, `ServiceAccountID`, ...)
/// and must not change.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "ServiceAccountID")]
    pub service_account_id: Uuid,
    #[serde(rename = "APIKey")]
    pub api_key: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "Valid")]
    pub valid: bool,
    #[serde(rename = "IsActive")]
    pub is_active: bool,
}

impl ApiKey {
    /// Creation payload for `service_account_id`: valid, active, server fields unset.
    pub fn new(service_account_id: Uuid, secret: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            service_account_id,
            api_key: secret.into(),
            created_at: unset_timestamp(),
            updated_at: unset_timestamp(),
            valid: true,
            is_active: true,
        }
    }

    /// Whether the server has assigned an identifier.
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// Valid and active at the same time.
    pub fn is_usable(&self) -> bool {
        self.valid && self.is_active
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("service_account_id", &self.service_account_id)
            .field("api_key", &mask_secret(&self.api_key))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("valid", &self.valid)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// Body of `GET /apikeys/key/{secret}/validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    #[serde(rename = "is_valid")]
    pub is_valid: bool,
}

/// The timestamp the service treats as "not set" (`0001-01-01T00:00:00Z`).
pub fn unset_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(ZERO_TIME_UNIX_SECS, 0).unwrap_or_default()
}

/// Keep only a short prefix of a secret so it can appear in logs.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}

/// Reject secrets that would address the collection instead of a key.
pub fn validate_secret(secret: &str) -> Result<(), ModelError> {
    if secret.trim().is_empty() {
        return Err(ModelError::Validation("api key secret must not be empty".into()));
    }
    // `.` and `..` are dot segments; a url path cannot carry them as data
    if secret == "." || secret == ".." {
        return Err(ModelError::Validation("api key secret must not be `.` or `..`".into()));
    }
    Ok(())
}

/// Reject the nil identifier for id-addressed calls.
pub fn validate_id(id: Uuid) -> Result<(), ModelError> {
    if id.is_nil() {
        return Err(ModelError::Validation("api key id must not be nil".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_service_field_names() {
        let sa = Uuid::new_v4();
        let key = ApiKey::new(sa, "sk_abc");
        let v = serde_json::to_value(&key).unwrap();
        let obj = v.as_object().unwrap();
        let mut names: Vec<&str> = obj.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["APIKey", "CreatedAt", "ID", "IsActive", "ServiceAccountID", "UpdatedAt", "Valid"]
        );
        assert_eq!(v["ID"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(v["ServiceAccountID"], sa.to_string());
        assert_eq!(v["CreatedAt"], "0001-01-01T00:00:00Z");
        assert_eq!(v["Valid"], true);
        assert_eq!(v["IsActive"], true);
    }

    #[test]
    fn parses_service_payload_with_offsets_and_nanos() {
        let id = Uuid::new_v4();
        let sa = Uuid::new_v4();
        let body = json!({
            "ID": id,
            "ServiceAccountID": sa,
            "APIKey": "sk_abc",
            "CreatedAt": "2024-05-01T10:00:00.123456789+02:00",
            "UpdatedAt": "2024-05-01T08:00:00.123456789Z",
            "Valid": true,
            "IsActive": false
        });
        let key: ApiKey = serde_json::from_value(body).unwrap();
        assert_eq!(key.id, id);
        assert_eq!(key.service_account_id, sa);
        assert_eq!(key.created_at, key.updated_at);
        assert!(key.has_id());
        assert!(!key.is_usable());
    }

    #[test]
    fn missing_field_is_rejected() {
        let body = json!({ "ID": Uuid::new_v4(), "APIKey": "x" });
        assert!(serde_json::from_value::<ApiKey>(body).is_err());
    }

    #[test]
    fn validate_response_uses_snake_case() {
        let r: ValidateResponse = serde_json::from_str(r#"{"is_valid":true,"reason":"ok"}"#).unwrap();
        assert!(r.is_valid);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = ApiKey::new(Uuid::new_v4(), "sk_live_supersecret");
        let dbg = format!("{key:?}");
        assert!(dbg.contains("sk_l****"));
        assert!(!dbg.contains("supersecret"));
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn argument_checks() {
        assert!(validate_secret("  ").is_err());
        assert!(validate_secret("sk").is_ok());
        assert!(validate_secret(".").is_err());
        assert!(validate_secret("..").is_err());
        assert!(validate_secret("...").is_ok());
        assert!(validate_id(Uuid::nil()).is_err());
        assert!(validate_id(Uuid::new_v4()).is_ok());
    }
}
