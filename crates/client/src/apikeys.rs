use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use configs::ClientConfig;
use models::{validate_id, validate_secret, ApiKey, ValidateResponse};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::ApiKeyClientError;
use crate::observability;
use crate::operation::Operation;
use crate::retry::RetryPolicy;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

pub type Result<T> = std::result::Result<T, ApiKeyClientError>;

const APIKEYS: &str = "apikeys";
const BY_KEY: &str = "key";
const VALIDATE: &str = "validate";

/// Client for the API key service.
///
/// Holds only the base address, the transport and call options, so clones are
/// cheap and a single instance can be shared between tasks.
#[derive(Clone)]
pub struct ApiKeyClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    retry: Option<RetryPolicy>,
    deadline: Option<Duration>,
}

impl fmt::Debug for ApiKeyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyClient")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl ApiKeyClient {
    /// Client using the default reqwest transport (10 second timeout).
    pub fn new(base_url: &str) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(ApiKeyClientError::TransportSetup)?;
        Self::with_transport(base_url, Arc::new(transport))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self { base_url, transport, retry: None, deadline: None })
    }

    /// Build the transport from configured timeouts and apply the retry settings.
    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        cfg.validate()
            .map_err(|e| ApiKeyClientError::InvalidConfig(e.to_string()))?;
        let transport = ReqwestTransport::with_timeouts(cfg.request_timeout(), Some(cfg.connect_timeout()))
            .map_err(ApiKeyClientError::TransportSetup)?;
        let mut client = Self::with_transport(&cfg.base_url, Arc::new(transport))?;
        client.retry = RetryPolicy::from_config(&cfg.retry);
        Ok(client)
    }

    /// Retry idempotent reads with `policy`. Mutations are never retried.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// A copy of this client whose calls each finish within `deadline`, retries included.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        let mut client = self.clone();
        client.deadline = Some(deadline);
        client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey> {
        let op = Operation::Create;
        let body = serde_json::to_vec(key).map_err(ApiKeyClientError::Serialize)?;
        let request = HttpRequest::new(Method::POST, self.endpoint(&[APIKEYS])?).json_body(body);
        let body = self.execute(op, request, StatusCode::CREATED).await?;
        let created: ApiKey = decode(op, &body)?;
        info!(id = %created.id, service_account_id = %created.service_account_id, "api key created");
        Ok(created)
    }

    pub async fn get_api_key_by_id(&self, id: Uuid) -> Result<ApiKey> {
        let op = Operation::GetById;
        validate_id(id)?;
        let id = id.to_string();
        let request = HttpRequest::new(Method::GET, self.endpoint(&[APIKEYS, &id])?);
        let body = self.execute(op, request, StatusCode::OK).await?;
        decode(op, &body)
    }

    /// Look a key up by its secret. The secret is sent as one escaped path segment.
    pub async fn get_api_key_by_api_key(&self, secret: &str) -> Result<ApiKey> {
        let op = Operation::GetByApiKey;
        validate_secret(secret)?;
        let request = HttpRequest::new(Method::GET, self.endpoint(&[APIKEYS, BY_KEY, secret])?);
        let body = self.execute(op, request, StatusCode::OK).await?;
        decode(op, &body)
    }

    /// Replace the record addressed by `key.id` and return the service's copy.
    pub async fn update_api_key(&self, key: &ApiKey) -> Result<ApiKey> {
        let op = Operation::Update;
        validate_id(key.id)?;
        let body = serde_json::to_vec(key).map_err(ApiKeyClientError::Serialize)?;
        let id = key.id.to_string();
        let request = HttpRequest::new(Method::PUT, self.endpoint(&[APIKEYS, &id])?).json_body(body);
        let body = self.execute(op, request, StatusCode::OK).await?;
        let updated: ApiKey = decode(op, &body)?;
        info!(id = %updated.id, "api key updated");
        Ok(updated)
    }

    /// Delete by id. A second delete of the same key surfaces the service's answer.
    pub async fn delete_api_key(&self, id: Uuid) -> Result<()> {
        let op = Operation::Delete;
        validate_id(id)?;
        let id_segment = id.to_string();
        let request = HttpRequest::new(Method::DELETE, self.endpoint(&[APIKEYS, &id_segment])?);
        self.execute(op, request, StatusCode::OK).await?;
        info!(%id, "api key deleted");
        Ok(())
    }

    /// All keys, in the order the service returns them.
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        let op = Operation::List;
        let request = HttpRequest::new(Method::GET, self.endpoint(&[APIKEYS])?);
        let body = self.execute(op, request, StatusCode::OK).await?;
        // an empty collection may arrive as `null`
        let keys: Option<Vec<ApiKey>> = decode(op, &body)?;
        Ok(keys.unwrap_or_default())
    }

    pub async fn validate_api_key(&self, secret: &str) -> Result<bool> {
        let op = Operation::Validate;
        validate_secret(secret)?;
        let request = HttpRequest::new(Method::GET, self.endpoint(&[APIKEYS, BY_KEY, secret, VALIDATE])?);
        let body = self.execute(op, request, StatusCode::OK).await?;
        let resp: ValidateResponse = decode(op, &body)?;
        Ok(resp.is_valid)
    }

    /// Append percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiKeyClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, operation: Operation, request: HttpRequest, expected: StatusCode) -> Result<Vec<u8>> {
        let exchange = self.exchange_with_retry(operation, request, expected);
        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, exchange).await {
                Ok(result) => result,
                Err(_) => {
                    observability::record_outcome(operation, "deadline");
                    warn!(%operation, ?deadline, "api key request deadline exceeded");
                    Err(ApiKeyClientError::DeadlineExceeded { operation, deadline })
                }
            },
            None => exchange.await,
        }
    }

    async fn exchange_with_retry(
        &self,
        operation: Operation,
        request: HttpRequest,
        expected: StatusCode,
    ) -> Result<Vec<u8>> {
        let policy = self.retry.filter(|_| operation.is_idempotent());
        let mut attempt = 1;
        loop {
            let result = self.exchange(operation, request.clone(), expected).await;
            match (result, policy) {
                (Err(err), Some(p)) if p.should_retry(attempt, &err) => {
                    let delay = p.backoff(attempt);
                    warn!(%operation, attempt, ?delay, error = %err, "retrying api key request");
                    observability::record_retry(operation);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                (result, _) => return result,
            }
        }
    }

    /// One request/response. Urls are never logged since they may carry a secret.
    async fn exchange(&self, operation: Operation, request: HttpRequest, expected: StatusCode) -> Result<Vec<u8>> {
        let method = request.method.clone();
        let started = Instant::now();
        let outcome = self.transport.send(request).await;
        let elapsed = started.elapsed();
        observability::observe_duration(operation, elapsed.as_secs_f64());

        let response = match outcome {
            Ok(response) => response,
            Err(source) => {
                observability::record_outcome(operation, "transport");
                warn!(%operation, %method, error = %source, "api key request failed");
                return Err(ApiKeyClientError::Transport { operation, source });
            }
        };
        debug!(
            %operation,
            %method,
            status = response.status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "api key request completed"
        );

        if response.status != expected {
            let err = ApiKeyClientError::from_status(operation, response.status, &response.body);
            observability::record_outcome(operation, err.kind());
            return Err(err);
        }
        observability::record_outcome(operation, "ok");
        Ok(response.body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ApiKeyClientError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiKeyClientError::InvalidBaseUrl(format!("{raw}: expected an http(s) url")));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn decode<T: DeserializeOwned>(operation: Operation, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ApiKeyClientError::Decode { operation, source })
}
