//! In-memory stand-in for the API key service, served by axum on an ephemeral port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use models::{ApiKey, ValidateResponse};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct Store {
    keys: Arc<RwLock<HashMap<Uuid, ApiKey>>>,
}

pub struct TestApp {
    pub base_url: String,
    pub store: Store,
}

impl TestApp {
    pub async fn store_is_empty(&self) -> bool {
        self.store.keys.read().await.is_empty()
    }
}

type Reply<T> = Result<(StatusCode, Json<T>), (StatusCode, String)>;

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "api key not found".to_string())
}

fn parse_id(raw: &str) -> Result<Uuid, (StatusCode, String)> {
    Uuid::parse_str(raw).map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid id: {raw}")))
}

async fn create(State(store): State<Store>, Json(mut key): Json<ApiKey>) -> Reply<ApiKey> {
    let mut keys = store.keys.write().await;
    if keys.values().any(|k| k.api_key == key.api_key) {
        return Err((StatusCode::CONFLICT, "api key already exists".to_string()));
    }
    let now = Utc::now();
    key.id = Uuid::new_v4();
    key.created_at = now;
    key.updated_at = now;
    keys.insert(key.id, key.clone());
    Ok((StatusCode::CREATED, Json(key)))
}

async fn list(State(store): State<Store>) -> Json<Vec<ApiKey>> {
    let keys = store.keys.read().await;
    let mut all: Vec<ApiKey> = keys.values().cloned().collect();
    all.sort_by_key(|k| k.created_at);
    Json(all)
}

async fn get_by_id(State(store): State<Store>, Path(id): Path<String>) -> Reply<ApiKey> {
    let id = parse_id(&id)?;
    let keys = store.keys.read().await;
    let key = keys.get(&id).cloned().ok_or_else(not_found)?;
    Ok((StatusCode::OK, Json(key)))
}

async fn update(State(store): State<Store>, Path(id): Path<String>, Json(body): Json<ApiKey>) -> Reply<ApiKey> {
    let id = parse_id(&id)?;
    let mut keys = store.keys.write().await;
    let current = keys.get_mut(&id).ok_or_else(not_found)?;
    current.service_account_id = body.service_account_id;
    current.api_key = body.api_key;
    current.valid = body.valid;
    current.is_active = body.is_active;
    current.updated_at = Utc::now().max(current.created_at + chrono::Duration::microseconds(1));
    Ok((StatusCode::OK, Json(current.clone())))
}

async fn delete(State(store): State<Store>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let id = parse_id(&id)?;
    let mut keys = store.keys.write().await;
    keys.remove(&id).map(|_| StatusCode::OK).ok_or_else(not_found)
}

async fn get_by_secret(State(store): State<Store>, Path(secret): Path<String>) -> Reply<ApiKey> {
    let keys = store.keys.read().await;
    let key = keys.values().find(|k| k.api_key == secret).cloned().ok_or_else(not_found)?;
    Ok((StatusCode::OK, Json(key)))
}

async fn validate(State(store): State<Store>, Path(secret): Path<String>) -> Json<ValidateResponse> {
    let keys = store.keys.read().await;
    let is_valid = keys.values().any(|k| k.api_key == secret && k.is_usable());
    Json(ValidateResponse { is_valid })
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

pub fn router(store: Store) -> Router {
    Router::new()
        .route("/apikeys", get(list).post(create))
        .route("/apikeys/:id", get(get_by_id).put(update).delete(delete))
        .route("/apikeys/key/:secret", get(get_by_secret))
        .route("/apikeys/key/:secret/validate", get(validate))
        .route("/slow", get(slow))
        .with_state(store)
}

pub async fn start_server() -> anyhow::Result<TestApp> {
    common::utils::logging::init_logging_test();
    let store = Store::default();
    let app = router(store.clone());
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, store })
}
