//! HTTP daemon/server mode for the obituary search engine (§6 "HTTP
//! surface (search service)").
//!
//! `GET /search` runs one query immediately and does not persist it;
//! `/exclude*` and `/batches*` expose the exclusion store and batch
//! history respectively. The server is intentionally thin: it
//! performs JSON (de)serialization, delegates to the core engine, and
//! converts errors into JSON HTTP responses.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::engine;
use crate::exclusion::ExclusionStore;
use crate::metrics::RuntimeMetrics;
use crate::models::{Exclusion, NewExclusion, PersonQuery};
use crate::provider;

#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub config: Arc<EngineConfig>,
    pub http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/exclude", post(create_exclude))
        .route("/exclusions", get(list_exclusions))
        .route("/exclude/:id", delete(remove_exclude))
        .route("/batches", get(list_batches))
        .route("/batches/latest", get(latest_batch))
        .route("/batches/:id", get(get_batch))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, state).await
}

pub async fn serve_with_listener(listener: TcpListener, state: AppState) -> Result<()> {
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", timestamp: chrono::Utc::now().to_rfc3339() })
}

/// Query params for `GET /search`, matching §6's camelCase wire names.
#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(rename = "firstName")]
    first_name: Option<String>,
    #[serde(rename = "lastName")]
    last_name: String,
    #[serde(rename = "middleName")]
    middle_name: Option<String>,
    nickname: Option<String>,
    city: Option<String>,
    state: Option<String>,
    age: Option<f64>,
    #[serde(rename = "keyWords")]
    key_words: Option<String>,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Response, ApiError> {
    if params.last_name.trim().is_empty() {
        return Err(ApiError::bad_request("lastName is required"));
    }
    if params.first_name.is_none() && params.nickname.is_none() {
        return Err(ApiError::bad_request("at least one of firstName or nickname is required"));
    }

    let query = PersonQuery {
        first_name: params.first_name,
        middle_name: params.middle_name,
        nickname: params.nickname,
        last_name: params.last_name,
        age: params.age,
        city: params.city,
        state: params.state,
        keywords: params.key_words,
        input_date: None,
    };

    let provider = provider::build_provider(&state.config.search_provider, state.http_client.clone(), &state.config.provider)
        .ok_or_else(|| ApiError::bad_request(format!("no provider configured for {}", state.config.search_provider)))?;

    let metrics = RuntimeMetrics::new();
    let today = chrono::Utc::now().date_naive();
    let conn = state.conn.lock().await;
    let outcome = engine::run_search(&query, today, provider.as_ref(), &conn, state.http_client.clone(), state.config.as_ref(), &metrics)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(outcome).into_response())
}

#[derive(Debug, Deserialize)]
struct CreateExcludeBody {
    #[serde(rename = "searchKey")]
    search_key: Option<String>,
    fingerprint: String,
    url: Option<String>,
    name: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExclusionEnvelope {
    exclusion: Exclusion,
}

async fn create_exclude(
    State(state): State<AppState>,
    Json(body): Json<CreateExcludeBody>,
) -> Result<Json<ExclusionEnvelope>, ApiError> {
    let conn = state.conn.lock().await;
    let store = ExclusionStore::new(&conn);
    let input = NewExclusion {
        scope: None,
        search_key: body.search_key,
        fingerprint: Some(body.fingerprint),
        url: body.url,
        name: body.name,
        reason: body.reason,
    };
    let (exclusion, _created) = store.add(&input).map_err(ApiError::from)?;
    Ok(Json(ExclusionEnvelope { exclusion }))
}

#[derive(Debug, Deserialize)]
struct ExclusionsParams {
    #[serde(rename = "searchKey")]
    search_key: String,
}

#[derive(Debug, Serialize)]
struct ExclusionsEnvelope {
    exclusions: Vec<Exclusion>,
}

async fn list_exclusions(
    State(state): State<AppState>,
    Query(params): Query<ExclusionsParams>,
) -> Result<Json<ExclusionsEnvelope>, ApiError> {
    let conn = state.conn.lock().await;
    let store = ExclusionStore::new(&conn);
    let exclusions = store.by_search_key(&params.search_key).map_err(ApiError::from)?;
    Ok(Json(ExclusionsEnvelope { exclusions }))
}

#[derive(Debug, Serialize)]
struct SuccessEnvelope {
    success: bool,
}

async fn remove_exclude(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<SuccessEnvelope>, ApiError> {
    let conn = state.conn.lock().await;
    let store = ExclusionStore::new(&conn);
    let removed = store.remove(id).map_err(ApiError::from)?;
    if !removed {
        return Err(ApiError::not_found(format!("exclusion {id} not found")));
    }
    Ok(Json(SuccessEnvelope { success: true }))
}

async fn list_batches(State(state): State<AppState>) -> Result<Response, ApiError> {
    let conn = state.conn.lock().await;
    let batches = crate::db::queries::list_batches(&conn).map_err(ApiError::from)?;
    Ok(Json(batches).into_response())
}

async fn latest_batch(State(state): State<AppState>) -> Result<Response, ApiError> {
    let conn = state.conn.lock().await;
    let batch = crate::db::queries::latest_batch(&conn).map_err(ApiError::from)?;
    match batch {
        Some(batch) => Ok(Json(batch).into_response()),
        None => Err(ApiError::not_found("no batches have run yet")),
    }
}

async fn get_batch(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, ApiError> {
    let conn = state.conn.lock().await;
    let batch = crate::db::queries::get_batch(&conn, id).map_err(ApiError::from)?;
    match batch {
        Some(batch) => Ok(Json(batch).into_response()),
        None => Err(ApiError::not_found(format!("batch {id} not found"))),
    }
}
