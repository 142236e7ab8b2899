//! REST front end using axum.
//!
//! Each handler borrows a store session for the duration of the request
//! and hands it to the query pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::config::API_TITLE;
use crate::data::filter::{Query1D, Query3D};
use crate::data::store::Catalog;
use crate::discovery;
use crate::error::{QueryError, StoreError};
use crate::format::HeaderStyle;
use crate::query;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub header_style: HeaderStyle,
}

/// A [`QueryError`] rendered as `{"detail": ...}` with its status code.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(QueryError::Store(err))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(QueryError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_client_error() {
            log::warn!("{status}: {}", self.0);
        } else {
            log::error!("{status}: {:?}", self.0);
        }
        (status, Json(self.0.detail())).into_response()
    }
}

/// Create REST router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/1d", get(query_1d))
        .route("/1d/", get(query_1d))
        .route("/3d", get(query_3d))
        .route("/3d/", get(query_3d))
        .route("/authors", get(authors))
        .route("/nfos", get(nfos))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": API_TITLE,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn query_1d(
    State(state): State<AppState>,
    params: Result<Query<Query1D>, QueryRejection>,
) -> Result<String, ApiError> {
    let Query(params) = params?;
    log::debug!("1D query {params:?}");
    let session = state.catalog.session()?;
    Ok(query::query_1d(&*session, &params, state.header_style)?)
}

async fn query_3d(
    State(state): State<AppState>,
    params: Result<Query<Query3D>, QueryRejection>,
) -> Result<String, ApiError> {
    let Query(params) = params?;
    log::debug!("3D query {params:?}");
    let session = state.catalog.session()?;
    Ok(query::query_3d(&*session, &params, state.header_style)?)
}

async fn authors(State(state): State<AppState>) -> Result<String, ApiError> {
    let session = state.catalog.session()?;
    Ok(discovery::authors(&*session)?)
}

async fn nfos(State(state): State<AppState>) -> Result<String, ApiError> {
    let session = state.catalog.session()?;
    Ok(discovery::nfos(&*session)?)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(bind_addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    log::info!("Starting REST server on {bind_addr}");
    log::info!("   GET /            - Service info");
    log::info!("   GET /1d/         - 1D models (VELEST)");
    log::info!("   GET /3d/         - 3D models (delimited)");
    log::info!("   GET /authors     - Distinct authors");
    log::info!("   GET /nfos        - Distinct NFOs");

    axum::Server::bind(&bind_addr)
        .serve(create_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("REST server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
}
