//! Axum router and HTTP handlers.
//!
//! `build_router` is the single entry point; `main.rs` attaches middleware
//! layers so tests can drive the bare router.

use super::api_types::{CreateOrderRequest, CurrentOrderResponse, ErrorResponse, HealthResponse};
use crate::application::engine::OrderEngine;
use crate::domain::order::{NewOrder, OrderId};
use crate::error::OrderError;
use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::error;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(engine: Arc<OrderEngine>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/terminals/:terminal_id/current", get(current_order))
        .route(
            "/v1/terminals/:terminal_id/orders",
            get(terminal_orders).post(create_order),
        )
        .route(
            "/v1/terminals/:terminal_id/orders/:order_id/in-progress",
            post(begin_processing),
        )
        .route("/v1/orders/:order_id", get(get_order))
        .route("/v1/orders/:order_id/complete", post(complete_order))
        .route("/v1/orders/:order_id/cancel", post(cancel_order))
        .with_state(engine)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Maps engine errors onto HTTP status codes.
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self.0 {
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::InvalidTransition { .. } => StatusCode::FORBIDDEN,
            OrderError::ValidationError(_) => StatusCode::BAD_REQUEST,
            OrderError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if code == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
        }
        let status = match &self.0 {
            OrderError::InvalidTransition { status, .. } => Some(*status),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
            status,
        };
        (code, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Malformed ids answer with the same JSON error body as other failures.
fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, OrderError> {
    path.map(|Path(params)| params)
        .map_err(|rejection| OrderError::ValidationError(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/terminals/:terminal_id/current
// ---------------------------------------------------------------------------

/// Public settlement-page read. Expires and promotes lazily.
pub(crate) async fn current_order(
    State(engine): State<Arc<OrderEngine>>,
    Path(terminal_id): Path<String>,
) -> ApiResult<Json<CurrentOrderResponse>> {
    let current = engine.current(&terminal_id).await?;
    Ok(Json(current.into()))
}

// ---------------------------------------------------------------------------
// /v1/terminals/:terminal_id/orders
// ---------------------------------------------------------------------------

pub(crate) async fn create_order(
    State(engine): State<Arc<OrderEngine>>,
    Path(terminal_id): Path<String>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) =
        payload.map_err(|rejection| OrderError::ValidationError(rejection.body_text()))?;
    let request = NewOrder::new(&body.amount, &body.description)?
        .with_exchange(body.exchange)
        .with_metadata(body.metadata);

    let order = engine.create(&terminal_id, request).await?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

pub(crate) async fn terminal_orders(
    State(engine): State<Arc<OrderEngine>>,
    Path(terminal_id): Path<String>,
) -> ApiResult<Response> {
    let orders = engine.orders_for_terminal(&terminal_id).await?;
    Ok(Json(orders).into_response())
}

// ---------------------------------------------------------------------------
// POST /v1/terminals/:terminal_id/orders/:order_id/in-progress
// ---------------------------------------------------------------------------

pub(crate) async fn begin_processing(
    State(engine): State<Arc<OrderEngine>>,
    path: Result<Path<(String, OrderId)>, PathRejection>,
) -> ApiResult<Response> {
    let (terminal_id, order_id) = path_params(path)?;
    let order = engine.begin_processing(&terminal_id, order_id).await?;
    Ok(Json(order).into_response())
}

// ---------------------------------------------------------------------------
// /v1/orders/:order_id
// ---------------------------------------------------------------------------

pub(crate) async fn get_order(
    State(engine): State<Arc<OrderEngine>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<Response> {
    let order_id = path_params(path)?;
    let order = engine.get(order_id).await?;
    Ok(Json(order).into_response())
}

pub(crate) async fn complete_order(
    State(engine): State<Arc<OrderEngine>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<Response> {
    let order_id = path_params(path)?;
    let order = engine.complete(order_id).await?;
    Ok(Json(order).into_response())
}

pub(crate) async fn cancel_order(
    State(engine): State<Arc<OrderEngine>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<Response> {
    let order_id = path_params(path)?;
    let order = engine.cancel(order_id).await?;
    Ok(Json(order).into_response())
}
