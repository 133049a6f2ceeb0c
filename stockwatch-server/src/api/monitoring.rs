//! Monitoring API handlers.
//!
//! Read access to the catalog plus the operator controls of the stock
//! change pipeline.
//!
//! # Endpoints
//!
//! - `GET /products/active`               - list active products
//! - `GET /products/{id}`                 - get one product
//! - `GET /products/category/{category}`  - list active products in a category
//! - `GET /notifications`                 - show the notification gate
//! - `PUT /notifications`                 - enable or disable notifications
//! - `GET /dead-letters`                  - peek the dead-letter queue

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use stockwatch_core::catalog::CatalogError;
use stockwatch_core::entities::ProductSnapshot;
use stockwatch_core::transport::{DeadLetterMessage, TransportError};
use stockwatch_sdk::objects::{
    DeadLetterQuery, DeadLetterResponse, NotificationStatusResponse, ProductResponse,
    SetNotificationsRequest, StockChangedPayload, clamp_dead_letter_limit,
};

use crate::state::AppState;

/// Build the Monitoring API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/active", get(list_active_products))
        .route("/products/{id}", get(get_product))
        .route(
            "/products/category/{category}",
            get(list_active_products_by_category),
        )
        .route(
            "/notifications",
            get(get_notifications).put(set_notifications),
        )
        .route("/dead-letters", get(peek_dead_letters))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Monitoring API handlers.
#[derive(Debug)]
pub(crate) enum MonitoringApiError {
    Catalog(CatalogError),
    Broker(TransportError),
    NotFound,
}

impl IntoResponse for MonitoringApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MonitoringApiError::Catalog(e) => {
                tracing::error!(error = %e, "Monitoring API catalog error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            MonitoringApiError::Broker(e) => {
                tracing::error!(error = %e, "Monitoring API broker error");
                (StatusCode::BAD_GATEWAY, "broker unavailable").into_response()
            }
            MonitoringApiError::NotFound => {
                (StatusCode::NOT_FOUND, "product not found").into_response()
            }
        }
    }
}

fn to_responses(products: Vec<ProductSnapshot>) -> Vec<ProductResponse> {
    products.into_iter().map(Into::into).collect()
}

fn to_dead_letter_response(message: DeadLetterMessage) -> DeadLetterResponse {
    let event = if message.payload_encoding == "string" {
        serde_json::from_str::<StockChangedPayload>(&message.payload).ok()
    } else {
        None
    };
    DeadLetterResponse {
        routing_key: message.routing_key,
        redelivered: message.redelivered,
        payload: message.payload,
        event,
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// `GET /products/active`: list every active product.
async fn list_active_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, MonitoringApiError> {
    let products = state
        .catalog
        .list_active_products()
        .await
        .map_err(MonitoringApiError::Catalog)?;
    Ok(Json(to_responses(products)))
}

/// `GET /products/{id}`: one product, active or not.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, MonitoringApiError> {
    let product = state
        .catalog
        .get_product(id)
        .await
        .map_err(MonitoringApiError::Catalog)?
        .ok_or(MonitoringApiError::NotFound)?;
    Ok(Json(ProductResponse::from(product)))
}

/// `GET /products/category/{category}`: active products in a category.
async fn list_active_products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, MonitoringApiError> {
    let products = state
        .catalog
        .list_active_products_by_category(&category)
        .await
        .map_err(MonitoringApiError::Catalog)?;
    Ok(Json(to_responses(products)))
}

// ---------------------------------------------------------------------------
// Notification gate
// ---------------------------------------------------------------------------

fn gate_status(state: &AppState) -> NotificationStatusResponse {
    NotificationStatusResponse {
        enabled: state.gate.is_enabled(),
        destination: state.gate.destination().to_string(),
    }
}

/// `GET /notifications`: current gate state.
async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    Json(gate_status(&state))
}

/// `PUT /notifications`: flip the gate. Suppressed events are not replayed.
async fn set_notifications(
    State(state): State<AppState>,
    Json(request): Json<SetNotificationsRequest>,
) -> impl IntoResponse {
    state.gate.set_enabled(request.enabled);
    Json(gate_status(&state))
}

// ---------------------------------------------------------------------------
// Dead letters
// ---------------------------------------------------------------------------

/// `GET /dead-letters`: peek the dead-letter queue without consuming it.
async fn peek_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> Result<impl IntoResponse, MonitoringApiError> {
    let limit = clamp_dead_letter_limit(query.limit);
    let messages = state
        .inspector
        .peek(&state.dead_letter_queue, limit)
        .await
        .map_err(MonitoringApiError::Broker)?;

    let response: Vec<_> = messages.into_iter().map(to_dead_letter_response).collect();
    Ok(Json(response))
}
