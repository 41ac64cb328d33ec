//! HTTP surface.
//!
//! | Route         | Behavior                                                    |
//! |---------------|-------------------------------------------------------------|
//! | `POST /claim` | `{"address"}` → 200 `{"amount", "response"}`, else 400 text |
//! | `GET /`       | 200, empty body (liveness)                                  |

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use faucet_types::{FaucetError, constants};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::coordinator::GrantCoordinator;

#[derive(Debug, Deserialize)]
struct ClaimRequest {
    address: String,
}

/// Build the router. Fails if an allowed origin is not a valid header value.
pub fn router(
    coordinator: Arc<GrantCoordinator>,
    allowed_origins: &[String],
) -> faucet_types::Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                FaucetError::Configuration(format!("allowed origin {origin:?}: {e}"))
            })
        })
        .collect::<faucet_types::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(health))
        .route("/claim", post(claim))
        .layer(RequestBodyLimitLayer::new(constants::MAX_CLAIM_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator))
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn claim(State(coordinator): State<Arc<GrantCoordinator>>, body: Bytes) -> Response {
    let request: ClaimRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return bad_request(&FaucetError::InvalidRequest {
                reason: e.to_string(),
            });
        }
    };

    // Detached so a client disconnect cannot abandon an admitted claim
    // before its refund runs.
    let task = tokio::spawn(async move { coordinator.claim(&request.address).await });
    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(FaucetError::Internal(format!("claim task: {e}"))),
    };

    match outcome {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(err) => bad_request(&err),
    }
}

fn bad_request(err: &FaucetError) -> Response {
    if !err.is_client_error() {
        tracing::warn!(error = %err, "claim failed");
    }
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}
