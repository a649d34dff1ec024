//! Request handlers.
//!
//! Generation never surfaces AI failures (the client falls back to
//! templates); the exchange endpoint surfaces every failure.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, warn};

use flowsmith_shared::{ElementKind, ErrorBody, GenerationRequest, OAuthExchangeRequest};

use crate::AppState;

/// Body of `POST /api/generate-element`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateElementBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(rename = "elementType", default)]
    pub element_type: Option<String>,
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

pub(crate) async fn generate_element(
    State(state): State<AppState>,
    body: Result<Json<GenerateElementBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable generate request body");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Prompt is required").with_description(rejection.body_text()),
            );
        }
    };

    let kind = body
        .element_type
        .as_deref()
        .and_then(ElementKind::parse_lenient);

    let request = match GenerationRequest::new(body.prompt.unwrap_or_default(), kind) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, ErrorBody::new(e.message())),
    };

    match state.completion.generate(&request).await {
        Ok(element) => (StatusCode::OK, Json(element)).into_response(),
        Err(e) => {
            error!(error = %e, "element generation unavailable");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Server configuration error").with_description(e.message()),
            )
        }
    }
}

pub(crate) async fn auth_exchange(
    State(state): State<AppState>,
    body: Result<Json<OAuthExchangeRequest>, JsonRejection>,
) -> Response {
    // An unreadable body carries no code.
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable exchange request body");
            OAuthExchangeRequest::default()
        }
    };

    match state.oauth.exchange(&request).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.to_body())
        }
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorBody::new("Method not allowed"),
    )
}

pub(crate) async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
