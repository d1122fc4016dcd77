//! HTTP handlers for trigger deliveries.
//!
//! Bodies are taken as raw bytes so the signature can be checked against
//! exactly what was sent before anything is parsed.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::application::TriggerDispatcher;
use crate::domain::trigger::{AnalyticsEvent, AuthEvent};

use super::dto::{DocumentEventRequest, ErrorResponse, HandledResponse};
use super::signature::{SignatureError, TriggerSignatureVerifier, SIGNATURE_HEADER};

/// Shared state for the trigger routes.
#[derive(Clone)]
pub struct TriggerAppState {
    pub dispatcher: Arc<TriggerDispatcher>,
    /// Signature checks are skipped when `None`.
    pub verifier: Option<Arc<TriggerSignatureVerifier>>,
}

impl TriggerAppState {
    pub fn new(dispatcher: TriggerDispatcher, signing_secret: Option<&str>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            verifier: signing_secret.map(|s| Arc::new(TriggerSignatureVerifier::new(s))),
        }
    }

    fn authenticate(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), TriggerApiError> {
        let Some(verifier) = &self.verifier else {
            return Ok(());
        };
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        verifier.verify(header, body).map_err(|e| {
            tracing::warn!(error = %e, "Rejected trigger delivery");
            TriggerApiError::Unauthorized(e)
        })
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn handle_document_event(
    State(state): State<TriggerAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<HandledResponse>, TriggerApiError> {
    state.authenticate(&headers, &body)?;
    let request: DocumentEventRequest = parse_body(&body)?;
    let event = request
        .into_event()
        .map_err(|e| TriggerApiError::BadRequest(e.to_string()))?;
    let handled = state.dispatcher.dispatch_document(event).await;
    Ok(Json(handled.into()))
}

pub async fn handle_auth_event(
    State(state): State<TriggerAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<HandledResponse>, TriggerApiError> {
    state.authenticate(&headers, &body)?;
    let event: AuthEvent = parse_body(&body)?;
    if event.uid().trim().is_empty() {
        return Err(TriggerApiError::BadRequest("uid cannot be empty".to_string()));
    }
    let handled = state.dispatcher.dispatch_auth(event).await;
    Ok(Json(handled.into()))
}

pub async fn handle_analytics_event(
    State(state): State<TriggerAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<HandledResponse>, TriggerApiError> {
    state.authenticate(&headers, &body)?;
    let event: AnalyticsEvent = parse_body(&body)?;
    let handled = state.dispatcher.dispatch_analytics(event).await;
    Ok(Json(handled.into()))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TriggerApiError> {
    serde_json::from_slice(body).map_err(|e| TriggerApiError::BadRequest(e.to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Delivery rejected before any handler ran.
#[derive(Debug)]
pub enum TriggerApiError {
    Unauthorized(SignatureError),
    BadRequest(String),
}

impl IntoResponse for TriggerApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            TriggerApiError::Unauthorized(e) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_SIGNATURE", e.to_string()),
            ),
            TriggerApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("INVALID_EVENT", message),
            ),
        };
        (status, Json(body)).into_response()
    }
}
