//! Axum router for trigger deliveries.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    handle_analytics_event, handle_auth_event, handle_document_event, health, TriggerAppState,
};

/// Create the trigger router.
///
/// # Routes
/// - `GET /health` - Liveness probe
/// - `POST /triggers/document` - Document create/update/delete events
/// - `POST /triggers/auth` - Identity created/deleted events
/// - `POST /triggers/analytics` - Analytics conversion events
pub fn trigger_router() -> Router<TriggerAppState> {
    Router::new().route("/health", get(health)).nest(
        "/triggers",
        Router::new()
            .route("/document", post(handle_document_event))
            .route("/auth", post(handle_auth_event))
            .route("/analytics", post(handle_analytics_event)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::email::InMemoryMailer;
    use crate::adapters::push::InMemoryPushNotifier;
    use crate::adapters::reporting::InMemoryErrorReporter;
    use crate::adapters::store::InMemoryDocumentStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::{Services, TriggerDispatcher, TriggerSettings};
    use crate::config::AccountProfileConfig;

    use super::super::signature::{TriggerSignatureVerifier, SIGNATURE_HEADER};

    const SECRET: &str = "trigger_secret_0123456789abcdefghij";

    fn app(secret: Option<&str>) -> (Router, Arc<InMemoryPushNotifier>) {
        let push = Arc::new(InMemoryPushNotifier::new());
        let services = Services {
            store: Arc::new(InMemoryDocumentStore::new()),
            payments: Arc::new(MockPaymentProvider::new()),
            mailer: Arc::new(InMemoryMailer::new()),
            push: push.clone(),
            reporter: Arc::new(InMemoryErrorReporter::new()),
            settings: TriggerSettings {
                from_email: "Lidora <noreply@lidora.app>".into(),
                operator_address: "ops@lidora.app".into(),
                device_token: "device-1".into(),
                default_transfer_destination: None,
                account_profile: AccountProfileConfig::default(),
            },
        };
        let state = TriggerAppState::new(TriggerDispatcher::new(&services), secret);
        (trigger_router().with_state(state), push)
    }

    fn post(uri: &str, body: &Value, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn first_open() -> Value {
        json!({
            "name": "first_open",
            "user": {
                "device_info": {"mobile_model_name": "Pixel 7"},
                "geo_info": {"city": "Lisbon", "country": "Portugal"}
            }
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app(None);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn analytics_event_runs_lifecycle_handler() {
        let (app, push) = app(None);
        let response = app
            .oneshot(post("/triggers/analytics", &first_open(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"handled": ["notify_app_lifecycle"]})
        );
        assert_eq!(push.sent().len(), 1);
    }

    #[tokio::test]
    async fn unmatched_document_event_handles_nothing() {
        let (app, _) = app(None);
        let body = json!({"path": "customers/u1/orders/o1", "kind": "create", "after": {}});
        let response = app
            .oneshot(post("/triggers/document", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"handled": []}));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (app, _) = app(None);
        let body = json!({"path": "customers", "kind": "create", "after": {}});
        let response = app
            .oneshot(post("/triggers/document", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_EVENT");
    }

    #[tokio::test]
    async fn unsigned_delivery_is_rejected_when_secret_is_set() {
        let (app, push) = app(Some(SECRET));
        let response = app
            .oneshot(post("/triggers/analytics", &first_open(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "INVALID_SIGNATURE");
        assert!(push.sent().is_empty());
    }

    #[tokio::test]
    async fn signed_delivery_is_accepted() {
        let (app, push) = app(Some(SECRET));
        let body = first_open();
        let signature = TriggerSignatureVerifier::new(SECRET)
            .sign(chrono::Utc::now().timestamp(), body.to_string().as_bytes());
        let response = app
            .oneshot(post("/triggers/analytics", &body, Some(signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(push.sent().len(), 1);
    }
}
