//! Lidora Functions - trigger delivery server.
//!
//! The hosting platform posts document, auth and analytics events to this
//! server; each request runs the matching handlers and reports what ran.
//!
//! # Configuration
//!
//! All settings come from `LIDORA__*` environment variables (a `.env` file is
//! read in development). See [`lidora_functions::config::AppConfig`].

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lidora_functions::adapters::{
    trigger_router, CloudLoggingReporter, FcmNotifier, FirestoreDocumentStore, GcpTokenSource,
    SmtpMailer, StripeConfig, StripePaymentAdapter, TriggerAppState,
};
use lidora_functions::application::{Services, TriggerDispatcher, TriggerSettings};
use lidora_functions::config::AppConfig;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[tokio::main]
async fn main() {
    let config = AppConfig::load().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    init_tracing(&config);

    let services = build_services(&config);
    let dispatcher = TriggerDispatcher::new(&services);
    for route in dispatcher.routes() {
        tracing::info!(
            pattern = %route.pattern,
            kind = %route.kind,
            handler = route.handler,
            "Registered document trigger"
        );
    }

    let state = TriggerAppState::new(
        dispatcher,
        config.server.trigger_signing_secret.as_deref(),
    );
    if state.verifier.is_none() {
        tracing::warn!("Trigger signing secret not set; deliveries are not authenticated");
    }

    let request_id = http::HeaderName::from_static(REQUEST_ID_HEADER);
    let app = trigger_router()
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    let addr = config
        .server
        .socket_addr()
        .expect("Invalid bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("lidora-functions listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// EnvFilter from `RUST_LOG`, falling back to the configured level.
/// JSON output in production, text locally.
fn init_tracing(config: &AppConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.server.log_level.clone().into());

    let production = config.is_production();
    let json_layer =
        production.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!production).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn build_services(config: &AppConfig) -> Services {
    let gcp = &config.gcp;
    let tokens = Arc::new(match (&gcp.access_token, &gcp.firestore_emulator_host) {
        (Some(token), _) => GcpTokenSource::fixed(token.clone()),
        (None, Some(_)) => GcpTokenSource::anonymous(),
        (None, None) => GcpTokenSource::metadata_server(),
    });

    let mut store = FirestoreDocumentStore::new(&gcp.project_id, tokens.clone());
    if let Some(host) = &gcp.firestore_emulator_host {
        tracing::info!(host = %host, "Using Firestore emulator");
        store = store.with_emulator(host);
    }

    let mut stripe = StripeConfig::new(config.payment.stripe_api_key.clone())
        .with_api_version(config.payment.api_version.clone());
    if let Some(url) = &config.payment.api_base_url {
        stripe = stripe.with_base_url(url.clone());
    }
    if config.payment.is_test_mode() {
        tracing::info!("Stripe is in test mode");
    }

    let mailer = SmtpMailer::new(&config.email).expect("Failed to configure SMTP transport");

    let mut push = FcmNotifier::new(config.notification.fcm_server_key.clone());
    if let Some(endpoint) = &config.notification.fcm_endpoint {
        push = push.with_endpoint(endpoint.clone());
    }

    let reporter = CloudLoggingReporter::new(gcp.project_id.clone(), gcp.function_name.clone(), tokens);

    Services {
        store: Arc::new(store),
        payments: Arc::new(StripePaymentAdapter::new(stripe)),
        mailer: Arc::new(mailer),
        push: Arc::new(push),
        reporter: Arc::new(reporter),
        settings: TriggerSettings::from_config(config),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
