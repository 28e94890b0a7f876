//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tintworks_core::config::TintworksConfig;
use tintworks_faq::{ChatSession, KnowledgeBase};
use tintworks_identity::IdentityProvider;
use tintworks_mail::Mailer;
use tintworks_payments::PaymentClient;
use tintworks_store::OrderStore;

/// Shared state for the gateway server. Every collaborator is constructed
/// once here and injected — there are no process-wide singletons.
pub struct AppState {
    pub config: TintworksConfig,
    pub start_time: std::time::Instant,
    /// The FAQ knowledge base — read-only, shared across all sessions.
    pub knowledge: Arc<KnowledgeBase>,
    /// Live chat sessions by id. Transcripts are owned by their session.
    pub sessions: Mutex<HashMap<String, ChatSession>>,
    /// Payment processor client. `None` when no secret key is configured;
    /// checkout then fails with a configuration error.
    pub payments: Option<PaymentClient>,
    pub identity: Arc<dyn IdentityProvider>,
    /// SMTP mailer. `None` when mail is disabled; sends are skipped with a
    /// log line.
    pub mailer: Option<Arc<Mailer>>,
    pub store: Arc<OrderStore>,
    /// Resolved payment-webhook signing secret.
    pub payment_webhook_secret: String,
    /// Resolved signup-webhook shared secret.
    pub signup_webhook_secret: String,
}

/// Build the Axum router with all routes.
pub fn build_router(shared: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/v1/info", get(super::routes::system_info))
        .route("/api/v1/services", get(super::routes::list_services))
        .route("/api/v1/checkout", post(super::routes::create_checkout))
        // Chat API
        .route("/api/v1/chat", post(super::routes::chat_message))
        .route(
            "/api/v1/chat/suggestions",
            get(super::routes::chat_suggestions),
        )
        .route(
            "/api/v1/chat/{session_id}",
            get(super::routes::chat_transcript),
        )
        // Order lookup for the payment-success page
        .route("/api/v1/orders/{id}", get(super::routes::get_order))
        .route(
            "/api/v1/orders/by-session/{session_id}",
            get(super::routes::order_by_session),
        )
        // Webhooks — public, authenticated by signature
        .route(
            "/api/v1/webhooks/payment",
            post(super::routes::payment_webhook),
        )
        .route(
            "/api/v1/webhooks/signup",
            post(super::routes::signup_webhook),
        )
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Restrict CORS origins in production via env var
            // Example: TINTWORKS_CORS_ORIGINS=https://shop.example.com
            if let Ok(origins_str) = std::env::var("TINTWORKS_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                // Development fallback — allow all origins
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Construct all collaborators from config and start the HTTP server.
pub async fn start(config: TintworksConfig) -> anyhow::Result<()> {
    let knowledge = Arc::new(KnowledgeBase::builtin());
    tracing::info!("FAQ knowledge base loaded: {} entries", knowledge.len());

    // Order store
    let db_path = config.store.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = OrderStore::open(&db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open order store: {e}"))?;
    tracing::info!("Order store ready: {}", db_path.display());

    // Payment processor client
    let payments = match PaymentClient::from_config(&config.payments) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("Payment client not available: {e} — checkout disabled");
            None
        }
    };

    // Identity provider
    let identity: Arc<dyn IdentityProvider> = match tintworks_identity::from_config(&config.identity)
    {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(
                "Identity provider not available: {e} — all checkout tokens will be rejected"
            );
            let empty = tintworks_core::config::IdentityConfig {
                backend: "static".into(),
                ..Default::default()
            };
            Arc::new(tintworks_identity::StaticIdentityProvider::from_config(
                &empty,
            ))
        }
    };

    // Mailer
    let mailer = if config.mail.enabled {
        match Mailer::from_config(&config.mail) {
            Ok(m) => Some(Arc::new(m)),
            Err(e) => {
                tracing::warn!("Mailer not available: {e} — emails disabled");
                None
            }
        }
    } else {
        tracing::info!("Mail disabled by config");
        None
    };

    let payment_webhook_secret = config.payments.resolve_webhook_secret();
    if payment_webhook_secret.is_empty() {
        tracing::warn!(
            "Payment webhook secret is not set — payment webhooks will be rejected"
        );
    }
    let signup_webhook_secret = config.identity.resolve_signup_webhook_secret();

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState {
        config,
        start_time: std::time::Instant::now(),
        knowledge,
        sessions: Mutex::new(HashMap::new()),
        payments,
        identity,
        mailer,
        store: Arc::new(store),
        payment_webhook_secret,
        signup_webhook_secret,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
