use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tourdesk::config::{AppConfig, StoreBackend};
use tourdesk::db::sqlite::SqliteStore;
use tourdesk::db::supabase::SupabaseStore;
use tourdesk::db::DocumentStore;
use tourdesk::handlers;
use tourdesk::services::payments::paystack::PaystackGateway;
use tourdesk::services::payments::PaymentGateway;
use tourdesk::services::sessions::SessionRegistry;
use tourdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Box<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Supabase => {
            anyhow::ensure!(
                !config.supabase_url.is_empty() && !config.supabase_anon_key.is_empty(),
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set when STORE_BACKEND=supabase"
            );
            tracing::info!("using Supabase store (url: {})", config.supabase_url);
            Box::new(SupabaseStore::new(
                &config.supabase_url,
                config.supabase_anon_key.clone(),
            ))
        }
        StoreBackend::Sqlite => {
            tracing::info!("using SQLite store (path: {})", config.database_url);
            Box::new(SqliteStore::open(
                &config.database_url,
                &config.migrations_dir,
            )?)
        }
    };

    let payments: Option<Box<dyn PaymentGateway>> = if config.payments_enabled() {
        tracing::info!("Paystack payments enabled ({})", config.currency);
        Some(Box::new(PaystackGateway::new(
            config.paystack_secret_key.clone(),
            config.paystack_callback_url.clone(),
        )))
    } else {
        tracing::warn!("PAYSTACK_SECRET_KEY not set, payments are disabled");
        None
    };

    let state = Arc::new(AppState {
        sessions: SessionRegistry::new(config.session_settings()),
        config: config.clone(),
        store,
        payments,
    });

    spawn_session_pruner(Arc::clone(&state));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/quote", post(handlers::catalog::quote))
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route("/api/sessions/:id", get(handlers::sessions::get_session))
        .route(
            "/api/sessions/:id/select",
            post(handlers::sessions::select_service),
        )
        .route(
            "/api/sessions/:id/booking",
            post(handlers::sessions::submit_booking),
        )
        .route(
            "/api/sessions/:id/cancel",
            post(handlers::sessions::cancel_booking),
        )
        .route(
            "/api/sessions/:id/payment",
            post(handlers::sessions::begin_payment),
        )
        .route(
            "/api/sessions/:id/payment/success",
            post(handlers::sessions::payment_success),
        )
        .route(
            "/api/sessions/:id/payment/cancel",
            post(handlers::sessions::payment_cancelled),
        )
        .route(
            "/api/sessions/:id/confirmation",
            get(handlers::sessions::get_confirmation),
        )
        .route(
            "/api/sessions/:id/confirmation.ics",
            get(handlers::sessions::download_ics),
        )
        .route(
            "/api/sessions/:id/close",
            post(handlers::sessions::close_confirmation),
        )
        .route(
            "/api/sessions/:id/events",
            get(handlers::sessions::events_stream),
        )
        .route(
            "/webhook/paystack",
            post(handlers::webhook::paystack_webhook),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_pruner(state: Arc<AppState>) {
    let max_idle = chrono::Duration::minutes(state.config.session_idle_minutes);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let pruned = state.sessions.prune_idle(max_idle);
            if pruned > 0 {
                tracing::info!(pruned, remaining = state.sessions.len(), "pruned idle sessions");
            }
        }
    });
}
