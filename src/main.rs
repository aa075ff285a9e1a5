use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rental_saas::config::Config;
use rental_saas::db::TenantDb;
use rental_saas::handlers::{self, AppState};
use rental_saas::payments::{PaymentProcessor, StripeProcessor};
use rental_saas::service::{BookingService, CarService, PaymentService};
use rental_saas::webhooks::WebhookNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Configuration is read once; secrets live here for the process
    // lifetime and are passed down explicitly.
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rental API server on port {}", config.server_port);

    let db = TenantDb::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .context("Failed to run migrations")?;

    if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; payment processor calls will fail");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessor::new(
        http.clone(),
        config.stripe_base_url.clone(),
        config.stripe_secret_key.clone(),
    ));
    let notifier = WebhookNotifier::spawn(db.clone(), http);

    let state = AppState {
        pool: db.pool().clone(),
        db: db.clone(),
        bookings: BookingService::new(db.clone(), Arc::clone(&processor), notifier.clone()),
        payments: PaymentService::new(db.clone(), processor, config.stripe_webhook_secret.clone()),
        cars: CarService::new(db),
    };

    // Build application router
    let app = Router::new()
        .nest("/api/cars", handlers::cars::router())
        .nest("/api/bookings", handlers::bookings::router())
        .nest("/api/payments", handlers::payments::router())
        .nest("/api/webhooks", handlers::payments::webhook_router())
        .nest("/api/settings", handlers::settings::router())
        .merge(handlers::health::router())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutting down server...");
}
