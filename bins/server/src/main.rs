//! CashTrackr API server.
//!
//! Main entry point for the budgeting backend.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cashtrackr_api::{AppState, RateLimiter, create_router};
use cashtrackr_db::connect;
use cashtrackr_shared::{
    AppConfig, EmailService, EmailTransport, Environment, JwtConfig, JwtService, Mailer,
    OUTBOX_CAPACITY, OutboxMailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.environment);

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        session_token_expires_days: config.jwt.session_token_expiry_days,
    });

    let mailer: Arc<dyn Mailer> = match config.email.transport {
        EmailTransport::Smtp => {
            info!(
                smtp_host = %config.email.smtp_host,
                smtp_port = %config.email.smtp_port,
                "Email service configured"
            );
            Arc::new(EmailService::new(config.email.clone()))
        }
        EmailTransport::Log => {
            info!(capacity = OUTBOX_CAPACITY, "Emails are logged to the in-process outbox");
            Arc::new(OutboxMailer::new(config.email.frontend_url.clone()))
        }
    };

    let max_requests = config.rate_limit_max_requests();
    info!(
        window_secs = config.rate_limit.window_secs,
        max_requests,
        trust_proxy = config.rate_limit.trust_proxy,
        "Rate limit configured"
    );

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        mailer,
        rate_limiter: Arc::new(
            RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                max_requests,
            )
            .trust_proxy(config.rate_limit.trust_proxy),
        ),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// JSON logs in production, human readable output elsewhere.
fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| environment.default_log_filter().into());
    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
