use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use traino_api::{build_router, state::AppState};
use traino_config::Settings;
use traino_db::{connect, indexes::ensure_indexes};
use traino_services::notify::check_sms_configuration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "traino_api=debug,traino_services=debug,traino_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!(
        "Starting Traino API on {}:{}",
        settings.app.host, settings.app.port
    );

    // Carrier credentials are advisory at startup: log what is wrong and
    // keep going, SMS just stays unavailable.
    let report = check_sms_configuration(&settings.sms);
    for issue in &report.issues {
        warn!(%issue, "SMS configuration issue");
    }
    for warning in &report.warnings {
        warn!(%warning, "SMS configuration warning");
    }
    if report.is_configured {
        info!("SMS carrier configured");
    } else {
        info!("SMS carrier not configured; SMS channel unavailable");
    }

    // Connect to MongoDB
    let db = connect(&settings).await?;

    // Ensure indexes
    ensure_indexes(&db).await?;

    // Build app state
    let app_state = AppState::new(db, settings.clone())?;

    // Start the notification sweep
    app_state
        .sweeper
        .clone()
        .spawn(settings.notifier.sweep_interval_secs);

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
