use tower_http::trace::TraceLayer;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wx_ingest::api::{create_router, AppState};
use wx_ingest::config::Config;
use wx_ingest::db::{self, ReadingRepository, YearlyStatsRepository};
use wx_ingest::services::WeatherService;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wx_ingest=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting weather station API on {}", config.server_addr());

    // Create database connection pool
    let pool = db::connect(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    // Create repositories and services
    let weather_service = WeatherService::new(
        ReadingRepository::new(pool.clone()),
        YearlyStatsRepository::new(pool.clone()),
    );

    // Create API router
    let app_state = AppState { weather_service };
    let app = create_router(app_state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
