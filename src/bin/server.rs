use horizon::server::{router, ServerState};
use horizon::HorizonConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Horizon time-series server");

    // Load configuration from environment
    let config = HorizonConfig::from_env();
    config.validate()?;

    info!("Bind address: {}", config.bind_address);
    info!("Default timezone: {}", config.default_timezone);
    info!("Default preset: {}", config.default_preset);

    let app = router(ServerState::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
