use retell_bridge::application::RetellService;
use retell_bridge::config::Config;
use retell_bridge::infrastructure::jambonz::SessionHandler;
use retell_bridge::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting retell-bridge");
    info!("Configuration loaded: {:?}", config);

    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics()?;

    let service = Arc::new(RetellService::new(&config.retell));
    info!(
        "Serving Retell application on {} (trunk: {}, auth header: {})",
        service.path(),
        service.policy().trunk(),
        service.policy().auth_header()
    );

    let app = build_router(AppState { handler: service }, prometheus_handle);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}
