use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use journey_poller::config::{AppConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use journey_poller::hub::PollerHub;
use journey_poller::poller::Poller;
use journey_poller::registry::RouteRegistry;
use journey_poller::transperth::{TransperthClient, TransperthConfig};
use journey_poller::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,journey_poller=debug")),
        )
        .init();

    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match AppConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!(%path, error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let hub = PollerHub::new();

    for instance in config.instances {
        let client = TransperthClient::new(TransperthConfig::new().with_surface(instance.surface))
            .expect("Failed to create Transperth client");
        let registry =
            RouteRegistry::new(instance.routes).expect("Routes were validated on load");

        info!(
            instance = %instance.id,
            routes = registry.len(),
            interval_secs = instance.poll_interval.as_secs(),
            surface = ?instance.surface,
            "Starting poller"
        );

        let poller = Arc::new(Poller::new(registry, client));
        hub.register(instance.id, poller.clone()).await;

        // First tick is immediate
        tokio::spawn(poller.run(instance.poll_interval));
    }

    let app = create_router(AppState::new(hub));

    info!(addr = %config.listen, "Journey poller listening");
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  GET  /api/instances");
    info!("  GET  /api/instances/:id/routes[/:route[/options/:n]]");
    info!("  POST /api/refresh");

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
