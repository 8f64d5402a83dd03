use image_gallery::{
    config::{Config, ACCESS_API, IMAGE_API},
    gallery::{self, Gallery},
    metrics::Telemetry,
    routes,
    template::PageTemplate,
    Error,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_gallery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        environment = %config.environment,
        metrics_enabled = config.metrics.enabled,
        failure_probability = config.faults.failure_probability,
        "Configuration loaded"
    );

    let template = PageTemplate::load(&config.template.path)?;
    let client = gallery::http_client(config.client.timeout())?;
    let gallery = Arc::new(Gallery::new(
        client,
        config.api_url(IMAGE_API)?,
        config.api_url(ACCESS_API)?,
        template,
    ));

    // A registration conflict here is fatal.
    let telemetry = if config.metrics.enabled {
        Some(Telemetry::new()?)
    } else {
        None
    };

    let app = routes::build_routes(gallery, config.faults.failure_probability, telemetry)?;

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Io)?;
    info!("Image gallery listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Image gallery shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
