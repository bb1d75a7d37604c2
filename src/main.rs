use birth_story::{
    DefaultAppState, build_metrics_layer_and_handle, build_metrics_router, build_router,
    client::create_hyper_client, config::Config, provider::OpenAiProvider,
};
use clap::Parser as _;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, instrument};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}

#[tokio::main]
#[instrument]
pub async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!("Starting story server with config: {:?}", config);

    let settings = config.provider_settings().inspect_err(|e| {
        error!("Refusing to start without generation capability: {}", e);
    })?;

    let http_client =
        create_hyper_client(config.pool_max_idle_per_host, config.pool_idle_timeout_secs);
    let provider = OpenAiProvider::new(http_client, settings)
        .map_err(|e| anyhow::anyhow!("Invalid provider URL '{}': {}", config.provider_url, e))?;
    info!(endpoint = %provider.endpoint(), model = %config.model, "Initialized story provider");

    let app_state: DefaultAppState = DefaultAppState::new(provider);
    let mut router = build_router(app_state);

    if config.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(config.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_addr).await?;
        info!("Metrics endpoint listening on {}", metrics_addr);

        let metrics_router = build_metrics_router(handle);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Server listening on {}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
