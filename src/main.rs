mod core;
mod features;
mod modules;
mod shared;

use crate::core::app::create_router;
use crate::core::config::Config;
use crate::features::auth;
use crate::features::files::{FileService, UploadRouter};
use crate::modules::storage::{StorageProvider, UploadThingClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Initialize auth
    let jwt_validator = Arc::new(auth::JwtValidator::new(
        &config.auth.jwt_secret,
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Shared upstream HTTP client
    let mut http_builder = reqwest::Client::builder();
    if let Some(timeout) = config.uploadthing.request_timeout {
        http_builder = http_builder.timeout(timeout);
    }
    let http_client = http_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    // Initialize UploadThing client for storage
    let uploadthing_client =
        UploadThingClient::new(config.uploadthing.clone(), http_client.clone());
    if !uploadthing_client.is_configured() {
        tracing::warn!(
            "UPLOADTHING_TOKEN is not defined in environment variables; storage calls will fail"
        );
    }
    let storage: Arc<dyn StorageProvider> = Arc::new(uploadthing_client);

    // Initialize File Service
    let file_service = Arc::new(FileService::new(Arc::clone(&storage), http_client));
    tracing::info!("File service initialized");

    // Initialize web SDK upload router
    let upload_router = Arc::new(UploadRouter::new(
        storage,
        config.uploadthing.callback_url.clone(),
    ));
    tracing::info!(
        "Upload router initialized (callback: {})",
        config.uploadthing.callback_url
    );

    let app = create_router(&config, jwt_validator, file_service, upload_router);

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive =
        socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server is running on port {}", config.app.port);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
