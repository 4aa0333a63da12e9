mod config;
mod dashboard;
mod errors;
mod models;
mod routes;
mod session;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageConfig};
use crate::routes::build_router;
use crate::session::StaticTokenSessions;
use crate::state::AppState;
use crate::storage::{
    FileStore, KvStore, MemoryFileStore, MemoryKvStore, RedisKvStore, S3FileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Vault v{}", env!("CARGO_PKG_VERSION"));

    let (kv, files) = build_stores(&config.storage).await?;
    let sessions = Arc::new(StaticTokenSessions::new(config.session_tokens.clone()));
    info!("Session gate initialized ({} tokens)", config.session_tokens.len());

    let state = AppState::new(config.clone(), kv, files, sessions);

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client has a fixed host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_stores(storage: &StorageConfig) -> Result<(Arc<dyn KvStore>, Arc<dyn FileStore>)> {
    match storage {
        StorageConfig::Remote {
            redis_url,
            kv_namespace,
            s3_bucket,
            s3_endpoint,
            aws_access_key_id,
            aws_secret_access_key,
        } => {
            let redis = redis::Client::open(redis_url.clone())?;
            info!("Redis client initialized (namespace: {kv_namespace})");

            let s3 = build_s3_client(s3_endpoint, aws_access_key_id, aws_secret_access_key).await;
            info!("S3 client initialized (bucket: {s3_bucket})");

            let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::new(redis, kv_namespace.clone()));
            let files: Arc<dyn FileStore> = Arc::new(S3FileStore::new(s3, s3_bucket.clone()));
            Ok((kv, files))
        }
        StorageConfig::Memory => {
            warn!("Using in-memory stores; all records are lost on restart");
            let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
            let files: Arc<dyn FileStore> = Arc::new(MemoryFileStore::new());
            Ok((kv, files))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "resume-vault-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
