mod applications;
mod auditions;
mod cache;
mod config;
mod db;
mod errors;
mod forums;
mod llm_client;
mod matching;
mod messaging;
mod models;
mod notifications;
mod profiles;
mod projects;
mod routes;
mod shortlist;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::shortlist::scorer::LlmApplicantScorer;
use crate::state::AppState;
use crate::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: missing required variables stop startup
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("casting_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting casting API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = Cache::new(redis, config.recommendation_cache_ttl_secs);
    info!(
        "Recommendation cache ready (ttl {}s)",
        config.recommendation_cache_ttl_secs
    );

    // Object storage
    let s3 = build_s3_client(&config).await;
    let storage = Storage::new(s3, config.buckets.clone(), config.signed_url_ttl_secs);
    info!("S3 client initialized ({})", config.s3_endpoint);

    // AI gateway
    let llm = LlmClient::new(
        config.ai_gateway_api_key.clone(),
        config.ai_gateway_url.clone(),
    )?;
    info!(
        "LLM client initialized (text: {}, vision: {})",
        llm_client::TEXT_MODEL,
        llm_client::VISION_MODEL
    );
    let shortlist_scorer = Arc::new(LlmApplicantScorer(llm.clone()));

    let state = AppState {
        db,
        cache,
        storage,
        llm,
        shortlist_scorer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client for MinIO or a managed S3-compatible endpoint. Path-style
/// addressing keeps bucket names out of the host.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "casting-api-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
