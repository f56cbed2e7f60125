use anyhow::Result;
use axum::Router;
use mongodb::Client;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::{listing_service::ListingService, media_service::CloudinaryClient};

/// Database used when the connection string does not name one.
const DEFAULT_DATABASE: &str = "cars";

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting car-listings with config: {:?}", cfg);

    // --- Initialize MongoDB connection ---
    let client = Client::with_uri_str(&cfg.mongodb_uri).await?;
    let db = client
        .default_database()
        .unwrap_or_else(|| client.database(DEFAULT_DATABASE));

    // --- Initialize media store client ---
    let media = CloudinaryClient::new(cfg.media.clone());

    // --- Initialize core service ---
    let listings = ListingService::new(db, media);

    // Client construction is lazy; round-trip a ping so a bad connection
    // string fails at startup rather than on the first request.
    listings.ping().await?;
    tracing::info!("Connected to MongoDB");

    // --- Build router ---
    let app: Router = routes::routes::routes()
        .with_state(listings)
        .layer(CorsLayer::permissive());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
