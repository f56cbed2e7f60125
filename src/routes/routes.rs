//! Defines routes for the car listings API.
//!
//! ## Structure
//! - **Listing endpoints** (one path, three methods)
//!   - `POST   /products` — create a listing (multipart form with pictures)
//!   - `GET    /products` — fetch one user's full document (`?username=`)
//!   - `DELETE /products` — remove one car by uuid (`?uuid=&username=`)
//!
//! - **Health endpoints**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (document store ping)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        listing_handlers::{create_listing, delete_listing, get_listings},
    },
    services::listing_service::ListingService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Request bodies carry up to ten in-memory image files.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build and return the router for all listing and health routes.
///
/// The router carries shared state (`ListingService`) to all handlers.
pub fn routes() -> Router<ListingService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // listing endpoints
        .route(
            "/products",
            post(create_listing).get(get_listings).delete(delete_listing),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
