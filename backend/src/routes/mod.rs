//! Route definitions for the Farm Parcel Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - parcel management
        .nest("/parcels", parcel_routes())
        // Protected routes - sub-parcel management
        .nest("/sub-parcels", sub_parcel_routes())
        // Protected routes - crop placement management
        .nest("/placements", placement_routes())
}

/// Parcel management routes (protected)
fn parcel_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_parcels).post(handlers::create_parcel))
        .route(
            "/:parcel_id",
            get(handlers::get_parcel)
                .put(handlers::update_parcel)
                .delete(handlers::delete_parcel),
        )
        .route(
            "/:parcel_id/sub-parcels",
            get(handlers::list_sub_parcels).post(handlers::create_sub_parcel),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sub-parcel management routes (protected)
fn sub_parcel_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:sub_parcel_id",
            get(handlers::get_sub_parcel)
                .put(handlers::update_sub_parcel)
                .delete(handlers::delete_sub_parcel),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Crop placement routes (protected)
fn placement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_placements).post(handlers::create_placement),
        )
        .route(
            "/:placement_id",
            get(handlers::get_placement)
                .put(handlers::update_placement)
                .delete(handlers::delete_placement),
        )
        .route("/:placement_id/finalize", post(handlers::finalize_placement))
        .route("/:placement_id/costs", post(handlers::accumulate_cost))
        .route("/:placement_id/history", get(handlers::get_placement_history))
        .route_layer(middleware::from_fn(auth_middleware))
}
