//! Crop placement HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::services::placement::{
    AccumulateCostInput, CreatePlacementInput, FinalizePlacementInput, PlacementFilter,
    PlacementService, UpdatePlacementInput,
};
use crate::AppState;

/// List crop placements with optional filters
pub async fn list_placements(
    State(state): State<AppState>,
    Query(filter): Query<PlacementFilter>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service.list(filter).await {
        Ok(placements) => (
            StatusCode::OK,
            Json(serde_json::json!({ "placements": placements })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a placement with its resolved location
pub async fn get_placement(
    State(state): State<AppState>,
    Path(placement_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service.get_with_location(placement_id).await {
        Ok(placement) => (StatusCode::OK, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a crop placement
pub async fn create_placement(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Json(input): Json<CreatePlacementInput>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service.create(current_user.user_id, input).await {
        Ok(placement) => (StatusCode::CREATED, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a crop placement (justification required)
pub async fn update_placement(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(placement_id): Path<Uuid>,
    Json(input): Json<UpdatePlacementInput>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service
        .update(current_user.user_id, placement_id, input)
        .await
    {
        Ok(placement) => (StatusCode::OK, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Finalize a crop placement
pub async fn finalize_placement(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(placement_id): Path<Uuid>,
    Json(input): Json<FinalizePlacementInput>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service
        .finalize(current_user.user_id, placement_id, input)
        .await
    {
        Ok(placement) => (StatusCode::OK, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Placements are never hard-deleted; this always reports the policy.
pub async fn delete_placement(
    State(state): State<AppState>,
    Path(placement_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service.delete(placement_id).await {
        Ok(placement) => (StatusCode::OK, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Post a cost amount to a placement's running total
pub async fn accumulate_cost(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(placement_id): Path<Uuid>,
    Json(input): Json<AccumulateCostInput>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service
        .accumulate_cost(current_user.user_id, placement_id, input)
        .await
    {
        Ok(placement) => (StatusCode::OK, Json(placement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Audit history for a placement
pub async fn get_placement_history(
    State(state): State<AppState>,
    Path(placement_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = PlacementService::new(state.db.clone(), state.events.clone());

    match service.history(placement_id).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({ "history": entries })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
