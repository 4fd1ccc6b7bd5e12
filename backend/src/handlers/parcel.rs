//! Parcel management HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::services::parcel::{CreateParcelInput, ParcelFilter, ParcelService, UpdateParcelInput};
use crate::AppState;

/// List parcels with optional name/status filters
pub async fn list_parcels(
    State(state): State<AppState>,
    Query(filter): Query<ParcelFilter>,
) -> impl IntoResponse {
    let service = ParcelService::new(state.db.clone(), state.events.clone());

    match service.list(filter).await {
        Ok(parcels) => (
            StatusCode::OK,
            Json(serde_json::json!({ "parcels": parcels })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific parcel with its sub-parcels
pub async fn get_parcel(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ParcelService::new(state.db.clone(), state.events.clone());

    match service.get_with_sub_parcels(parcel_id).await {
        Ok(parcel) => (StatusCode::OK, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new parcel
pub async fn create_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Json(input): Json<CreateParcelInput>,
) -> impl IntoResponse {
    let service = ParcelService::new(state.db.clone(), state.events.clone());

    match service.create(current_user.user_id, input).await {
        Ok(parcel) => (StatusCode::CREATED, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a parcel
pub async fn update_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(parcel_id): Path<Uuid>,
    Json(input): Json<UpdateParcelInput>,
) -> impl IntoResponse {
    let service = ParcelService::new(state.db.clone(), state.events.clone());

    match service.update(current_user.user_id, parcel_id, input).await {
        Ok(parcel) => (StatusCode::OK, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Soft-delete a parcel
pub async fn delete_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ParcelService::new(state.db.clone(), state.events.clone());

    match service.delete(current_user.user_id, parcel_id).await {
        Ok(parcel) => (StatusCode::OK, Json(parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}
