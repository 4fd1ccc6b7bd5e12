//! Sub-parcel management HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::services::sub_parcel::{CreateSubParcelInput, SubParcelService, UpdateSubParcelInput};
use crate::AppState;

/// List a parcel's sub-parcels
pub async fn list_sub_parcels(
    State(state): State<AppState>,
    Path(parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SubParcelService::new(state.db.clone(), state.events.clone());

    match service.list_by_parcel(parcel_id).await {
        Ok(sub_parcels) => (
            StatusCode::OK,
            Json(serde_json::json!({ "sub_parcels": sub_parcels })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific sub-parcel
pub async fn get_sub_parcel(
    State(state): State<AppState>,
    Path(sub_parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SubParcelService::new(state.db.clone(), state.events.clone());

    match service.get(sub_parcel_id).await {
        Ok(sub_parcel) => (StatusCode::OK, Json(sub_parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a sub-parcel under a parcel
pub async fn create_sub_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(parcel_id): Path<Uuid>,
    Json(input): Json<CreateSubParcelInput>,
) -> impl IntoResponse {
    let service = SubParcelService::new(state.db.clone(), state.events.clone());

    match service.create(current_user.user_id, parcel_id, input).await {
        Ok(sub_parcel) => (StatusCode::CREATED, Json(sub_parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a sub-parcel
pub async fn update_sub_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(sub_parcel_id): Path<Uuid>,
    Json(input): Json<UpdateSubParcelInput>,
) -> impl IntoResponse {
    let service = SubParcelService::new(state.db.clone(), state.events.clone());

    match service
        .update(current_user.user_id, sub_parcel_id, input)
        .await
    {
        Ok(sub_parcel) => (StatusCode::OK, Json(sub_parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Soft-delete a sub-parcel
pub async fn delete_sub_parcel(
    State(state): State<AppState>,
    Extension(current_user): Extension<AuthUser>,
    Path(sub_parcel_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SubParcelService::new(state.db.clone(), state.events.clone());

    match service.delete(current_user.user_id, sub_parcel_id).await {
        Ok(sub_parcel) => (StatusCode::OK, Json(sub_parcel)).into_response(),
        Err(e) => e.into_response(),
    }
}
