//! Error handling for the Farm Parcel Management Platform
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::geometry::GeometryError;
use shared::types::LocationError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Spatial invariant violations
    #[error("Sub-parcel boundary is not contained in its parent parcel")]
    NotContained,

    #[error("Sub-parcel boundary overlaps sibling '{0}'")]
    OverlapsExisting(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Delete blocked: {0}")]
    HasDependents(String),

    // Crop placement location errors
    #[error("Placement location is ambiguous: both parcel and sub-parcel set")]
    LocationAmbiguous,

    #[error("Placement location is missing: neither parcel nor sub-parcel set")]
    LocationMissing,

    #[error("Parcel has sub-parcels; placements must attach to a specific sub-parcel")]
    ParcelHasSubParcels,

    #[error("An active placement already exists at this location")]
    LocationOccupied,

    #[error("A non-empty justification is required for placement updates")]
    JustificationRequired,

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Ambiguous => AppError::LocationAmbiguous,
            LocationError::Missing => AppError::LocationMissing,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "TOKEN_EXPIRED".to_string(),
                    message_en: "Token has expired".to_string(),
                    message_es: "El token ha expirado".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_TOKEN".to_string(),
                    message_en: "Invalid token".to_string(),
                    message_es: "Token inválido".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message, message_es } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::InvalidGeometry(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_GEOMETRY".to_string(),
                    message_en: format!("Invalid polygon: {}", err),
                    message_es: "El polígono del límite no es válido".to_string(),
                    field: Some("polygon".to_string()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_es: format!("No se encontró {}", resource),
                    field: None,
                },
            ),
            AppError::NotContained => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NOT_CONTAINED".to_string(),
                    message_en: "Sub-parcel boundary must lie fully inside its parent parcel"
                        .to_string(),
                    message_es: "El límite del sublote debe estar completamente dentro del lote"
                        .to_string(),
                    field: Some("polygon".to_string()),
                },
            ),
            AppError::OverlapsExisting(sibling) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "OVERLAPS_EXISTING".to_string(),
                    message_en: format!("Sub-parcel boundary overlaps sibling '{}'", sibling),
                    message_es: format!("El límite del sublote se superpone con '{}'", sibling),
                    field: Some("polygon".to_string()),
                },
            ),
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_NAME".to_string(),
                    message_en: format!("A record named '{}' already exists here", name),
                    message_es: format!("Ya existe un registro con el nombre '{}'", name),
                    field: Some("name".to_string()),
                },
            ),
            AppError::HasDependents(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "HAS_DEPENDENTS".to_string(),
                    message_en: msg.clone(),
                    message_es: "No se puede eliminar: existen registros dependientes".to_string(),
                    field: None,
                },
            ),
            AppError::LocationAmbiguous => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "LOCATION_AMBIGUOUS".to_string(),
                    message_en: "Specify either a parcel or a sub-parcel, not both".to_string(),
                    message_es: "Indique un lote o un sublote, no ambos".to_string(),
                    field: Some("location".to_string()),
                },
            ),
            AppError::LocationMissing => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "LOCATION_MISSING".to_string(),
                    message_en: "A parcel or sub-parcel location is required".to_string(),
                    message_es: "Se requiere un lote o un sublote como ubicación".to_string(),
                    field: Some("location".to_string()),
                },
            ),
            AppError::ParcelHasSubParcels => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PARCEL_HAS_SUB_PARCELS".to_string(),
                    message_en: "This parcel has sub-parcels; attach the placement to one of them"
                        .to_string(),
                    message_es: "Este lote tiene sublotes; asigne el cultivo a uno de ellos"
                        .to_string(),
                    field: Some("location".to_string()),
                },
            ),
            AppError::LocationOccupied => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "LOCATION_OCCUPIED".to_string(),
                    message_en: "An active crop placement already exists at this location"
                        .to_string(),
                    message_es: "Ya existe un cultivo activo en esta ubicación".to_string(),
                    field: Some("location".to_string()),
                },
            ),
            AppError::JustificationRequired => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "JUSTIFICATION_REQUIRED".to_string(),
                    message_en: "Placement updates require a non-empty justification".to_string(),
                    message_es: "Las modificaciones del cultivo requieren una justificación"
                        .to_string(),
                    field: Some("justification".to_string()),
                },
            ),
            AppError::OperationNotSupported(msg) => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorDetail {
                    code: "OPERATION_NOT_SUPPORTED".to_string(),
                    message_en: msg.clone(),
                    message_es: "Operación no soportada".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("No se puede cambiar el estado: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_es: "Ocurrió un error de base de datos".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_es: "Ocurrió un error interno del servidor".to_string(),
                    field: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected request: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
