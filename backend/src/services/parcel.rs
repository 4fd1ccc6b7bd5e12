//! Parcel management service for top-level land units

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use shared::geometry;
use shared::types::{Point, Polygon};
use shared::validation::validate_name;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventKind, EventSink};
use crate::services::sub_parcel::SubParcel;

/// Parcel service for managing land parcels and their derived geometry
#[derive(Clone)]
pub struct ParcelService {
    db: PgPool,
    events: Arc<dyn EventSink>,
}

/// Parcel lifecycle status, independent of soft deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    Active,
    Inactive,
}

impl ParcelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Active => "active",
            ParcelStatus::Inactive => "inactive",
        }
    }
}

/// Parcel information with derived geometry fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Parcel {
    pub id: Uuid,
    pub name: String,
    pub polygon: Json<Polygon>,
    pub area_m2: f64,
    pub area_ha: f64,
    pub centroid: Json<Point>,
    pub description: Option<String>,
    pub status: ParcelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parcel with its sub-parcels, ordered by creation
#[derive(Debug, Clone, Serialize)]
pub struct ParcelWithSubParcels {
    #[serde(flatten)]
    pub parcel: Parcel,
    pub sub_parcels: Vec<SubParcel>,
}

/// Input for creating a parcel
#[derive(Debug, Deserialize)]
pub struct CreateParcelInput {
    pub name: String,
    pub polygon: Polygon,
    pub description: Option<String>,
}

/// Input for updating a parcel
#[derive(Debug, Deserialize)]
pub struct UpdateParcelInput {
    pub name: Option<String>,
    pub polygon: Option<Polygon>,
    pub description: Option<String>,
    pub status: Option<ParcelStatus>,
}

/// Filters for listing parcels
#[derive(Debug, Default, Deserialize)]
pub struct ParcelFilter {
    /// Case-insensitive name substring
    pub name: Option<String>,
    pub status: Option<ParcelStatus>,
}

const PARCEL_COLUMNS: &str = "id, name, polygon, area_m2, area_ha, centroid, \
     description, status, created_at, updated_at";

/// Compute the derived geometry fields for a boundary polygon. Coordinates
/// are geographic degrees (x = longitude, y = latitude); the metric area is
/// the planar approximation the kernel provides for field-sized parcels.
pub(crate) fn derive_geometry(polygon: &Polygon) -> AppResult<(f64, f64, Point)> {
    let area_m2 = geometry::approx_area_m2(polygon)?;
    let centroid = geometry::centroid(polygon)?;
    Ok((area_m2, area_m2 / geometry::M2_PER_HECTARE, centroid))
}

impl ParcelService {
    /// Create a new ParcelService instance
    pub fn new(db: PgPool, events: Arc<dyn EventSink>) -> Self {
        Self { db, events }
    }

    /// Get a parcel by ID, excluding soft-deleted rows
    pub async fn get(&self, parcel_id: Uuid) -> AppResult<Parcel> {
        let parcel = sqlx::query_as::<_, Parcel>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(parcel_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parcel".to_string()))?;

        Ok(parcel)
    }

    /// Get a parcel together with its live sub-parcels
    pub async fn get_with_sub_parcels(&self, parcel_id: Uuid) -> AppResult<ParcelWithSubParcels> {
        let parcel = self.get(parcel_id).await?;

        let sub_parcels = sqlx::query_as::<_, SubParcel>(
            r#"
            SELECT id, parcel_id, name, polygon, area_m2, area_ha, centroid,
                   description, status, created_at, updated_at
            FROM sub_parcels
            WHERE parcel_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(parcel_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ParcelWithSubParcels {
            parcel,
            sub_parcels,
        })
    }

    /// List parcels with optional name/status filters
    pub async fn list(&self, filter: ParcelFilter) -> AppResult<Vec<Parcel>> {
        let name_pattern = filter.name.map(|n| format!("%{}%", n));
        let parcels = sqlx::query_as::<_, Parcel>(&format!(
            r#"
            SELECT {PARCEL_COLUMNS}
            FROM parcels
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR name ILIKE $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY created_at ASC
            "#
        ))
        .bind(name_pattern)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(parcels)
    }

    /// Create a parcel, deriving its area and centroid from the boundary
    pub async fn create(&self, user_id: Uuid, input: CreateParcelInput) -> AppResult<Parcel> {
        if let Err(msg) = validate_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_es: "El nombre del lote no es válido".to_string(),
            });
        }

        let (area_m2, area_ha, centroid) = derive_geometry(&input.polygon)?;

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM parcels WHERE LOWER(name) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if duplicate > 0 {
            return Err(AppError::DuplicateName(input.name));
        }

        let parcel = sqlx::query_as::<_, Parcel>(&format!(
            r#"
            INSERT INTO parcels (name, polygon, area_m2, area_ha, centroid, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING {PARCEL_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(Json(&input.polygon))
        .bind(area_m2)
        .bind(area_ha)
        .bind(Json(&centroid))
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(parcel_id = %parcel.id, %user_id, "parcel created");
        self.events.emit(DomainEvent::new(
            "parcel",
            EventKind::Created,
            parcel.id,
            serde_json::to_value(&parcel).unwrap_or(Value::Null),
        ));

        Ok(parcel)
    }

    /// Update a parcel, recomputing derived fields on geometry change
    pub async fn update(
        &self,
        user_id: Uuid,
        parcel_id: Uuid,
        input: UpdateParcelInput,
    ) -> AppResult<Parcel> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Parcel>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(parcel_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Parcel".to_string()))?;

        if let Some(ref name) = input.name {
            if let Err(msg) = validate_name(name) {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: msg.to_string(),
                    message_es: "El nombre del lote no es válido".to_string(),
                });
            }

            let duplicate = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM parcels WHERE LOWER(name) = LOWER($1) AND id != $2 AND deleted_at IS NULL",
            )
            .bind(name)
            .bind(parcel_id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate > 0 {
                return Err(AppError::DuplicateName(name.clone()));
            }
        }

        let (polygon, area_m2, area_ha, centroid) = match input.polygon {
            Some(polygon) => {
                let (area_m2, area_ha, centroid) = derive_geometry(&polygon)?;
                (polygon, area_m2, area_ha, centroid)
            }
            None => (
                existing.polygon.0.clone(),
                existing.area_m2,
                existing.area_ha,
                existing.centroid.0,
            ),
        };

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let status = input.status.unwrap_or(existing.status);

        let parcel = sqlx::query_as::<_, Parcel>(&format!(
            r#"
            UPDATE parcels
            SET name = $1, polygon = $2, area_m2 = $3, area_ha = $4, centroid = $5,
                description = $6, status = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {PARCEL_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(Json(&polygon))
        .bind(area_m2)
        .bind(area_ha)
        .bind(Json(&centroid))
        .bind(&description)
        .bind(status)
        .bind(parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(parcel_id = %parcel.id, %user_id, "parcel updated");
        self.events.emit(DomainEvent::new(
            "parcel",
            EventKind::Updated,
            parcel.id,
            serde_json::to_value(&parcel).unwrap_or(Value::Null),
        ));

        Ok(parcel)
    }

    /// Soft-delete a parcel. Blocked while it owns live sub-parcels or an
    /// active crop placement sits directly on it.
    pub async fn delete(&self, user_id: Uuid, parcel_id: Uuid) -> AppResult<Parcel> {
        let mut tx = self.db.begin().await?;

        let parcel = sqlx::query_as::<_, Parcel>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(parcel_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Parcel".to_string()))?;

        let sub_parcel_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sub_parcels WHERE parcel_id = $1 AND deleted_at IS NULL",
        )
        .bind(parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        if sub_parcel_count > 0 {
            return Err(AppError::HasDependents(format!(
                "Cannot delete parcel: {} sub-parcels are linked to it",
                sub_parcel_count
            )));
        }

        let active_placements = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM crop_placements WHERE parcel_id = $1 AND status = 'active'",
        )
        .bind(parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_placements > 0 {
            return Err(AppError::HasDependents(format!(
                "Cannot delete parcel: {} active crop placements are linked to it",
                active_placements
            )));
        }

        sqlx::query("UPDATE parcels SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(parcel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(parcel_id = %parcel.id, %user_id, "parcel deleted");
        self.events.emit(DomainEvent::new(
            "parcel",
            EventKind::Deleted,
            parcel.id,
            serde_json::to_value(&parcel).unwrap_or(Value::Null),
        ));

        Ok(parcel)
    }
}
