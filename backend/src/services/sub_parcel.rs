//! Sub-parcel management service
//!
//! Sub-parcel writes are validated against the parent boundary (containment)
//! and against live siblings (overlap) inside one transaction, with the
//! parent parcel row locked so two concurrent writes cannot both pass the
//! checks against a stale snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::geometry;
use shared::types::{Point, Polygon};
use shared::validation::validate_name;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventKind, EventSink};
use crate::services::parcel::{Parcel, ParcelStatus};

/// Sub-parcel service for managing parcel subdivisions
#[derive(Clone)]
pub struct SubParcelService {
    db: PgPool,
    events: Arc<dyn EventSink>,
}

/// Sub-parcel information with derived geometry fields
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubParcel {
    pub id: Uuid,
    pub parcel_id: Uuid,
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

/// Input for creating a sub-parcel
#[derive(Debug, Deserialize)]
pub struct CreateSubParcelInput {
    pub name: String,
    pub polygon: Polygon,
    pub description: Option<String>,
}

/// Input for updating a sub-parcel. The owning parcel is immutable.
#[derive(Debug, Deserialize)]
pub struct UpdateSubParcelInput {
    pub name: Option<String>,
    pub polygon: Option<Polygon>,
    pub description: Option<String>,
    pub status: Option<ParcelStatus>,
}

const SUB_PARCEL_COLUMNS: &str = "id, parcel_id, name, polygon, area_m2, area_ha, centroid, \
     description, status, created_at, updated_at";

impl SubParcelService {
    /// Create a new SubParcelService instance
    pub fn new(db: PgPool, events: Arc<dyn EventSink>) -> Self {
        Self { db, events }
    }

    /// Get a sub-parcel by ID, excluding soft-deleted rows
    pub async fn get(&self, sub_parcel_id: Uuid) -> AppResult<SubParcel> {
        let sub_parcel = sqlx::query_as::<_, SubParcel>(&format!(
            "SELECT {SUB_PARCEL_COLUMNS} FROM sub_parcels WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(sub_parcel_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-parcel".to_string()))?;

        Ok(sub_parcel)
    }

    /// List a parcel's live sub-parcels, ordered by creation
    pub async fn list_by_parcel(&self, parcel_id: Uuid) -> AppResult<Vec<SubParcel>> {
        let sub_parcels = sqlx::query_as::<_, SubParcel>(&format!(
            r#"
            SELECT {SUB_PARCEL_COLUMNS}
            FROM sub_parcels
            WHERE parcel_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#
        ))
        .bind(parcel_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sub_parcels)
    }

    /// Create a sub-parcel under a parent parcel. The boundary must lie
    /// fully inside the parent and must not overlap any live sibling.
    pub async fn create(
        &self,
        user_id: Uuid,
        parcel_id: Uuid,
        input: CreateSubParcelInput,
    ) -> AppResult<SubParcel> {
        if let Err(msg) = validate_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_es: "El nombre del sublote no es válido".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let parent = lock_parent(&mut tx, parcel_id).await?;

        if !geometry::contains(&parent.polygon.0, &input.polygon)? {
            return Err(AppError::NotContained);
        }

        self.check_sibling_overlap(&mut tx, parcel_id, &input.polygon, None)
            .await?;

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sub_parcels WHERE parcel_id = $1 AND LOWER(name) = LOWER($2) AND deleted_at IS NULL",
        )
        .bind(parcel_id)
        .bind(&input.name)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate > 0 {
            return Err(AppError::DuplicateName(input.name));
        }

        let (area_m2, area_ha, centroid) = super::parcel::derive_geometry(&input.polygon)?;

        let sub_parcel = sqlx::query_as::<_, SubParcel>(&format!(
            r#"
            INSERT INTO sub_parcels (parcel_id, name, polygon, area_m2, area_ha, centroid, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            RETURNING {SUB_PARCEL_COLUMNS}
            "#
        ))
        .bind(parcel_id)
        .bind(&input.name)
        .bind(Json(&input.polygon))
        .bind(area_m2)
        .bind(area_ha)
        .bind(Json(&centroid))
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(sub_parcel_id = %sub_parcel.id, %parcel_id, %user_id, "sub-parcel created");
        self.events.emit(DomainEvent::new(
            "sub_parcel",
            EventKind::Created,
            sub_parcel.id,
            serde_json::to_value(&sub_parcel).unwrap_or(Value::Null),
        ));

        Ok(sub_parcel)
    }

    /// Update a sub-parcel. A boundary change re-runs containment against
    /// the parent and overlap checks against siblings, excluding self.
    pub async fn update(
        &self,
        user_id: Uuid,
        sub_parcel_id: Uuid,
        input: UpdateSubParcelInput,
    ) -> AppResult<SubParcel> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, SubParcel>(&format!(
            "SELECT {SUB_PARCEL_COLUMNS} FROM sub_parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(sub_parcel_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-parcel".to_string()))?;

        // Lock the parent for the duration even when the polygon is not
        // changing, so sibling writes serialize on the same row.
        let parent = lock_parent(&mut tx, existing.parcel_id).await?;

        if let Some(ref name) = input.name {
            if let Err(msg) = validate_name(name) {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: msg.to_string(),
                    message_es: "El nombre del sublote no es válido".to_string(),
                });
            }

            let duplicate = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sub_parcels WHERE parcel_id = $1 AND LOWER(name) = LOWER($2) AND id != $3 AND deleted_at IS NULL",
            )
            .bind(existing.parcel_id)
            .bind(name)
            .bind(sub_parcel_id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate > 0 {
                return Err(AppError::DuplicateName(name.clone()));
            }
        }

        let (polygon, area_m2, area_ha, centroid) = match input.polygon {
            Some(polygon) => {
                if !geometry::contains(&parent.polygon.0, &polygon)? {
                    return Err(AppError::NotContained);
                }
                self.check_sibling_overlap(&mut tx, existing.parcel_id, &polygon, Some(sub_parcel_id))
                    .await?;
                let (area_m2, area_ha, centroid) = super::parcel::derive_geometry(&polygon)?;
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

        let sub_parcel = sqlx::query_as::<_, SubParcel>(&format!(
            r#"
            UPDATE sub_parcels
            SET name = $1, polygon = $2, area_m2 = $3, area_ha = $4, centroid = $5,
                description = $6, status = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {SUB_PARCEL_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(Json(&polygon))
        .bind(area_m2)
        .bind(area_ha)
        .bind(Json(&centroid))
        .bind(&description)
        .bind(status)
        .bind(sub_parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(sub_parcel_id = %sub_parcel.id, %user_id, "sub-parcel updated");
        self.events.emit(DomainEvent::new(
            "sub_parcel",
            EventKind::Updated,
            sub_parcel.id,
            serde_json::to_value(&sub_parcel).unwrap_or(Value::Null),
        ));

        Ok(sub_parcel)
    }

    /// Soft-delete a sub-parcel. Blocked while an active crop placement
    /// references it.
    pub async fn delete(&self, user_id: Uuid, sub_parcel_id: Uuid) -> AppResult<SubParcel> {
        let mut tx = self.db.begin().await?;

        let sub_parcel = sqlx::query_as::<_, SubParcel>(&format!(
            "SELECT {SUB_PARCEL_COLUMNS} FROM sub_parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(sub_parcel_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sub-parcel".to_string()))?;

        let active_placements = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM crop_placements WHERE sub_parcel_id = $1 AND status = 'active'",
        )
        .bind(sub_parcel_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_placements > 0 {
            return Err(AppError::HasDependents(format!(
                "Cannot delete sub-parcel: {} active crop placements are linked to it",
                active_placements
            )));
        }

        sqlx::query("UPDATE sub_parcels SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(sub_parcel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(sub_parcel_id = %sub_parcel.id, %user_id, "sub-parcel deleted");
        self.events.emit(DomainEvent::new(
            "sub_parcel",
            EventKind::Deleted,
            sub_parcel.id,
            serde_json::to_value(&sub_parcel).unwrap_or(Value::Null),
        ));

        Ok(sub_parcel)
    }

    /// Pairwise overlap scan against live siblings, excluding `exclude_id`
    /// on updates. Runs inside the caller's transaction, under the parent
    /// row lock.
    async fn check_sibling_overlap(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        parcel_id: Uuid,
        polygon: &Polygon,
        exclude_id: Option<Uuid>,
    ) -> AppResult<()> {
        let siblings = sqlx::query_as::<_, SubParcel>(&format!(
            r#"
            SELECT {SUB_PARCEL_COLUMNS}
            FROM sub_parcels
            WHERE parcel_id = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id != $2)
            ORDER BY created_at ASC
            "#
        ))
        .bind(parcel_id)
        .bind(exclude_id)
        .fetch_all(&mut **tx)
        .await?;

        for sibling in &siblings {
            if geometry::overlaps(polygon, &sibling.polygon.0)? {
                return Err(AppError::OverlapsExisting(sibling.name.clone()));
            }
        }

        Ok(())
    }
}

/// Lock the parent parcel row for the duration of a sub-parcel write.
async fn lock_parent(tx: &mut Transaction<'_, Postgres>, parcel_id: Uuid) -> AppResult<Parcel> {
    sqlx::query_as::<_, Parcel>(
        r#"
        SELECT id, name, polygon, area_m2, area_ha, centroid,
               description, status, created_at, updated_at
        FROM parcels
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(parcel_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Parcel".to_string()))
}
