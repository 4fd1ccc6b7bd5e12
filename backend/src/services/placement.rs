//! Crop placement management service
//!
//! A crop placement occupies exactly one concrete location: a childless
//! parcel or a specific sub-parcel. At most one active placement may exist
//! per location, and every update writes an audit history row with a
//! field-level diff and a mandatory justification. Placements are never
//! hard-deleted.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::types::Location;
use shared::validation::{validate_cost_amount, validate_justification, validate_name};

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventKind, EventSink};
use crate::services::parcel::Parcel;
use crate::services::sub_parcel::SubParcel;

/// Crop placement service
#[derive(Clone)]
pub struct PlacementService {
    db: PgPool,
    events: Arc<dyn EventSink>,
}

/// Crop placement lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Active,
    Finalized,
    Inactive,
}

impl PlacementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStatus::Active => "active",
            PlacementStatus::Finalized => "finalized",
            PlacementStatus::Inactive => "inactive",
        }
    }
}

/// Crop placement record. The two nullable location columns mirror the
/// storage shape; logic goes through [`CropPlacement::location`], which
/// yields the sum type and cannot observe an invalid both/neither state
/// (the schema CHECK constraint upholds the XOR at rest).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CropPlacement {
    pub id: Uuid,
    pub name: String,
    pub crop_type: Option<String>,
    pub description: Option<String>,
    pub parcel_id: Option<Uuid>,
    pub sub_parcel_id: Option<Uuid>,
    pub planting_date: Option<NaiveDate>,
    pub finalization_date: Option<NaiveDate>,
    pub status: PlacementStatus,
    pub cost_total: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CropPlacement {
    /// The placement's concrete location as a sum type.
    pub fn location(&self) -> AppResult<Location> {
        Ok(Location::from_columns(self.parcel_id, self.sub_parcel_id)?)
    }
}

/// Immutable audit entry written once per placement update call
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlacementHistory {
    pub id: Uuid,
    pub placement_id: Uuid,
    pub user_id: Uuid,
    pub justification: String,
    /// Field name -> { previous, new }, or null when no value changed
    pub changes: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
}

/// Placement with its resolved location
#[derive(Debug, Clone, Serialize)]
pub struct PlacementWithLocation {
    #[serde(flatten)]
    pub placement: CropPlacement,
    /// The parcel hosting the placement, or the parent of its sub-parcel
    pub parcel: Option<Parcel>,
    pub sub_parcel: Option<SubParcel>,
}

/// Input for creating a crop placement
#[derive(Debug, Deserialize)]
pub struct CreatePlacementInput {
    pub name: String,
    pub crop_type: Option<String>,
    pub description: Option<String>,
    pub parcel_id: Option<Uuid>,
    pub sub_parcel_id: Option<Uuid>,
    pub planting_date: Option<NaiveDate>,
}

/// Input for updating a crop placement. Every call requires a non-empty
/// justification, even when no field value actually changes.
#[derive(Debug, Deserialize)]
pub struct UpdatePlacementInput {
    pub justification: Option<String>,
    pub name: Option<String>,
    pub crop_type: Option<String>,
    pub description: Option<String>,
    pub parcel_id: Option<Uuid>,
    pub sub_parcel_id: Option<Uuid>,
    pub planting_date: Option<NaiveDate>,
    pub status: Option<PlacementStatus>,
}

/// Input for finalizing a placement
#[derive(Debug, Deserialize)]
pub struct FinalizePlacementInput {
    /// Defaults to today when omitted
    pub finalization_date: Option<NaiveDate>,
}

/// Input for posting a cost to a placement
#[derive(Debug, Deserialize)]
pub struct AccumulateCostInput {
    pub amount: Decimal,
}

/// Filters for listing placements
#[derive(Debug, Default, Deserialize)]
pub struct PlacementFilter {
    pub status: Option<PlacementStatus>,
    pub parcel_id: Option<Uuid>,
    pub sub_parcel_id: Option<Uuid>,
}

const PLACEMENT_COLUMNS: &str = "id, name, crop_type, description, parcel_id, sub_parcel_id, \
     planting_date, finalization_date, status, cost_total, created_by, created_at, updated_at";

/// Record a changed field in the audit diff. Equal values record nothing.
pub fn diff_entry(changes: &mut Map<String, Value>, field: &str, previous: Value, new: Value) {
    if previous != new {
        changes.insert(
            field.to_string(),
            json!({ "previous": previous, "new": new }),
        );
    }
}

/// Canonical form for dates in the audit diff (ISO-8601 or null).
pub fn date_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => Value::String(d.to_string()),
        None => Value::Null,
    }
}

/// Canonical form for id references in the audit diff.
pub fn id_value(id: Option<Uuid>) -> Value {
    match id {
        Some(id) => Value::String(id.to_string()),
        None => Value::Null,
    }
}

impl PlacementService {
    /// Create a new PlacementService instance
    pub fn new(db: PgPool, events: Arc<dyn EventSink>) -> Self {
        Self { db, events }
    }

    /// Get a placement by ID
    pub async fn get(&self, placement_id: Uuid) -> AppResult<CropPlacement> {
        let placement = sqlx::query_as::<_, CropPlacement>(&format!(
            "SELECT {PLACEMENT_COLUMNS} FROM crop_placements WHERE id = $1"
        ))
        .bind(placement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop placement".to_string()))?;

        Ok(placement)
    }

    /// Get a placement with its location resolved: the sub-parcel it sits
    /// on (plus the parent parcel), or the parcel it sits on directly.
    pub async fn get_with_location(&self, placement_id: Uuid) -> AppResult<PlacementWithLocation> {
        let placement = self.get(placement_id).await?;

        let (parcel, sub_parcel) = match placement.location()? {
            Location::Parcel(parcel_id) => {
                let parcel = fetch_parcel(&self.db, parcel_id).await?;
                (parcel, None)
            }
            Location::SubParcel(sub_parcel_id) => {
                let sub_parcel = sqlx::query_as::<_, SubParcel>(
                    r#"
                    SELECT id, parcel_id, name, polygon, area_m2, area_ha, centroid,
                           description, status, created_at, updated_at
                    FROM sub_parcels
                    WHERE id = $1
                    "#,
                )
                .bind(sub_parcel_id)
                .fetch_optional(&self.db)
                .await?;
                let parent = match &sub_parcel {
                    Some(sp) => fetch_parcel(&self.db, sp.parcel_id).await?,
                    None => None,
                };
                (parent, sub_parcel)
            }
        };

        Ok(PlacementWithLocation {
            placement,
            parcel,
            sub_parcel,
        })
    }

    /// List placements with optional status/location filters
    pub async fn list(&self, filter: PlacementFilter) -> AppResult<Vec<CropPlacement>> {
        let placements = sqlx::query_as::<_, CropPlacement>(&format!(
            r#"
            SELECT {PLACEMENT_COLUMNS}
            FROM crop_placements
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR parcel_id = $2)
              AND ($3::uuid IS NULL OR sub_parcel_id = $3)
            ORDER BY created_at ASC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.parcel_id)
        .bind(filter.sub_parcel_id)
        .fetch_all(&self.db)
        .await?;

        Ok(placements)
    }

    /// Audit history for a placement, newest first
    pub async fn history(&self, placement_id: Uuid) -> AppResult<Vec<PlacementHistory>> {
        // Ensure the placement exists so a bad id reads as 404, not [].
        self.get(placement_id).await?;

        let entries = sqlx::query_as::<_, PlacementHistory>(
            r#"
            SELECT id, placement_id, user_id, justification, changes, created_at
            FROM placement_history
            WHERE placement_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(placement_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Create a crop placement at a free concrete location
    pub async fn create(&self, user_id: Uuid, input: CreatePlacementInput) -> AppResult<CropPlacement> {
        if let Err(msg) = validate_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
                message_es: "El nombre del cultivo no es válido".to_string(),
            });
        }

        let location = Location::from_columns(input.parcel_id, input.sub_parcel_id)?;

        let mut tx = self.db.begin().await?;

        lock_location(&mut tx, location).await?;
        assert_location_free(&mut tx, location, None).await?;

        let (parcel_id, sub_parcel_id) = location.to_columns();
        let placement = sqlx::query_as::<_, CropPlacement>(&format!(
            r#"
            INSERT INTO crop_placements
                (name, crop_type, description, parcel_id, sub_parcel_id,
                 planting_date, status, cost_total, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', 0, $7)
            RETURNING {PLACEMENT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.crop_type)
        .bind(&input.description)
        .bind(parcel_id)
        .bind(sub_parcel_id)
        .bind(input.planting_date)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_occupancy_conflict)?;

        tx.commit().await?;

        tracing::info!(placement_id = %placement.id, %user_id, "crop placement created");
        self.events.emit(DomainEvent::new(
            "crop_placement",
            EventKind::Created,
            placement.id,
            serde_json::to_value(&placement).unwrap_or(Value::Null),
        ));

        Ok(placement)
    }

    /// Update a crop placement. The justification is mandatory for every
    /// call; the placement row and exactly one history row (carrying the
    /// field diff, or null when nothing changed) commit in one transaction.
    pub async fn update(
        &self,
        user_id: Uuid,
        placement_id: Uuid,
        input: UpdatePlacementInput,
    ) -> AppResult<CropPlacement> {
        let justification = input.justification.as_deref().unwrap_or("");
        if validate_justification(justification).is_err() {
            return Err(AppError::JustificationRequired);
        }

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, CropPlacement>(&format!(
            "SELECT {PLACEMENT_COLUMNS} FROM crop_placements WHERE id = $1 FOR UPDATE"
        ))
        .bind(placement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop placement".to_string()))?;

        if let Some(ref name) = input.name {
            if let Err(msg) = validate_name(name) {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: msg.to_string(),
                    message_es: "El nombre del cultivo no es válido".to_string(),
                });
            }
        }

        let current_location = existing.location()?;
        let new_location = if input.parcel_id.is_some() || input.sub_parcel_id.is_some() {
            Location::from_columns(input.parcel_id, input.sub_parcel_id)?
        } else {
            current_location
        };

        let new_status = match input.status {
            None => existing.status,
            Some(status) => {
                validate_status_patch(existing.status, status)?;
                status
            }
        };

        let (needs_location_lock, needs_occupancy_check) =
            location_checks(current_location, new_location, existing.status, new_status);
        if needs_location_lock {
            lock_location(&mut tx, new_location).await?;
        }
        if needs_occupancy_check {
            assert_location_free(&mut tx, new_location, Some(placement_id)).await?;
        }

        let name = input.name.clone().unwrap_or_else(|| existing.name.clone());
        let crop_type = input.crop_type.clone().or_else(|| existing.crop_type.clone());
        let description = input
            .description
            .clone()
            .or_else(|| existing.description.clone());
        let planting_date = input.planting_date.or(existing.planting_date);
        let (parcel_id, sub_parcel_id) = new_location.to_columns();

        let mut changes = Map::new();
        diff_entry(&mut changes, "name", json!(existing.name), json!(name));
        diff_entry(
            &mut changes,
            "crop_type",
            json!(existing.crop_type),
            json!(crop_type),
        );
        diff_entry(
            &mut changes,
            "description",
            json!(existing.description),
            json!(description),
        );
        diff_entry(
            &mut changes,
            "parcel_id",
            id_value(existing.parcel_id),
            id_value(parcel_id),
        );
        diff_entry(
            &mut changes,
            "sub_parcel_id",
            id_value(existing.sub_parcel_id),
            id_value(sub_parcel_id),
        );
        diff_entry(
            &mut changes,
            "planting_date",
            date_value(existing.planting_date),
            date_value(planting_date),
        );
        diff_entry(
            &mut changes,
            "status",
            json!(existing.status.as_str()),
            json!(new_status.as_str()),
        );
        let changes = if changes.is_empty() {
            None
        } else {
            Some(Json(Value::Object(changes)))
        };

        let placement = sqlx::query_as::<_, CropPlacement>(&format!(
            r#"
            UPDATE crop_placements
            SET name = $1, crop_type = $2, description = $3, parcel_id = $4,
                sub_parcel_id = $5, planting_date = $6, status = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {PLACEMENT_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&crop_type)
        .bind(&description)
        .bind(parcel_id)
        .bind(sub_parcel_id)
        .bind(planting_date)
        .bind(new_status)
        .bind(placement_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_occupancy_conflict)?;

        sqlx::query(
            r#"
            INSERT INTO placement_history (placement_id, user_id, justification, changes)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(placement_id)
        .bind(user_id)
        .bind(justification)
        .bind(&changes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(placement_id = %placement.id, %user_id, "crop placement updated");
        self.events.emit(DomainEvent::new(
            "crop_placement",
            EventKind::Updated,
            placement.id,
            serde_json::to_value(&placement).unwrap_or(Value::Null),
        ));

        Ok(placement)
    }

    /// Finalize an active placement, setting its finalization date.
    /// Irreversible in the normal flow.
    pub async fn finalize(
        &self,
        user_id: Uuid,
        placement_id: Uuid,
        input: FinalizePlacementInput,
    ) -> AppResult<CropPlacement> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, CropPlacement>(&format!(
            "SELECT {PLACEMENT_COLUMNS} FROM crop_placements WHERE id = $1 FOR UPDATE"
        ))
        .bind(placement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop placement".to_string()))?;

        match existing.status {
            PlacementStatus::Finalized => {
                return Err(AppError::InvalidStateTransition(
                    "placement is already finalized".to_string(),
                ));
            }
            PlacementStatus::Inactive => {
                return Err(AppError::InvalidStateTransition(
                    "only active placements can be finalized".to_string(),
                ));
            }
            PlacementStatus::Active => {}
        }

        let finalization_date = input
            .finalization_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let placement = sqlx::query_as::<_, CropPlacement>(&format!(
            r#"
            UPDATE crop_placements
            SET status = 'finalized', finalization_date = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {PLACEMENT_COLUMNS}
            "#
        ))
        .bind(finalization_date)
        .bind(placement_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(placement_id = %placement.id, %user_id, "crop placement finalized");
        self.events.emit(DomainEvent::new(
            "crop_placement",
            EventKind::Updated,
            placement.id,
            serde_json::to_value(&placement).unwrap_or(Value::Null),
        ));

        Ok(placement)
    }

    /// Hard deletion is a policy violation: history rows reference the
    /// placement and must stay resolvable. Callers transition status
    /// instead.
    pub async fn delete(&self, _placement_id: Uuid) -> AppResult<CropPlacement> {
        Err(AppError::OperationNotSupported(
            "Crop placements are never deleted; finalize or deactivate them instead".to_string(),
        ))
    }

    /// Atomically add a cost amount to the placement's running total.
    /// A single in-place increment, safe under concurrent callers.
    pub async fn accumulate_cost(
        &self,
        user_id: Uuid,
        placement_id: Uuid,
        input: AccumulateCostInput,
    ) -> AppResult<CropPlacement> {
        if let Err(msg) = validate_cost_amount(input.amount) {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: msg.to_string(),
                message_es: "El monto debe ser positivo".to_string(),
            });
        }

        let placement = sqlx::query_as::<_, CropPlacement>(&format!(
            r#"
            UPDATE crop_placements
            SET cost_total = cost_total + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {PLACEMENT_COLUMNS}
            "#
        ))
        .bind(input.amount)
        .bind(placement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop placement".to_string()))?;

        tracing::info!(placement_id = %placement.id, %user_id, amount = %input.amount, "cost posted");
        self.events.emit(DomainEvent::new(
            "crop_placement",
            EventKind::Updated,
            placement.id,
            serde_json::to_value(&placement).unwrap_or(Value::Null),
        ));

        Ok(placement)
    }
}

/// Status changes allowed through the generic update patch. Finalization
/// has its own operation and is irreversible.
fn validate_status_patch(current: PlacementStatus, requested: PlacementStatus) -> AppResult<()> {
    match (current, requested) {
        (PlacementStatus::Active, PlacementStatus::Active)
        | (PlacementStatus::Inactive, PlacementStatus::Inactive)
        | (PlacementStatus::Finalized, PlacementStatus::Finalized) => Ok(()),
        (PlacementStatus::Active, PlacementStatus::Inactive)
        | (PlacementStatus::Inactive, PlacementStatus::Active) => Ok(()),
        (PlacementStatus::Finalized, _) => Err(AppError::InvalidStateTransition(
            "finalized placements cannot change status".to_string(),
        )),
        (_, PlacementStatus::Finalized) => Err(AppError::InvalidStateTransition(
            "use the finalize operation to finalize a placement".to_string(),
        )),
    }
}

/// Which target-location checks an update needs. The location row must be
/// locked (re-running existence and the most-specific-location rule) both
/// when the placement moves and when it returns to active at a tenancy it
/// did not already hold, since the location may have been subdivided or
/// occupied while the placement was inactive. Occupancy is re-checked in
/// exactly the will-be-active cases.
fn location_checks(
    current: Location,
    new: Location,
    current_status: PlacementStatus,
    new_status: PlacementStatus,
) -> (bool, bool) {
    let occupancy = new_status == PlacementStatus::Active
        && (new != current || current_status != PlacementStatus::Active);
    (new != current || occupancy, occupancy)
}

/// True for unique violations raised by the partial indexes that back
/// single-active-tenancy at the store level.
fn is_occupancy_conflict(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some("23505")
        && constraint.map_or(false, |c| c.starts_with("uq_active_placement"))
}

/// A concurrent writer winning the occupancy race trips the partial unique
/// index; surface that as the occupancy conflict, not a storage failure.
fn map_occupancy_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if is_occupancy_conflict(db.code().as_deref(), db.constraint()) {
            return AppError::LocationOccupied;
        }
    }
    AppError::DatabaseError(err)
}

/// Lock the target location row and enforce the most-specific-location
/// rule: a parcel with live sub-parcels may not host a placement directly.
async fn lock_location(tx: &mut Transaction<'_, Postgres>, location: Location) -> AppResult<()> {
    match location {
        Location::Parcel(parcel_id) => {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            )
            .bind(parcel_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Parcel".to_string()))?;

            let sub_parcel_count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sub_parcels WHERE parcel_id = $1 AND deleted_at IS NULL",
            )
            .bind(parcel_id)
            .fetch_one(&mut **tx)
            .await?;

            if sub_parcel_count > 0 {
                return Err(AppError::ParcelHasSubParcels);
            }
        }
        Location::SubParcel(sub_parcel_id) => {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM sub_parcels WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            )
            .bind(sub_parcel_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Sub-parcel".to_string()))?;
        }
    }
    Ok(())
}

/// Fail with `LocationOccupied` if another active placement holds the
/// location. Runs under the location row lock; the partial unique indexes
/// in the schema back this check against races the lock cannot see.
async fn assert_location_free(
    tx: &mut Transaction<'_, Postgres>,
    location: Location,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let (parcel_id, sub_parcel_id) = location.to_columns();
    let occupied = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM crop_placements
        WHERE status = 'active'
          AND ($1::uuid IS NULL OR parcel_id = $1)
          AND ($2::uuid IS NULL OR sub_parcel_id = $2)
          AND ($3::uuid IS NULL OR id != $3)
        "#,
    )
    .bind(parcel_id)
    .bind(sub_parcel_id)
    .bind(exclude_id)
    .fetch_one(&mut **tx)
    .await?;

    if occupied > 0 {
        return Err(AppError::LocationOccupied);
    }
    Ok(())
}

async fn fetch_parcel(db: &PgPool, parcel_id: Uuid) -> AppResult<Option<Parcel>> {
    let parcel = sqlx::query_as::<_, Parcel>(
        r#"
        SELECT id, name, polygon, area_m2, area_ha, centroid,
               description, status, created_at, updated_at
        FROM parcels
        WHERE id = $1
        "#,
    )
    .bind(parcel_id)
    .fetch_optional(db)
    .await?;

    Ok(parcel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_entry_skips_unchanged_fields() {
        let mut changes = Map::new();
        diff_entry(&mut changes, "name", json!("Maize 2026"), json!("Maize 2026"));
        assert!(changes.is_empty());
    }

    #[test]
    fn diff_entry_records_previous_and_new() {
        let mut changes = Map::new();
        diff_entry(&mut changes, "crop_type", json!("maize"), json!("wheat"));
        assert_eq!(
            changes.get("crop_type"),
            Some(&json!({ "previous": "maize", "new": "wheat" }))
        );
    }

    #[test]
    fn diff_entry_treats_null_to_value_as_change() {
        let mut changes = Map::new();
        diff_entry(&mut changes, "description", Value::Null, json!("rotated in"));
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn date_value_is_iso_or_null() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(date_value(Some(d)), json!("2026-03-15"));
        assert_eq!(date_value(None), Value::Null);
    }

    #[test]
    fn id_value_uses_canonical_uuid_form() {
        let id = Uuid::new_v4();
        assert_eq!(id_value(Some(id)), json!(id.to_string()));
        assert_eq!(id_value(None), Value::Null);
    }

    #[test]
    fn status_patch_allows_active_inactive_both_ways() {
        assert!(validate_status_patch(PlacementStatus::Active, PlacementStatus::Inactive).is_ok());
        assert!(validate_status_patch(PlacementStatus::Inactive, PlacementStatus::Active).is_ok());
    }

    #[test]
    fn status_patch_is_a_noop_for_same_status() {
        assert!(validate_status_patch(PlacementStatus::Finalized, PlacementStatus::Finalized).is_ok());
    }

    #[test]
    fn status_patch_rejects_leaving_finalized() {
        let err =
            validate_status_patch(PlacementStatus::Finalized, PlacementStatus::Active).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[test]
    fn status_patch_rejects_finalizing_through_update() {
        let err =
            validate_status_patch(PlacementStatus::Active, PlacementStatus::Finalized).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[test]
    fn reactivation_at_same_location_relocks_and_rechecks() {
        // The parcel may have been subdivided or occupied while this
        // placement sat inactive, so the row lock and the occupancy check
        // both run again.
        let here = Location::Parcel(Uuid::new_v4());
        assert_eq!(
            location_checks(here, here, PlacementStatus::Inactive, PlacementStatus::Active),
            (true, true)
        );
    }

    #[test]
    fn unchanged_active_tenancy_skips_location_checks() {
        let here = Location::SubParcel(Uuid::new_v4());
        assert_eq!(
            location_checks(here, here, PlacementStatus::Active, PlacementStatus::Active),
            (false, false)
        );
    }

    #[test]
    fn relocation_always_locks_the_target() {
        let from = Location::Parcel(Uuid::new_v4());
        let to = Location::SubParcel(Uuid::new_v4());
        assert_eq!(
            location_checks(from, to, PlacementStatus::Active, PlacementStatus::Active),
            (true, true)
        );
        // Moving while deactivating still validates the target row, but
        // occupancy only matters for active tenancy.
        assert_eq!(
            location_checks(from, to, PlacementStatus::Active, PlacementStatus::Inactive),
            (true, false)
        );
    }

    #[test]
    fn occupancy_index_violations_read_as_conflicts() {
        assert!(is_occupancy_conflict(
            Some("23505"),
            Some("uq_active_placement_per_parcel")
        ));
        assert!(is_occupancy_conflict(
            Some("23505"),
            Some("uq_active_placement_per_sub_parcel")
        ));
        // Other unique violations keep their storage-error shape.
        assert!(!is_occupancy_conflict(Some("23505"), Some("uq_sub_parcels_live_name")));
        assert!(!is_occupancy_conflict(Some("23503"), Some("uq_active_placement_per_parcel")));
        assert!(!is_occupancy_conflict(Some("23505"), None));
    }
}
