//! Readiness reporting for the parcel management API

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Whether the parcel store answers a probe query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Reachable,
    Unreachable,
}

/// Readiness report returned under /api/v1/health
#[derive(Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub version: &'static str,
    pub database: DatabaseStatus,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => DatabaseStatus::Reachable,
        Err(_) => DatabaseStatus::Unreachable,
    };

    Json(HealthReport {
        service: "farm-parcel-management",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(DatabaseStatus::Reachable).unwrap(),
            serde_json::json!("reachable")
        );
    }

    #[test]
    fn report_carries_service_and_probe_outcome() {
        let report = HealthReport {
            service: "farm-parcel-management",
            version: "0.0.0",
            database: DatabaseStatus::Unreachable,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["service"], serde_json::json!("farm-parcel-management"));
        assert_eq!(value["database"], serde_json::json!("unreachable"));
    }
}
