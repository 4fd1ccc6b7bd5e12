//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A planar coordinate pair. `x` is longitude, `y` is latitude when the
/// polygon is expressed in geographic degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered ring of vertices, implicitly closed (the last vertex connects
/// back to the first). Simplicity (no self-intersection) is checked by the
/// geometry kernel at the write boundary, not assumed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<Point>);

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the edges of the ring, including the closing last-to-first edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(pairs: Vec<(f64, f64)>) -> Self {
        Self(pairs.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }
}

/// The concrete place a crop placement attaches to: a childless parcel or a
/// specific sub-parcel. Exactly one of the two, by construction; the
/// two-nullable-column shape exists only at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Location {
    Parcel(Uuid),
    SubParcel(Uuid),
}

/// Invalid location column states surfaced when translating from storage or
/// caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("both parcel_id and sub_parcel_id are set")]
    Ambiguous,
    #[error("neither parcel_id nor sub_parcel_id is set")]
    Missing,
}

impl Location {
    /// Build from the two nullable foreign-key columns.
    pub fn from_columns(
        parcel_id: Option<Uuid>,
        sub_parcel_id: Option<Uuid>,
    ) -> Result<Self, LocationError> {
        match (parcel_id, sub_parcel_id) {
            (Some(_), Some(_)) => Err(LocationError::Ambiguous),
            (None, None) => Err(LocationError::Missing),
            (Some(id), None) => Ok(Location::Parcel(id)),
            (None, Some(id)) => Ok(Location::SubParcel(id)),
        }
    }

    /// Translate back to the two nullable foreign-key columns.
    pub fn to_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Location::Parcel(id) => (Some(id), None),
            Location::SubParcel(id) => (None, Some(id)),
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            Location::Parcel(id) | Location::SubParcel(id) => *id,
        }
    }
}
