//! Planar geometry kernel for parcel boundaries.
//!
//! Pure functions over simple polygons: area, centroid, boundary-inclusive
//! containment and positive-area overlap. No I/O, no persistence awareness.
//!
//! Coordinates are treated as Cartesian. For field-sized parcels expressed
//! in geographic degrees, [`approx_area_m2`] applies an equirectangular
//! scaling at the polygon's mean latitude; true geodesic precision is out
//! of scope.
//!
//! Containment is boundary-inclusive: a polygon equal to, or sharing edges
//! with, the outer boundary counts as contained. Overlap is the opposite
//! convention: polygons that merely share an edge or touch at a point do
//! not overlap, while one polygon fully engulfing another does.

use thiserror::Error;

use crate::types::{Point, Polygon};

/// Tolerance for orientation and on-segment tests.
const EPSILON: f64 = 1e-9;

/// Meters per degree of latitude (spherical mean radius).
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Square meters per hectare.
pub const M2_PER_HECTARE: f64 = 10_000.0;

/// Rejection reasons for invalid polygons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("polygon must have at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon has a non-finite coordinate at vertex {0}")]
    NonFiniteCoordinate(usize),

    #[error("polygon is self-intersecting")]
    SelfIntersecting,

    #[error("polygon has zero area")]
    ZeroArea,
}

/// Check that a polygon is usable by the rest of the kernel: at least three
/// finite vertices, non-degenerate area, and no two non-adjacent edges
/// crossing each other.
pub fn validate(polygon: &Polygon) -> Result<(), GeometryError> {
    let pts = polygon.points();
    if pts.len() < 3 {
        return Err(GeometryError::TooFewVertices(pts.len()));
    }
    for (i, p) in pts.iter().enumerate() {
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate(i));
        }
    }
    if signed_area(pts).abs() < EPSILON {
        return Err(GeometryError::ZeroArea);
    }

    let n = pts.len();
    for i in 0..n {
        let (a1, a2) = (pts[i], pts[(i + 1) % n]);
        for j in (i + 1)..n {
            // Adjacent edges share an endpoint and may not properly cross.
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let (b1, b2) = (pts[j], pts[(j + 1) % n]);
            if segments_cross(a1, a2, b1, b2) {
                return Err(GeometryError::SelfIntersecting);
            }
        }
    }
    Ok(())
}

/// Unsigned polygon area via the shoelace formula, in the square of the
/// caller's coordinate unit.
pub fn area(polygon: &Polygon) -> Result<f64, GeometryError> {
    validate(polygon)?;
    Ok(signed_area(polygon.points()).abs())
}

/// Approximate area in square meters for a polygon expressed in geographic
/// degrees, using an equirectangular projection at the mean latitude.
pub fn approx_area_m2(polygon: &Polygon) -> Result<f64, GeometryError> {
    validate(polygon)?;
    let projected = project_degrees_to_meters(polygon);
    Ok(signed_area(projected.points()).abs())
}

/// Area-weighted polygon centroid (not a vertex average, which is biased by
/// uneven vertex density). Returned in the caller's coordinate unit.
pub fn centroid(polygon: &Polygon) -> Result<Point, GeometryError> {
    validate(polygon)?;
    let pts = polygon.points();
    let a = signed_area(pts);
    let n = pts.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        let w = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * w;
        cy += (p.y + q.y) * w;
    }
    Ok(Point::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Boundary-inclusive containment: every vertex of `inner` lies inside or on
/// the boundary of `outer`, and no edge of `inner` properly crosses an edge
/// of `outer`. A sub-parcel sharing edges with its parent is contained.
pub fn contains(outer: &Polygon, inner: &Polygon) -> Result<bool, GeometryError> {
    validate(outer)?;
    validate(inner)?;

    for p in inner.points() {
        if !point_in_polygon(*p, outer) {
            return Ok(false);
        }
    }
    for (a1, a2) in inner.edges() {
        for (b1, b2) in outer.edges() {
            if segments_cross(a1, a2, b1, b2) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Positive-area interior intersection. Shared edges and point contacts are
/// not overlap; full engulfment of one polygon by the other is.
pub fn overlaps(a: &Polygon, b: &Polygon) -> Result<bool, GeometryError> {
    validate(a)?;
    validate(b)?;

    for (a1, a2) in a.edges() {
        for (b1, b2) in b.edges() {
            if segments_cross(a1, a2, b1, b2) {
                return Ok(true);
            }
        }
    }
    // No proper crossings: interiors intersect only if part of one ring
    // sits inside the other. Vertices catch the engulfment case. Edge
    // midpoints catch rings whose contacts are all collinear or endpoint
    // touches, where every vertex lands exactly on the other boundary
    // (two full-width strips offset along a shared line). Centroids catch
    // the identical-ring case.
    if a.points().iter().any(|p| point_strictly_inside(*p, b))
        || b.points().iter().any(|p| point_strictly_inside(*p, a))
    {
        return Ok(true);
    }
    if edge_midpoints(a).any(|m| point_strictly_inside(m, b))
        || edge_midpoints(b).any(|m| point_strictly_inside(m, a))
    {
        return Ok(true);
    }
    let ca = centroid(a)?;
    let cb = centroid(b)?;
    Ok(point_strictly_inside(ca, b) || point_strictly_inside(cb, a))
}

/// Boundary-inclusive point-in-polygon test.
pub fn point_in_polygon(p: Point, polygon: &Polygon) -> bool {
    point_on_boundary(p, polygon) || ray_cast(p, polygon)
}

/// Interior-only point-in-polygon test.
pub fn point_strictly_inside(p: Point, polygon: &Polygon) -> bool {
    !point_on_boundary(p, polygon) && ray_cast(p, polygon)
}

/// True if `p` lies on any edge of the ring.
pub fn point_on_boundary(p: Point, polygon: &Polygon) -> bool {
    polygon.edges().any(|(a, b)| on_segment(p, a, b))
}

fn edge_midpoints(polygon: &Polygon) -> impl Iterator<Item = Point> + '_ {
    polygon
        .edges()
        .map(|(p, q)| Point::new((p.x + q.x) / 2.0, (p.y + q.y) / 2.0))
}

fn signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Cross product of (b - a) x (c - a); sign gives the turn direction.
fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True if `p` lies on the closed segment [a, b].
fn on_segment(p: Point, a: Point, b: Point) -> bool {
    if orientation(a, b, p).abs() > EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Proper segment crossing: the segments intersect at a single interior
/// point of both. Endpoint contact and collinear overlap do not count,
/// which is what makes shared parcel edges legal.
fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

/// Even-odd ray cast, half-open on edge endpoints so a ray through a vertex
/// is counted once.
fn ray_cast(p: Point, polygon: &Polygon) -> bool {
    let mut inside = false;
    for (a, b) in polygon.edges() {
        if (a.y > p.y) != (b.y > p.y) {
            let x_hit = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_hit {
                inside = !inside;
            }
        }
    }
    inside
}

/// Equirectangular projection of a degree-coordinate ring into meters.
fn project_degrees_to_meters(polygon: &Polygon) -> Polygon {
    let pts = polygon.points();
    let mean_lat = pts.iter().map(|p| p.y).sum::<f64>() / pts.len() as f64;
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * mean_lat.to_radians().cos();
    Polygon::new(
        pts.iter()
            .map(|p| Point::new(p.x * meters_per_degree_lon, p.y * METERS_PER_DEGREE_LAT))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    #[test]
    fn rejects_polygon_with_too_few_vertices() {
        let line = Polygon::from(vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(validate(&line), Err(GeometryError::TooFewVertices(2)));
    }

    #[test]
    fn rejects_self_intersecting_bowtie() {
        let bowtie = Polygon::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        assert_eq!(validate(&bowtie), Err(GeometryError::SelfIntersecting));
    }

    #[test]
    fn rejects_degenerate_collinear_ring() {
        let flat = Polygon::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(validate(&flat), Err(GeometryError::ZeroArea));
    }

    #[test]
    fn area_of_north_field_rectangle() {
        // 100m x 50m field
        let field = rect(0.0, 0.0, 100.0, 50.0);
        let a = area(&field).unwrap();
        assert!((a - 5000.0).abs() < 1e-9);
        assert!((a / M2_PER_HECTARE - 0.5).abs() < 1e-12);
    }

    #[test]
    fn area_is_orientation_independent() {
        let ccw = rect(0.0, 0.0, 4.0, 3.0);
        let cw = Polygon::from(vec![(0.0, 0.0), (0.0, 3.0), (4.0, 3.0), (4.0, 0.0)]);
        assert_eq!(area(&ccw).unwrap(), area(&cw).unwrap());
    }

    #[test]
    fn centroid_of_rectangle_is_its_center() {
        let r = rect(2.0, 2.0, 6.0, 4.0);
        let c = centroid(&r).unwrap();
        assert!((c.x - 4.0).abs() < 1e-9);
        assert!((c.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_is_not_a_vertex_average() {
        // Extra collinear vertices along one edge must not drag the centroid.
        let skewed = Polygon::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ]);
        let c = centroid(&skewed).unwrap();
        assert!((c.x - 2.0).abs() < 1e-9);
        assert!((c.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn area_and_centroid_are_deterministic() {
        let poly = Polygon::from(vec![(0.3, 0.7), (5.1, 0.2), (6.4, 4.9), (1.2, 5.8)]);
        let a1 = area(&poly).unwrap();
        let a2 = area(&poly).unwrap();
        assert_eq!(a1.to_bits(), a2.to_bits());
        let c1 = centroid(&poly).unwrap();
        let c2 = centroid(&poly).unwrap();
        assert_eq!(c1.x.to_bits(), c2.x.to_bits());
        assert_eq!(c1.y.to_bits(), c2.y.to_bits());
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let parent = rect(0.0, 0.0, 100.0, 50.0);
        // Identical ring counts as contained.
        assert!(contains(&parent, &parent.clone()).unwrap());
        // Half sharing three boundary edges counts as contained.
        let left_half = rect(0.0, 0.0, 50.0, 50.0);
        assert!(contains(&parent, &left_half).unwrap());
    }

    #[test]
    fn containment_rejects_protruding_ring() {
        let parent = rect(0.0, 0.0, 100.0, 50.0);
        let sticking_out = rect(80.0, 10.0, 120.0, 40.0);
        assert!(!contains(&parent, &sticking_out).unwrap());
        let disjoint = rect(200.0, 0.0, 250.0, 50.0);
        assert!(!contains(&parent, &disjoint).unwrap());
    }

    #[test]
    fn shared_edge_is_not_overlap() {
        let left = rect(0.0, 0.0, 50.0, 50.0);
        let right = rect(50.0, 0.0, 100.0, 50.0);
        assert!(!overlaps(&left, &right).unwrap());
    }

    #[test]
    fn corner_touch_is_not_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 10.0, 20.0, 20.0);
        assert!(!overlaps(&a, &b).unwrap());
    }

    #[test]
    fn partial_intersection_is_overlap() {
        // Middle strip crossing both halves of a 100x50 field.
        let left = rect(0.0, 0.0, 50.0, 50.0);
        let middle = rect(40.0, 10.0, 60.0, 40.0);
        assert!(overlaps(&left, &middle).unwrap());
        assert!(overlaps(&middle, &left).unwrap());
    }

    #[test]
    fn engulfment_is_overlap() {
        let big = rect(0.0, 0.0, 100.0, 100.0);
        let small = rect(20.0, 20.0, 40.0, 40.0);
        assert!(overlaps(&big, &small).unwrap());
        assert!(overlaps(&small, &big).unwrap());
    }

    #[test]
    fn collinear_offset_rings_overlap() {
        // Full-width strips offset by half their height: no proper edge
        // crossing and every vertex of each ring lies on the other's
        // boundary, yet the interiors share a 10x5 band.
        let lower = rect(0.0, 0.0, 10.0, 10.0);
        let upper = rect(0.0, 5.0, 10.0, 15.0);
        assert!(overlaps(&lower, &upper).unwrap());
        assert!(overlaps(&upper, &lower).unwrap());
    }

    #[test]
    fn identical_rings_overlap() {
        let a = rect(0.0, 0.0, 30.0, 30.0);
        assert!(overlaps(&a, &a.clone()).unwrap());
    }

    #[test]
    fn disjoint_rings_do_not_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(100.0, 100.0, 110.0, 110.0);
        assert!(!overlaps(&a, &b).unwrap());
    }

    #[test]
    fn approx_area_scales_degrees_to_meters() {
        // Roughly 0.001 x 0.001 degrees near the equator: about 111m x 111m.
        let poly = rect(0.0, 0.0, 0.001, 0.001);
        let a = approx_area_m2(&poly).unwrap();
        assert!(a > 12_000.0 && a < 12_800.0, "got {a}");
    }

    #[test]
    fn predicates_reject_invalid_input() {
        let bowtie = Polygon::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        let square = rect(0.0, 0.0, 1.0, 1.0);
        assert!(contains(&square, &bowtie).is_err());
        assert!(overlaps(&bowtie, &square).is_err());
        assert!(centroid(&bowtie).is_err());
    }
}
