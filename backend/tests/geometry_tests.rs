//! Geometry kernel property-based and unit tests
//!
//! Comprehensive tests for:
//! - Area and centroid derivation from boundary polygons
//! - Boundary-inclusive containment (sub-parcel within parent)
//! - Positive-area overlap (sibling sub-parcel exclusivity)
//! - Degenerate polygon rejection

use proptest::prelude::*;
use shared::geometry::{
    self, approx_area_m2, area, centroid, contains, overlaps, GeometryError, M2_PER_HECTARE,
};
use shared::{Point, Polygon};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Axis-aligned rectangle with positive extent, as (x0, y0, width, height)
fn rect_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (
        -1000.0..1000.0f64,
        -1000.0..1000.0f64,
        1.0..500.0f64,
        1.0..500.0f64,
    )
}

fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon {
    Polygon::from(vec![(x0, y0), (x0 + w, y0), (x0 + w, y0 + h), (x0, y0 + h)])
}

/// Shrink factor for building a strictly interior rectangle
fn shrink_strategy() -> impl Strategy<Value = f64> {
    0.1..0.8f64
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Shoelace area of an axis-aligned rectangle equals width * height
    #[test]
    fn test_rectangle_area_matches_extent(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let a = area(&rect(x0, y0, w, h)).unwrap();
        let expected = w * h;
        prop_assert!(
            (a - expected).abs() <= expected * 1e-9,
            "area {} vs expected {}",
            a,
            expected
        );
    }

    /// Hectare conversion is a fixed 10,000 m2 ratio
    #[test]
    fn test_hectare_conversion_ratio(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let a = area(&rect(x0, y0, w, h)).unwrap();
        let ha = a / M2_PER_HECTARE;
        prop_assert!((ha * M2_PER_HECTARE - a).abs() <= a * 1e-12);
    }

    /// Centroid of a rectangle is its center
    #[test]
    fn test_rectangle_centroid_is_center(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let c = centroid(&rect(x0, y0, w, h)).unwrap();
        prop_assert!((c.x - (x0 + w / 2.0)).abs() < 1e-6);
        prop_assert!((c.y - (y0 + h / 2.0)).abs() < 1e-6);
    }

    /// Derived metrics are bit-identical across repeated evaluation
    #[test]
    fn test_derivation_is_deterministic(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let poly = rect(x0, y0, w, h);
        prop_assert_eq!(area(&poly).unwrap().to_bits(), area(&poly).unwrap().to_bits());
        let c1 = centroid(&poly).unwrap();
        let c2 = centroid(&poly).unwrap();
        prop_assert_eq!(c1.x.to_bits(), c2.x.to_bits());
        prop_assert_eq!(c1.y.to_bits(), c2.y.to_bits());
    }

    /// Containment is reflexive: a boundary contains an identical ring
    #[test]
    fn test_containment_is_reflexive(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let poly = rect(x0, y0, w, h);
        prop_assert!(contains(&poly, &poly.clone()).unwrap());
    }

    /// A concentric shrunken rectangle is contained in, and overlaps, its parent
    #[test]
    fn test_interior_ring_contained_and_overlapping(
        (x0, y0, w, h) in rect_strategy(),
        shrink in shrink_strategy()
    ) {
        let parent = rect(x0, y0, w, h);
        let inset_x = w * (1.0 - shrink) / 2.0;
        let inset_y = h * (1.0 - shrink) / 2.0;
        let inner = rect(x0 + inset_x, y0 + inset_y, w * shrink, h * shrink);

        prop_assert!(contains(&parent, &inner).unwrap());
        prop_assert!(!contains(&inner, &parent).unwrap());
        // Engulfment counts as overlap, in both argument orders.
        prop_assert!(overlaps(&parent, &inner).unwrap());
        prop_assert!(overlaps(&inner, &parent).unwrap());
    }

    /// A rectangle translated fully outside its parent is neither contained
    /// nor overlapping
    #[test]
    fn test_disjoint_ring_rejected(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let parent = rect(x0, y0, w, h);
        let far = rect(x0 + w * 2.0 + 1.0, y0 + h * 2.0 + 1.0, w, h);
        prop_assert!(!contains(&parent, &far).unwrap());
        prop_assert!(!overlaps(&parent, &far).unwrap());
    }

    /// Two halves of a split parent share an edge without overlapping, and
    /// both remain contained in the parent
    #[test]
    fn test_shared_edge_split_is_legal(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let parent = rect(x0, y0, w, h);
        let left = rect(x0, y0, w / 2.0, h);
        let right = rect(x0 + w / 2.0, y0, w / 2.0, h);

        prop_assert!(contains(&parent, &left).unwrap());
        prop_assert!(contains(&parent, &right).unwrap());
        prop_assert!(!overlaps(&left, &right).unwrap());
    }

    /// A strip crossing the split line overlaps both halves
    #[test]
    fn test_crossing_strip_overlaps_both_halves(
        (x0, y0, w, h) in rect_strategy()
    ) {
        let left = rect(x0, y0, w / 2.0, h);
        let right = rect(x0 + w / 2.0, y0, w / 2.0, h);
        let strip = rect(x0 + w / 4.0, y0 + h / 4.0, w / 2.0, h / 2.0);

        prop_assert!(overlaps(&strip, &left).unwrap());
        prop_assert!(overlaps(&strip, &right).unwrap());
    }

    /// Rings with fewer than three vertices are rejected by every operation
    #[test]
    fn test_short_rings_rejected(
        x in -100.0..100.0f64,
        y in -100.0..100.0f64
    ) {
        let segment = Polygon::from(vec![(x, y), (x + 1.0, y + 1.0)]);
        prop_assert_eq!(area(&segment), Err(GeometryError::TooFewVertices(2)));
        prop_assert!(centroid(&segment).is_err());
    }

    /// Zero-extent rectangles have no area and are rejected
    #[test]
    fn test_degenerate_rectangle_rejected(
        x0 in -100.0..100.0f64,
        y0 in -100.0..100.0f64,
        w in 1.0..50.0f64
    ) {
        let flat = rect(x0, y0, w, 0.0);
        prop_assert_eq!(area(&flat), Err(GeometryError::ZeroArea));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn north_field_scenario_metrics() {
    // A 100m x 50m field near the equator, expressed in geographic degrees.
    let w_deg = 100.0 / 111_320.0;
    let h_deg = 50.0 / 111_320.0;
    let field = Polygon::from(vec![(0.0, 0.0), (w_deg, 0.0), (w_deg, h_deg), (0.0, h_deg)]);

    let m2 = approx_area_m2(&field).unwrap();
    assert!((m2 - 5000.0).abs() < 0.01, "got {m2} m2");
    assert!((m2 / M2_PER_HECTARE - 0.5).abs() < 1e-6);

    let c = centroid(&field).unwrap();
    assert!((c.x - w_deg / 2.0).abs() < 1e-12);
    assert!((c.y - h_deg / 2.0).abs() < 1e-12);
}

#[test]
fn self_intersecting_boundary_is_rejected_everywhere() {
    let bowtie = Polygon::from(vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]);
    let square = Polygon::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);

    assert_eq!(geometry::validate(&bowtie), Err(GeometryError::SelfIntersecting));
    assert!(area(&bowtie).is_err());
    assert!(contains(&square, &bowtie).is_err());
    assert!(overlaps(&bowtie, &square).is_err());
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let poly = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(f64::NAN, 1.0),
        Point::new(1.0, 1.0),
    ]);
    assert_eq!(
        geometry::validate(&poly),
        Err(GeometryError::NonFiniteCoordinate(1))
    );
}

#[test]
fn corner_touching_rings_do_not_overlap() {
    let a = Polygon::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    let b = Polygon::from(vec![(10.0, 10.0), (20.0, 10.0), (20.0, 20.0), (10.0, 20.0)]);
    assert!(!overlaps(&a, &b).unwrap());
}

#[test]
fn half_offset_strips_overlap_despite_collinear_edges() {
    // Sibling strips spanning the parent's full width, offset by half
    // their height. All edge contact is collinear, so only their interiors
    // give the conflict away.
    let lower = Polygon::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    let upper = Polygon::from(vec![(0.0, 5.0), (10.0, 5.0), (10.0, 15.0), (0.0, 15.0)]);
    assert!(overlaps(&lower, &upper).unwrap());
    assert!(overlaps(&upper, &lower).unwrap());
}

#[test]
fn triangle_within_concave_parent_is_contained() {
    // L-shaped parent; the triangle sits in the lower arm.
    let parent = Polygon::from(vec![
        (0.0, 0.0),
        (30.0, 0.0),
        (30.0, 10.0),
        (10.0, 10.0),
        (10.0, 30.0),
        (0.0, 30.0),
    ]);
    let triangle = Polygon::from(vec![(15.0, 2.0), (25.0, 2.0), (20.0, 8.0)]);
    assert!(contains(&parent, &triangle).unwrap());

    // The notch carved out of the L is outside the parent.
    let in_notch = Polygon::from(vec![(15.0, 15.0), (25.0, 15.0), (20.0, 25.0)]);
    assert!(!contains(&parent, &in_notch).unwrap());
}
