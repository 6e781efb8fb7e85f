//! Geometry for circular stick surfaces
//!
//! Pure functions used by [`StickSurface`](super::stick_surface::StickSurface)
//! to turn a raw contact point into a clamped displacement and a normalized
//! direction vector.

use std::f32::consts::FRAC_PI_2;

/// Position in a surface's local coordinate space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Normalized stick direction, each component in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub dx: f32,
    pub dy: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { dx: 0.0, dy: 0.0 };

    /// Builds a vector, clamping both components into `[-1, 1]`.
    pub fn new(dx: f32, dy: f32) -> Self {
        Self {
            dx: dx.clamp(-1.0, 1.0),
            dy: dy.clamp(-1.0, 1.0),
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f32 {
    let x_distance = b.x - a.x;
    let y_distance = b.y - a.y;
    (x_distance * x_distance + y_distance * y_distance).sqrt()
}

/// Strict containment test; a point on the boundary counts as outside.
pub fn is_inside(point: Point, center: Point, radius: f32) -> bool {
    distance(point, center) < radius
}

/// Projects `point` onto the circle boundary unless it already lies inside.
///
/// The boundary position is measured from the top of the circle: the bearing
/// from `atan2` is rotated by -90° before being converted back into x/y
/// distances, which keeps the original direction of `point` relative to
/// `center`.
pub fn clamp_to_circle(point: Point, center: Point, radius: f32) -> Point {
    if is_inside(point, center, radius) {
        return point;
    }

    let angle = (point.y - center.y).atan2(point.x - center.x);
    let x_distance = (angle - FRAC_PI_2).sin() * radius;
    let y_distance = (angle - FRAC_PI_2).cos() * radius;

    Point::new(center.x - x_distance, center.y + y_distance)
}

/// Linear mapping of `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// `in_min == in_max` is a caller bug: debug builds assert, release builds
/// return `out_min` instead of NaN.
pub fn scale(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    debug_assert!(
        in_min != in_max,
        "scale called with an empty input range [{in_min}, {in_max}]"
    );
    if in_min == in_max {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn boundary_counts_as_outside() {
        let center = Point::new(50.0, 50.0);
        assert!(!is_inside(Point::new(100.0, 50.0), center, 50.0));
        assert!(is_inside(Point::new(99.9, 50.0), center, 50.0));
    }

    #[test]
    fn clamps_cardinal_directions_onto_boundary() {
        let center = Point::new(50.0, 50.0);
        let cases = [
            (Point::new(130.0, 50.0), Point::new(100.0, 50.0)),
            (Point::new(-30.0, 50.0), Point::new(0.0, 50.0)),
            (Point::new(50.0, -80.0), Point::new(50.0, 0.0)),
            (Point::new(50.0, 200.0), Point::new(50.0, 100.0)),
        ];
        for (input, expected) in cases {
            let clamped = clamp_to_circle(input, center, 50.0);
            assert!((clamped.x - expected.x).abs() < EPSILON, "{input:?} -> {clamped:?}");
            assert!((clamped.y - expected.y).abs() < EPSILON, "{input:?} -> {clamped:?}");
        }
    }

    #[test]
    fn scale_maps_endpoints_and_midpoint() {
        assert_eq!(scale(-45.0, -45.0, 45.0, -1.0, 1.0), -1.0);
        assert_eq!(scale(45.0, -45.0, 45.0, -1.0, 1.0), 1.0);
        assert_eq!(scale(0.0, -45.0, 45.0, -1.0, 1.0), 0.0);
    }

    #[test]
    #[should_panic(expected = "empty input range")]
    #[cfg(debug_assertions)]
    fn scale_asserts_on_empty_range() {
        scale(1.0, 2.0, 2.0, -1.0, 1.0);
    }

    #[test]
    fn vector_components_are_clamped() {
        let vector = Vector2::new(1.000_001, -3.0);
        assert_eq!(vector, Vector2 { dx: 1.0, dy: -1.0 });
    }

    proptest! {
        #[test]
        fn inside_points_are_unchanged(
            cx in -500.0f32..500.0,
            cy in -500.0f32..500.0,
            radius in 1.0f32..200.0,
            angle in 0.0f32..std::f32::consts::TAU,
            fraction in 0.0f32..0.99,
        ) {
            let center = Point::new(cx, cy);
            let point = Point::new(
                cx + angle.cos() * radius * fraction,
                cy + angle.sin() * radius * fraction,
            );
            prop_assume!(is_inside(point, center, radius));
            prop_assert_eq!(clamp_to_circle(point, center, radius), point);
        }

        #[test]
        fn outside_points_land_on_boundary_in_same_direction(
            cx in -500.0f32..500.0,
            cy in -500.0f32..500.0,
            radius in 1.0f32..200.0,
            angle in 0.0f32..std::f32::consts::TAU,
            factor in 1.0f32..20.0,
        ) {
            let center = Point::new(cx, cy);
            let point = Point::new(
                cx + angle.cos() * radius * factor,
                cy + angle.sin() * radius * factor,
            );
            let clamped = clamp_to_circle(point, center, radius);

            let tolerance = radius * 1e-3;
            prop_assert!((distance(clamped, center) - radius).abs() < tolerance);

            // Same direction: the unit vectors from center coincide.
            let original = distance(point, center);
            let ux = (point.x - cx) / original;
            let uy = (point.y - cy) / original;
            let cx_unit = (clamped.x - cx) / radius;
            let cy_unit = (clamped.y - cy) / radius;
            prop_assert!((ux - cx_unit).abs() < 1e-2);
            prop_assert!((uy - cy_unit).abs() < 1e-2);
        }

        #[test]
        fn scale_round_trips(
            a in -100.0f32..100.0,
            span in 1.0f32..100.0,
            c in -100.0f32..100.0,
            out_span in 1.0f32..100.0,
            t in 0.0f32..=1.0,
        ) {
            let b = a + span;
            let d = c + out_span;
            let v = a + t * span;
            let back = scale(scale(v, a, b, c, d), c, d, a, b);
            prop_assert!((back - v).abs() < 1e-2);
        }
    }
}
