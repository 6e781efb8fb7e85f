//! Model of one on-screen analog stick.
//!
//! A surface receives raw contact points in its local coordinate space, keeps
//! the knob inside its circle and reports the knob position as a normalized
//! [`Vector2`]. Drawing is left to the presentation layer, which reads the
//! state back through the accessors.

use tracing::debug;

use super::geometry::{self, Point, Vector2};
use super::types::{StickEvent, StickId};

#[derive(Debug, Clone, PartialEq)]
struct StickSurfaceState {
    center: Point,
    radius: f32,
    // Knob position; equals `center` at rest
    displacement: Point,
    invert_y: bool,
}

#[derive(Debug)]
pub struct StickSurface {
    stick: StickId,
    state: StickSurfaceState,
    contact_active: bool,
}

impl StickSurface {
    pub fn new(stick: StickId, center: Point, radius: f32, invert_y: bool) -> Self {
        debug_assert!(radius > 0.0, "stick radius must be positive, got {radius}");
        Self {
            stick,
            state: StickSurfaceState {
                center,
                radius,
                displacement: center,
                invert_y,
            },
            contact_active: false,
        }
    }

    pub fn center(&self) -> Point {
        self.state.center
    }

    pub fn radius(&self) -> f32 {
        self.state.radius
    }

    /// Current knob position, for drawing the stick line and dot.
    pub fn displacement(&self) -> Point {
        self.state.displacement
    }

    pub fn is_active(&self) -> bool {
        self.contact_active
    }

    /// A new contact lands on the surface. Handled exactly like a move.
    pub fn on_contact_begin(&mut self, point: Point) -> StickEvent {
        self.on_contact_move(point)
    }

    /// Moves the knob towards `point`, clamped to the circle.
    ///
    /// With several contacts on one surface the last processed one wins.
    pub fn on_contact_move(&mut self, point: Point) -> StickEvent {
        self.contact_active = true;
        self.state.displacement =
            geometry::clamp_to_circle(point, self.state.center, self.state.radius);
        let event = StickEvent {
            stick: self.stick,
            vector: self.vector(),
        };
        debug!(
            "{:?} stick contact at ({:.1}, {:.1}) -> ({:.3}, {:.3})",
            self.stick, point.x, point.y, event.vector.dx, event.vector.dy
        );
        event
    }

    /// Releases the knob back to the center.
    ///
    /// Always yields a zero vector, also when the contact never moved.
    pub fn on_contact_end(&mut self) -> StickEvent {
        self.contact_active = false;
        self.state.displacement = self.state.center;
        debug!("{:?} stick released", self.stick);
        StickEvent {
            stick: self.stick,
            vector: Vector2::ZERO,
        }
    }

    /// Normalized knob position, derived from the displacement.
    pub fn vector(&self) -> Vector2 {
        let radius = self.state.radius;
        let dx = self.state.displacement.x - self.state.center.x;
        let mut dy = self.state.displacement.y - self.state.center.y;
        if self.state.invert_y {
            dy *= -1.0;
        }
        Vector2::new(
            geometry::scale(dx, -radius, radius, -1.0, 1.0),
            geometry::scale(dy, -radius, radius, -1.0, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn surface(invert_y: bool) -> StickSurface {
        StickSurface::new(StickId::Right, Point::new(50.0, 50.0), 50.0, invert_y)
    }

    fn assert_vector(actual: Vector2, dx: f32, dy: f32) {
        assert!(
            (actual.dx - dx).abs() < EPSILON && (actual.dy - dy).abs() < EPSILON,
            "expected ({dx}, {dy}), got {actual:?}"
        );
    }

    #[test]
    fn starts_centered() {
        let surface = surface(false);
        assert_eq!(surface.displacement(), Point::new(50.0, 50.0));
        assert_eq!(surface.vector(), Vector2::ZERO);
        assert!(!surface.is_active());
    }

    #[test]
    fn outside_contact_is_clamped_then_released() {
        let mut surface = surface(false);

        let moved = surface.on_contact_move(Point::new(130.0, 50.0));
        assert_eq!(moved.stick, StickId::Right);
        assert_vector(moved.vector, 1.0, 0.0);
        assert!((surface.displacement().x - 100.0).abs() < EPSILON);
        assert!(surface.is_active());

        let released = surface.on_contact_end();
        assert_eq!(released.vector, Vector2::ZERO);
        assert_eq!(surface.displacement(), Point::new(50.0, 50.0));
        assert!(!surface.is_active());
    }

    #[test]
    fn release_without_move_still_reports_zero() {
        let mut surface = surface(true);
        let released = surface.on_contact_end();
        assert_eq!(released.vector, Vector2::ZERO);
    }

    #[test]
    fn inverted_y_flips_vertical_component() {
        let mut plain = surface(false);
        let mut inverted = surface(true);

        assert_vector(plain.on_contact_move(Point::new(75.0, 75.0)).vector, 0.5, 0.5);
        assert_vector(
            inverted.on_contact_move(Point::new(75.0, 75.0)).vector,
            0.5,
            -0.5,
        );
    }

    #[test]
    fn last_contact_wins() {
        let mut surface = surface(false);
        surface.on_contact_begin(Point::new(25.0, 50.0));
        let event = surface.on_contact_move(Point::new(60.0, 50.0));
        assert_vector(event.vector, 0.2, 0.0);
    }

    #[test]
    fn diagonal_overshoot_stays_within_unit_range() {
        let mut surface = surface(false);
        let event = surface.on_contact_move(Point::new(500.0, 500.0));
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert_vector(event.vector, expected, expected);
    }
}
