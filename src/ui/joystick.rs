//! Virtual stick widget.
//!
//! Pointer press, drag and release over the widget become contact
//! begin/move/end on the coordinator; the knob is drawn from the surface's
//! displacement afterwards, so the picture always matches the reported vector.

use eframe::egui::{self, vec2, Rect, Response, Sense, Stroke};

use super::common::UiColors;
use crate::controller::{InputCoordinator, Point, StickId, StickSurface};

const STICK_LINE_WIDTH: f32 = 8.0;
const KNOB_BORDER_WIDTH: f32 = 2.0;

pub fn stick_widget(
    ui: &mut egui::Ui,
    coordinator: &mut InputCoordinator,
    stick: StickId,
    knob_radius: f32,
) -> Response {
    let diameter = coordinator.surface(stick).radius() * 2.0;
    let (rect, response) =
        ui.allocate_exact_size(vec2(diameter, diameter), Sense::click_and_drag());

    let active = coordinator.surface(stick).is_active();
    match response.interact_pointer_pos() {
        Some(pos) if response.is_pointer_button_down_on() => {
            let local = pos - rect.min;
            let point = Point::new(local.x, local.y);
            if active {
                coordinator.contact_move(stick, point);
            } else {
                coordinator.contact_begin(stick, point);
            }
        }
        // Release fires once, also for a tap without movement
        _ if active => coordinator.contact_end(stick),
        _ => {}
    }

    paint(ui, rect, coordinator.surface(stick), knob_radius);
    response
}

fn paint(ui: &egui::Ui, rect: Rect, surface: &StickSurface, knob_radius: f32) {
    let painter = ui.painter();
    let center = surface.center();
    let knob = surface.displacement();
    let center = rect.min + vec2(center.x, center.y);
    let knob = rect.min + vec2(knob.x, knob.y);

    painter.circle_filled(center, surface.radius(), UiColors::STICK_BG);
    painter.line_segment(
        [center, knob],
        Stroke::new(STICK_LINE_WIDTH, UiColors::STICK_LINE),
    );
    painter.circle_filled(knob, knob_radius, UiColors::KNOB);
    painter.circle_stroke(
        knob,
        knob_radius,
        Stroke::new(KNOB_BORDER_WIDTH, UiColors::KNOB_BORDER),
    );
}
