//! Shared colors and frame styling for the pad window.

use eframe::egui::{Color32, Frame, Stroke};

/// Color palette of the dark theme and the virtual stick.
pub struct UiColors;

impl UiColors {
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected / hardware mode (green)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Virtual sticks in charge (red)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    // Virtual stick parts
    pub const STICK_BG: Color32 = Color32::from_black_alpha(76);
    pub const STICK_LINE: Color32 = Color32::from_rgb(65, 70, 77);
    pub const KNOB: Color32 = Color32::from_rgb(149, 210, 107);
    pub const KNOB_BORDER: Color32 = Color32::from_rgb(205, 225, 190);
}

/// Frame with the standard border and margins.
pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(4)
        .outer_margin(2)
}
