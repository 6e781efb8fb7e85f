//! # Pad Window
//!
//! eframe front end for the [`InputCoordinator`]. It plays the presentation
//! role: draws the two virtual sticks while no physical controller is
//! attached, feeds pointer contacts back into the coordinator, and shows the
//! unified event stream.
//!
//! The coordinator lives inside the app, so the egui thread is its home
//! thread. Hardware events are drained once per frame with
//! [`InputCoordinator::pump`].

pub mod common;
pub mod joystick;

use eframe::egui::{self, Align, Layout, RichText};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::UIConfig;
use crate::controller::{ButtonEvent, ConnectionState, InputCoordinator, StickId, Vector2};
use common::{create_frame, UiColors};
use joystick::stick_widget;

// Latest values seen through the unified handlers
#[derive(Default)]
struct EventLog {
    left: Vector2,
    right: Vector2,
    last_button: Option<ButtonEvent>,
    connection: ConnectionState,
    stick_events: u64,
    button_events: u64,
}

pub struct PadUI {
    coordinator: InputCoordinator,
    settings: UIConfig,
    log: Rc<RefCell<EventLog>>,
}

impl PadUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut coordinator: InputCoordinator,
        settings: UIConfig,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let log = Rc::new(RefCell::new(EventLog::default()));

        let sink = log.clone();
        coordinator.set_stick_changed_handler(move |event| {
            let mut log = sink.borrow_mut();
            match event.stick {
                StickId::Left => log.left = event.vector,
                StickId::Right => log.right = event.vector,
            }
            log.stick_events += 1;
        });

        let sink = log.clone();
        coordinator.set_button_changed_handler(move |event| {
            let mut log = sink.borrow_mut();
            log.last_button = Some(event);
            log.button_events += 1;
        });

        let sink = log.clone();
        coordinator.set_connection_observer(move |state| {
            info!("Controller now in {} mode", state);
            sink.borrow_mut().connection = state;
        });

        let ctx = cc.egui_ctx.clone();
        coordinator.set_visibility_handler(move |visible| {
            debug!("Virtual sticks visible: {}", visible);
            ctx.request_repaint();
        });

        Self {
            coordinator,
            settings,
            log,
        }
    }

    fn show_sticks(&mut self, ctx: &egui::Context) {
        let padding = self.settings.padding;
        let knob_radius = self.settings.knob_radius;
        let coordinator = &mut self.coordinator;

        egui::TopBottomPanel::bottom("virtual_sticks")
            .exact_height(self.settings.panel_height)
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.add_space(padding);
                    stick_widget(ui, coordinator, StickId::Left, knob_radius);
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.add_space(padding);
                        stick_widget(ui, coordinator, StickId::Right, knob_radius);
                    });
                });
            });
    }

    fn show_status(&self, ctx: &egui::Context) {
        let log = self.log.borrow();
        egui::CentralPanel::default().show(ctx, |ui| {
            create_frame(UiColors::MAIN_BG, UiColors::BORDER).show(ui, |ui| {
                let (text, color) = match log.connection {
                    ConnectionState::Hardware => {
                        let name = self
                            .coordinator
                            .hardware()
                            .attached_device()
                            .map(|info| info.name.as_str())
                            .unwrap_or("unknown");
                        (format!("Hardware: {name}"), UiColors::ACTIVE)
                    }
                    ConnectionState::Software => {
                        ("Virtual sticks".to_string(), UiColors::INACTIVE)
                    }
                };
                ui.label(RichText::new(text).color(color).strong());
                ui.separator();
                ui.label(format!(
                    "Left stick:  ({:+.2}, {:+.2})",
                    log.left.dx, log.left.dy
                ));
                ui.label(format!(
                    "Right stick: ({:+.2}, {:+.2})",
                    log.right.dx, log.right.dy
                ));
                match log.last_button {
                    Some(event) => ui.label(format!(
                        "Last button: {:?} {:.2} ({})",
                        event.button,
                        event.value,
                        if event.pressed { "pressed" } else { "released" }
                    )),
                    None => ui.label("Last button: -"),
                };
                ui.label(format!(
                    "Events: {} stick, {} button",
                    log.stick_events, log.button_events
                ));
            });
        });
    }
}

impl eframe::App for PadUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.coordinator.pump();
        ctx.request_repaint_after(Duration::from_millis(self.settings.repaint_interval_ms));

        if self.coordinator.is_surface_visible() {
            self.show_sticks(ctx);
        } else if self.coordinator.end_active_contacts() > 0 {
            debug!("Virtual sticks hidden during a drag, contacts released");
        }
        self.show_status(ctx);
    }
}
