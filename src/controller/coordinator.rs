//! Input Coordinator - one event stream for hardware and virtual sticks
//!
//! Owns the [`HardwareSource`] and the two [`StickSurface`]s and forwards
//! everything they produce to a single pair of application handlers. The
//! connection state only drives the visibility of the virtual surface; events
//! from the inactive source are still delivered.
//!
//! # Threading Model
//!
//! The coordinator lives on one home thread (usually the UI thread). Hardware
//! callbacks arrive on the platform thread. Samples are queued in the bounded
//! handoff channel, connect/disconnect notifications in the unbounded
//! lifecycle channel. The home thread drains both with
//! [`InputCoordinator::pump`] or [`InputCoordinator::pump_next`].
//!
//! ```text
//! GamepadDevice   ─[Button/Stick]──────────→ handoff ───┐
//! DeviceDiscovery ─[Connected/Disconnected]→ lifecycle ─┼→ InputCoordinator ─→ handlers
//! contact points  ─→ StickSurface ─[StickEvent]─────────┘
//! ```

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use super::discovery::DeviceDiscovery;
use super::geometry::Point;
use super::hardware_source::{HardwareSource, RawHardwareEvent};
use super::stick_surface::StickSurface;
use super::types::{ButtonEvent, ConnectionState, DeviceId, StickEvent, StickId};
use crate::config::{ConfigError, ControllerConfig};

/// Outward callback slot.
///
/// Absence of a handler is an explicit state, events dispatched to it are
/// dropped with a trace line.
pub enum Handler<E> {
    Unregistered,
    Registered(Box<dyn FnMut(E)>),
}

impl<E> Handler<E> {
    pub fn new(handler: impl FnMut(E) + 'static) -> Self {
        Handler::Registered(Box::new(handler))
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Handler::Registered(_))
    }

    /// Returns `false` when nobody was listening.
    pub fn dispatch(&mut self, event: E) -> bool {
        match self {
            Handler::Registered(handler) => {
                handler(event);
                true
            }
            Handler::Unregistered => false,
        }
    }
}

pub struct InputCoordinator {
    hardware: HardwareSource,
    handoff: mpsc::Receiver<RawHardwareEvent>,
    lifecycle: mpsc::UnboundedReceiver<RawHardwareEvent>,
    left: StickSurface,
    right: StickSurface,
    state: ConnectionState,
    stick_handler: Handler<StickEvent>,
    button_handler: Handler<ButtonEvent>,
    connection_observer: Handler<ConnectionState>,
    visibility_handler: Handler<bool>,
}

impl InputCoordinator {
    /// Builds the coordinator in software mode. Fails if `config` does not
    /// validate, before any channel or surface is created.
    pub fn new(
        config: &ControllerConfig,
        discovery: Box<dyn DeviceDiscovery>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sender, handoff) = mpsc::channel(config.handoff_capacity);
        let (lifecycle_sender, lifecycle) = mpsc::unbounded_channel();
        debug!(
            "Created hardware handoff channel with capacity {}",
            config.handoff_capacity
        );

        let left = &config.left_stick;
        let right = &config.right_stick;
        let coordinator = Self {
            hardware: HardwareSource::new(discovery, sender, lifecycle_sender),
            handoff,
            lifecycle,
            left: StickSurface::new(
                StickId::Left,
                Point::new(left.radius, left.radius),
                left.radius,
                left.invert_y,
            ),
            right: StickSurface::new(
                StickId::Right,
                Point::new(right.radius, right.radius),
                right.radius,
                right.invert_y,
            ),
            state: ConnectionState::Software,
            stick_handler: Handler::Unregistered,
            button_handler: Handler::Unregistered,
            connection_observer: Handler::Unregistered,
            visibility_handler: Handler::Unregistered,
        };
        info!("Input coordinator ready in {} mode", coordinator.state);
        Ok(coordinator)
    }

    pub fn set_stick_changed_handler(&mut self, handler: impl FnMut(StickEvent) + 'static) {
        self.stick_handler = Handler::new(handler);
    }

    pub fn set_button_changed_handler(&mut self, handler: impl FnMut(ButtonEvent) + 'static) {
        self.button_handler = Handler::new(handler);
    }

    pub fn set_connection_observer(&mut self, observer: impl FnMut(ConnectionState) + 'static) {
        self.connection_observer = Handler::new(observer);
    }

    /// Receives `true` when the virtual surface should be shown.
    pub fn set_visibility_handler(&mut self, handler: impl FnMut(bool) + 'static) {
        self.visibility_handler = Handler::new(handler);
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_surface_visible(&self) -> bool {
        self.state == ConnectionState::Software
    }

    pub fn hardware(&self) -> &HardwareSource {
        &self.hardware
    }

    pub fn surface(&self, stick: StickId) -> &StickSurface {
        match stick {
            StickId::Left => &self.left,
            StickId::Right => &self.right,
        }
    }

    fn surface_mut(&mut self, stick: StickId) -> &mut StickSurface {
        match stick {
            StickId::Left => &mut self.left,
            StickId::Right => &mut self.right,
        }
    }

    pub fn contact_begin(&mut self, stick: StickId, point: Point) {
        let event = self.surface_mut(stick).on_contact_begin(point);
        self.emit_stick(event);
    }

    pub fn contact_move(&mut self, stick: StickId, point: Point) {
        let event = self.surface_mut(stick).on_contact_move(point);
        self.emit_stick(event);
    }

    pub fn contact_end(&mut self, stick: StickId) {
        let event = self.surface_mut(stick).on_contact_end();
        self.emit_stick(event);
    }

    /// A device appeared: attach the first available one.
    ///
    /// Returns `true` if the connection state changed.
    pub fn device_connected(&mut self) -> bool {
        self.hardware.attach();
        self.sync_state()
    }

    /// `device` went away. Falls back to another connected device if there
    /// is one, otherwise to the virtual surface.
    ///
    /// Returns `true` if the connection state changed.
    pub fn device_disconnected(&mut self, device: DeviceId) -> bool {
        let attached = self.hardware.attached_device().map(|info| info.id);
        if attached == Some(device) {
            self.hardware.detach();
            self.hardware.attach_excluding(device);
        } else {
            debug!("Ignoring disconnect of unattached device {}", device);
        }
        self.sync_state()
    }

    /// Drains both hardware channels without waiting, connect/disconnect
    /// notifications first. Returns the number of hardware events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.lifecycle.try_recv() {
            self.handle_hardware_event(event);
            handled += 1;
        }
        while let Ok(event) = self.handoff.try_recv() {
            self.handle_hardware_event(event);
            handled += 1;
        }
        if handled > 0 {
            trace!("Pumped {} hardware events", handled);
        }
        handled
    }

    /// Waits for the next hardware event and handles it. Pending
    /// connect/disconnect notifications are handled before samples.
    ///
    /// Returns `false` once both channels are closed.
    pub async fn pump_next(&mut self) -> bool {
        let event = tokio::select! {
            biased;
            Some(event) = self.lifecycle.recv() => event,
            Some(event) = self.handoff.recv() => event,
            else => return false,
        };
        self.handle_hardware_event(event);
        true
    }

    /// Releases every virtual stick that still has a contact, for when the
    /// surface disappears mid-drag and will never see the release.
    ///
    /// Returns the number of released sticks.
    pub fn end_active_contacts(&mut self) -> usize {
        let mut released = 0;
        for stick in StickId::ALL {
            if self.surface(stick).is_active() {
                self.contact_end(stick);
                released += 1;
            }
        }
        released
    }

    fn handle_hardware_event(&mut self, event: RawHardwareEvent) {
        match event {
            RawHardwareEvent::Button { event, timestamp } => {
                debug!(
                    "Hardware button {:?} = {:.3} (pressed: {}) at {}",
                    event.button,
                    event.value,
                    event.pressed,
                    timestamp.format("%H:%M:%S.%3f")
                );
                self.emit_button(event);
            }
            RawHardwareEvent::Stick { event, timestamp } => {
                debug!(
                    "Hardware stick {:?} = ({:.3}, {:.3}) at {}",
                    event.stick,
                    event.vector.dx,
                    event.vector.dy,
                    timestamp.format("%H:%M:%S.%3f")
                );
                self.emit_stick(event);
            }
            RawHardwareEvent::DeviceConnected { timestamp } => {
                info!(
                    "Device connect notification at {}",
                    timestamp.format("%H:%M:%S.%3f")
                );
                self.device_connected();
            }
            RawHardwareEvent::DeviceDisconnected { device, timestamp } => {
                info!(
                    "Device {} disconnect notification at {}",
                    device,
                    timestamp.format("%H:%M:%S.%3f")
                );
                self.device_disconnected(device);
            }
        }
    }

    fn sync_state(&mut self) -> bool {
        let target = if self.hardware.is_attached() {
            ConnectionState::Hardware
        } else {
            ConnectionState::Software
        };
        self.transition(target)
    }

    fn transition(&mut self, target: ConnectionState) -> bool {
        if self.state == target {
            debug!("Already in {} mode", target);
            return false;
        }
        info!("Connection state {} -> {}", self.state, target);
        self.state = target;

        self.connection_observer.dispatch(target);
        let visible = target == ConnectionState::Software;
        if !self.visibility_handler.dispatch(visible) {
            trace!("No visibility handler registered");
        }
        true
    }

    fn emit_stick(&mut self, event: StickEvent) {
        if !self.stick_handler.dispatch(event) {
            trace!("No stick handler registered, dropping {:?}", event);
        }
    }

    fn emit_button(&mut self, event: ButtonEvent) {
        if !self.button_handler.dispatch(event) {
            trace!("No button handler registered, dropping {:?}", event);
        }
    }
}

impl Drop for InputCoordinator {
    fn drop(&mut self) {
        if self.hardware.detach() {
            debug!("Input coordinator dropped, hardware handlers released");
        }
    }
}
