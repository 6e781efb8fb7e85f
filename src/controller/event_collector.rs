//! Gilrs backed device discovery
//!
//! A dedicated thread owns the [`Gilrs`] context and runs an [`EventCollector`]
//! state machine (`Initializing` → `Collecting`). Gilrs events are translated
//! into calls on the handlers registered through [`GilrsDiscovery`] and
//! [`GilrsDevice`]; those handlers run on the collector thread.

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use parking_lot::Mutex;
use statum::{machine, state};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::discovery::{
    ButtonHandler, ConnectHandler, DeviceDiscovery, DisconnectHandler, GamepadDevice,
    StickHandler, Subscription,
};
use super::types::{ButtonId, DeviceId, DeviceInfo, StickId};
pub use crate::config::CollectorSettings;

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to spawn collector thread: {0}")]
    SpawnError(String),
}

/// Handlers and device list shared between the collector thread and the
/// handles given out to the coordinator.
#[derive(Default)]
pub struct HandlerRegistry {
    next_token: u64,
    connected: Vec<DeviceInfo>,
    buttons: Vec<(u64, DeviceId, ButtonId, ButtonHandler)>,
    sticks: Vec<(u64, DeviceId, StickId, StickHandler)>,
    connect: Vec<(u64, ConnectHandler)>,
    disconnect: Vec<(u64, DisconnectHandler)>,
}

pub type SharedRegistry = Arc<Mutex<HandlerRegistry>>;

impl HandlerRegistry {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn emit_button(&self, device: DeviceId, button: ButtonId, value: f32, pressed: bool) {
        for (_, target, id, handler) in &self.buttons {
            if *target == device && *id == button {
                handler(value, pressed);
            }
        }
    }

    fn emit_stick(&self, device: DeviceId, stick: StickId, x: f32, y: f32) {
        for (_, target, id, handler) in &self.sticks {
            if *target == device && *id == stick {
                handler(x, y);
            }
        }
    }

    // The device list is updated before any handler runs, so handlers that
    // re-resolve devices see the new state.
    fn device_connected(&mut self, info: DeviceInfo) {
        if !self.connected.iter().any(|known| known.id == info.id) {
            self.connected.push(info);
        }
        for (_, handler) in &self.connect {
            handler();
        }
    }

    fn device_disconnected(&mut self, device: DeviceId) {
        self.connected.retain(|known| known.id != device);
        for (_, handler) in &self.disconnect {
            handler(device);
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("connected", &self.connected)
            .field("buttons", &self.buttons.len())
            .field("sticks", &self.sticks.len())
            .field("connect", &self.connect.len())
            .field("disconnect", &self.disconnect.len())
            .finish()
    }
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Handlers to call for translated events
    registry: SharedRegistry,

    // Collector settings
    settings: CollectorSettings,

    // Cancelled when the discovery handle is dropped
    shutdown: CancellationToken,

    // Last seen (x, y) per stick and gamepad, gilrs reports axes one at a time
    sticks: HashMap<GamepadId, [(f32, f32); 2]>,
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: CollectorSettings,
        registry: SharedRegistry,
        shutdown: CancellationToken,
    ) -> Result<Self, CollectorError> {
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, registry, settings, shutdown, HashMap::new()))
    }

    // Record already connected gamepads and transition to Collecting state
    pub fn initialize(self) -> EventCollector<Collecting> {
        {
            let mut registry = self.registry.lock();
            for (id, gamepad) in self.gilrs.gamepads() {
                info!(
                    "Found gamepad ID: {}, Name: {}, UUID: {:?}",
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
                let info = DeviceInfo {
                    id: device_id(id),
                    name: gamepad.name().to_string(),
                };
                if !registry.connected.iter().any(|known| known.id == info.id) {
                    registry.connected.push(info);
                }
            }
            if registry.connected.is_empty() {
                warn!("No gamepad connected, virtual sticks stay active");
            }
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        self.transition()
    }
}

impl EventCollector<Collecting> {
    // Poll gilrs until the discovery handle goes away
    pub fn run_collection_loop(&mut self) {
        info!("Starting Event Collector loop");
        let idle = Duration::from_millis(self.settings.poll_interval_ms.max(1));

        while !self.shutdown.is_cancelled() {
            while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
                self.dispatch(id, event);
            }
            std::thread::sleep(idle);
        }

        info!("Event Collector loop stopped");
    }

    fn dispatch(&mut self, id: GamepadId, event: EventType) {
        let device = device_id(id);
        match event {
            EventType::Connected => {
                let name = self.gilrs.gamepad(id).name().to_string();
                info!("Gamepad connected: {} ({})", name, device);
                self.registry
                    .lock()
                    .device_connected(DeviceInfo { id: device, name });
            }
            EventType::Disconnected => {
                warn!("Gamepad disconnected: {}", device);
                self.sticks.remove(&id);
                self.registry.lock().device_disconnected(device);
            }
            EventType::ButtonChanged(button, value, _) => {
                let Some(button_id) = map_button(button) else {
                    debug!("Ignoring unmapped button: {:?}", button);
                    return;
                };
                let pressed = self.gilrs.gamepad(id).is_pressed(button);
                debug!(
                    "Button {:?} -> {:?} = {:.3} (pressed: {})",
                    button, button_id, value, pressed
                );
                self.registry
                    .lock()
                    .emit_button(device, button_id, value, pressed);
            }
            EventType::AxisChanged(axis, value, _) => self.axis_changed(id, axis, value),
            _ => debug!("Unhandled event type: {:?}", event),
        }
    }

    fn axis_changed(&mut self, id: GamepadId, axis: Axis, value: f32) {
        let device = device_id(id);
        let (stick, is_x) = match axis {
            Axis::LeftStickX => (StickId::Left, true),
            Axis::LeftStickY => (StickId::Left, false),
            Axis::RightStickX => (StickId::Right, true),
            Axis::RightStickY => (StickId::Right, false),
            Axis::LeftZ | Axis::RightZ => {
                let button = if axis == Axis::LeftZ {
                    ButtonId::LeftTrigger
                } else {
                    ButtonId::RightTrigger
                };
                let value = value.clamp(0.0, 1.0);
                let pressed = value >= self.settings.trigger_press_threshold;
                self.registry
                    .lock()
                    .emit_button(device, button, value, pressed);
                return;
            }
            _ => {
                debug!("Ignoring unsupported axis: {:?}", axis);
                return;
            }
        };

        let value = apply_deadzone(value, self.settings.joystick_deadzone);
        let slot = &mut self.sticks.entry(id).or_default()[stick_index(stick)];
        if is_x {
            slot.0 = value;
        } else {
            slot.1 = value;
        }
        let (x, y) = *slot;
        self.registry.lock().emit_stick(device, stick, x, y);
    }
}

/// [`DeviceDiscovery`] over gilrs. Dropping it stops the collector thread.
pub struct GilrsDiscovery {
    registry: SharedRegistry,
    _shutdown: DropGuard,
}

impl GilrsDiscovery {
    /// Starts the collector thread and waits until gilrs is initialized.
    pub async fn spawn(settings: CollectorSettings) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let registry = SharedRegistry::default();
        let shutdown = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_registry = registry.clone();
        let thread_shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("gilrs-collector".to_string())
            .spawn(move || {
                let collector =
                    match EventCollector::create(settings, thread_registry, thread_shutdown) {
                        Ok(collector) => collector,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                let mut collecting = collector.initialize();
                let _ = ready_tx.send(Ok(()));
                collecting.run_collection_loop();
            })
            .map_err(|e| CollectorError::SpawnError(e.to_string()))?;

        ready_rx.await.map_err(|_| {
            CollectorError::InitializationError("collector thread exited during startup".to_string())
        })??;

        info!("Event Collector successfully started");
        Ok(Self {
            registry,
            _shutdown: shutdown.drop_guard(),
        })
    }
}

impl DeviceDiscovery for GilrsDiscovery {
    fn available_devices(&self) -> Vec<Arc<dyn GamepadDevice>> {
        self.registry
            .lock()
            .connected
            .iter()
            .map(|info| {
                Arc::new(GilrsDevice {
                    info: info.clone(),
                    registry: self.registry.clone(),
                }) as Arc<dyn GamepadDevice>
            })
            .collect()
    }

    fn on_connect(&self, handler: ConnectHandler) -> Subscription {
        let mut registry = self.registry.lock();
        let token = registry.token();
        registry.connect.push((token, handler));

        drop(registry);

        let handle = self.registry.clone();
        Subscription::new(move || handle.lock().connect.retain(|(t, _)| *t != token))
    }

    fn on_disconnect(&self, handler: DisconnectHandler) -> Subscription {
        let mut registry = self.registry.lock();
        let token = registry.token();
        registry.disconnect.push((token, handler));

        drop(registry);

        let handle = self.registry.clone();
        Subscription::new(move || handle.lock().disconnect.retain(|(t, _)| *t != token))
    }
}

/// One gilrs gamepad as seen by the coordinator.
pub struct GilrsDevice {
    info: DeviceInfo,
    registry: SharedRegistry,
}

impl GamepadDevice for GilrsDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn on_button_changed(&self, button: ButtonId, handler: ButtonHandler) -> Subscription {
        let mut registry = self.registry.lock();
        let token = registry.token();
        registry.buttons.push((token, self.info.id, button, handler));

        drop(registry);

        let handle = self.registry.clone();
        Subscription::new(move || handle.lock().buttons.retain(|(t, ..)| *t != token))
    }

    fn on_stick_changed(&self, stick: StickId, handler: StickHandler) -> Subscription {
        let mut registry = self.registry.lock();
        let token = registry.token();
        registry.sticks.push((token, self.info.id, stick, handler));

        drop(registry);

        let handle = self.registry.clone();
        Subscription::new(move || handle.lock().sticks.retain(|(t, ..)| *t != token))
    }
}

fn device_id(id: GamepadId) -> DeviceId {
    DeviceId(usize::from(id))
}

fn stick_index(stick: StickId) -> usize {
    match stick {
        StickId::Left => 0,
        StickId::Right => 1,
    }
}

// Helper function to map gilrs Button to our ButtonId
fn map_button(button: Button) -> Option<ButtonId> {
    match button {
        Button::South => Some(ButtonId::A),
        Button::East => Some(ButtonId::B),
        Button::West => Some(ButtonId::X),
        Button::North => Some(ButtonId::Y),
        Button::LeftTrigger => Some(ButtonId::LeftShoulder),
        Button::RightTrigger => Some(ButtonId::RightShoulder),
        Button::LeftTrigger2 => Some(ButtonId::LeftTrigger),
        Button::RightTrigger2 => Some(ButtonId::RightTrigger),
        _ => None,
    }
}

// Helper function to apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn device(registry: &SharedRegistry, id: usize) -> GilrsDevice {
        GilrsDevice {
            info: DeviceInfo {
                id: DeviceId(id),
                name: format!("pad {id}"),
            },
            registry: registry.clone(),
        }
    }

    #[test]
    fn deadzone_zeroes_small_values_and_rescales_the_rest() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(-0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
        assert!((apply_deadzone(0.525, 0.05) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn maps_face_shoulder_and_trigger_buttons() {
        assert_eq!(map_button(Button::South), Some(ButtonId::A));
        assert_eq!(map_button(Button::North), Some(ButtonId::Y));
        assert_eq!(map_button(Button::LeftTrigger), Some(ButtonId::LeftShoulder));
        assert_eq!(map_button(Button::RightTrigger2), Some(ButtonId::RightTrigger));
        assert_eq!(map_button(Button::Start), None);
    }

    #[test]
    fn routes_events_to_matching_device_and_control() {
        let registry = SharedRegistry::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let _sub = {
            let hits = hits.clone();
            device(&registry, 1).on_button_changed(
                ButtonId::A,
                Box::new(move |value, pressed| {
                    assert_eq!(value, 1.0);
                    assert!(pressed);
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };

        let registry_guard = registry.lock();
        registry_guard.emit_button(DeviceId(1), ButtonId::A, 1.0, true);
        registry_guard.emit_button(DeviceId(2), ButtonId::A, 1.0, true);
        registry_guard.emit_button(DeviceId(1), ButtonId::B, 1.0, true);
        drop(registry_guard);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_unregisters_handler() {
        let registry = SharedRegistry::default();
        let sub = device(&registry, 1).on_stick_changed(StickId::Left, Box::new(|_, _| {}));
        assert_eq!(registry.lock().sticks.len(), 1);
        drop(sub);
        assert!(registry.lock().sticks.is_empty());
    }

    #[test]
    fn connect_updates_device_list_before_notifying() {
        let registry = SharedRegistry::default();
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let seen = seen.clone();
            let mut guard = registry.lock();
            guard.connect.push((
                0,
                Box::new(move || {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
            ));
        }

        let info = DeviceInfo {
            id: DeviceId(4),
            name: "pad".to_string(),
        };
        registry.lock().device_connected(info.clone());
        registry.lock().device_connected(info);
        assert_eq!(registry.lock().connected.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        registry.lock().device_disconnected(DeviceId(4));
        assert!(registry.lock().connected.is_empty());
    }
}
