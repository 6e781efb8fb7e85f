//! In-memory discovery used by the controller tests.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::discovery::{
    ButtonHandler, ConnectHandler, DeviceDiscovery, DisconnectHandler, GamepadDevice,
    StickHandler, Subscription,
};
use super::types::{ButtonId, DeviceId, DeviceInfo, StickId};

#[derive(Default)]
struct DeviceHandlers {
    next_token: u64,
    buttons: HashMap<u64, (ButtonId, ButtonHandler)>,
    sticks: HashMap<u64, (StickId, StickHandler)>,
}

#[derive(Clone)]
pub struct FakeDevice {
    info: DeviceInfo,
    handlers: Arc<Mutex<DeviceHandlers>>,
}

impl FakeDevice {
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            info: DeviceInfo {
                id: DeviceId(id),
                name: name.to_string(),
            },
            handlers: Arc::default(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.info.id
    }

    pub fn handler_count(&self) -> usize {
        let handlers = self.handlers.lock();
        handlers.buttons.len() + handlers.sticks.len()
    }

    pub fn set_button(&self, button: ButtonId, value: f32, pressed: bool) {
        let handlers = self.handlers.lock();
        for (target, handler) in handlers.buttons.values() {
            if *target == button {
                handler(value, pressed);
            }
        }
    }

    pub fn set_stick(&self, stick: StickId, x: f32, y: f32) {
        let handlers = self.handlers.lock();
        for (target, handler) in handlers.sticks.values() {
            if *target == stick {
                handler(x, y);
            }
        }
    }
}

impl GamepadDevice for FakeDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn on_button_changed(&self, button: ButtonId, handler: ButtonHandler) -> Subscription {
        let mut handlers = self.handlers.lock();
        let token = handlers.next_token;
        handlers.next_token += 1;
        handlers.buttons.insert(token, (button, handler));

        let registry = self.handlers.clone();
        Subscription::new(move || {
            registry.lock().buttons.remove(&token);
        })
    }

    fn on_stick_changed(&self, stick: StickId, handler: StickHandler) -> Subscription {
        let mut handlers = self.handlers.lock();
        let token = handlers.next_token;
        handlers.next_token += 1;
        handlers.sticks.insert(token, (stick, handler));

        let registry = self.handlers.clone();
        Subscription::new(move || {
            registry.lock().sticks.remove(&token);
        })
    }
}

#[derive(Default)]
struct Hub {
    devices: Vec<FakeDevice>,
    connect: Vec<ConnectHandler>,
    disconnect: Vec<DisconnectHandler>,
}

/// Discovery whose device list and notifications are driven by the test.
#[derive(Clone, Default)]
pub struct FakeDiscovery {
    hub: Arc<Mutex<Hub>>,
}

impl FakeDiscovery {
    /// Adds a device without announcing it.
    pub fn insert(&self, device: FakeDevice) {
        self.hub.lock().devices.push(device);
    }

    /// Adds a device and fires the connect notification.
    pub fn plug(&self, device: FakeDevice) {
        self.insert(device);
        self.notify_connect();
    }

    /// Removes a device and fires the disconnect notification.
    pub fn unplug(&self, id: DeviceId) {
        self.hub.lock().devices.retain(|device| device.id() != id);
        self.notify_disconnect(id);
    }

    pub fn notify_connect(&self) {
        for handler in &self.hub.lock().connect {
            handler();
        }
    }

    pub fn notify_disconnect(&self, id: DeviceId) {
        for handler in &self.hub.lock().disconnect {
            handler(id);
        }
    }

    pub fn watcher_count(&self) -> usize {
        let hub = self.hub.lock();
        hub.connect.len() + hub.disconnect.len()
    }
}

impl DeviceDiscovery for FakeDiscovery {
    fn available_devices(&self) -> Vec<Arc<dyn GamepadDevice>> {
        self.hub
            .lock()
            .devices
            .iter()
            .map(|device| Arc::new(device.clone()) as Arc<dyn GamepadDevice>)
            .collect()
    }

    fn on_connect(&self, handler: ConnectHandler) -> Subscription {
        self.hub.lock().connect.push(handler);
        let hub = self.hub.clone();
        Subscription::new(move || hub.lock().connect.clear())
    }

    fn on_disconnect(&self, handler: DisconnectHandler) -> Subscription {
        self.hub.lock().disconnect.push(handler);
        let hub = self.hub.clone();
        Subscription::new(move || hub.lock().disconnect.clear())
    }
}
