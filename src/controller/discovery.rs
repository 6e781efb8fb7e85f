//! Seam between the crate and the platform gamepad layer.
//!
//! The platform side is modelled as a [`DeviceDiscovery`] that reports which
//! devices exist and announces connects/disconnects, plus one
//! [`GamepadDevice`] per physical controller with per-control change
//! callbacks. All callbacks may fire on a platform thread, hence the
//! `Send + Sync` bounds.
//!
//! Every registration returns a [`Subscription`]; dropping it unregisters the
//! handler.

use std::fmt;
use std::sync::Arc;

use super::types::{ButtonId, DeviceId, DeviceInfo, StickId};

/// Button value-changed callback: `(value in [0, 1], pressed)`.
pub type ButtonHandler = Box<dyn Fn(f32, bool) + Send + Sync>;
/// Stick value-changed callback: `(x, y)`, each in `[-1, 1]`.
pub type StickHandler = Box<dyn Fn(f32, f32) + Send + Sync>;
pub type ConnectHandler = Box<dyn Fn() + Send + Sync>;
pub type DisconnectHandler = Box<dyn Fn(DeviceId) + Send + Sync>;

pub trait GamepadDevice: Send + Sync {
    fn info(&self) -> DeviceInfo;

    fn on_button_changed(&self, button: ButtonId, handler: ButtonHandler) -> Subscription;

    fn on_stick_changed(&self, stick: StickId, handler: StickHandler) -> Subscription;
}

pub trait DeviceDiscovery {
    /// Currently connected devices, in platform order.
    fn available_devices(&self) -> Vec<Arc<dyn GamepadDevice>>;

    fn on_connect(&self, handler: ConnectHandler) -> Subscription;

    fn on_disconnect(&self, handler: DisconnectHandler) -> Subscription;
}

/// Registration guard. Unregisters its handler when dropped.
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unregisters right away instead of waiting for drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
