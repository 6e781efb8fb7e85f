//! Physical controller adapter.
//!
//! Registers per-control handlers on the first available device and turns
//! their callbacks into unified [`ButtonEvent`]s and [`StickEvent`]s. Callbacks
//! run on the platform thread, so everything crosses to the coordinator's home
//! thread through channels:
//!
//! - samples go through a bounded handoff channel and are dropped when it is
//!   full; a newer sample of the same control follows anyway.
//! - connect/disconnect notifications go through an unbounded lifecycle
//!   channel. Losing one would leave the connection state out of sync with
//!   the attached device.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::discovery::{DeviceDiscovery, GamepadDevice, Subscription};
use super::geometry::Vector2;
use super::types::{ButtonEvent, ButtonId, DeviceId, DeviceInfo, StickEvent, StickId};

// Message crossing from the platform thread to the home thread
#[derive(Debug, Clone)]
pub enum RawHardwareEvent {
    Button {
        event: ButtonEvent,
        timestamp: DateTime<Local>,
    },
    Stick {
        event: StickEvent,
        timestamp: DateTime<Local>,
    },
    DeviceConnected {
        timestamp: DateTime<Local>,
    },
    DeviceDisconnected {
        device: DeviceId,
        timestamp: DateTime<Local>,
    },
}

struct Attachment {
    info: DeviceInfo,
    _subscriptions: Vec<Subscription>,
}

pub struct HardwareSource {
    discovery: Box<dyn DeviceDiscovery>,
    funnel: mpsc::Sender<RawHardwareEvent>,
    attached: Option<Attachment>,
    _watchers: [Subscription; 2],
}

impl HardwareSource {
    /// Subscribes to connect/disconnect notifications of `discovery`.
    ///
    /// When a device is already present a connect notification is queued, so
    /// the first drain of the channel attaches it.
    pub fn new(
        discovery: Box<dyn DeviceDiscovery>,
        funnel: mpsc::Sender<RawHardwareEvent>,
        lifecycle: mpsc::UnboundedSender<RawHardwareEvent>,
    ) -> Self {
        let connect_watcher = {
            let lifecycle = lifecycle.clone();
            discovery.on_connect(Box::new(move || {
                announce(
                    &lifecycle,
                    RawHardwareEvent::DeviceConnected {
                        timestamp: Local::now(),
                    },
                );
            }))
        };
        let disconnect_watcher = {
            let lifecycle = lifecycle.clone();
            discovery.on_disconnect(Box::new(move |device| {
                announce(
                    &lifecycle,
                    RawHardwareEvent::DeviceDisconnected {
                        device,
                        timestamp: Local::now(),
                    },
                );
            }))
        };

        if !discovery.available_devices().is_empty() {
            debug!("Device present at startup, queueing connect");
            announce(
                &lifecycle,
                RawHardwareEvent::DeviceConnected {
                    timestamp: Local::now(),
                },
            );
        }

        Self {
            discovery,
            funnel,
            attached: None,
            _watchers: [connect_watcher, disconnect_watcher],
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn attached_device(&self) -> Option<&DeviceInfo> {
        self.attached.as_ref().map(|attachment| &attachment.info)
    }

    /// Attaches the first available device.
    ///
    /// Returns `true` if the attached device changed. Attaching the device that
    /// is already attached is a no-op; no device at all leaves the current
    /// attachment untouched.
    pub fn attach(&mut self) -> bool {
        let Some(device) = self.discovery.available_devices().into_iter().next() else {
            debug!("Attach requested but no device is available");
            return false;
        };
        self.attach_device(device)
    }

    /// Attaches the first available device other than `excluded`.
    pub fn attach_excluding(&mut self, excluded: DeviceId) -> bool {
        let next = self
            .discovery
            .available_devices()
            .into_iter()
            .find(|device| device.info().id != excluded);
        match next {
            Some(device) => self.attach_device(device),
            None => false,
        }
    }

    fn attach_device(&mut self, device: Arc<dyn GamepadDevice>) -> bool {
        let info = device.info();
        if self.attached_device().map(|current| current.id) == Some(info.id) {
            debug!("Device {} ({}) already attached", info.name, info.id);
            return false;
        }
        self.detach();

        let mut subscriptions = Vec::with_capacity(ButtonId::ALL.len() + StickId::ALL.len());
        for button in ButtonId::ALL {
            let funnel = self.funnel.clone();
            subscriptions.push(device.on_button_changed(
                button,
                Box::new(move |value, pressed| {
                    forward(
                        &funnel,
                        RawHardwareEvent::Button {
                            event: ButtonEvent {
                                button,
                                value: value.clamp(0.0, 1.0),
                                pressed,
                            },
                            timestamp: Local::now(),
                        },
                    );
                }),
            ));
        }
        for stick in StickId::ALL {
            let funnel = self.funnel.clone();
            subscriptions.push(device.on_stick_changed(
                stick,
                Box::new(move |x, y| {
                    forward(
                        &funnel,
                        RawHardwareEvent::Stick {
                            event: StickEvent {
                                stick,
                                vector: Vector2::new(x, y),
                            },
                            timestamp: Local::now(),
                        },
                    );
                }),
            ));
        }

        info!(
            "Attached {} ({}) with {} handlers",
            info.name,
            info.id,
            subscriptions.len()
        );
        self.attached = Some(Attachment {
            info,
            _subscriptions: subscriptions,
        });
        true
    }

    /// Unregisters all handlers of the attached device.
    ///
    /// Returns `true` if a device was attached.
    pub fn detach(&mut self) -> bool {
        match self.attached.take() {
            Some(attachment) => {
                info!("Detached {} ({})", attachment.info.name, attachment.info.id);
                true
            }
            None => false,
        }
    }
}

fn announce(lifecycle: &mpsc::UnboundedSender<RawHardwareEvent>, event: RawHardwareEvent) {
    if lifecycle.send(event).is_err() {
        debug!("Lifecycle channel closed, coordinator is gone");
    }
}

fn forward(funnel: &mpsc::Sender<RawHardwareEvent>, event: RawHardwareEvent) {
    match funnel.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!("Hardware handoff channel full, dropping {:?}", event);
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Hardware handoff channel closed, coordinator is gone");
        }
    }
}
