//! Controller subsystem: hardware and virtual stick input unified
//!
//! 1. [`geometry`] - Circle clamping and range scaling
//! 2. [`stick_surface`] - On-screen stick model producing normalized vectors
//! 3. [`hardware_source`] - Physical gamepad adapter with attach/detach lifecycle
//! 4. [`coordinator`] - Single event stream and software/hardware failover
//! 5. [`event_collector`] - Gilrs implementation of the [`discovery`] seam
//!
//! # Architecture
//!
//! ```text
//! Gilrs ──► EventCollector ──► HardwareSource ──┐
//!           (collector thread)  (handoff chan)  ├──► InputCoordinator ──► handlers
//! Pointer ──► StickSurface (left/right) ────────┘
//! ```

pub mod coordinator;
pub mod discovery;
pub mod event_collector;
pub mod geometry;
pub mod hardware_source;
pub mod stick_surface;
pub mod types;

#[cfg(test)]
mod fake_device;

pub use coordinator::{Handler, InputCoordinator};
pub use discovery::{DeviceDiscovery, GamepadDevice, Subscription};
pub use event_collector::{CollectorError, GilrsDiscovery};
pub use geometry::{Point, Vector2};
pub use hardware_source::{HardwareSource, RawHardwareEvent};
pub use stick_surface::StickSurface;
pub use types::{ButtonEvent, ButtonId, ConnectionState, DeviceId, DeviceInfo, StickEvent, StickId};
