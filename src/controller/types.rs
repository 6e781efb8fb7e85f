//! Unified event vocabulary shared by the hardware and virtual input paths.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::geometry::Vector2;

// Button identifiers, identical for both input sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonId {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
}

impl ButtonId {
    pub const ALL: [ButtonId; 8] = [
        ButtonId::A,
        ButtonId::B,
        ButtonId::X,
        ButtonId::Y,
        ButtonId::LeftShoulder,
        ButtonId::RightShoulder,
        ButtonId::LeftTrigger,
        ButtonId::RightTrigger,
    ];
}

// Stick identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickId {
    Left,
    Right,
}

impl StickId {
    pub const ALL: [StickId; 2] = [StickId::Left, StickId::Right];
}

/// Analog button change, `value` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub value: f32,
    pub pressed: bool,
}

/// Stick change with a normalized direction vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickEvent {
    pub stick: StickId,
    pub vector: Vector2,
}

/// Which source currently owns the presentation.
///
/// `Hardware` holds iff a physical device is attached. Event delivery does not
/// depend on this value, only the visibility of the virtual surface does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Software,
    Hardware,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionState::Software => write!(f, "software"),
            ConnectionState::Hardware => write!(f, "hardware"),
        }
    }
}

// Platform identity of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
}
