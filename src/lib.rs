//! Unified gamepad input: physical controllers and on-screen virtual sticks
//! behind one event stream.

pub mod config;
pub mod controller;
pub mod ui;
