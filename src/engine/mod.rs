//! Core engine — phase monitoring and the bet → decide → act loop.

pub mod autopilot;
pub mod monitor;

pub use autopilot::{Autopilot, AutopilotHandle, StopReason};
pub use monitor::{PhaseMonitor, PhaseSignal};
