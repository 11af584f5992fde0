mod constants;
mod types;
mod control;
mod controller;
mod device;
mod diagnostics;
mod error;
pub mod config;
pub mod sim;
pub mod transport;

pub use control::ControlLaw;
pub use controller::Controller;
pub use device::{HapticDevice, Hapkit};
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::HapkitError;
pub use types::{map_range, raw_to_position, ActuatorCommand, AnalogPin, Cycle, Diagnostic};

// Re-export commonly used items
pub use constants::{DAMPING, JOYSTICK_X, KP, LOOP_PERIOD, MOTOR_PIN, POTENTIOMETER};
