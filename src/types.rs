use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

use crate::constants::{COMMAND_MAX, COMMAND_MIN, POSITION_MAX, POSITION_MIN, RAW_MAX, RAW_MIN};

#[derive(Debug, EnumIter, EnumString, Display, Clone, Copy, Eq, PartialEq, Hash)]
pub enum AnalogPin {
    A0 = 0, // joystick X
    A1 = 1, // joystick Y, wired but unused
    A2 = 2, // arm potentiometer
    A3 = 3,
    A4 = 4,
    A5 = 5,
}

/// Servo command written to the motor, always within `0..=180`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ActuatorCommand(u8);

impl ActuatorCommand {
    pub const MIN: ActuatorCommand = ActuatorCommand(COMMAND_MIN);
    pub const MAX: ActuatorCommand = ActuatorCommand(COMMAND_MAX);

    /// Saturates `force` into the servo range and truncates toward zero.
    ///
    /// Non-finite forces are not rejected: NaN lands on 0, infinities on
    /// whichever end they point at.
    pub fn from_force(force: f32) -> Self {
        ActuatorCommand(force.clamp(COMMAND_MIN as f32, COMMAND_MAX as f32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the loop reports once per iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostic {
    pub target_position: f32,
    pub current_position: f32,
    pub force: f32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Joystick: {:.2}\tPosition: {:.2}\tForce: {:.2}",
            self.target_position, self.current_position, self.force
        )
    }
}

/// Every value computed during one pass of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle {
    pub raw_target: i32,
    pub raw_current: i32,
    pub target_position: f32,
    pub current_position: f32,
    pub error: f32,
    pub force: f32,
    pub command: ActuatorCommand,
}

impl Cycle {
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            target_position: self.target_position,
            current_position: self.current_position,
            force: self.force,
        }
    }
}

/// Linear rescale from one range to another. Does not saturate.
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

pub fn raw_to_position(raw: i32) -> f32 {
    map_range(raw as f32, RAW_MIN, RAW_MAX, POSITION_MIN, POSITION_MAX)
}

// Inverse of `raw_to_position`, limited to what the ADC can report.
pub(crate) fn position_to_raw(position: f32) -> i32 {
    map_range(position, POSITION_MIN, POSITION_MAX, RAW_MIN, RAW_MAX)
        .round()
        .clamp(RAW_MIN, RAW_MAX) as i32
}
