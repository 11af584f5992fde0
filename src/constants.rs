use std::time::Duration;

use crate::types::AnalogPin;

pub const VENDOR_ID: u16 = 0x2341;
pub const PRODUCT_ID: u16 = 0x8036;
pub const SIGNATURE: u8 = 0x55;

// Command constants
pub const CMD_SERVO_ATTACH: u8 = 0x20;
pub const CMD_PIN_MODE_INPUT: u8 = 0x21;
pub const CMD_ANALOG_READ: u8 = 0x22;
pub const CMD_SERVO_WRITE: u8 = 0x23;

// Wiring
pub const JOYSTICK_X: AnalogPin = AnalogPin::A0;
pub const JOYSTICK_Y: AnalogPin = AnalogPin::A1;
pub const POTENTIOMETER: AnalogPin = AnalogPin::A2;
pub const MOTOR_PIN: u8 = 9;

// Sensor and position ranges
pub const RAW_MIN: f32 = 0.0;
pub const RAW_MAX: f32 = 1023.0;
pub const POSITION_MIN: f32 = -50.0;
pub const POSITION_MAX: f32 = 50.0;

// Servo command range
pub const COMMAND_MIN: u8 = 0;
pub const COMMAND_MAX: u8 = 180;
pub const COMMAND_NEUTRAL: u8 = 90;

// Control law
pub const KP: f32 = 1.5;
pub const DAMPING: f32 = 0.5;

pub const LOOP_PERIOD: Duration = Duration::from_millis(10);
