//! A Hapkit that exists only in memory.
//!
//! The joystick follows a [`JoystickProfile`]. The arm is driven by a
//! continuous-rotation servo: command 90 holds still, 0 and 180 run at
//! `max_speed` in either direction, and the mechanical stops sit at the ends
//! of the position range. Simulated time advances by one loop period per
//! actuator write, so a run is reproducible regardless of wall-clock jitter.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimConfig;
use crate::constants::{
    COMMAND_NEUTRAL, JOYSTICK_X, JOYSTICK_Y, POSITION_MAX, POSITION_MIN, POTENTIOMETER, RAW_MAX,
};
use crate::device::HapticDevice;
use crate::error::HapkitError;
use crate::types::{position_to_raw, ActuatorCommand, AnalogPin};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JoystickProfile {
    /// Held at one raw reading.
    Fixed { raw: i32 },
    /// Swept end to end and back, once per period.
    Sweep { period_secs: f32 },
}

impl Default for JoystickProfile {
    fn default() -> Self {
        JoystickProfile::Sweep { period_secs: 4.0 }
    }
}

impl JoystickProfile {
    pub fn sample(&self, elapsed: Duration) -> i32 {
        match *self {
            JoystickProfile::Fixed { raw } => raw,
            JoystickProfile::Sweep { period_secs } => {
                let half = RAW_MAX / 2.0;
                let phase = TAU * elapsed.as_secs_f32() / period_secs;
                (half - half * phase.cos()).round() as i32
            }
        }
    }
}

#[derive(Debug)]
struct SimState {
    elapsed: Duration,
    position: f32,
    joystick_override: Option<i32>,
    potentiometer_override: Option<i32>,
    commands: Vec<ActuatorCommand>,
    attached: bool,
}

pub struct SimulatedHapkit {
    config: SimConfig,
    dt: Duration,
    state: Arc<Mutex<SimState>>,
}

/// Shared view into a [`SimulatedHapkit`], for steering inputs and watching
/// outputs while the controller owns the device.
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHapkit {
    pub fn new(config: SimConfig, dt: Duration) -> Self {
        let position = config.initial_position.clamp(POSITION_MIN, POSITION_MAX);
        SimulatedHapkit {
            config,
            dt,
            state: Arc::new(Mutex::new(SimState {
                elapsed: Duration::ZERO,
                position,
                joystick_override: None,
                potentiometer_override: None,
                commands: Vec::new(),
                attached: false,
            })),
        }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl HapticDevice for SimulatedHapkit {
    async fn setup(&mut self) -> Result<(), HapkitError> {
        self.state.lock().attached = true;
        debug!("Simulated Hapkit attached");
        Ok(())
    }

    async fn read_analog(&mut self, pin: AnalogPin) -> Result<i32, HapkitError> {
        let state = self.state.lock();
        let raw = match pin {
            JOYSTICK_X => state
                .joystick_override
                .unwrap_or_else(|| self.config.joystick.sample(state.elapsed)),
            POTENTIOMETER => state
                .potentiometer_override
                .unwrap_or_else(|| position_to_raw(state.position)),
            JOYSTICK_Y => (RAW_MAX / 2.0).round() as i32,
            _ => 0,
        };
        Ok(raw)
    }

    async fn write_actuator(&mut self, command: ActuatorCommand) -> Result<(), HapkitError> {
        let mut state = self.state.lock();
        let neutral = COMMAND_NEUTRAL as f32;
        let velocity = (command.value() as f32 - neutral) / neutral * self.config.max_speed;

        let moved = state.position + velocity * self.dt.as_secs_f32();
        state.position = moved.clamp(POSITION_MIN, POSITION_MAX);
        state.elapsed += self.dt;
        state.commands.push(command);
        Ok(())
    }
}

impl SimHandle {
    pub fn set_joystick(&self, raw: i32) {
        self.state.lock().joystick_override = Some(raw);
    }

    pub fn set_potentiometer(&self, raw: i32) {
        self.state.lock().potentiometer_override = Some(raw);
    }

    pub fn release_overrides(&self) {
        let mut state = self.state.lock();
        state.joystick_override = None;
        state.potentiometer_override = None;
    }

    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.state.lock().commands.clone()
    }

    pub fn position(&self) -> f32 {
        self.state.lock().position
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().attached
    }
}
