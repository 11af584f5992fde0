use crate::constants::{DAMPING, KP};
use crate::types::{raw_to_position, ActuatorCommand, Cycle};

/// The proportional-damping law driving the Hapkit motor.
///
/// Damping acts on the arm's absolute position, not its velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLaw {
    kp: f32,
    damping: f32,
}

impl ControlLaw {
    pub const HAPKIT: ControlLaw = ControlLaw { kp: KP, damping: DAMPING };

    pub fn kp(&self) -> f32 {
        self.kp
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn force(&self, target_position: f32, current_position: f32) -> f32 {
        let error = target_position - current_position;
        self.kp * error - self.damping * current_position
    }

    /// Maps both readings, applies the law and saturates the result.
    pub fn evaluate(&self, raw_target: i32, raw_current: i32) -> Cycle {
        let target_position = raw_to_position(raw_target);
        let current_position = raw_to_position(raw_current);
        let error = target_position - current_position;
        let force = self.force(target_position, current_position);

        Cycle {
            raw_target,
            raw_current,
            target_position,
            current_position,
            error,
            force,
            command: ActuatorCommand::from_force(force),
        }
    }
}

impl Default for ControlLaw {
    fn default() -> Self {
        ControlLaw::HAPKIT
    }
}
