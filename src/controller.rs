use std::convert::Infallible;

use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::{
    constants::*,
    control::ControlLaw,
    device::HapticDevice,
    diagnostics::DiagnosticSink,
    error::HapkitError,
    types::Cycle,
};

/// Drives one Hapkit: read both channels, apply the law, write the servo,
/// report, then wait out the rest of the period.
pub struct Controller<D, S> {
    device: D,
    sink: S,
    law: ControlLaw,
    period: Duration,
}

impl<D: HapticDevice, S: DiagnosticSink> Controller<D, S> {
    pub fn new(device: D, sink: S) -> Self {
        Controller {
            device,
            sink,
            law: ControlLaw::HAPKIT,
            period: LOOP_PERIOD,
        }
    }

    /// Stretches the loop period. Never goes below `LOOP_PERIOD`.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(LOOP_PERIOD);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn law(&self) -> &ControlLaw {
        &self.law
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn setup(&mut self) -> Result<(), HapkitError> {
        self.device.setup().await
    }

    /// One unpaced iteration.
    pub async fn step(&mut self) -> Result<Cycle, HapkitError> {
        let raw_target = self.device.read_analog(JOYSTICK_X).await?;
        let raw_current = self.device.read_analog(POTENTIOMETER).await?;

        let cycle = self.law.evaluate(raw_target, raw_current);

        self.device.write_actuator(cycle.command).await?;
        self.sink.emit(&cycle.diagnostic());

        debug!(
            raw_target,
            raw_current,
            error = cycle.error,
            command = cycle.command.value(),
            "step"
        );
        Ok(cycle)
    }

    /// Steps once per period until the device fails.
    pub async fn run(&mut self) -> Result<Infallible, HapkitError> {
        info!("Control loop running every {:?}", self.period);
        let mut ticker = self.ticker();
        loop {
            ticker.tick().await;
            self.step().await?;
        }
    }

    /// Like `run`, but stops after `iterations` steps and returns the last one.
    pub async fn run_for(&mut self, iterations: u64) -> Result<Option<Cycle>, HapkitError> {
        info!("Control loop running {} iterations every {:?}", iterations, self.period);
        let mut ticker = self.ticker();
        let mut last = None;
        for _ in 0..iterations {
            ticker.tick().await;
            last = Some(self.step().await?);
        }
        Ok(last)
    }

    // A late iteration pushes the schedule back instead of bunching the
    // following ticks together.
    fn ticker(&self) -> Interval {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
