use std::time::Duration;

use approx::assert_relative_eq;
use hapkit::config::SimConfig;
use hapkit::sim::{JoystickProfile, SimHandle, SimulatedHapkit};
use hapkit::transport::TransportError;
use hapkit::{
    ActuatorCommand, AnalogPin, Controller, Diagnostic, HapkitError, HapticDevice, LOOP_PERIOD,
};

fn simulated(joystick: JoystickProfile) -> (SimulatedHapkit, SimHandle) {
    let device = SimulatedHapkit::new(
        SimConfig {
            joystick,
            ..SimConfig::default()
        },
        LOOP_PERIOD,
    );
    let handle = device.handle();
    (device, handle)
}

#[tokio::test(start_paused = true)]
async fn joystick_max_against_arm_min() {
    let (device, handle) = simulated(JoystickProfile::Fixed { raw: 1023 });
    handle.set_potentiometer(0);
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

    let cycle = controller.run_for(1).await.unwrap().unwrap();

    assert_eq!(cycle.target_position, 50.0);
    assert_eq!(cycle.current_position, -50.0);
    assert_eq!(cycle.error, 100.0);
    assert_eq!(cycle.force, 175.0);
    assert_eq!(handle.commands(), vec![ActuatorCommand::from_force(175.0)]);
    assert_eq!(handle.commands()[0].value(), 175);
}

#[tokio::test(start_paused = true)]
async fn joystick_min_against_arm_max() {
    let (device, handle) = simulated(JoystickProfile::Fixed { raw: 0 });
    handle.set_potentiometer(1023);
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

    let cycle = controller.run_for(1).await.unwrap().unwrap();

    assert_eq!(cycle.force, -175.0);
    assert_eq!(handle.commands(), vec![ActuatorCommand::MIN]);
    assert_eq!(
        controller.sink()[0].to_string(),
        "Joystick: -50.00\tPosition: 50.00\tForce: -175.00"
    );
}

#[tokio::test(start_paused = true)]
async fn centred_readings_only_feel_the_damping() {
    for raw in [511, 512] {
        let (device, handle) = simulated(JoystickProfile::Fixed { raw });
        handle.set_potentiometer(raw);
        let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

        let cycle = controller.run_for(1).await.unwrap().unwrap();

        assert_relative_eq!(cycle.error, 0.0);
        assert_relative_eq!(cycle.force, -0.5 * cycle.current_position, epsilon = 1e-6);
        assert_eq!(handle.commands(), vec![ActuatorCommand::MIN]);
    }
}

#[tokio::test(start_paused = true)]
async fn same_inputs_give_same_outputs_on_consecutive_iterations() {
    let (device, handle) = simulated(JoystickProfile::Fixed { raw: 800 });
    handle.set_potentiometer(200);
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

    controller.run_for(2).await.unwrap();

    let commands = handle.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0], commands[1]);
    assert_eq!(controller.sink()[0], controller.sink()[1]);
}

#[tokio::test(start_paused = true)]
async fn iterations_are_spaced_by_the_period() {
    let (device, _handle) = simulated(JoystickProfile::default());
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

    let start = tokio::time::Instant::now();
    controller.run_for(5).await.unwrap();

    // The first iteration runs immediately.
    assert_eq!(start.elapsed(), LOOP_PERIOD * 4);
    assert_eq!(controller.sink().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn longer_period_is_honoured() {
    let (device, _handle) = simulated(JoystickProfile::default());
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new())
        .with_period(Duration::from_millis(25));

    let start = tokio::time::Instant::now();
    controller.run_for(3).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn run_keeps_going_until_stopped_from_outside() {
    let (device, handle) = simulated(JoystickProfile::default());
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());

    let result = tokio::time::timeout(Duration::from_millis(105), controller.run()).await;

    assert!(result.is_err(), "run returned on its own");
    assert_eq!(handle.commands().len(), 11);
}

#[tokio::test(start_paused = true)]
async fn arm_settles_where_the_servo_is_neutral() {
    // Joystick at +50: force = 75 - 2 * position, so the servo sits at 90
    // (no motion) once the arm reaches -7.5.
    let (device, handle) = simulated(JoystickProfile::Fixed { raw: 1023 });
    let mut controller = Controller::new(device, Vec::<Diagnostic>::new());
    controller.setup().await.unwrap();

    controller.run_for(500).await.unwrap();

    assert!(handle.is_attached());
    assert_relative_eq!(handle.position(), -7.5, epsilon = 1.0);
    let last = *handle.commands().last().unwrap();
    assert!((88..=92).contains(&last.value()), "last command {}", last);
}

struct Unplugged;

impl HapticDevice for Unplugged {
    async fn read_analog(&mut self, _pin: AnalogPin) -> Result<i32, HapkitError> {
        Err(TransportError::NoDeviceFound.into())
    }

    async fn write_actuator(&mut self, _command: ActuatorCommand) -> Result<(), HapkitError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn device_failure_ends_the_loop() {
    let mut controller = Controller::new(Unplugged, Vec::<Diagnostic>::new());

    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, HapkitError::Transport(TransportError::NoDeviceFound)));
    assert!(controller.sink().is_empty());
}
