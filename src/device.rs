use tracing::{debug, info};

use crate::config::{ConfigError, DeviceKind, RuntimeConfig};
use crate::constants::*;
use crate::error::HapkitError;
use crate::transport::Transport;
use crate::types::{ActuatorCommand, AnalogPin};

/// The I/O the control loop needs from a Hapkit.
#[allow(async_fn_in_trait)]
pub trait HapticDevice {
    /// One-time pin and servo configuration, before the loop starts.
    async fn setup(&mut self) -> Result<(), HapkitError> {
        Ok(())
    }

    async fn read_analog(&mut self, pin: AnalogPin) -> Result<i32, HapkitError>;

    async fn write_actuator(&mut self, command: ActuatorCommand) -> Result<(), HapkitError>;
}

/// A physical Hapkit behind a bridge board.
pub struct Hapkit {
    transport: Transport,
}

impl Hapkit {
    pub async fn connect(config: &RuntimeConfig) -> Result<Self, HapkitError> {
        let transport = match config.device {
            DeviceKind::Hid => Transport::hid(&config.hid).await?,
            DeviceKind::Bluetooth => Transport::bluetooth(&config.bluetooth).await?,
            DeviceKind::Auto => Transport::new(&config.hid, &config.bluetooth).await?,
            DeviceKind::Simulated => return Err(ConfigError::NoLink(config.device).into()),
        };
        Ok(Hapkit { transport })
    }

    pub fn from_transport(transport: Transport) -> Self {
        Hapkit { transport }
    }
}

impl HapticDevice for Hapkit {
    async fn setup(&mut self) -> Result<(), HapkitError> {
        for (cmd, data) in setup_requests() {
            self.transport.send(cmd, &data).await?;
        }
        info!(motor_pin = MOTOR_PIN, "Hapkit attached");
        Ok(())
    }

    async fn read_analog(&mut self, pin: AnalogPin) -> Result<i32, HapkitError> {
        let (cmd, data) = analog_read_request(pin);
        self.transport.send(cmd, &data).await?;
        let response = self.transport.recv(cmd).await?;
        let raw = parse_analog_reply(pin, &response)?;
        debug!("{} raw: {}", pin, raw);
        Ok(raw)
    }

    async fn write_actuator(&mut self, command: ActuatorCommand) -> Result<(), HapkitError> {
        let (cmd, data) = servo_write_request(command);
        self.transport.send(cmd, &data).await?;
        Ok(())
    }
}

// Input mode on both sensed channels, then attach the servo.
fn setup_requests() -> [(u8, Vec<u8>); 2] {
    let inputs = [JOYSTICK_X as u8, POTENTIOMETER as u8];
    let mut pin_mode = vec![inputs.len() as u8];
    pin_mode.extend_from_slice(&inputs);

    [
        (CMD_PIN_MODE_INPUT, pin_mode),
        (CMD_SERVO_ATTACH, vec![MOTOR_PIN]),
    ]
}

fn analog_read_request(pin: AnalogPin) -> (u8, Vec<u8>) {
    (CMD_ANALOG_READ, vec![pin as u8])
}

fn servo_write_request(command: ActuatorCommand) -> (u8, Vec<u8>) {
    (CMD_SERVO_WRITE, vec![MOTOR_PIN, command.value()])
}

// `[pin, lo, hi]`
fn parse_analog_reply(pin: AnalogPin, response: &[u8]) -> Result<i32, HapkitError> {
    if response.len() < 3 {
        return Err(HapkitError::UnexpectedReply {
            cmd: CMD_ANALOG_READ,
            reason: format!("expected 3 bytes, got {}", response.len()),
        });
    }

    if response[0] != pin as u8 {
        return Err(HapkitError::UnexpectedReply {
            cmd: CMD_ANALOG_READ,
            reason: format!("asked for pin {} but got pin {}", pin as u8, response[0]),
        });
    }

    Ok(u16::from_le_bytes([response[1], response[2]]) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::encode_frame;

    fn frame((cmd, data): (u8, Vec<u8>)) -> Vec<u8> {
        encode_frame(cmd, &data)
    }

    #[test]
    fn setup_configures_inputs_then_attaches_the_servo() {
        let frames: Vec<Vec<u8>> = setup_requests().into_iter().map(frame).collect();
        assert_eq!(
            frames,
            vec![
                vec![0x55, 0x55, 5, 0x21, 2, 0, 2],
                vec![0x55, 0x55, 3, 0x20, 9],
            ]
        );
    }

    #[test]
    fn servo_write_carries_pin_and_command() {
        assert_eq!(
            frame(servo_write_request(ActuatorCommand::from_force(175.0))),
            vec![0x55, 0x55, 4, 0x23, 9, 175]
        );
        assert_eq!(
            frame(servo_write_request(ActuatorCommand::from_force(-175.0))),
            vec![0x55, 0x55, 4, 0x23, 9, 0]
        );
        assert_eq!(
            frame(servo_write_request(ActuatorCommand::MAX)),
            vec![0x55, 0x55, 4, 0x23, 9, 180]
        );
    }

    #[test]
    fn analog_read_names_the_pin() {
        assert_eq!(
            frame(analog_read_request(JOYSTICK_X)),
            vec![0x55, 0x55, 3, 0x22, 0]
        );
        assert_eq!(
            frame(analog_read_request(POTENTIOMETER)),
            vec![0x55, 0x55, 3, 0x22, 2]
        );
    }

    #[tokio::test]
    async fn simulated_kind_has_no_link_to_open() {
        let result = Hapkit::connect(&RuntimeConfig::default()).await;
        match result {
            Err(HapkitError::Config(ConfigError::NoLink(DeviceKind::Simulated))) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connected to a simulated device"),
        }
    }

    #[test]
    fn analog_reply_is_little_endian() {
        assert_eq!(parse_analog_reply(AnalogPin::A2, &[2, 0xff, 0x03]).unwrap(), 1023);
        assert_eq!(parse_analog_reply(AnalogPin::A0, &[0, 0x00, 0x02]).unwrap(), 512);
    }

    #[test]
    fn reading_is_not_range_checked() {
        assert_eq!(parse_analog_reply(AnalogPin::A0, &[0, 0xd0, 0x07]).unwrap(), 2000);
    }

    #[test]
    fn reply_for_another_pin_is_rejected() {
        let err = parse_analog_reply(AnalogPin::A2, &[0, 0xff, 0x03]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected reply to command 0x22: asked for pin 2 but got pin 0"
        );
    }

    #[test]
    fn short_reply_is_rejected() {
        assert!(matches!(
            parse_analog_reply(AnalogPin::A0, &[0, 0xff]),
            Err(HapkitError::UnexpectedReply { cmd: CMD_ANALOG_READ, .. })
        ));
    }
}
