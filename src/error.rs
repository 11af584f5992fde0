use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Failures raised by the I/O collaborators around the control loop.
///
/// The control computation itself never fails.
#[derive(Debug, Error)]
pub enum HapkitError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unexpected reply to command {cmd:#04x}: {reason}")]
    UnexpectedReply { cmd: u8, reason: String },
}
