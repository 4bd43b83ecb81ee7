//! Protocol errors

use thiserror::Error;

/// Errors raised by the transport and the line protocol
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Serial driver failure other than a missing device or I/O
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// No reply within the allowed time
    #[error("Response timeout")]
    Timeout,

    /// Connect requested on a live session
    #[error("Already connected")]
    AlreadyConnected,

    /// Probe went unanswered or was answered by something else
    #[error("No ROM station detected on the serial port (reply: {reply:?})")]
    NoDevice {
        /// Line received instead of the acknowledgement (empty on timeout)
        reply: String,
    },

    /// Port does not exist
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Operating system I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for ProtocolError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(err.description),
            serialport::ErrorKind::Io(kind) => {
                ProtocolError::IoError(std::io::Error::new(kind, err.description))
            }
            _ => ProtocolError::SerialError(err.description),
        }
    }
}
