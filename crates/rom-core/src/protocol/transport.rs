//! Transport seam
//!
//! The session only needs a duplex line channel: write bytes, read one
//! terminated line, clear pending buffers and close. Real hardware goes through
//! [`SerialTransport`](super::serial::SerialTransport); tests and demo mode plug
//! in their own implementations.

use std::time::Duration;

use super::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Line-oriented duplex channel to a ROM station
pub trait Transport: Send {
    /// Write all bytes to the device
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Read one line terminated by `\n`.
    ///
    /// The terminator and any trailing `\r` are stripped. When nothing complete
    /// arrives within the receive timeout the result is an empty string, not an
    /// error.
    fn read_line(&mut self) -> Result<String, ProtocolError>;

    /// Discard pending input and output
    fn clear_buffers(&mut self) -> Result<(), ProtocolError>;

    /// Release the underlying resource.
    fn close(self: Box<Self>) -> Result<(), ProtocolError>;
}

/// Opens transports by port identifier
pub trait PortOpener: Send {
    /// Open `port_name` with the given line settings
    fn open(
        &self,
        port_name: &str,
        settings: &SerialSettings,
    ) -> Result<Box<dyn Transport>, ProtocolError>;
}

/// Serial line settings used when opening a port.
///
/// Framing is fixed at 8N1 without flow control and with DTR/RTS deasserted;
/// only the speed and receive timeout are tunable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Baud rate
    pub baud_rate: u32,
    /// Receive timeout for a single line
    pub read_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}
