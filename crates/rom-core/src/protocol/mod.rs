//! Serial Protocol Communication
//!
//! Implements the ROM station line protocol: bracketed ASCII tags, one
//! `\n`-terminated command and at most one reply line per exchange.

pub mod commands;
mod error;
pub mod serial;
mod session;
pub mod transport;

pub use commands::Command;
pub use error::ProtocolError;
pub use serial::{list_ports, PortInfo, SerialOpener, SerialTransport};
pub use session::{Session, SessionConfig, SessionState};
pub use transport::{PortOpener, SerialSettings, Transport};

/// Baud rate of the ROM station firmware
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Default receive timeout for one reply line in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Time the station needs after the port opens (2s boot plus 1s margin)
pub const POWER_ON_SETTLE_MS: u64 = 3000;

/// Time the station needs to apply a mode change
pub const MODE_SETTLE_MS: u64 = 100;
