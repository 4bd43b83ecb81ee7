//! Session management
//!
//! Owns the link to one ROM station: connect, liveness probe, single-value
//! queries and teardown. Any transport fault closes the session; callers
//! recover by connecting again.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::commands::{is_probe_ack, parse_value_reply, Command};
use super::transport::{PortOpener, SerialSettings, Transport};
use super::{ProtocolError, MODE_SETTLE_MS, POWER_ON_SETTLE_MS};
use crate::error::DriverError;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No link
    Disconnected,
    /// Link open and the last probe succeeded
    Connected,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Serial line settings
    pub serial: SerialSettings,
    /// Wait after opening the port before talking to the station
    pub power_on_settle: Duration,
    /// Wait after switching debug output off
    pub mode_settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            power_on_settle: Duration::from_millis(POWER_ON_SETTLE_MS),
            mode_settle: Duration::from_millis(MODE_SETTLE_MS),
        }
    }
}

impl SessionConfig {
    /// Configuration without settle delays, for simulated stations
    pub fn immediate() -> Self {
        Self {
            power_on_settle: Duration::ZERO,
            mode_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Send one command line and read one reply line
fn exchange(transport: &mut dyn Transport, cmd: &Command) -> Result<String, ProtocolError> {
    let wire = cmd.to_wire();
    debug!("TX {:?}", wire.trim_end());
    transport.write_all(wire.as_bytes())?;
    let reply = transport.read_line()?;
    debug!("RX {:?}", reply);
    Ok(reply)
}

/// Exchange on a clean line: stale bytes from an aborted exchange are dropped first
fn request(transport: &mut dyn Transport, cmd: &Command) -> Result<String, ProtocolError> {
    transport.clear_buffers()?;
    exchange(transport, cmd)
}

/// Run the `[IA]` liveness probe and return the station banner
fn probe(transport: &mut dyn Transport) -> Result<String, ProtocolError> {
    let reply = exchange(transport, &Command::Identify)?;
    if reply.is_empty() || !is_probe_ack(&reply) {
        return Err(ProtocolError::NoDevice { reply });
    }
    Ok(reply)
}

/// Link to one ROM station
pub struct Session {
    /// Opens transports by port name
    opener: Box<dyn PortOpener>,
    /// Session configuration
    config: SessionConfig,
    /// Open transport, if any
    transport: Option<Box<dyn Transport>>,
    /// True only while the transport is held and the last probe succeeded
    connected: bool,
    /// Port name of the current link
    port_name: Option<String>,
    /// Banner returned by the last successful probe
    banner: Option<String>,
}

impl Session {
    /// Create a disconnected session
    pub fn new(opener: Box<dyn PortOpener>, config: SessionConfig) -> Self {
        Self {
            opener,
            config,
            transport: None,
            connected: false,
            port_name: None,
            banner: None,
        }
    }

    /// Get current session state
    pub fn state(&self) -> SessionState {
        if self.connected {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Check the cached connection flag (no traffic)
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Station banner from the last successful probe
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Port of the current link
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the port, initialise the station and validate it with a probe.
    ///
    /// On failure the port is closed again and the session stays disconnected.
    /// The port name is passed to the opener verbatim.
    pub fn connect(&mut self, port_name: &str) -> Result<(), DriverError> {
        if port_name.is_empty() {
            return Err(DriverError::Config(
                "no serial port defined in the settings".to_string(),
            ));
        }
        if self.connected {
            return Err(DriverError::Connect {
                port: port_name.to_string(),
                source: ProtocolError::AlreadyConnected,
            });
        }
        // Leftover handle from a failed fault path
        self.disconnect();

        info!("connecting to ROM station on {}", port_name);
        let connect_err = |source| DriverError::Connect {
            port: port_name.to_string(),
            source,
        };

        let mut transport = self
            .opener
            .open(port_name, &self.config.serial)
            .map_err(connect_err)?;

        match self.initialise(transport.as_mut()) {
            Ok(banner) => {
                info!("ROM station on {} answered {:?}", port_name, banner);
                self.transport = Some(transport);
                self.port_name = Some(port_name.to_string());
                self.banner = Some(banner);
                self.connected = true;
                Ok(())
            }
            Err(e) => {
                warn!("connect to {} failed: {}", port_name, e);
                if let Err(close_err) = transport.close() {
                    warn!("closing {} after failed connect: {}", port_name, close_err);
                }
                Err(connect_err(e))
            }
        }
    }

    /// Startup sequence: settle, silence debug output, settle, probe
    fn initialise(&self, transport: &mut dyn Transport) -> Result<String, ProtocolError> {
        if !self.config.power_on_settle.is_zero() {
            debug!(
                "waiting {}ms for station power-on",
                self.config.power_on_settle.as_millis()
            );
            std::thread::sleep(self.config.power_on_settle);
        }

        let debug_off = Command::SetDebug(false).to_wire();
        debug!("TX {:?}", debug_off.trim_end());
        transport.write_all(debug_off.as_bytes())?;
        transport.clear_buffers()?;
        if !self.config.mode_settle.is_zero() {
            std::thread::sleep(self.config.mode_settle);
        }

        probe(transport)
    }

    /// Close the link. Safe to call at any time.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.banner = None;
        if let Some(transport) = self.transport.take() {
            let port = self.port_name.take().unwrap_or_default();
            match transport.close() {
                Ok(()) => info!("disconnected from {}", port),
                Err(e) => warn!("error while closing {} (ignored): {}", port, e),
            }
        }
        self.port_name = None;
    }

    /// Re-validate the link before use.
    ///
    /// The serial link can drop without the port reporting it, so every call
    /// re-runs the probe instead of trusting the cached flag.
    pub fn ensure_connected(&mut self, context: &str) -> Result<(), DriverError> {
        let outcome = match (self.connected, self.transport.as_mut()) {
            (true, Some(transport)) => probe(transport.as_mut()),
            _ => return Err(DriverError::not_connected(context)),
        };

        match outcome {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("{}: liveness probe failed: {}", context, e);
                self.disconnect();
                Err(DriverError::NotConnected {
                    context: context.to_string(),
                    source: Some(e),
                })
            }
        }
    }

    /// Query one value by sensor code.
    ///
    /// `Ok(None)` means the station answered but not with a value. Transport
    /// faults close the session.
    pub fn query(&mut self, code: &str) -> Result<Option<f64>, DriverError> {
        let outcome = match (self.connected, self.transport.as_mut()) {
            (true, Some(transport)) => request(transport.as_mut(), &Command::Get(code)),
            _ => return Err(DriverError::not_connected(code)),
        };

        match outcome {
            Ok(reply) => {
                let value = parse_value_reply(&reply);
                if value.is_none() {
                    debug!("query {}: unusable reply {:?}", code, reply);
                }
                Ok(value)
            }
            Err(e) => {
                warn!("query {} failed, closing session: {}", code, e);
                self.disconnect();
                Err(DriverError::Transport(e))
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}
