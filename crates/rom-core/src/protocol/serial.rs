//! Serial port handling
//!
//! Low-level serial access for the ROM station: port discovery, opening with the
//! station's fixed line settings and a [`Transport`] that reads `\n`-terminated
//! replies.

use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::transport::{PortOpener, SerialSettings, Transport};
use super::ProtocolError;

/// Per-read poll slice while waiting for a terminator
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Upper bound on a reply line; anything longer is noise from a foreign device
const MAX_LINE_LEN: usize = 256;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key putting Arduino-style ports first:
///  - ttyACM* then ttyUSB* (numeric suffix order)
///  - COM* ports by number (COM3 before COM10)
///  - everything else by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let numbered = [("ttyACM", 0u8), ("ttyUSB", 1), ("COM", 2)];
    for (prefix, rank) in numbered {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List available serial ports in a deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let port = PortInfo::from(info);
        map.entry(port.name.clone()).or_insert(port);
    }

    // USB CDC boards are not always reported by the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut ports: Vec<PortInfo> = map.into_values().collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Open a serial port with the ROM station line settings
pub fn open_port(
    name: &str,
    settings: &SerialSettings,
) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let mut port = serialport::new(name, settings.baud_rate)
        .timeout(POLL_INTERVAL.min(settings.read_timeout))
        .open()?;
    configure_port(port.as_mut())?;
    Ok(port)
}

/// Apply 8N1 framing without handshake and deassert DTR/RTS
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;

    // Not every USB bridge exposes the modem lines
    if let Err(e) = port.write_data_terminal_ready(false) {
        warn!("configure_port: failed to clear DTR: {} (continuing)", e);
    }
    if let Err(e) = port.write_request_to_send(false) {
        warn!("configure_port: failed to clear RTS: {} (continuing)", e);
    }

    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(ClearBuffer::All)?;
    Ok(())
}

/// [`Transport`] over a real serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
    /// Bytes received past the last returned line
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Wrap an already configured port
    pub fn new(port: Box<dyn SerialPort>, read_timeout: Duration) -> Self {
        Self {
            port,
            read_timeout,
            pending: Vec::new(),
        }
    }

    /// Split the first complete line off the pending buffer
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line[..end]);
        Some(text.trim_end_matches('\r').to_string())
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ProtocolError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut buffer = [0u8; 64];

        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            if Instant::now() >= deadline {
                if !self.pending.is_empty() {
                    debug!(
                        "read_line: timeout with {} unterminated bytes, discarding",
                        self.pending.len()
                    );
                    self.pending.clear();
                }
                return Ok(String::new());
            }

            match self.port.read(&mut buffer) {
                Ok(0) => {}
                Ok(n) => {
                    self.pending.extend_from_slice(&buffer[..n]);
                    if self.pending.len() > MAX_LINE_LEN && !self.pending.contains(&b'\n') {
                        warn!("read_line: {} bytes without terminator, discarding", self.pending.len());
                        self.pending.clear();
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(ProtocolError::IoError(e)),
            }
        }
    }

    fn clear_buffers(&mut self) -> Result<(), ProtocolError> {
        self.pending.clear();
        clear_buffers(self.port.as_mut())
    }

    fn close(mut self: Box<Self>) -> Result<(), ProtocolError> {
        self.pending.clear();
        self.port.flush()?;
        Ok(())
    }
}

/// Opens [`SerialTransport`]s on real hardware
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(
        &self,
        port_name: &str,
        settings: &SerialSettings,
    ) -> Result<Box<dyn Transport>, ProtocolError> {
        debug!(
            "opening {} at {} baud (8N1, timeout {}ms)",
            port_name,
            settings.baud_rate,
            settings.read_timeout.as_millis()
        );
        let port = open_port(port_name, settings)?;
        Ok(Box::new(SerialTransport::new(port, settings.read_timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // Only checks that enumeration does not panic
        let ports = list_ports();
        for port in &ports {
            println!("Found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_port_sorting() {
        let names = [
            "COM10",
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "COM3",
            "/dev/ttyUSB0",
            "/dev/someport",
            "/dev/ttyACM0",
        ];
        let mut ports: Vec<PortInfo> = names
            .iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect();

        ports.sort_by_key(|p| port_sort_key(&p.name));
        let ordered: Vec<String> = ports.into_iter().map(|p| p.name).collect();

        assert_eq!(
            ordered,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "COM3",
                "COM10",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialOpener.open("/dev/rom-does-not-exist", &SerialSettings::default());
        assert!(result.is_err());
    }
}
