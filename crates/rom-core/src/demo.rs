//! Demo Mode - Simulated ROM station
//!
//! A [`Transport`] that answers like the station firmware, so the driver can be
//! exercised without hardware. Readings drift slowly around a mild spring night
//! (about 12 °C, 70 %RH, 1013 hPa).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

use crate::protocol::commands::{Command, PROBE_ACK};
use crate::protocol::{PortOpener, ProtocolError, SerialSettings, Transport};

/// Magnus formula coefficients used by the firmware
const MAGNUS_A: f64 = 17.271;
const MAGNUS_B: f64 = 237.7;

/// Compute the dew point from temperature (°C) and relative humidity (%)
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    let gamma = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + (humidity * 0.01).ln();
    (MAGNUS_B * gamma) / (MAGNUS_A - gamma)
}

/// Simulated ROM station
pub struct SimulatedStation {
    /// Reply lines waiting to be read
    outbox: VecDeque<String>,
    /// Partially written command bytes
    inbox: Vec<u8>,
    /// Verbose diagnostics after each command (firmware boots with it on)
    debug_mode: bool,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    /// Random number generator
    rng: StdRng,
}

impl Default for SimulatedStation {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedStation {
    /// Create a station with a random seed
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a station with reproducible readings
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            outbox: VecDeque::new(),
            inbox: Vec::new(),
            debug_mode: true,
            temperature: 12.0,
            humidity: 70.0,
            pressure: 1013.25,
            rng,
        }
    }

    /// Whether verbose diagnostics are on
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Let the readings wander a little, as real sensors do between reads
    fn drift(&mut self) {
        self.temperature = (self.temperature + self.rng.gen_range(-0.05..0.05)).clamp(-30.0, 45.0);
        self.humidity = (self.humidity + self.rng.gen_range(-0.2..0.2)).clamp(5.0, 100.0);
        self.pressure = (self.pressure + self.rng.gen_range(-0.1..0.1)).clamp(950.0, 1050.0);
    }

    /// Handle one received command line
    fn handle_line(&mut self, line: &str) {
        let response = match Command::parse(line) {
            Some(Command::Identify) => {
                self.outbox.push_back(PROBE_ACK.to_string());
                PROBE_ACK.to_string()
            }
            Some(Command::SetDebug(on)) => {
                self.debug_mode = on;
                "OK".to_string()
            }
            Some(Command::Get(code)) => {
                self.drift();
                let value = match code.to_ascii_uppercase().as_str() {
                    "T" => Some(self.temperature),
                    "H" => Some(self.humidity),
                    "P" => Some(self.pressure),
                    "DP" => Some(dew_point(self.temperature, self.humidity)),
                    _ => None,
                };
                match value {
                    Some(v) => {
                        let reply = format!("[GET]{}:{:.2}", code, v);
                        self.outbox.push_back(reply.clone());
                        reply
                    }
                    None => String::new(),
                }
            }
            None => String::new(),
        };

        if self.debug_mode {
            self.outbox.push_back(format!("Command received: {}", line.trim()));
            self.outbox.push_back(format!("Response: {}", response));
        }
    }
}

impl Transport for SimulatedStation {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.inbox.extend_from_slice(data);
        while let Some(end) = self.inbox.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.inbox.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw).into_owned();
            debug!("simulated station got {:?}", line.trim_end());
            self.handle_line(&line);
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ProtocolError> {
        Ok(self.outbox.pop_front().unwrap_or_default())
    }

    fn clear_buffers(&mut self) -> Result<(), ProtocolError> {
        self.outbox.clear();
        self.inbox.clear();
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), ProtocolError> {
        Ok(())
    }
}

/// Opens a fresh [`SimulatedStation`] for any port name
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedOpener {
    seed: Option<u64>,
}

impl SimulatedOpener {
    /// Stations with random readings
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Stations with reproducible readings
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl PortOpener for SimulatedOpener {
    fn open(
        &self,
        port_name: &str,
        _settings: &SerialSettings,
    ) -> Result<Box<dyn Transport>, ProtocolError> {
        debug!("opening simulated station on {}", port_name);
        let station = match self.seed {
            Some(seed) => SimulatedStation::seeded(seed),
            None => SimulatedStation::new(),
        };
        Ok(Box::new(station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(station: &mut SimulatedStation, line: &str) -> String {
        station.write_all(line.as_bytes()).unwrap();
        station.read_line().unwrap()
    }

    #[test]
    fn test_identify() {
        let mut station = SimulatedStation::seeded(1);
        assert_eq!(send(&mut station, "[IA]\n"), "[IA]ROM V1");
    }

    #[test]
    fn test_debug_mode_adds_diagnostics() {
        let mut station = SimulatedStation::seeded(1);
        assert!(station.debug_mode());
        assert_eq!(send(&mut station, "[IA]\n"), "[IA]ROM V1");
        assert_eq!(station.read_line().unwrap(), "Command received: [IA]");
        assert_eq!(station.read_line().unwrap(), "Response: [IA]ROM V1");

        station.write_all(b"[SET]DEBUG:OFF\n").unwrap();
        assert!(!station.debug_mode());
        assert_eq!(station.read_line().unwrap(), "");
    }

    #[test]
    fn test_value_replies() {
        let mut station = SimulatedStation::seeded(42);
        station.write_all(b"[SET]DEBUG:OFF\n").unwrap();

        let reply = send(&mut station, "[GET]T\n");
        assert!(reply.starts_with("[GET]T:"), "{}", reply);
        let value: f64 = reply[7..].parse().unwrap();
        assert!((11.0..13.0).contains(&value));

        let reply = send(&mut station, "[GET]P\n");
        assert!(reply.starts_with("[GET]P:"));

        // Unknown code: no reply at all
        assert_eq!(send(&mut station, "[GET]X\n"), "");
    }

    #[test]
    fn test_split_writes_are_reassembled() {
        let mut station = SimulatedStation::seeded(3);
        station.write_all(b"[SET]DEBUG:OFF\n[I").unwrap();
        assert_eq!(station.read_line().unwrap(), "");
        station.write_all(b"A]\n").unwrap();
        assert_eq!(station.read_line().unwrap(), "[IA]ROM V1");
    }

    #[test]
    fn test_clear_buffers_drops_pending_replies() {
        let mut station = SimulatedStation::seeded(3);
        station.write_all(b"[IA]\n").unwrap();
        station.clear_buffers().unwrap();
        assert_eq!(station.read_line().unwrap(), "");
    }

    #[test]
    fn test_dew_point() {
        // Saturated air: dew point equals temperature
        assert!((dew_point(20.0, 100.0) - 20.0).abs() < 1e-9);
        let dp = dew_point(20.0, 50.0);
        assert!((dp - 9.26).abs() < 0.05, "{}", dp);
    }

    #[test]
    fn test_opener_ignores_port_name() {
        let opener = SimulatedOpener::seeded(9);
        let mut transport = opener.open("anything", &SerialSettings::default()).unwrap();
        transport.write_all(b"[IA]\n").unwrap();
        assert_eq!(transport.read_line().unwrap(), "[IA]ROM V1");
        transport.close().unwrap();
    }
}
