//! Scripted ROM station shared by the integration tests

#![allow(dead_code)]

use rom_core::protocol::commands::Command;
use rom_core::protocol::{PortOpener, ProtocolError, SerialSettings, Transport};
use rom_core::SensorKind;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

/// What the mock station answers and what it has seen
#[derive(Default)]
pub struct DeviceState {
    /// Reply to `[IA]`; empty means silence (read timeout)
    pub probe_reply: String,
    /// Reply line per `[GET]` code
    pub replies: HashMap<String, String>,
    /// Every command line received, terminator included
    pub written: Vec<String>,
    pub fail_on_write: bool,
    pub fail_on_read: bool,
    pub fail_on_query: bool,
    pub fail_on_close: bool,
    pub fail_open: bool,
    pub opened: usize,
    /// Port names handed to the opener, as received
    pub opened_ports: Vec<String>,
    pub closed: usize,
    /// Lines waiting to be read
    pub outbox: VecDeque<String>,
}

pub type SharedDevice = Arc<Mutex<DeviceState>>;

/// A station answering like ROM firmware with fixed readings
pub fn station() -> SharedDevice {
    let mut state = DeviceState {
        probe_reply: "[IA]ROM V1 test".to_string(),
        ..Default::default()
    };
    for (kind, value) in [
        (SensorKind::Temperature, "21.26"),
        (SensorKind::Humidity, "55.10"),
        (SensorKind::Pressure, "982.54"),
    ] {
        let code = kind.command_code().unwrap();
        let prefix = kind.reply_prefix().unwrap();
        state
            .replies
            .insert(code.to_string(), format!("{}{}", prefix, value));
    }
    Arc::new(Mutex::new(state))
}

fn broken_pipe(what: &str) -> ProtocolError {
    ProtocolError::IoError(io::Error::new(io::ErrorKind::BrokenPipe, what.to_string()))
}

pub struct MockTransport {
    device: SharedDevice,
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let mut device = self.device.lock().unwrap();
        if device.fail_on_write {
            return Err(broken_pipe("write failed"));
        }
        let line = String::from_utf8_lossy(data).into_owned();
        device.written.push(line.clone());

        match Command::parse(&line) {
            Some(Command::Identify) => {
                if !device.probe_reply.is_empty() {
                    let reply = device.probe_reply.clone();
                    device.outbox.push_back(reply);
                }
            }
            Some(Command::Get(code)) => {
                if device.fail_on_query {
                    return Err(broken_pipe("device unplugged"));
                }
                if let Some(reply) = device.replies.get(code).cloned() {
                    device.outbox.push_back(reply);
                }
            }
            Some(Command::SetDebug(_)) | None => {}
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ProtocolError> {
        let mut device = self.device.lock().unwrap();
        if device.fail_on_read {
            return Err(broken_pipe("read failed"));
        }
        Ok(device.outbox.pop_front().unwrap_or_default())
    }

    fn clear_buffers(&mut self) -> Result<(), ProtocolError> {
        self.device.lock().unwrap().outbox.clear();
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), ProtocolError> {
        let mut device = self.device.lock().unwrap();
        device.closed += 1;
        if device.fail_on_close {
            return Err(broken_pipe("close failed"));
        }
        Ok(())
    }
}

pub struct MockOpener {
    device: SharedDevice,
}

impl MockOpener {
    pub fn new(device: &SharedDevice) -> Self {
        Self {
            device: Arc::clone(device),
        }
    }
}

impl PortOpener for MockOpener {
    fn open(
        &self,
        port_name: &str,
        settings: &SerialSettings,
    ) -> Result<Box<dyn Transport>, ProtocolError> {
        assert_eq!(settings.baud_rate, 57600);
        let mut device = self.device.lock().unwrap();
        if device.fail_open {
            return Err(ProtocolError::PortNotFound(port_name.to_string()));
        }
        device.opened += 1;
        device.opened_ports.push(port_name.to_string());
        Ok(Box::new(MockTransport {
            device: Arc::clone(&self.device),
        }))
    }
}

/// Route driver logs to the test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rom_core=debug")
        .with_test_writer()
        .try_init();
}
