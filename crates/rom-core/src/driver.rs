//! Observing-conditions driver
//!
//! The public face of the library: sensor accessors, connection control and
//! the fixed capability answers for properties the station cannot measure.
//!
//! Every measured read re-validates the link with a probe before querying, so a
//! station that silently dropped off the bus is detected on the next call.

use tracing::{debug, info};

use crate::error::DriverError;
use crate::protocol::{PortOpener, SerialOpener, Session, SessionConfig, SessionState};
use crate::sensors::{self, SensorKind};
use crate::settings::DriverSettings;

/// Driver name shown to clients
pub const DRIVER_NAME: &str = "Remote Open Meteo";

/// Driver description
pub const DRIVER_DESCRIPTION: &str = "Remote Open Meteo";

/// Driver information string
pub const DRIVER_INFO: &str = "Observing conditions driver for the Remote Open Meteo (ROM) weather station";

/// Version of the observing-conditions interface implemented
pub const INTERFACE_VERSION: i16 = 1;

/// Observing-conditions driver for one ROM station
pub struct ObservingConditions {
    settings: DriverSettings,
    session: Session,
}

impl ObservingConditions {
    /// Create a driver that talks to real serial hardware
    pub fn new(settings: DriverSettings) -> Self {
        Self::with_opener(settings, Box::new(SerialOpener), SessionConfig::default())
    }

    /// Create a driver over any transport
    pub fn with_opener(
        settings: DriverSettings,
        opener: Box<dyn PortOpener>,
        config: SessionConfig,
    ) -> Self {
        Self {
            settings,
            session: Session::new(opener, config),
        }
    }

    // --- Identity -------------------------------------------------------

    /// Short driver name
    pub fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    /// Driver description
    pub fn description(&self) -> &'static str {
        DRIVER_DESCRIPTION
    }

    /// Longer description of the driver
    pub fn driver_info(&self) -> &'static str {
        DRIVER_INFO
    }

    /// Crate version
    pub fn driver_version(&self) -> &'static str {
        crate::VERSION
    }

    /// Observing-conditions interface version
    pub fn interface_version(&self) -> i16 {
        INTERFACE_VERSION
    }

    /// No custom actions are supported
    pub fn supported_actions(&self) -> Vec<String> {
        Vec::new()
    }

    // --- Settings -------------------------------------------------------

    /// Current settings
    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Select the serial port. Refused while connected.
    pub fn set_port(&mut self, port: impl Into<String>) -> Result<(), DriverError> {
        if self.session.is_connected() {
            return Err(DriverError::Config(
                "disconnect the ROM station before changing its port".to_string(),
            ));
        }
        self.settings.port = port.into();
        Ok(())
    }

    /// Underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    // --- Connection -----------------------------------------------------

    /// Cached connection flag
    pub fn connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Connect to or disconnect from the configured port.
    ///
    /// Requesting the current state does nothing.
    pub fn set_connected(&mut self, connected: bool) -> Result<(), DriverError> {
        debug!("Connected set {}", connected);
        if connected == self.session.is_connected() {
            return Ok(());
        }
        if connected {
            self.session.connect(&self.settings.port)?;
            info!("connected to port {}", self.settings.port);
        } else {
            self.session.disconnect();
            info!("disconnected from port {}", self.settings.port);
        }
        Ok(())
    }

    /// Same as `set_connected(true)`
    pub fn connect(&mut self) -> Result<(), DriverError> {
        self.set_connected(true)
    }

    /// Close the link; never fails
    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    // --- Generic entry points -------------------------------------------

    /// Custom actions are not supported
    pub fn action(&mut self, name: &str, parameters: &str) -> Result<String, DriverError> {
        debug!("Action {}, parameters {} not implemented", name, parameters);
        Err(DriverError::NotImplemented(format!("Action {}", name)))
    }

    /// Raw commands are not supported; still requires a live station
    pub fn command_blind(&mut self, _command: &str, _raw: bool) -> Result<(), DriverError> {
        self.session.ensure_connected("CommandBlind")?;
        Err(DriverError::NotImplemented("CommandBlind".to_string()))
    }

    /// See [`command_blind`](Self::command_blind)
    pub fn command_bool(&mut self, _command: &str, _raw: bool) -> Result<bool, DriverError> {
        self.session.ensure_connected("CommandBool")?;
        Err(DriverError::NotImplemented("CommandBool".to_string()))
    }

    /// See [`command_blind`](Self::command_blind)
    pub fn command_string(&mut self, _command: &str, _raw: bool) -> Result<String, DriverError> {
        self.session.ensure_connected("CommandString")?;
        Err(DriverError::NotImplemented("CommandString".to_string()))
    }

    /// The station samples on its own schedule; there is nothing to refresh
    pub fn refresh(&mut self) -> Result<(), DriverError> {
        Err(DriverError::NotImplemented("Refresh".to_string()))
    }

    // --- Averaging ------------------------------------------------------

    /// Only instantaneous values are available
    pub fn average_period(&self) -> f64 {
        0.0
    }

    /// Only `0.0` is accepted
    pub fn set_average_period(&mut self, hours: f64) -> Result<(), DriverError> {
        debug!("AveragePeriod set {}", hours);
        if hours != 0.0 {
            return Err(DriverError::invalid_value("AveragePeriod", hours, "0 only"));
        }
        Ok(())
    }

    // --- Sensors --------------------------------------------------------

    /// Read any property by kind
    pub fn read(&mut self, kind: SensorKind) -> Result<f64, DriverError> {
        match kind {
            SensorKind::AveragePeriod => Ok(self.average_period()),
            _ => match kind.command_code() {
                Some(code) => self.read_measured(kind, code),
                None => {
                    debug!("{} get - not implemented", kind);
                    Err(DriverError::NotImplemented(kind.display_name().to_string()))
                }
            },
        }
    }

    /// Probe, query and insist on a value
    fn read_measured(&mut self, kind: SensorKind, code: &str) -> Result<f64, DriverError> {
        let context = kind.display_name();
        self.session.ensure_connected(context)?;
        match self.session.query(code)? {
            Some(value) => {
                debug!("{}: {}", context, value);
                Ok(value)
            }
            None => Err(DriverError::NoValue(context.to_string())),
        }
    }

    /// Ambient temperature in °C
    pub fn temperature(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::Temperature)
    }

    /// Relative humidity in percent
    pub fn humidity(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::Humidity)
    }

    /// Atmospheric pressure in hPa
    pub fn pressure(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::Pressure)
    }

    /// Not available on this station
    pub fn cloud_cover(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::CloudCover)
    }

    /// Not available on this station
    pub fn dew_point(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::DewPoint)
    }

    /// Not available on this station
    pub fn rain_rate(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::RainRate)
    }

    /// Not available on this station
    pub fn sky_brightness(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::SkyBrightness)
    }

    /// Not available on this station
    pub fn sky_quality(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::SkyQuality)
    }

    /// Not available on this station
    pub fn sky_temperature(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::SkyTemperature)
    }

    /// Not available on this station
    pub fn star_fwhm(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::StarFwhm)
    }

    /// Not available on this station
    pub fn wind_direction(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::WindDirection)
    }

    /// Not available on this station
    pub fn wind_gust(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::WindGust)
    }

    /// Not available on this station
    pub fn wind_speed(&mut self) -> Result<f64, DriverError> {
        self.read(SensorKind::WindSpeed)
    }

    /// Description of a sensor by name
    pub fn sensor_description(&self, name: &str) -> Result<&'static str, DriverError> {
        sensors::sensor_description(name)
    }

    /// Age of a sensor's last reading; not tracked
    pub fn time_since_last_update(&self, name: &str) -> Result<f64, DriverError> {
        sensors::time_since_last_update(name)
    }
}
