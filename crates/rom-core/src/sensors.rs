//! Sensor catalogue
//!
//! The fixed set of observing-conditions properties and what the current ROM
//! hardware generation can actually measure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DriverError;

/// Observing-conditions property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Averaging period in hours
    AveragePeriod,
    /// Cloud cover in percent
    CloudCover,
    /// Dew point in °C
    DewPoint,
    /// Relative humidity in percent
    Humidity,
    /// Atmospheric pressure in hPa
    Pressure,
    /// Rain rate in mm/h
    RainRate,
    /// Sky brightness in lux
    SkyBrightness,
    /// Sky quality in mag/arcsec²
    SkyQuality,
    /// Sky temperature in °C
    SkyTemperature,
    /// Seeing, as star FWHM in arcseconds
    StarFwhm,
    /// Ambient temperature in °C
    Temperature,
    /// Wind direction in degrees
    WindDirection,
    /// Peak wind speed over the last two minutes in m/s
    WindGust,
    /// Wind speed in m/s
    WindSpeed,
}

impl SensorKind {
    /// Every property, in lookup order
    pub const ALL: [SensorKind; 14] = [
        SensorKind::AveragePeriod,
        SensorKind::CloudCover,
        SensorKind::DewPoint,
        SensorKind::Humidity,
        SensorKind::Pressure,
        SensorKind::RainRate,
        SensorKind::SkyBrightness,
        SensorKind::SkyQuality,
        SensorKind::SkyTemperature,
        SensorKind::StarFwhm,
        SensorKind::Temperature,
        SensorKind::WindDirection,
        SensorKind::WindGust,
        SensorKind::WindSpeed,
    ];

    /// Sensors the station can be queried for
    pub const MEASURED: [SensorKind; 3] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Pressure,
    ];

    /// Lowercase lookup key
    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::AveragePeriod => "averageperiod",
            SensorKind::CloudCover => "cloudcover",
            SensorKind::DewPoint => "dewpoint",
            SensorKind::Humidity => "humidity",
            SensorKind::Pressure => "pressure",
            SensorKind::RainRate => "rainrate",
            SensorKind::SkyBrightness => "skybrightness",
            SensorKind::SkyQuality => "skyquality",
            SensorKind::SkyTemperature => "skytemperature",
            SensorKind::StarFwhm => "starfwhm",
            SensorKind::Temperature => "temperature",
            SensorKind::WindDirection => "winddirection",
            SensorKind::WindGust => "windgust",
            SensorKind::WindSpeed => "windspeed",
        }
    }

    /// Property name as shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorKind::AveragePeriod => "AveragePeriod",
            SensorKind::CloudCover => "CloudCover",
            SensorKind::DewPoint => "DewPoint",
            SensorKind::Humidity => "Humidity",
            SensorKind::Pressure => "Pressure",
            SensorKind::RainRate => "RainRate",
            SensorKind::SkyBrightness => "SkyBrightness",
            SensorKind::SkyQuality => "SkyQuality",
            SensorKind::SkyTemperature => "SkyTemperature",
            SensorKind::StarFwhm => "StarFWHM",
            SensorKind::Temperature => "Temperature",
            SensorKind::WindDirection => "WindDirection",
            SensorKind::WindGust => "WindGust",
            SensorKind::WindSpeed => "WindSpeed",
        }
    }

    /// Station command code, for sensors backed by hardware
    pub fn command_code(&self) -> Option<&'static str> {
        match self {
            SensorKind::Temperature => Some("T"),
            SensorKind::Humidity => Some("H"),
            SensorKind::Pressure => Some("P"),
            _ => None,
        }
    }

    /// Expected start of the station's reply for this sensor
    pub fn reply_prefix(&self) -> Option<&'static str> {
        match self {
            SensorKind::Temperature => Some("[GET]T:"),
            SensorKind::Humidity => Some("[GET]H:"),
            SensorKind::Pressure => Some("[GET]P:"),
            _ => None,
        }
    }

    /// Unit of the reported value
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::AveragePeriod => "h",
            SensorKind::CloudCover | SensorKind::Humidity => "%",
            SensorKind::DewPoint | SensorKind::SkyTemperature | SensorKind::Temperature => "°C",
            SensorKind::Pressure => "hPa",
            SensorKind::RainRate => "mm/h",
            SensorKind::SkyBrightness => "lux",
            SensorKind::SkyQuality => "mag/arcsec²",
            SensorKind::StarFwhm => "arcsec",
            SensorKind::WindDirection => "°",
            SensorKind::WindGust | SensorKind::WindSpeed => "m/s",
        }
    }

    /// Whether the current hardware generation measures this property
    pub fn is_measured(&self) -> bool {
        self.command_code().is_some()
    }

    /// Fixed description for implemented properties
    fn description(&self) -> Option<&'static str> {
        match self {
            SensorKind::AveragePeriod => {
                Some("Average period in hours, immediate values are only available")
            }
            SensorKind::Humidity => Some("Relative humidity"),
            SensorKind::Pressure => Some("Atmospheric pressure"),
            SensorKind::Temperature => Some("Ambient temperature"),
            _ => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SensorKind {
    type Err = DriverError;

    /// Case-insensitive, whitespace-tolerant name lookup
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = name.trim().to_ascii_lowercase();
        SensorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| DriverError::invalid_value("sensor name", name, "a known sensor name"))
    }
}

/// Describe a sensor by name
pub fn sensor_description(name: &str) -> Result<&'static str, DriverError> {
    let kind: SensorKind = name.parse()?;
    kind.description().ok_or_else(|| {
        DriverError::NotImplemented(format!("SensorDescription - Property {}", name.trim()))
    })
}

/// Time since the last update of a sensor.
///
/// The station pushes no timestamps, so every known property reports not
/// implemented. An empty name asks about the most recent update of any sensor.
pub fn time_since_last_update(name: &str) -> Result<f64, DriverError> {
    if name.trim().is_empty() {
        return Err(DriverError::NotImplemented(
            "TimeSinceLastUpdate - most recent sensor update".to_string(),
        ));
    }
    let kind: SensorKind = name.parse()?;
    Err(DriverError::NotImplemented(format!(
        "TimeSinceLastUpdate - Property {}",
        kind.display_name()
    )))
}
