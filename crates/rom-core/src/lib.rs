//! # ROM Core Library
//!
//! Core functionality for the Remote Open Meteo (ROM) weather station driver.
//!
//! This library provides:
//! - The ROM serial line protocol (probe, queries, reply parsing)
//! - A session that validates the link before every use and closes on faults
//! - An observing-conditions driver facade with typed errors
//! - A rolling two-minute wind gust tracker
//! - A simulated station for demos and tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use rom_core::{DriverSettings, ObservingConditions};
//!
//! let settings = DriverSettings { port: "/dev/ttyUSB0".into(), trace_enabled: false };
//! let mut driver = ObservingConditions::new(settings);
//! driver.set_connected(true)?;
//! println!("Temperature: {} °C", driver.temperature()?);
//! driver.set_connected(false)?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod demo;
pub mod driver;
pub mod error;
pub mod gust;
pub mod protocol;
pub mod sensors;
pub mod settings;
pub mod worker;

pub use driver::ObservingConditions;
pub use error::DriverError;
pub use gust::GustTracker;
pub use sensors::SensorKind;
pub use settings::DriverSettings;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::demo::{SimulatedOpener, SimulatedStation};
    pub use crate::driver::ObservingConditions;
    pub use crate::error::DriverError;
    pub use crate::gust::GustTracker;
    pub use crate::protocol::{
        PortOpener, ProtocolError, Session, SessionConfig, SessionState, Transport,
    };
    pub use crate::sensors::SensorKind;
    pub use crate::settings::DriverSettings;
    pub use crate::worker::DriverWorker;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
