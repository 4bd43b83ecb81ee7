//! Driver errors
//!
//! What callers of the driver see. Expected capability gaps
//! ([`DriverError::NotImplemented`]) are kept apart from faults
//! ([`DriverError::Transport`]) so they can be matched without string
//! inspection.

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Errors returned by session and driver operations
#[derive(Error, Debug)]
pub enum DriverError {
    /// Missing or invalid configuration (e.g. no serial port selected)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A setter or lookup received a value it does not accept
    #[error("Invalid value '{value}' for {property} (expected {expected})")]
    InvalidValue {
        /// Property or parameter name
        property: String,
        /// Rejected value, as text
        value: String,
        /// What would have been accepted
        expected: String,
    },

    /// Opening or validating the link failed
    #[error("Failed to connect to ROM station on {port}: {source}")]
    Connect {
        /// Port the connect was attempted on
        port: String,
        /// Root cause
        #[source]
        source: ProtocolError,
    },

    /// Operation attempted without a live station
    #[error("{context}: not connected{}", .source.as_ref().map(|e| format!(" ({})", e)).unwrap_or_default())]
    NotConnected {
        /// Operation that needed the link
        context: String,
        /// Probe failure, when the link was found dead on re-validation
        #[source]
        source: Option<ProtocolError>,
    },

    /// The link is fine but the reply did not carry a value
    #[error("No valid value returned for {0}")]
    NoValue(String),

    /// Capability not backed by the current hardware generation
    #[error("{0} is not implemented")]
    NotImplemented(String),

    /// Transport-level fault; the session has been closed
    #[error("Driver error: {0}")]
    Transport(#[source] ProtocolError),

    /// Persisted settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),
}

impl DriverError {
    pub(crate) fn not_connected(context: impl Into<String>) -> Self {
        DriverError::NotConnected {
            context: context.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_value(
        property: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        DriverError::InvalidValue {
            property: property.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Configuration-class errors: bad settings or bad arguments
    pub fn is_config_class(&self) -> bool {
        matches!(
            self,
            DriverError::Config(_) | DriverError::InvalidValue { .. }
        )
    }

    /// True when the error means the session is (now) disconnected
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            DriverError::Connect { .. } | DriverError::NotConnected { .. } | DriverError::Transport(_)
        )
    }
}
