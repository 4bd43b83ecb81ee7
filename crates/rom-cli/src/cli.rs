//! Command line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Read observing conditions from a Remote Open Meteo station
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Settings file (defaults to the user config directory)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port, overriding the saved setting
    #[clap(long, global = true)]
    pub port: Option<String>,

    /// Talk to a simulated station instead of hardware
    #[clap(long, global = true)]
    pub demo: bool,

    /// Hard deadline for each driver call, in milliseconds
    #[clap(long, global = true, default_value = "10000")]
    pub deadline_ms: u64,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports
    Ports,

    /// Connect, read sensors once and disconnect
    Read {
        /// Sensors to read (default: temperature humidity pressure)
        sensors: Vec<String>,
    },

    /// Read sensors periodically
    Watch {
        /// Seconds between reads
        #[clap(long, default_value = "10")]
        interval_secs: u64,

        /// Stop after this many rounds
        #[clap(long)]
        count: Option<u64>,
    },

    /// Describe a sensor
    Describe {
        /// Sensor name, e.g. "humidity"
        name: String,
    },

    /// Show or change the saved settings
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the settings as JSON
    Show,

    /// Save the serial port
    SetPort { port: String },

    /// Save the trace flag
    SetTrace {
        #[clap(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}
