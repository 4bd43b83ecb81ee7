//! `rom` - command line front end for the Remote Open Meteo station

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Args, Command, ConfigAction};
use rom_core::demo::SimulatedOpener;
use rom_core::protocol::{list_ports, SessionConfig};
use rom_core::sensors::sensor_description;
use rom_core::worker::DriverWorker;
use rom_core::{DriverError, DriverSettings, ObservingConditions, SensorKind};

fn settings_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => DriverSettings::default_path().context("locating the settings file"),
    }
}

fn init_logging(settings: &DriverSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse sensor names, defaulting to everything the station measures
fn parse_sensors(names: &[String]) -> Result<Vec<SensorKind>> {
    if names.is_empty() {
        return Ok(SensorKind::MEASURED.to_vec());
    }
    names
        .iter()
        .map(|n| n.parse::<SensorKind>().with_context(|| format!("sensor '{}'", n)))
        .collect()
}

fn build_driver(args: &Args, mut settings: DriverSettings) -> ObservingConditions {
    if let Some(port) = &args.port {
        settings.port = port.clone();
    }
    if args.demo {
        if !settings.has_port() {
            settings.port = "SIMULATED".to_string();
        }
        ObservingConditions::with_opener(
            settings,
            Box::new(SimulatedOpener::new()),
            SessionConfig::immediate(),
        )
    } else {
        ObservingConditions::new(settings)
    }
}

fn format_reading(kind: SensorKind, result: &Result<f64, DriverError>) -> String {
    match result {
        Ok(value) => format!("{:<12} {:>9.2} {}", kind.display_name(), value, kind.unit()),
        Err(e) => format!("{:<12} {}", kind.display_name(), e),
    }
}

/// Read each sensor once; stops early if the link goes down
fn read_round(
    worker: &DriverWorker,
    deadline: Duration,
    sensors: &[SensorKind],
) -> Vec<(SensorKind, Result<f64, DriverError>)> {
    let mut readings = Vec::with_capacity(sensors.len());
    for &kind in sensors {
        let result = worker.call(deadline, move |driver| driver.read(kind));
        let fatal = matches!(&result, Err(e) if e.is_disconnect());
        readings.push((kind, result));
        if fatal {
            break;
        }
    }
    readings
}

fn connect(worker: &DriverWorker, deadline: Duration) -> Result<()> {
    // Station boot plus probe needs more than a single query
    let connect_deadline = deadline + Duration::from_millis(rom_core::protocol::POWER_ON_SETTLE_MS);
    worker
        .call(connect_deadline, |driver| driver.set_connected(true))
        .context("connecting to the ROM station")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let path = settings_path(&args)?;
    let settings = DriverSettings::load(&path)?;
    init_logging(&settings);

    let deadline = Duration::from_millis(args.deadline_ms);

    match &args.command {
        Command::Ports => {
            let ports = list_ports();
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                match (port.vid, port.pid) {
                    (Some(vid), Some(pid)) => println!(
                        "{}  [{:04x}:{:04x}] {}",
                        port.name,
                        vid,
                        pid,
                        port.product.unwrap_or_default()
                    ),
                    _ => println!("{}", port.name),
                }
            }
        }

        Command::Read { sensors } => {
            let sensors = parse_sensors(sensors)?;
            let worker = DriverWorker::spawn(build_driver(&args, settings))?;
            connect(&worker, deadline)?;
            for (kind, result) in read_round(&worker, deadline, &sensors) {
                println!("{}", format_reading(kind, &result));
            }
            // A missed deadline may leave the worker busy; dropping it waits for the thread
            let _ = worker.call(deadline, |driver| driver.set_connected(false));
        }

        Command::Watch {
            interval_secs,
            count,
        } => {
            let worker = DriverWorker::spawn(build_driver(&args, settings))?;
            let interval = Duration::from_secs(*interval_secs);
            let mut round: u64 = 0;

            loop {
                let connected = worker.call(deadline, |driver| Ok(driver.connected()))?;
                if !connected {
                    if let Err(e) = connect(&worker, deadline) {
                        warn!("{:#}", e);
                    }
                }

                let now = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
                for (kind, result) in read_round(&worker, deadline, &SensorKind::MEASURED) {
                    println!("{}  {}", now, format_reading(kind, &result));
                }

                round += 1;
                if count.map_or(false, |c| round >= c) {
                    break;
                }
                std::thread::sleep(interval);
            }
            let _ = worker.call(deadline, |driver| driver.set_connected(false));
        }

        Command::Describe { name } => match sensor_description(name) {
            Ok(text) => println!("{}", text),
            Err(DriverError::NotImplemented(_)) => {
                println!("{}: not measured by this station", name.trim())
            }
            Err(e) => return Err(e.into()),
        },

        Command::Config { action } => {
            let mut settings = settings;
            match action {
                ConfigAction::Show => {
                    println!("{}", path.display());
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                }
                ConfigAction::SetPort { port } => {
                    settings.port = port.clone();
                    settings.save(&path)?;
                    info!("saved port {} to {}", port, path.display());
                }
                ConfigAction::SetTrace { enabled } => {
                    settings.trace_enabled = *enabled;
                    settings.save(&path)?;
                    info!("saved trace flag {} to {}", enabled, path.display());
                }
            }
        }
    }

    Ok(())
}
