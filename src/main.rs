use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{debug, info, warn};

use crate::bus::{Busctl, SensorBus, SENSORS_PATH, SENSOR_VALUE_IFACE};
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::render::{list_sensors, TableRenderer};
use crate::watch::{watch, StopSignal};

mod bus;
mod cli;
mod error;
mod logger;
mod normalize;
mod path_order;
mod render;
mod sensor_types;
mod table_types;
mod watch;

// Exit status of a watch session ended by Ctrl-C.
const INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logger::setup_logger(cli.verbose) {
        eprintln!("Can't set up logging: {e}");
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            debug!("{e:?}");
            eprintln!("{e}");
            if matches!(e, Error::DiscoveryEmpty(_)) {
                eprintln!("Try 'bmc-sensors --help' for more information.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    if let Some(host) = &cli.host {
        info!("Open DBus session to {host}");
    }
    let bus = Busctl::new(cli.busctl.as_str(), cli.host.clone());

    let root = match &cli.sensor_type {
        Some(sensor_type) => format!("{SENSORS_PATH}/{sensor_type}"),
        None => SENSORS_PATH.to_string(),
    };
    let sensors = bus.discover(&root, SENSOR_VALUE_IFACE)?;

    if cli.watch.is_empty() {
        let color = !cli.no_color && io::stdout().is_terminal();
        let mut renderer = TableRenderer::new(io::stdout().lock(), color);
        list_sensors(&bus, &sensors, &mut renderer)?;
        return Ok(ExitCode::SUCCESS);
    }

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.stop()) {
            warn!("Can't install Ctrl-C handler: {e}");
        }
    }

    let interval = Duration::from_secs(cli.interval);
    watch(&bus, &cli.watch, interval, &sensors, &mut io::stdout().lock(), &stop)?;
    Ok(ExitCode::from(INTERRUPTED))
}
