//! Sense CLI - drive Sensekit against the simulated platform
//!
//! Commands:
//! - list: print the sensor registry table
//! - config: print a sensor's default configuration
//! - run: sense for a while and print records as JSON

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sensekit::registry::{default_config, type_of};
use sensekit::sim::SimulatedPlatform;
use sensekit::{SensorRegistry, SensorType, FRAMEWORK_VERSION, PRODUCER_NAME};

/// Sense - duty-cycled on-device sensing against a simulated platform
#[derive(Parser)]
#[command(name = "sense")]
#[command(version = FRAMEWORK_VERSION)]
#[command(about = "Run Sensekit sensors and print their records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sensor registry table
    List,

    /// Print a sensor's default configuration as JSON
    Config {
        /// Sensor name (e.g. "WiFi", "SMS", "Accelerometer")
        sensor: String,
    },

    /// Sense for a while and print one JSON record per line
    Run {
        /// Sensor name, or "all" for every available sensor
        sensor: String,

        /// How long to sense before stopping
        #[arg(long, default_value = "10")]
        duration_secs: u64,

        /// Leave listed permissions ungranted (repeatable)
        #[arg(long)]
        deny: Vec<String>,

        /// Period between simulated push events (millis)
        #[arg(long, default_value = "500")]
        event_period_ms: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::List => list(),
        Commands::Config { sensor } => config(&sensor),
        Commands::Run {
            sensor,
            duration_secs,
            deny,
            event_period_ms,
        } => run(&sensor, duration_secs, &deny, event_period_ms),
    }
}

fn list() -> ExitCode {
    println!("{:<6} {:<15} {:<6} {:<22} classifier", "code", "name", "kind", "log tag");
    for sensor_type in SensorType::ALL {
        println!(
            "{:<6} {:<15} {:<6} {:<22} {}",
            sensor_type.code(),
            sensor_type.name(),
            match sensor_type.kind() {
                sensekit::SensorKind::Pull => "pull",
                sensekit::SensorKind::Push => "push",
            },
            sensor_type.log_tag(),
            if sensor_type.has_classifier() { "yes" } else { "no" },
        );
    }
    ExitCode::SUCCESS
}

fn config(sensor: &str) -> ExitCode {
    let sensor_type = match type_of(sensor) {
        Ok(sensor_type) => sensor_type,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&default_config(sensor_type)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(sensor: &str, duration_secs: u64, deny: &[String], event_period_ms: u64) -> ExitCode {
    let platform = SimulatedPlatform::with_all_permissions()
        .with_event_period(Duration::from_millis(event_period_ms));
    for permission in deny {
        platform.revoke(permission);
    }
    let registry = SensorRegistry::new(Arc::new(platform));

    let mut sensors = if sensor.eq_ignore_ascii_case("all") {
        registry.get_all()
    } else {
        let sensor_type = match type_of(sensor) {
            Ok(sensor_type) => sensor_type,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        };
        match registry.resolve(sensor_type) {
            Ok(handle) => vec![handle],
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let (tx, rx) = mpsc::channel();
    let sink = Arc::new(tx);
    for handle in &mut sensors {
        if let Err(err) = handle.start(Arc::clone(&sink) as Arc<dyn sensekit::RecordSink>) {
            eprintln!("warning: {} did not start: {err}", handle.log_tag());
        }
    }
    drop(sink);

    let pretty = atty::is(atty::Stream::Stdout);
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let mut emitted: u64 = 0;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(record) => {
                let json = if pretty {
                    serde_json::to_string_pretty(&record)
                } else {
                    serde_json::to_string(&record)
                };
                match json {
                    Ok(json) => println!("{json}"),
                    Err(err) => eprintln!("warning: unencodable record: {err}"),
                }
                emitted += 1;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    for handle in &mut sensors {
        handle.stop();
    }

    eprintln!("{PRODUCER_NAME} v{FRAMEWORK_VERSION}: {emitted} records from {} sensor(s)", sensors.len());
    ExitCode::SUCCESS
}
