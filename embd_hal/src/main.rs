//! # embd
//!
//! Companion tool for the embd HAL: host detection, pin listing and quick
//! GPIO/LED pokes from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Which board is this?
//! embd detect --json
//!
//! # Print the active pin map
//! embd pins
//!
//! # Drive and sample pins (any id or alias)
//! embd gpio write P9_12 1
//! embd gpio read 60
//!
//! # Blink the user LED
//! embd led toggle USR3
//!
//! # Print edges until Ctrl-C
//! embd watch P9_12 --edge rising
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand, ValueEnum};
use embd_common::config::{ConfigError, ConfigLoader, HalConfig, LogLevel};
use embd_common::consts::DEFAULT_CONFIG_PATH;
use embd_common::host::Host;
use embd_common::pin::Capability;
use embd_hal::Hal;
use embd_hal::detect::HostInfo;
use embd_hal::gpio::{DigitalPin, Direction, Edge, Level};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// embd - single-board computer HAL tool
#[derive(Parser, Debug)]
#[command(name = "embd")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Inspect and drive GPIO, LEDs and buses on single-board computers")]
#[command(long_about = None)]
struct Args {
    /// Path to the HAL configuration file. A missing file means defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Skip detection and use this host tag (rpi, bbb, chip).
    #[arg(long)]
    host: Option<Host>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected host and board revision
    Detect {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the pin map of the detected host
    Pins,
    /// Read or write a digital pin
    Gpio {
        #[command(subcommand)]
        action: GpioAction,
    },
    /// Switch an on-board LED
    Led {
        /// What to do
        action: LedAction,
        /// LED name or alias
        led: String,
    },
    /// Print edge events of an input pin until Ctrl-C
    Watch {
        /// Pin id or alias
        pin: String,
        /// Edge to report
        #[arg(long, default_value = "both")]
        edge: Edge,
    },
}

#[derive(Subcommand, Debug)]
enum GpioAction {
    /// Configure as input and print the level
    Read {
        /// Pin id or alias
        pin: String,
    },
    /// Configure as output and drive the level
    Write {
        /// Pin id or alias
        pin: String,
        /// 0 or 1
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        value: u8,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LedAction {
    On,
    Off,
    Toggle,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("embd failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config);
    let log_level = config.as_ref().map(|c| c.log_level).unwrap_or_default();
    setup_tracing(&args, log_level);

    let mut config = config?;
    if let Some(host) = args.host {
        config.host.tag = Some(host);
    }
    debug!(path = %args.config.display(), "configuration loaded");

    let hal = Hal::from_config(config)?;
    let result = execute(&hal, &args.command);
    let closed = hal.close();
    result?;
    closed?;
    Ok(())
}

fn execute(hal: &Hal, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Detect { json } => {
            let info = HostInfo {
                host: hal.host(),
                revision: hal.revision(),
            };
            if *json {
                println!("{}", serde_json::to_string(&info)?);
            } else {
                println!("host: {}", info.host);
                println!("revision: {:#x}", info.revision);
                println!("features: {}", hal.descriptor().features().join(", "));
            }
        }
        Command::Pins => {
            let gpio = hal.gpio()?;
            for pin in gpio.pin_map().iter() {
                let caps: Vec<_> = pin.caps.iter().map(Capability::name).collect();
                println!(
                    "{:<8} gpio {:<5} {:<24} {}",
                    pin.id,
                    pin.digital_logical,
                    caps.join(","),
                    pin.aliases.join(" ")
                );
            }
        }
        Command::Gpio { action } => match action {
            GpioAction::Read { pin } => {
                hal.set_direction(pin, Direction::In)?;
                println!("{}", hal.digital_read(pin)?);
            }
            GpioAction::Write { pin, value } => {
                hal.set_direction(pin, Direction::Out)?;
                hal.digital_write(pin, Level::from(*value == 1))?;
            }
        },
        Command::Led { action, led } => match action {
            LedAction::On => hal.led_on(led)?,
            LedAction::Off => hal.led_off(led)?,
            LedAction::Toggle => hal.led_toggle(led)?,
        },
        Command::Watch { pin, edge } => watch(hal, pin, *edge)?,
    }
    Ok(())
}

fn watch(hal: &Hal, key: &str, edge: Edge) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })?;

    let pin = hal.new_digital_pin(key)?;
    pin.set_direction(Direction::In)?;
    pin.watch(
        edge,
        Box::new(|pin: &dyn DigitalPin| match pin.read() {
            Ok(level) => println!("{} {}", pin.id(), level),
            Err(e) => warn!(pin = pin.id(), error = %e, "read after edge failed"),
        }),
    )?;
    info!(pin = pin.id(), edge = edge.as_str(), "watching");

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    pin.stop_watching()?;
    Ok(())
}

/// Load the configuration file; a missing file yields defaults.
fn load_config(path: &Path) -> Result<HalConfig, ConfigError> {
    match HalConfig::load(path) {
        Err(ConfigError::FileNotFound) => Ok(HalConfig::default()),
        other => other,
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        match configured {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
