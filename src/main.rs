//! RFID access gate — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ThreadedReader    SqliteLedger    SystemClock   LogEventSink  │
//! │  (CardReader)      (ScanLedger)    (Clock)       (EventSink)   │
//! │  JsonConfigFile    rppal / SimulatedPin                        │
//! │  (ConfigPort)      (embedded-hal OutputPin)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                 GateLoop (gate rules)                  │    │
//! │  │  Debounce · Quota · Actuator sequencer                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ctrlc ──▶ ShutdownTrigger ──▶ Shutdown (every blocking wait)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Besides `run`, the binary offers read-only audit commands over the
//! same ledger file.
#![deny(unused_must_use)]

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::{process, thread};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use embedded_hal::digital::OutputPin;
use fern::Dispatch;
use log::{LevelFilter, info};

use rfidgate::adapters::config_file::JsonConfigFile;
use rfidgate::adapters::line_reader::LineReader;
use rfidgate::adapters::log_sink::LogEventSink;
use rfidgate::adapters::sqlite_ledger::SqliteLedger;
use rfidgate::adapters::threaded_reader::ThreadedReader;
use rfidgate::adapters::time::{ClockZone, SystemClock};
use rfidgate::app::ports::{Clock, ConfigError, ConfigPort};
use rfidgate::app::service::GateLoop;
use rfidgate::card::Identifier;
use rfidgate::config::GateConfig;
use rfidgate::shutdown::shutdown_pair;

// ── Command line ──────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rfidgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unattended RFID access gate with a daily scan quota", long_about = None)]
struct Cli {
    /// JSON config file (optional; defaults apply without one)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite ledger path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gate loop, reading one card identifier per line on stdin
    Run {
        /// BCM pin number of the unlock output (overrides the config file)
        #[arg(long)]
        gpio: Option<u8>,
    },

    /// List registered cards, newest first
    Cards {
        #[arg(long)]
        json: bool,
    },

    /// List one card's scans on a local date
    Scans {
        /// Card identifier
        uid: String,

        /// Local date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run { gpio: None });

    if let Commands::InitConfig { path } = &command {
        return init_config(path);
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Commands::Run { gpio: Some(gpio) } = &command {
        config.output_gpio = *gpio;
    }
    config
        .validate()
        .context("configuration after command-line overrides")?;

    setup_logging(&config).context("failed to install logger")?;

    match command {
        Commands::Run { .. } => run_gate(&config),
        Commands::Cards { json } => list_cards(&config, json),
        Commands::Scans { uid, date, json } => list_scans(&config, &uid, date, json),
        Commands::InitConfig { .. } => Ok(()),
    }
}

// ── Startup helpers ───────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<GateConfig> {
    let Some(path) = path else {
        return Ok(GateConfig::default());
    };
    match JsonConfigFile::new(path).load() {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound) => bail!("config file {} not found", path.display()),
        Err(e) => Err(e).with_context(|| format!("loading {}", path.display())),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists; refusing to overwrite", path.display());
    }
    JsonConfigFile::new(path)
        .save(&GateConfig::default())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

/// Install the global `fern` dispatcher: stdout plus an optional log file.
fn setup_logging(config: &GateConfig) -> Result<(), fern::InitError> {
    let level = match config.log_level.to_uppercase().as_str() {
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(path) = &config.log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn system_clock(config: &GateConfig) -> SystemClock {
    SystemClock::new(ClockZone::from_offset(config.utc_offset()))
}

#[cfg(feature = "rpi")]
fn open_output(gpio: u8) -> Result<impl OutputPin> {
    let pin = rppal::gpio::Gpio::new()
        .context("opening GPIO controller")?
        .get(gpio)
        .with_context(|| format!("claiming BCM {gpio}"))?
        .into_output_low();
    info!("Output on BCM {} (rppal)", gpio);
    Ok(pin)
}

#[cfg(not(feature = "rpi"))]
fn open_output(gpio: u8) -> Result<impl OutputPin> {
    info!("Output on BCM {} (simulated; build with --features rpi for GPIO)", gpio);
    Ok(rfidgate::drivers::sim_pin::SimulatedPin::new(gpio))
}

// ── Commands ──────────────────────────────────────────────────

fn run_gate(config: &GateConfig) -> Result<()> {
    info!("━━━ RFID gate v{} starting ━━━", env!("CARGO_PKG_VERSION"));

    let (trigger, shutdown) = shutdown_pair();
    ctrlc::set_handler(move || trigger.fire()).context("installing signal handler")?;

    let ledger = SqliteLedger::open(&config.db_path)
        .with_context(|| format!("opening ledger {}", config.db_path.display()))?;
    let pin = open_output(config.output_gpio)?;
    let reader = ThreadedReader::spawn(
        LineReader::new(BufReader::new(std::io::stdin())),
        shutdown.clone(),
    )
    .context("starting reader thread")?;

    let gate = GateLoop::new(
        config,
        reader,
        ledger,
        pin,
        system_clock(config),
        LogEventSink::new(),
        shutdown,
    )
    .context("initialising gate")?;

    gate.run().context("shutdown cleanup")?;
    info!("Gate stopped");
    Ok(())
}

fn list_cards(config: &GateConfig, json: bool) -> Result<()> {
    let ledger = SqliteLedger::open(&config.db_path)?;
    let cards = ledger.list_cards()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }
    if cards.is_empty() {
        println!("No cards registered.");
    }
    for card in &cards {
        println!("{:<24} first seen {}", card.identifier, card.first_seen.to_rfc3339());
    }
    Ok(())
}

fn list_scans(config: &GateConfig, uid: &str, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let identifier = Identifier::parse(uid).context("invalid card identifier")?;
    let clock = system_clock(config);
    let date = date.unwrap_or_else(|| clock.local_date(clock.now()));

    let ledger = SqliteLedger::open(&config.db_path)?;
    if ledger.card(&identifier)?.is_none() {
        bail!("card {} is not registered", identifier);
    }
    let scans = ledger.scans_on_day(&identifier, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&scans)?);
        return Ok(());
    }
    println!(
        "{} on {}: {} scan(s), quota {}/day",
        identifier,
        date,
        scans.len(),
        config.max_daily_scans
    );
    for (n, scan) in scans.iter().enumerate() {
        let total = n + 1;
        let verdict = if total <= config.max_daily_scans as usize {
            "allowed"
        } else {
            "denied"
        };
        println!(
            "  #{:<6} {}  total={}  {}",
            scan.sequence_id,
            scan.timestamp.to_rfc3339(),
            total,
            verdict
        );
    }
    Ok(())
}
