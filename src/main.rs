/*!
 * Tether CLI - hold a TCP connection open and reconnect it when it drops
 */

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tether::config::{LogLevel, TetherConfig};
use tether::driver::{Driver, LineLogger};
use tether::error::{TetherError, EXIT_FATAL, EXIT_SUCCESS};
use tether::logging;
use tracing::info;

#[derive(Parser)]
#[command(name = "tether")]
#[command(version, about = "Keep a TCP client connection alive across failures", long_about = None)]
struct Cli {
    /// Remote host name or address
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Remote port
    #[arg(short = 'p', long, value_name = "PORT")]
    port: Option<u16>,

    /// Load settings from a TOML file; flags override it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevelArg>,

    /// Path to log file (default: stdout)
    #[arg(long = "log-file", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging (equivalent to --log-level=debug)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Seconds between full resolution cycles
    #[arg(long, value_name = "SECS")]
    reconnect_interval: Option<f64>,

    /// Heartbeat period in milliseconds
    #[arg(long, value_name = "MS")]
    heartbeat_ms: Option<u64>,

    /// Line to send to the peer at the start of every session
    #[arg(long, value_name = "TEXT")]
    greeting: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

impl Cli {
    /// Layer command-line flags over the file (or default) configuration
    fn into_config(self) -> anyhow::Result<TetherConfig> {
        let mut config = match self.config {
            Some(ref path) => TetherConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TetherConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = self.log_level {
            config.log_level = level.into();
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
        if self.verbose {
            config.verbose = true;
        }
        if let Some(interval) = self.reconnect_interval {
            config.reconnect.reconnect_interval = interval;
        }
        if let Some(ms) = self.heartbeat_ms {
            config.heartbeat_interval_ms = ms;
        }
        if self.greeting.is_some() {
            config.greeting = self.greeting;
        }

        Ok(config)
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<TetherError>()
                .map(TetherError::exit_code)
                .unwrap_or(EXIT_FATAL)
        }
    };
    std::process::exit(code);
}

fn run() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    config.validate()?;

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let mut handler = LineLogger::new();
    if let Some(ref greeting) = config.greeting {
        handler = handler.with_greeting(greeting.clone());
    }
    let mut driver = Driver::new(&config, handler)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(driver.run());

    let snapshot = driver.connection().snapshot();
    info!(
        sessions = driver.connection().handler().sessions(),
        bytes = driver.connection().handler().total_bytes(),
        failures = snapshot.failures,
        "Stopped"
    );
    Ok(())
}
