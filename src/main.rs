use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bt_hid_bridge::bluetooth::{AdapterState, LoopbackConfig, LoopbackStack};
use bt_hid_bridge::bridge;
use bt_hid_bridge::config::AppConfig;
use bt_hid_bridge::events::EventBus;
use bt_hid_bridge::HidSession;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// Adapter state reported by the loopback stack
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum AdapterArg {
    #[default]
    Enabled,
    Disabled,
    Missing,
}

impl From<AdapterArg> for AdapterState {
    fn from(arg: AdapterArg) -> Self {
        match arg {
            AdapterArg::Enabled => AdapterState::Enabled,
            AdapterArg::Disabled => AdapterState::Disabled,
            AdapterArg::Missing => AdapterState::Missing,
        }
    }
}

/// bt-hid-bridge command line arguments
#[derive(Parser, Debug)]
#[command(name = "bt-hid-bridge")]
#[command(version, about = "Bluetooth HID keyboard/mouse bridge (JSON lines on stdin/stdout)", long_about = None)]
struct CliArgs {
    /// Configuration file (JSON)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Adapter state reported by the loopback stack
    #[arg(long, value_name = "STATE", default_value = "enabled")]
    adapter: AdapterArg,

    /// Simulate a host that accepts connect/disconnect requests
    #[arg(long)]
    auto_link: bool,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON objects
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging with CLI arguments
    init_logging(args.log_level, args.verbose, args.log_json);

    tracing::info!("Starting bt-hid-bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(args.config.as_deref()).await?;

    let stack = LoopbackStack::new(LoopbackConfig {
        adapter: args.adapter.into(),
        auto_link: args.auto_link,
        ..Default::default()
    });
    let events = Arc::new(EventBus::with_capacity(config.events.channel_capacity));
    let session = HidSession::new(Arc::new(stack), config.hid, events.clone());

    // Forward notifications to stdout
    let mut event_rx = events.subscribe();
    let event_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event listener lagged, {} events missed", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = bridge::handle_line(&session, line).await;
        println!("{}", serde_json::to_string(&response)?);
    }

    tracing::info!("Input closed, shutting down");
    session.shutdown();
    event_task.abort();
    Ok(())
}

fn init_logging(level: LogLevel, verbose_count: u8, json: bool) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    // Build filter string based on effective level
    let filter = match effective_level {
        LogLevel::Error => "bt_hid_bridge=error",
        LogLevel::Warn => "bt_hid_bridge=warn",
        LogLevel::Info => "bt_hid_bridge=info",
        LogLevel::Verbose => "bt_hid_bridge=debug,tokio=info",
        LogLevel::Debug => "bt_hid_bridge=debug,tokio=debug",
        LogLevel::Trace => "bt_hid_bridge=trace,tokio=debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // stdout carries the bridge protocol, logs go to stderr
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
