//! Serial terminal for talking to embedded devices
//! Features: split log/serial views, line-based send, config wizard

mod app;
mod event;
mod run;
mod terminal;
mod ui;
mod widgets;
mod wizard;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use circuit_echo_core::{spawn_link_reader, Link, LinkConfig, LinkHandle, LogSink, Parity, QueueReceiver};
use clap::Parser;
use crossterm::event::EventStream;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use terminal::TerminalGuard;

/// Upper bound on waiting for the reader after the UI exits
const READER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Circuit Echo - serial terminal with a live log pane
///
/// Without --port an interactive wizard asks for the link settings.
#[derive(Parser, Debug)]
#[command(name = "circuit-echo", version, about)]
struct Args {
    /// Serial port to open (skips the wizard)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = 115200)]
    baud: u32,

    /// Data bits (5-8)
    #[arg(long, default_value_t = 8)]
    data_bits: u8,

    /// Stop bits (1 or 2)
    #[arg(long, default_value_t = 1)]
    stop_bits: u8,

    /// Parity: N, O, E (or none, odd, even)
    #[arg(long, default_value = "N", value_parser = parse_parity)]
    parity: Parity,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the available serial ports and exit
    #[arg(long, default_value = "false")]
    list_ports: bool,
}

/// Parity flag values the serial driver can open
fn parse_parity(s: &str) -> std::result::Result<Parity, String> {
    let parity: Parity = s.parse().map_err(|e: circuit_echo_core::CoreError| e.to_string())?;
    if !parity.is_supported() {
        return Err(format!("parity {} is not supported by this driver", parity));
    }
    Ok(parity)
}

impl Args {
    /// Link configuration taken from flags, if a port was given
    fn flag_config(&self) -> Option<LinkConfig> {
        let port = self.port.as_ref()?;
        Some(LinkConfig::new(
            port.clone(),
            self.baud,
            self.data_bits,
            self.stop_bits,
            self.parity,
        ))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log output goes to the in-app pane; stderr would corrupt the screen
    let sink = LogSink::new();
    setup_logging(&args.log_level, &sink)?;

    if args.list_ports {
        match wizard::list_ports() {
            Ok(ports) => ports.iter().for_each(|p| println!("{}", p)),
            Err(e) => eprintln!("{}", e),
        }
        return Ok(());
    }

    let config = match resolve_config(&args) {
        Ok(Some(config)) => config,
        Ok(None) => {
            eprintln!("No configuration selected, exiting.");
            return Ok(());
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return Ok(());
        }
    };

    match serde_json::to_string(&config) {
        Ok(json) => info!("Link configuration: {}", json),
        Err(e) => warn!("Failed to serialize link configuration: {}", e),
    }

    let link = match LinkHandle::open(&config) {
        Ok(link) => Arc::new(link),
        Err(e) => {
            error!("Failed to open serial port: {}", e);
            eprintln!("Failed to open serial port: {}", e);
            return Ok(());
        }
    };

    let (serial_tx, serial_rx) = circuit_echo_core::serial_queue();
    let cancel = CancellationToken::new();
    let reader = spawn_link_reader(link.take_reader()?, serial_tx, cancel.clone());

    let log_rx = sink
        .subscribe()
        .context("log sink already has a consumer")?;

    let mut app = App::new(
        Some(link.clone() as Arc<dyn Link>),
        cancel.clone(),
        config.summary(),
    );
    let result = run_ui(&mut app, serial_rx, log_rx).await;

    // Quit normally closes the link and cancels the reader. On the error
    // paths closing is enough: the read half fails with LinkClosed.
    if !link.is_closed() {
        if let Err(e) = link.close() {
            eprintln!("Failed to close serial port: {}", e);
        }
    }

    if tokio::time::timeout(READER_SHUTDOWN_TIMEOUT, reader).await.is_err() {
        warn!("Serial reader did not stop within {:?}", READER_SHUTDOWN_TIMEOUT);
    }

    if let Err(e) = result {
        eprintln!("Error running program: {:#}", e);
    }

    Ok(())
}

/// Flags when a port was given, the wizard otherwise
fn resolve_config(args: &Args) -> Result<Option<LinkConfig>> {
    if let Some(config) = args.flag_config() {
        config.validate()?;
        return Ok(Some(config));
    }

    let ports = wizard::list_ports()?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    wizard::run_wizard(&ports, &mut input, &mut output)
}

/// Run the presentation loop on the alternate screen
async fn run_ui(
    app: &mut App,
    serial_rx: QueueReceiver<Bytes>,
    log_rx: QueueReceiver<Bytes>,
) -> Result<()> {
    let _guard = TerminalGuard::enable().context("failed to prepare terminal")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let result = run::run(&mut terminal, app, EventStream::new(), serial_rx, log_rx).await;

    terminal.show_cursor()?;
    result
}

/// Setup logging with tracing-subscriber, writing into the log sink
fn setup_logging(level: &str, sink: &Arc<LogSink>) -> Result<()> {
    let log_level = level
        .parse::<Level>()
        .unwrap_or(Level::INFO);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(sink.writer()).with_ansi(false))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_build_config() {
        let args = Args::try_parse_from([
            "circuit-echo",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "9600",
            "--data-bits",
            "7",
            "--stop-bits",
            "2",
            "--parity",
            "even",
        ])
        .unwrap();

        assert_eq!(
            args.flag_config(),
            Some(LinkConfig::new("/dev/ttyUSB0", 9600, 7, 2, Parity::Even))
        );
    }

    #[test]
    fn test_flag_defaults() {
        let args = Args::try_parse_from(["circuit-echo", "-p", "COM3"]).unwrap();
        let config = args.flag_config().unwrap();

        assert_eq!(config.summary(), "COM3 @ 115200 8N1");
        assert_eq!(args.log_level, "info");
        assert!(!args.list_ports);
    }

    #[test]
    fn test_no_port_means_wizard() {
        let args = Args::try_parse_from(["circuit-echo"]).unwrap();
        assert_eq!(args.flag_config(), None);
    }

    #[test]
    fn test_invalid_parity_rejected() {
        assert!(Args::try_parse_from(["circuit-echo", "--parity", "x"]).is_err());
    }

    #[test]
    fn test_unsupported_parity_flag_rejected() {
        for value in ["M", "space"] {
            let err = Args::try_parse_from(["circuit-echo", "--parity", value]).unwrap_err();
            assert!(err.to_string().contains("not supported by this driver"));
        }
    }

    #[test]
    fn test_invalid_flag_config_fails_validation() {
        let args = Args::try_parse_from(["circuit-echo", "-p", "COM3", "--data-bits", "9"]).unwrap();
        assert!(resolve_config(&args).is_err());
    }
}
