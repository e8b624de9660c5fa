use clap::Parser;
use miette::{IntoDiagnostic, Result};
use safepay_bridge::application::bridge::Bridge;
use safepay_bridge::application::session;
use safepay_bridge::config::{ACK_TIMEOUT_MS, BridgeConfig, MAX_RETRIES};
use safepay_bridge::domain::context::{AuthorizationOptions, Environment, PropertyUpdate};
use safepay_bridge::domain::ports::{EventHandlerHandle, TransportHandle};
use safepay_bridge::infrastructure::stdio::{LineSource, LineTransport, OutputFormat};
use safepay_bridge::interfaces::cli::console_handler::ConsoleEventHandler;
use safepay_bridge::interfaces::json::context_reader::ContextReader;
use std::fs::File;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Relays messages between a host and an embedded Safepay authentication page.
///
/// Outbound messages are written to stdout, one per line. Inbound page events
/// are read from stdin, one JSON payload per line. Authentication outcomes are
/// printed to stderr.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the payment session context
    context: PathBuf,

    #[arg(long, value_enum, default_value = "sandbox", env = "SAFEPAY_ENVIRONMENT")]
    environment: Environment,

    /// Per-attempt acknowledgment deadline in milliseconds
    #[arg(long, default_value_t = ACK_TIMEOUT_MS, env = "SAFEPAY_ACK_TIMEOUT_MS")]
    ack_timeout_ms: u64,

    /// Redeliveries allowed per message after the first attempt
    #[arg(long, default_value_t = MAX_RETRIES, env = "SAFEPAY_MAX_RETRIES")]
    max_retries: u32,

    /// Capture the payment as part of authorization
    #[arg(long)]
    do_capture: bool,

    /// Save the card on file
    #[arg(long)]
    card_on_file: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// How long to wait for outstanding acknowledgments once stdin closes
    #[arg(long, default_value_t = 0)]
    linger_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let file = File::open(&cli.context).into_diagnostic()?;
    let context = ContextReader::new(file).read().into_diagnostic()?;

    let config = BridgeConfig::default()
        .with_ack_timeout(Duration::from_millis(cli.ack_timeout_ms))
        .with_max_retries(cli.max_retries);
    let handler: EventHandlerHandle = Arc::new(ConsoleEventHandler::stderr());
    let bridge = Bridge::new(config, handler).into_diagnostic()?;
    tracing::debug!(
        ack_timeout_ms = bridge.config().ack_timeout.as_millis() as u64,
        max_retries = bridge.config().max_retries,
        "Bridge configured"
    );

    let transport = Arc::new(LineTransport::stdout(cli.format).into_diagnostic()?);
    bridge.attach_transport(transport.clone() as TransportHandle);

    let options = AuthorizationOptions {
        do_capture: cli.do_capture,
        do_card_on_file: cli.card_on_file,
    };
    bridge.enqueue(
        PropertyUpdate::device_collection(cli.environment, &context, options),
        true,
    );

    let mut source = LineSource::new(BufReader::new(tokio::io::stdin()));
    session::pump(&bridge, &mut source).await.into_diagnostic()?;

    if cli.linger_ms > 0
        && tokio::time::timeout(Duration::from_millis(cli.linger_ms), bridge.settled())
            .await
            .is_err()
    {
        let status = bridge.status();
        tracing::warn!(
            pending = status.pending,
            inflight = status.inflight,
            "Abandoning undelivered messages"
        );
    }

    bridge.teardown();
    transport.close();
    Ok(())
}
