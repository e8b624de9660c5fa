//! Line-delimited transport and inbound source for driving a page that lives
//! in another process.

use super::script::injection_script;
use crate::domain::message::OutboundMessage;
use crate::domain::ports::{InboundSource, Transport};
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One outbound JSON object per line.
    #[default]
    Json,
    /// One `postMessage` injection script per line.
    Script,
}

/// Writes each injected message as a single line.
///
/// Lines are handed to a dedicated writer thread, so `inject` never blocks a
/// runtime worker on a stalled pipe. A write failure closes the transport;
/// later injections fail with `TransportUnavailable`.
pub struct LineTransport<W> {
    sender: Mutex<Option<Sender<String>>>,
    worker: Mutex<Option<JoinHandle<W>>>,
    open: Arc<AtomicBool>,
    format: OutputFormat,
}

impl<W: Write + Send + 'static> LineTransport<W> {
    pub fn spawn(writer: W, format: OutputFormat) -> Result<Self> {
        let (sender, receiver) = channel();
        let open = Arc::new(AtomicBool::new(true));
        let worker = thread::Builder::new()
            .name("safepay-line-writer".to_string())
            .spawn({
                let open = open.clone();
                move || run_writer(writer, receiver, &open)
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            open,
            format,
        })
    }

    /// Stops accepting lines, waits for everything already injected to be
    /// written, and returns the writer. Returns `None` if already closed.
    pub fn close(&self) -> Option<W> {
        self.sender.lock().take();
        self.open.store(false, Ordering::SeqCst);
        let worker = self.worker.lock().take()?;
        worker.join().ok()
    }
}

impl LineTransport<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Result<Self> {
        Self::spawn(io::stdout(), format)
    }
}

fn run_writer<W: Write>(mut writer: W, receiver: Receiver<String>, open: &AtomicBool) -> W {
    for line in receiver {
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Line transport closed after write failure");
            open.store(false, Ordering::SeqCst);
            break;
        }
    }
    writer
}

impl<W: Send> Transport for LineTransport<W> {
    fn is_available(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn inject(&self, message: &OutboundMessage<'_>) -> Result<()> {
        let line = match self.format {
            OutputFormat::Json => message.to_json()?,
            OutputFormat::Script => injection_script(message)?,
        };
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) if self.is_available() => sender
                .send(line)
                .map_err(|_| BridgeError::TransportUnavailable),
            _ => Err(BridgeError::TransportUnavailable),
        }
    }
}

/// Reads raw inbound events one per line, skipping blank lines.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InboundSource for LineSource<R> {
    async fn next_event(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}
