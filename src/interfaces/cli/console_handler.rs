use crate::domain::event::DomainEventKind;
use crate::domain::ports::EventHandler;
use parking_lot::Mutex;
use serde_json::Value;
use std::io::{self, Write};

/// Prints each authentication outcome as `<event name> <json>` on its own line.
pub struct ConsoleEventHandler<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> ConsoleEventHandler<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl ConsoleEventHandler<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> EventHandler for ConsoleEventHandler<W> {
    fn handle(&self, kind: DomainEventKind, event: &Value) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{} {}", kind.name(), event) {
            tracing::warn!(error = %e, "Failed to print domain event");
        }
    }
}
