use crate::domain::message::OutboundMessage;
use crate::domain::ports::Transport;
use crate::error::{BridgeError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;

/// One injected message as seen by the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub at: Instant,
    pub body: Value,
}

impl Delivery {
    pub fn kind(&self) -> Option<&str> {
        self.body.get("type").and_then(Value::as_str)
    }

    pub fn message_id(&self) -> Option<&str> {
        self.body.get("messageId").and_then(Value::as_str)
    }
}

/// A transport that keeps every injection in memory.
///
/// Availability and injection failures can be toggled to simulate a page that
/// is not mounted yet or has gone away. Clones share the same record.
#[derive(Default, Clone)]
pub struct RecordingTransport {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    unavailable: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Makes every `inject` call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.lock().is_empty()
    }
}

impl Transport for RecordingTransport {
    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn inject(&self, message: &OutboundMessage<'_>) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::TransportUnavailable);
        }
        let body = message.to_value()?;
        self.deliveries.lock().push(Delivery {
            at: Instant::now(),
            body,
        });
        Ok(())
    }
}
