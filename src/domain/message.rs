use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Envelope key carrying the message kind.
pub const TYPE_KEY: &str = "type";
/// Envelope key carrying the correlation identifier.
pub const MESSAGE_ID_KEY: &str = "messageId";

/// Identifier matching an ack-expecting message to its acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mints a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical content sent to the embedded page, independent of delivery mechanics.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: String,
    pub payload: Map<String, Value>,
}

impl Message {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Adds a payload field, replacing any previous value under `key`.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// A message waiting in the outbound queue.
///
/// The correlation id is present exactly when the message expects an ack, and
/// it is kept across retries of the same logical message.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub message: Message,
    pub correlation_id: Option<CorrelationId>,
    /// Redeliveries still allowed. Never increases.
    pub retries_remaining: u32,
    /// Dispatch attempts made so far.
    pub attempts: u32,
}

impl PendingEntry {
    pub fn new(message: Message, expect_ack: bool, retries: u32) -> Self {
        Self {
            message,
            correlation_id: expect_ack.then(CorrelationId::generate),
            retries_remaining: retries,
            attempts: 0,
        }
    }

    pub fn outbound(&self) -> OutboundMessage<'_> {
        OutboundMessage {
            message: &self.message,
            correlation_id: self.correlation_id.as_ref(),
        }
    }
}

/// Wire view of a pending entry: `{ ...payload, type, messageId? }`.
///
/// Envelope keys win over payload fields with the same name.
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    pub message: &'a Message,
    pub correlation_id: Option<&'a CorrelationId>,
}

impl OutboundMessage<'_> {
    pub fn kind(&self) -> &str {
        &self.message.kind
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for OutboundMessage<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.message.payload {
            if key != TYPE_KEY && key != MESSAGE_ID_KEY {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry(TYPE_KEY, &self.message.kind)?;
        if let Some(id) = self.correlation_id {
            map.serialize_entry(MESSAGE_ID_KEY, id)?;
        }
        map.end()
    }
}

/// Lifecycle of a single logical message.
///
/// `Queued -> Inflight -> Acked | Queued (after a timeout) | Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Queued,
    Inflight,
    Acked,
    Exhausted,
}
