use super::event::DomainEventKind;
use super::message::OutboundMessage;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// One-way channel into the embedded page.
///
/// Injection is fire-and-forget: a successful return only means the call was
/// handed to the page, not that it was processed.
pub trait Transport: Send + Sync {
    /// Whether the underlying handle can currently accept injections.
    fn is_available(&self) -> bool {
        true
    }

    fn inject(&self, message: &OutboundMessage<'_>) -> Result<()>;
}

/// Callbacks for authentication outcomes, supplied by the integrating
/// application. Each receives the full parsed event object.
pub trait EventHandler: Send + Sync {
    fn on_cardinal_success(&self, _event: &Value) {}
    fn on_cardinal_failure(&self, _event: &Value) {}
    fn on_device_data_complete(&self, _event: &Value) {}
    fn on_enrollment_required(&self, _event: &Value) {}
    fn on_enrollment_frictionless(&self, _event: &Value) {}
    fn on_enrollment_failed(&self, _event: &Value) {}
    fn on_safepay_error(&self, _event: &Value) {}

    fn handle(&self, kind: DomainEventKind, event: &Value) {
        match kind {
            DomainEventKind::CardinalSuccess => self.on_cardinal_success(event),
            DomainEventKind::CardinalFailure => self.on_cardinal_failure(event),
            DomainEventKind::DeviceDataComplete => self.on_device_data_complete(event),
            DomainEventKind::EnrollmentRequired => self.on_enrollment_required(event),
            DomainEventKind::EnrollmentFrictionless => self.on_enrollment_frictionless(event),
            DomainEventKind::EnrollmentFailed => self.on_enrollment_failed(event),
            DomainEventKind::SafepayError => self.on_safepay_error(event),
        }
    }
}

/// Handler that drops every domain event.
pub struct NoopEventHandler;

impl EventHandler for NoopEventHandler {}

/// Stream of raw inbound payloads coming back from the embedded page.
#[async_trait]
pub trait InboundSource: Send {
    /// Returns `None` once the page side has closed.
    async fn next_event(&mut self) -> Result<Option<String>>;
}

pub type TransportHandle = Arc<dyn Transport>;
pub type EventHandlerHandle = Arc<dyn EventHandler>;
