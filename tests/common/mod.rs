#![allow(dead_code)]

use parking_lot::Mutex;
use safepay_bridge::application::bridge::Bridge;
use safepay_bridge::config::BridgeConfig;
use safepay_bridge::domain::ports::EventHandler;
use safepay_bridge::infrastructure::in_memory::RecordingTransport;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const READY: &str = r#"{"name":"safepay-inframe__ready"}"#;

pub fn ack(message_id: &str, status: &str) -> String {
    format!(
        r#"{{"name":"safepay-inframe__ack","detail":{{"messageId":"{message_id}","status":"{status}"}}}}"#
    )
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Records every domain callback as `(callback, event)`.
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<(&'static str, Value)> {
        self.events.lock().clone()
    }

    fn record(&self, callback: &'static str, event: &Value) {
        self.events.lock().push((callback, event.clone()));
    }
}

impl EventHandler for RecordingHandler {
    fn on_cardinal_success(&self, event: &Value) {
        self.record("cardinal_success", event);
    }
    fn on_cardinal_failure(&self, event: &Value) {
        self.record("cardinal_failure", event);
    }
    fn on_device_data_complete(&self, event: &Value) {
        self.record("device_data_complete", event);
    }
    fn on_enrollment_required(&self, event: &Value) {
        self.record("enrollment_required", event);
    }
    fn on_enrollment_frictionless(&self, event: &Value) {
        self.record("enrollment_frictionless", event);
    }
    fn on_enrollment_failed(&self, event: &Value) {
        self.record("enrollment_failed", event);
    }
    fn on_safepay_error(&self, event: &Value) {
        self.record("safepay_error", event);
    }
}

pub struct Harness {
    pub bridge: Bridge,
    pub transport: RecordingTransport,
    pub handler: Arc<RecordingHandler>,
}

pub fn harness(config: BridgeConfig) -> Harness {
    let handler = Arc::new(RecordingHandler::default());
    let bridge = Bridge::new(config, handler.clone()).unwrap();
    let transport = RecordingTransport::new();
    bridge.attach_transport(Arc::new(transport.clone()));
    Harness {
        bridge,
        transport,
        handler,
    }
}

pub fn fast_config(max_retries: u32) -> BridgeConfig {
    BridgeConfig::default()
        .with_ack_timeout(ms(100))
        .with_max_retries(max_retries)
}
