use super::bridge::Bridge;
use crate::domain::ports::InboundSource;
use crate::error::Result;
use tracing::debug;

/// Feeds every inbound payload from `source` into the bridge until the source
/// closes. Returns the number of payloads handled.
///
/// Malformed payloads are counted and dropped by the bridge; only a failure to
/// read from the source ends the pump early.
pub async fn pump(bridge: &Bridge, source: &mut dyn InboundSource) -> Result<usize> {
    let mut handled = 0;
    while let Some(raw) = source.next_event().await? {
        bridge.handle_inbound(&raw);
        handled += 1;
    }
    debug!(handled, "Inbound source closed");
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::domain::message::Message;
    use crate::domain::ports::NoopEventHandler;
    use crate::infrastructure::in_memory::RecordingTransport;
    use crate::infrastructure::stdio::LineSource;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_pump_routes_every_line() {
        let bridge = Bridge::new(BridgeConfig::default(), Arc::new(NoopEventHandler)).unwrap();
        let transport = RecordingTransport::new();
        bridge.attach_transport(Arc::new(transport.clone()));
        bridge.enqueue(Message::new("safepay-property-update"), false);

        let input = "{\"name\":\"safepay-inframe__ready\"}\nnot json\n[\"console\"]\n";
        let mut source = LineSource::new(input.as_bytes());

        let handled = pump(&bridge, &mut source).await.unwrap();
        assert_eq!(handled, 3);
        assert!(bridge.status().ready);
        assert_eq!(transport.len(), 1);
    }
}
