use crate::domain::message::OutboundMessage;
use crate::error::Result;

/// Renders the script that posts `message` into the page's window. The
/// script always evaluates to `true`.
pub fn injection_script(message: &OutboundMessage<'_>) -> Result<String> {
    let json = message.to_json()?;
    Ok(format!(
        r#"if (window.postMessage) {{ window.postMessage({json}, "*"); }} else {{ console.error("postMessage is not supported"); }} true;"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::{CorrelationId, Message, PendingEntry};

    #[test]
    fn test_script_embeds_message() {
        let entry = PendingEntry {
            message: Message::new("safepay-property-update"),
            correlation_id: Some(CorrelationId::from("m-1")),
            retries_remaining: 0,
            attempts: 0,
        };

        let script = injection_script(&entry.outbound()).unwrap();
        assert!(script.starts_with("if (window.postMessage)"));
        assert!(script.contains(r#"window.postMessage({"type":"safepay-property-update","messageId":"m-1"}, "*")"#));
        assert!(script.ends_with("true;"));
    }
}
