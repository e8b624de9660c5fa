//! Inbound events posted by the embedded page.
//!
//! Every raw payload is parsed in one step into [`InboundEvent`]. Only the
//! structure is checked; domain payloads are carried through untouched.

use crate::domain::message::CorrelationId;
use crate::error::{BridgeError, Result};
use serde::Deserialize;
use serde_json::Value;

pub const READY: &str = "safepay-inframe__ready";
pub const ACK: &str = "safepay-inframe__ack";
pub const CARDINAL_3DS_SUCCESS: &str = "safepay-inframe__cardinal-3ds__success";
pub const CARDINAL_3DS_FAILURE: &str = "safepay-inframe__cardinal-3ds__failure";
pub const DEVICE_DATA_COMPLETE: &str = "safepay-inframe__cardinal-device-data__complete";
pub const ENROLLMENT_REQUIRED: &str = "safepay-inframe__enrollment__required";
pub const ENROLLMENT_FRICTIONLESS: &str = "safepay-inframe__enrollment__frictionless";
pub const ENROLLMENT_FAILED: &str = "safepay-inframe__enrollment__failed";
pub const SAFEPAY_ERROR: &str = "safepay-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AckErrorDetail {
    pub message: Option<String>,
}

/// Body of an acknowledgment.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AckDetail {
    #[serde(rename = "messageId")]
    pub message_id: Option<CorrelationId>,
    pub status: Option<AckStatus>,
    pub detail: Option<AckErrorDetail>,
}

impl AckDetail {
    pub fn is_failure(&self) -> bool {
        self.status == Some(AckStatus::Error)
    }

    pub fn failure_message(&self) -> &str {
        self.detail
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .unwrap_or("unknown error")
    }
}

/// Outcome events from the authentication flow, forwarded to the host verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainEventKind {
    CardinalSuccess,
    CardinalFailure,
    DeviceDataComplete,
    EnrollmentRequired,
    EnrollmentFrictionless,
    EnrollmentFailed,
    SafepayError,
}

impl DomainEventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            CARDINAL_3DS_SUCCESS => Self::CardinalSuccess,
            CARDINAL_3DS_FAILURE => Self::CardinalFailure,
            DEVICE_DATA_COMPLETE => Self::DeviceDataComplete,
            ENROLLMENT_REQUIRED => Self::EnrollmentRequired,
            ENROLLMENT_FRICTIONLESS => Self::EnrollmentFrictionless,
            ENROLLMENT_FAILED => Self::EnrollmentFailed,
            SAFEPAY_ERROR => Self::SafepayError,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CardinalSuccess => CARDINAL_3DS_SUCCESS,
            Self::CardinalFailure => CARDINAL_3DS_FAILURE,
            Self::DeviceDataComplete => DEVICE_DATA_COMPLETE,
            Self::EnrollmentRequired => ENROLLMENT_REQUIRED,
            Self::EnrollmentFrictionless => ENROLLMENT_FRICTIONLESS,
            Self::EnrollmentFailed => ENROLLMENT_FAILED,
            Self::SafepayError => SAFEPAY_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Ready,
    Ack(AckDetail),
    /// The full event object, untouched.
    Domain(DomainEventKind, Value),
    /// Console output mirrored from the page as a JSON array.
    Console(Vec<Value>),
    /// Well-formed event with a tag this bridge does not handle.
    Unrecognized(String),
}

impl InboundEvent {
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let object = match value {
            Value::Array(lines) => return Ok(Self::Console(lines)),
            Value::Object(object) => object,
            other => {
                return Err(BridgeError::MalformedEvent(format!(
                    "expected an object, got {other}"
                )));
            }
        };

        let name = match object.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => {
                return Err(BridgeError::MalformedEvent(
                    "missing string field `name`".to_string(),
                ));
            }
        };

        match name.as_str() {
            READY => Ok(Self::Ready),
            ACK => {
                let detail = match object.get("detail") {
                    None | Some(Value::Null) => AckDetail::default(),
                    Some(detail) => AckDetail::deserialize(detail)?,
                };
                Ok(Self::Ack(detail))
            }
            other => match DomainEventKind::from_name(other) {
                Some(kind) => Ok(Self::Domain(kind, Value::Object(object))),
                None => Ok(Self::Unrecognized(name)),
            },
        }
    }
}
