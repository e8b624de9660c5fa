use crate::domain::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Message kind used to push properties into the embedded page.
pub const PROPERTY_UPDATE: &str = "safepay-property-update";

/// Hosting environment of the embedded authentication pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    Local,
    Development,
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Development => "development",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Self::Local => "http://localhost:3000",
            Self::Development => "https://dev.api.getsafepay.com/drops",
            Self::Sandbox => "https://sandbox.api.getsafepay.com/drops",
            Self::Production => "https://getsafepay.com/drops",
        }
    }

    /// Entry page hosting device fingerprinting and the 3-D-Secure challenge.
    pub fn authlink_url(self) -> String {
        format!("{}/authlink", self.base_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street_1: String,
    #[serde(default)]
    pub street_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// Payment session details supplied by the integrating application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub tracker: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "deviceDataCollectionJWT", default)]
    pub device_data_collection_jwt: String,
    #[serde(rename = "deviceDataCollectionURL", default)]
    pub device_data_collection_url: String,
    #[serde(flatten)]
    pub billing: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorizationOptions {
    pub do_capture: bool,
    pub do_card_on_file: bool,
}

/// Builders for `safepay-property-update` messages.
pub struct PropertyUpdate;

impl PropertyUpdate {
    /// Properties needed by the device fingerprinting page.
    pub fn device_collection(
        environment: Environment,
        context: &SessionContext,
        options: AuthorizationOptions,
    ) -> Message {
        Message::new(PROPERTY_UPDATE).with_field(
            "properties",
            json!({
                "environment": environment.as_str(),
                "authToken": context.client_secret,
                "tracker": context.tracker,
                "deviceDataCollectionJWT": context.device_data_collection_jwt,
                "deviceDataCollectionURL": context.device_data_collection_url,
                "billing": context.billing,
                "authorizationOptions": options,
            }),
        )
    }

    /// Properties for the 3-D-Secure step-up challenge.
    pub fn step_up(access_token: &str, step_up_url: &str) -> Message {
        Message::new(PROPERTY_UPDATE).with_field(
            "properties",
            json!({
                "threeDSJWT": access_token,
                "threeDSURL": step_up_url,
            }),
        )
    }
}
