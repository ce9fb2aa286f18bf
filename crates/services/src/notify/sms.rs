use async_trait::async_trait;
use tracing::debug;
use traino_config::SmsSettings;

use super::{SendError, SmsSender};

/// Twilio-compatible carrier client. Credentials are optional: without them
/// the sender reports unconfigured and every send fails with
/// `CarrierNotConfigured`, which dispatch records without counting.
pub struct TwilioSender {
    credentials: Option<CarrierCredentials>,
    client: reqwest::Client,
}

struct CarrierCredentials {
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// E.164 shape: leading `+`, then 1 to 15 digits, first digit non-zero.
pub fn is_e164(number: &str) -> bool {
    let Some(rest) = number.strip_prefix('+') else {
        return false;
    };

    (1..=15).contains(&rest.len())
        && !rest.starts_with('0')
        && rest.chars().all(|c| c.is_ascii_digit())
}

impl TwilioSender {
    pub fn new(settings: &SmsSettings) -> Self {
        let credentials = match (
            settings.account_sid.as_deref(),
            settings.auth_token.as_deref(),
            settings.from_number.as_deref(),
        ) {
            (Some(sid), Some(token), Some(from))
                if !sid.is_empty() && !token.is_empty() && !from.is_empty() =>
            {
                Some(CarrierCredentials {
                    account_sid: sid.to_string(),
                    auth_token: token.to_string(),
                    from_number: from.to_string(),
                })
            }
            _ => None,
        };

        Self {
            credentials,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
        let Some(creds) = &self.credentials else {
            return Err(SendError::CarrierNotConfigured);
        };

        if !is_e164(to) {
            return Err(SendError::InvalidAddress(format!(
                "{to} is not an E.164 phone number"
            )));
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            creds.account_sid
        );
        let params = [
            ("To", to),
            ("From", creds.from_number.as_str()),
            ("Body", body),
        ];

        let resp: serde_json::Value = self
            .client
            .post(&url)
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| SendError::Carrier(e.to_string()))?
            .json()
            .await
            .map_err(|e| SendError::Carrier(e.to_string()))?;

        // Success payloads carry a message `sid`; rejections carry `message`.
        match resp["sid"].as_str() {
            Some(sid) => {
                debug!(sid = %sid, to = %to, "SMS accepted by carrier");
                Ok(())
            }
            None => {
                let message = resp["message"].as_str().unwrap_or("Unknown carrier error");
                Err(SendError::Carrier(message.to_string()))
            }
        }
    }
}
