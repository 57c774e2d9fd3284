//! Twilio REST client: place outbound calls and send WhatsApp messages.

use crate::config::TwilioConfig;
use serde::Deserialize;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const WHATSAPP_PREFIX: &str = "whatsapp:";

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("twilio not configured: {0}")]
    NotConfigured(&'static str),
    #[error("twilio request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("twilio api error: {0}")]
    Api(String),
}

/// What the callee hears: a URL Twilio fetches markup from, or inline markup.
#[derive(Debug, Clone)]
pub enum CallScript {
    Url(String),
    Twiml(String),
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    sid: String,
}

#[derive(Clone)]
pub struct TwilioClient {
    api_base: String,
    account_sid: String,
    auth_token: String,
    whatsapp_from: Option<String>,
    phone_number: Option<String>,
    client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_base: TWILIO_API_BASE.to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            whatsapp_from: None,
            phone_number: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build from config; None when account sid or auth token is missing.
    pub fn from_config(config: &TwilioConfig) -> Option<Self> {
        let sid = config.account_sid.as_ref()?;
        let token = config.auth_token.as_ref()?;
        let mut client = Self::new(sid.clone(), token.clone());
        client.whatsapp_from = config.whatsapp_from.clone();
        client.phone_number = config.phone_number.clone();
        Some(client)
    }

    /// Point at a different API root (tests, regional edges).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    async fn create(&self, resource: &str, form: &[(&str, &str)]) -> Result<String, TwilioError> {
        let url = format!(
            "{}/Accounts/{}/{}.json",
            self.api_base, self.account_sid, resource
        );
        let res = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TwilioError::Api(format!("{} {}", status, body)));
        }
        let created: CreatedResource = res.json().await?;
        Ok(created.sid)
    }

    /// POST Calls.json from the configured voice number. Returns the call sid.
    pub async fn place_call(&self, to: &str, script: &CallScript) -> Result<String, TwilioError> {
        let from = self
            .phone_number
            .as_deref()
            .ok_or(TwilioError::NotConfigured("voice phone number"))?;
        let to = strip_whatsapp(to);
        let sid = match script {
            CallScript::Url(url) => {
                self.create("Calls", &[("To", to), ("From", from), ("Url", url.as_str())])
                    .await?
            }
            CallScript::Twiml(twiml) => {
                self.create("Calls", &[("To", to), ("From", from), ("Twiml", twiml.as_str())])
                    .await?
            }
        };
        log::info!("twilio: placed call {} to {}", sid, to);
        Ok(sid)
    }

    /// POST Messages.json from the configured WhatsApp sender. Returns the message sid.
    pub async fn send_whatsapp(&self, to: &str, body: &str) -> Result<String, TwilioError> {
        let from = self
            .whatsapp_from
            .as_deref()
            .ok_or(TwilioError::NotConfigured("whatsapp sender"))?;
        let to = whatsapp_address(to);
        let from = whatsapp_address(from);
        let sid = self
            .create("Messages", &[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
            .await?;
        log::info!("twilio: sent whatsapp message {} to {}", sid, to);
        Ok(sid)
    }
}

/// "+1555…" -> "whatsapp:+1555…"; already-prefixed addresses pass through.
pub fn whatsapp_address(number: &str) -> String {
    let n = number.trim();
    if n.starts_with(WHATSAPP_PREFIX) {
        n.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, n)
    }
}

/// Voice calls need the bare number even when the sender came in over WhatsApp.
pub fn strip_whatsapp(number: &str) -> &str {
    let n = number.trim();
    n.strip_prefix(WHATSAPP_PREFIX).unwrap_or(n)
}
