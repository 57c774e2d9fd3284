//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.grit/config.json`) and environment.
//! Credentials normally come from the environment; a set, non-empty env var always
//! wins over the file.

use crate::sheets::{parse_service_account_json, ServiceAccountKey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Twilio account, senders and public URL.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Completion model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Spreadsheet used as the interaction log.
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Wake-up call behaviour.
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook endpoints (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; Twilio has to reach it).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Twilio credentials and sender identities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwilioConfig {
    /// Overridden by TWILIO_ACCOUNT_SID env.
    pub account_sid: Option<String>,
    /// Overridden by TWILIO_AUTH_TOKEN env.
    pub auth_token: Option<String>,
    /// WhatsApp sender, e.g. "whatsapp:+14155238886". Overridden by TWILIO_WHATSAPP_FROM env.
    pub whatsapp_from: Option<String>,
    /// Voice number used as caller id for outbound calls. Overridden by TWILIO_PHONE_NUMBER env.
    pub phone_number: Option<String>,
    /// Public URL of this gateway (used as the call script URL when placing calls). Overridden by GRIT_PUBLIC_BASE_URL env.
    pub public_base_url: Option<String>,
}

/// Completion model settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// API base (default https://api.openai.com/v1). Overridden by OPENAI_BASE_URL env.
    pub base_url: Option<String>,
    /// Bearer key. Overridden by OPENAI_API_KEY env.
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Per-request timeout for completion calls.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Output budget for image analysis replies.
    #[serde(default = "default_media_max_tokens")]
    pub media_max_tokens: u32,
    /// Output budget for free-text coaching replies.
    #[serde(default = "default_text_max_tokens")]
    pub text_max_tokens: u32,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_media_max_tokens() -> u32 {
    300
}

fn default_text_max_tokens() -> u32 {
    200
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
            media_max_tokens: default_media_max_tokens(),
            text_max_tokens: default_text_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Spreadsheet log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetConfig {
    /// Spreadsheet key from the sheet URL. Overridden by GOOGLE_SHEET_KEY env.
    pub spreadsheet_id: Option<String>,
    /// Worksheet (tab) name rows are appended to.
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    /// Service account credential object, file key `serviceAccountJson`. Overridden by
    /// SERVICE_ACCOUNT_JSON env (JSON text).
    #[serde(rename = "serviceAccountJson")]
    pub service_account: Option<ServiceAccountKey>,
}

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            worksheet: default_worksheet(),
            service_account: None,
        }
    }
}

/// Wake-up call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// When true, a caller who does not press 1 gets called back after `follow_up_delay_secs`.
    #[serde(default)]
    pub follow_up_call: bool,
    #[serde(default = "default_follow_up_delay_secs")]
    pub follow_up_delay_secs: u64,
}

fn default_follow_up_delay_secs() -> u64 {
    30 * 60
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            follow_up_call: false,
            follow_up_delay_secs: default_follow_up_delay_secs(),
        }
    }
}

impl VoiceConfig {
    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_secs(self.follow_up_delay_secs)
    }
}

/// Trimmed, non-empty value or None.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Apply env overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from `lookup` (env var name -> value). Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| non_empty(lookup(key));

    if let Some(v) = get("TWILIO_ACCOUNT_SID") {
        config.twilio.account_sid = Some(v);
    }
    if let Some(v) = get("TWILIO_AUTH_TOKEN") {
        config.twilio.auth_token = Some(v);
    }
    if let Some(v) = get("TWILIO_WHATSAPP_FROM") {
        config.twilio.whatsapp_from = Some(v);
    }
    if let Some(v) = get("TWILIO_PHONE_NUMBER") {
        config.twilio.phone_number = Some(v);
    }
    if let Some(v) = get("GRIT_PUBLIC_BASE_URL") {
        config.twilio.public_base_url = Some(v);
    }
    if let Some(v) = get("OPENAI_API_KEY") {
        config.llm.api_key = Some(v);
    }
    if let Some(v) = get("OPENAI_BASE_URL") {
        config.llm.base_url = Some(v);
    }
    if let Some(v) = get("GOOGLE_SHEET_KEY") {
        config.sheet.spreadsheet_id = Some(v);
    }
    if let Some(v) = get("SERVICE_ACCOUNT_JSON") {
        let key = parse_service_account_json(&v).context("parsing SERVICE_ACCOUNT_JSON")?;
        config.sheet.service_account = Some(key);
    }
    if let Some(v) = get("PORT") {
        config.gateway.port = v
            .parse()
            .with_context(|| format!("parsing PORT value {:?}", v))?;
    }
    Ok(())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("GRIT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".grit").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path (or GRIT_CONFIG_PATH / default), then apply env overrides.
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config)?;
    Ok((config, path))
}
