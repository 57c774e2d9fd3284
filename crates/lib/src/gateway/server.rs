//! Gateway HTTP server: Twilio webhooks for WhatsApp and the wake-up call.

use crate::coach::{self, CallRouter, FollowUp, MessageRouter, ReplyBudget};
use crate::config::Config;
use crate::llm::{OpenAiClient, TextGenerator};
use crate::sheets::{AppendLog, MemoryLog, SheetsClient};
use crate::twilio::{self, CallResponseWebhook, TwilioClient, WhatsAppWebhook};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::FormRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Rows kept by the in-memory fallback log; the oldest are dropped past this.
const FALLBACK_LOG_ROWS: usize = 1000;

/// Shared state for the gateway. Collaborators are built once and injected here.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub messages: Arc<MessageRouter>,
    pub calls: Arc<CallRouter>,
}

impl GatewayState {
    /// Wire routers from explicit collaborators. `twilio` is only needed for follow-up calls.
    pub fn new(
        config: Config,
        log: Arc<dyn AppendLog>,
        llm: Arc<dyn TextGenerator>,
        twilio: Option<TwilioClient>,
    ) -> Self {
        let budget = ReplyBudget {
            media_max_tokens: config.llm.media_max_tokens,
            text_max_tokens: config.llm.text_max_tokens,
        };
        let follow_up = if config.voice.follow_up_call {
            match twilio {
                Some(t) if t.phone_number().is_some() => {
                    Some(FollowUp::new(t, config.voice.follow_up_delay()))
                }
                _ => {
                    log::warn!("voice.followUpCall is set but Twilio voice credentials are missing; follow-up calls disabled");
                    None
                }
            }
        } else {
            None
        };
        Self {
            messages: Arc::new(MessageRouter::new(llm, log, budget)),
            calls: Arc::new(CallRouter::new(follow_up)),
            config: Arc::new(config),
        }
    }

    /// Build the real collaborators from config: OpenAI client, Sheets log (or an in-memory
    /// log when the sheet is not configured), and Twilio REST client when credentials exist.
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = OpenAiClient::from_config(&config.llm).context("building completion client")?;
        if llm.is_configured() {
            log::info!("completion model {}", llm.model());
        } else {
            log::warn!("no completion api key configured; model replies will use the fallback text");
        }
        let log: Arc<dyn AppendLog> =
            match SheetsClient::from_config(&config.sheet).context("building sheet client")? {
                Some(sheet) => {
                    log::info!("logging interactions to spreadsheet {}", sheet.spreadsheet_id());
                    Arc::new(sheet)
                }
                None => {
                    log::warn!(
                        "sheet not configured; keeping the last {} interactions in memory only",
                        FALLBACK_LOG_ROWS
                    );
                    Arc::new(MemoryLog::bounded(FALLBACK_LOG_ROWS))
                }
            };
        let twilio = TwilioClient::from_config(&config.twilio);
        Ok(Self::new(config, log, Arc::new(llm), twilio))
    }
}

/// Routes served by the gateway.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/whatsapp", post(whatsapp_webhook))
        .route("/voice", get(voice_twiml).post(voice_twiml))
        .route("/call-response", post(call_response))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(state: GatewayState) -> Result<()> {
    let bind_addr = format!("{}:{}", state.config.gateway.bind.trim(), state.config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

/// Twilio always gets a reply document: an unreadable form is treated as an empty one.
fn form_or_default<T: Default>(route: &str, form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(e) => {
            log::warn!("{}: unreadable form ({}), using empty fields", route, e);
            T::default()
        }
    }
}

/// GET / returns a simple health JSON for uptime checks.
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

/// POST /whatsapp: text or media message; replies with a single-message envelope.
async fn whatsapp_webhook(
    State(state): State<GatewayState>,
    form: Result<Form<WhatsAppWebhook>, FormRejection>,
) -> Response {
    let inbound = form_or_default("whatsapp", form).into_inbound();
    log::info!(
        "whatsapp: message from {} ({} media)",
        inbound.sender,
        inbound.num_media
    );
    let routed = state.messages.handle(&inbound).await;
    xml_response(twilio::message_reply(&routed.reply))
}

/// GET|POST /voice: wake-up script plus the digit gather.
async fn voice_twiml() -> Response {
    log::info!("voice: serving wake-up script");
    xml_response(coach::wake_up_call())
}

/// POST /call-response: answer to the gathered digit.
async fn call_response(
    State(state): State<GatewayState>,
    form: Result<Form<CallResponseWebhook>, FormRejection>,
) -> Response {
    let form = form_or_default("call-response", form);
    let from = form.from.unwrap_or_default();
    log::info!(
        "voice: call response from {} (digits {:?})",
        from,
        form.digits
    );
    xml_response(state.calls.respond(form.digits.as_deref(), &from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TwilioConfig;

    fn twilio_with_number() -> TwilioClient {
        let mut c = TwilioConfig::default();
        c.account_sid = Some("AC1".to_string());
        c.auth_token = Some("tok".to_string());
        c.phone_number = Some("+15550000000".to_string());
        TwilioClient::from_config(&c).unwrap()
    }

    fn state(config: Config, twilio: Option<TwilioClient>) -> GatewayState {
        let llm = OpenAiClient::from_config(&config.llm).unwrap();
        GatewayState::new(config, Arc::new(MemoryLog::new()), Arc::new(llm), twilio)
    }

    #[test]
    fn from_config_without_credentials_uses_memory_log() {
        assert!(GatewayState::from_config(Config::default()).is_ok());
    }

    #[test]
    fn follow_up_stays_off_unless_enabled() {
        let s = state(Config::default(), Some(twilio_with_number()));
        assert!(!s.calls.has_follow_up());

        let mut config = Config::default();
        config.voice.follow_up_call = true;
        let s = state(config.clone(), None);
        assert!(!s.calls.has_follow_up());
        let s = state(config, Some(twilio_with_number()));
        assert!(s.calls.has_follow_up());
    }
}
