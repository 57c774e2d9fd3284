//! Twilio integration: webhook payloads, TwiML replies, and the REST calls the
//! gateway and CLI make on their own (outbound calls, WhatsApp sends).

mod rest;
pub mod twiml;
mod webhook;

pub use rest::{strip_whatsapp, whatsapp_address, CallScript, TwilioClient, TwilioError};
pub use twiml::{message_reply, VoiceResponse};
pub use webhook::{CallResponseWebhook, WhatsAppWebhook};
