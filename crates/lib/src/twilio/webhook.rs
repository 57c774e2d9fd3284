//! Form payloads Twilio posts to the webhooks. Every field is optional on the wire;
//! defaults are explicit so a sparse request still yields a reply.

use crate::inbound::{InboundMessage, MediaRef};
use serde::Deserialize;

/// Incoming WhatsApp message (POST /whatsapp).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WhatsAppWebhook {
    pub from: Option<String>,
    pub body: Option<String>,
    /// Kept as text: a blank or garbled value counts as zero media.
    pub num_media: Option<String>,
    pub media_url0: Option<String>,
    pub media_content_type0: Option<String>,
}

impl WhatsAppWebhook {
    pub fn num_media(&self) -> u32 {
        self.num_media
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn into_inbound(self) -> InboundMessage {
        let num_media = self.num_media();
        let media = match (num_media, self.media_url0) {
            (n, Some(url)) if n > 0 => vec![MediaRef {
                url,
                content_type: self.media_content_type0,
            }],
            _ => Vec::new(),
        };
        InboundMessage {
            sender: self.from.unwrap_or_default(),
            body: self.body.unwrap_or_default().trim().to_string(),
            num_media,
            media,
        }
    }
}

/// Digit collected by the wake-up call's gather (POST /call-response).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CallResponseWebhook {
    pub digits: Option<String>,
    pub from: Option<String>,
}
