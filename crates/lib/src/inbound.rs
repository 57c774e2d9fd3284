//! Inbound WhatsApp message, normalized from the webhook form for the coach router.

/// One media attachment reference (Twilio-hosted URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub content_type: Option<String>,
}

/// A message from the WhatsApp channel to be answered by the coach.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    /// Sender id, e.g. "whatsapp:+911234567890".
    pub sender: String,
    /// Body text, already trimmed (may be empty).
    pub body: String,
    /// Media count as reported by the provider.
    pub num_media: u32,
    /// Media references that arrived with the message (only the first is used).
    pub media: Vec<MediaRef>,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into().trim().to_string(),
            num_media: 0,
            media: Vec::new(),
        }
    }

    pub fn has_media(&self) -> bool {
        self.num_media > 0
    }

    pub fn first_media(&self) -> Option<&MediaRef> {
        self.media.first()
    }
}

/// What kind of interaction a log row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Media,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Media => "media",
        }
    }
}
