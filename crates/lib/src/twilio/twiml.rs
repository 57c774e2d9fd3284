//! TwiML (Twilio Markup Language) rendering for messaging and voice replies.

use std::fmt::Write;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Messaging reply envelope with exactly one `<Message>`.
pub fn message_reply(text: &str) -> String {
    format!(
        "{}<Response>\n  <Message>{}</Message>\n</Response>",
        XML_DECL,
        xml_escape(text)
    )
}

/// Voice verbs this service emits.
#[derive(Debug, Clone)]
enum VoiceVerb {
    Say {
        text: String,
        voice: Option<String>,
        language: Option<String>,
    },
    Gather {
        num_digits: u32,
        action: String,
        timeout: u32,
        children: Vec<VoiceVerb>,
    },
}

/// Builder for a `<Response>` voice document.
#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<VoiceVerb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<Say>` with the provider's default voice.
    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push(VoiceVerb::Say {
            text: text.to_string(),
            voice: None,
            language: None,
        });
        self
    }

    /// `<Say>` with an explicit voice and language.
    pub fn say_with(mut self, text: &str, voice: &str, language: &str) -> Self {
        self.verbs.push(VoiceVerb::Say {
            text: text.to_string(),
            voice: Some(voice.to_string()),
            language: Some(language.to_string()),
        });
        self
    }

    /// DTMF `<Gather>` that posts the collected digits to `action`; `prompt` is spoken inside it.
    pub fn gather_digits(
        mut self,
        num_digits: u32,
        action: &str,
        timeout: u32,
        prompt: Option<&str>,
    ) -> Self {
        let children = prompt
            .map(|p| {
                vec![VoiceVerb::Say {
                    text: p.to_string(),
                    voice: None,
                    language: None,
                }]
            })
            .unwrap_or_default();
        self.verbs.push(VoiceVerb::Gather {
            num_digits,
            action: action.to_string(),
            timeout,
            children,
        });
        self
    }

    pub fn build(self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str("<Response>\n");
        for verb in &self.verbs {
            render_verb(&mut xml, verb, 1);
        }
        xml.push_str("</Response>");
        xml
    }
}

fn render_verb(xml: &mut String, verb: &VoiceVerb, indent: usize) {
    let pad = "  ".repeat(indent);
    match verb {
        VoiceVerb::Say {
            text,
            voice,
            language,
        } => {
            let _ = write!(xml, "{}<Say", pad);
            if let Some(v) = voice {
                let _ = write!(xml, " voice=\"{}\"", xml_escape(v));
            }
            if let Some(l) = language {
                let _ = write!(xml, " language=\"{}\"", xml_escape(l));
            }
            let _ = writeln!(xml, ">{}</Say>", xml_escape(text));
        }
        VoiceVerb::Gather {
            num_digits,
            action,
            timeout,
            children,
        } => {
            let _ = write!(
                xml,
                "{}<Gather action=\"{}\" numDigits=\"{}\" timeout=\"{}\"",
                pad,
                xml_escape(action),
                num_digits,
                timeout
            );
            if children.is_empty() {
                let _ = writeln!(xml, "/>");
            } else {
                let _ = writeln!(xml, ">");
                for child in children {
                    render_verb(xml, child, indent + 1);
                }
                let _ = writeln!(xml, "{}</Gather>", pad);
            }
        }
    }
}

/// Escape special XML characters
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_reply_wraps_one_escaped_message() {
        let xml = message_reply("Push-ups & planks <now>");
        assert!(xml.starts_with("<?xml"));
        assert_eq!(xml.matches("<Message>").count(), 1);
        assert!(xml.contains("Push-ups &amp; planks &lt;now&gt;"));
        assert!(xml.ends_with("</Response>"));
    }

    #[test]
    fn say_with_voice_and_language() {
        let xml = VoiceResponse::new().say_with("Stay hard.", "alice", "en-US").build();
        assert!(xml.contains("<Say voice=\"alice\" language=\"en-US\">Stay hard.</Say>"));
    }

    #[test]
    fn plain_say_has_no_attributes() {
        let xml = VoiceResponse::new().say("Good.").build();
        assert!(xml.contains("<Say>Good.</Say>"));
    }

    #[test]
    fn gather_nests_prompt() {
        let xml = VoiceResponse::new()
            .gather_digits(1, "/call-response", 6, Some("Press 1."))
            .build();
        assert!(xml.contains("<Gather action=\"/call-response\" numDigits=\"1\" timeout=\"6\">"));
        assert!(xml.contains("    <Say>Press 1.</Say>"));
        assert!(xml.contains("</Gather>"));
    }

    #[test]
    fn gather_without_prompt_self_closes() {
        let xml = VoiceResponse::new().gather_digits(1, "/x", 5, None).build();
        assert!(xml.contains("timeout=\"5\"/>"));
        assert!(!xml.contains("</Gather>"));
    }

    #[test]
    fn escape_quotes_and_apostrophes() {
        assert_eq!(xml_escape("it's \"now\""), "it&apos;s &quot;now&quot;");
    }
}
