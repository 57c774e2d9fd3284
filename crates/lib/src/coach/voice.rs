//! Wake-up call: the spoken script with its digit prompt, and the answer to the digit.

use crate::coach::persona;
use crate::twilio::{strip_whatsapp, CallScript, TwilioClient, VoiceResponse};
use std::time::Duration;

/// Route the gather posts the collected digit to.
pub const CALL_RESPONSE_PATH: &str = "/call-response";
/// Seconds of silence before the gather gives up.
pub const GATHER_TIMEOUT_SECS: u32 = 6;
const GATHER_NUM_DIGITS: u32 = 1;

/// Markup for the wake-up call: monologue, then a one-digit gather.
pub fn wake_up_call() -> String {
    VoiceResponse::new()
        .say_with(
            persona::WAKE_UP_SCRIPT,
            persona::WAKE_UP_VOICE,
            persona::WAKE_UP_LANGUAGE,
        )
        .gather_digits(
            GATHER_NUM_DIGITS,
            CALL_RESPONSE_PATH,
            GATHER_TIMEOUT_SECS,
            Some(persona::GATHER_PROMPT),
        )
        .build()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Pressed 1.
    Up,
    /// Anything else, including no digit.
    NotUp,
}

pub fn call_outcome(digits: Option<&str>) -> CallOutcome {
    match digits {
        Some("1") => CallOutcome::Up,
        _ => CallOutcome::NotUp,
    }
}

/// Calls back a caller who did not confirm.
#[derive(Clone)]
pub struct FollowUp {
    twilio: TwilioClient,
    delay: Duration,
}

impl FollowUp {
    pub fn new(twilio: TwilioClient, delay: Duration) -> Self {
        Self { twilio, delay }
    }

    /// Detached: sleep, then place the follow-up call. Failures are only logged.
    fn schedule(&self, to: &str) {
        let twilio = self.twilio.clone();
        let delay = self.delay;
        let to = strip_whatsapp(to).to_string();
        log::info!("voice: follow-up call to {} in {}s", to, delay.as_secs());
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let script = CallScript::Twiml(follow_up_call());
            if let Err(e) = twilio.place_call(&to, &script).await {
                log::warn!("voice: follow-up call to {} failed: {}", to, e);
            }
        });
    }
}

/// Inline markup for the follow-up call.
pub fn follow_up_call() -> String {
    VoiceResponse::new().say(persona::FOLLOW_UP_LINE).build()
}

#[derive(Clone, Default)]
pub struct CallRouter {
    follow_up: Option<FollowUp>,
}

impl CallRouter {
    pub fn new(follow_up: Option<FollowUp>) -> Self {
        Self { follow_up }
    }

    pub fn has_follow_up(&self) -> bool {
        self.follow_up.is_some()
    }

    /// Markup answering the gathered digit. A caller who is not up gets the reprimand, and a
    /// follow-up call when one is configured.
    pub fn respond(&self, digits: Option<&str>, from: &str) -> String {
        match call_outcome(digits) {
            CallOutcome::Up => VoiceResponse::new().say(persona::CONFIRMED_LINE).build(),
            CallOutcome::NotUp => {
                match &self.follow_up {
                    Some(f) if !from.trim().is_empty() => f.schedule(from),
                    Some(_) => log::warn!("voice: no caller number, skipping follow-up call"),
                    None => {}
                }
                VoiceResponse::new().say(persona::MISSED_LINE).build()
            }
        }
    }
}
