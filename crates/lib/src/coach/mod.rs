//! The coach: decides what the bot says back, over WhatsApp and on the wake-up call.

mod message;
pub mod persona;
mod voice;

pub use message::{classify, MessageRouter, ReplyBudget, RoutedReply, TextIntent};
pub use voice::{
    call_outcome, follow_up_call, wake_up_call, CallOutcome, CallRouter, FollowUp,
    CALL_RESPONSE_PATH, GATHER_TIMEOUT_SECS,
};
