//! Gateway: the HTTP surface Twilio calls.
//!
//! `/whatsapp` answers messages, `/voice` serves the wake-up call script and
//! `/call-response` answers the digit the caller pressed. Every route replies with
//! a well-formed XML document, whatever the collaborators did.

mod server;

pub use server::{router, run_gateway, GatewayState};
