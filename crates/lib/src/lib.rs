//! Grit core library: the webhook gateway, coach routing, and the external clients
//! (completion model, spreadsheet log, Twilio) the gateway talks to.

pub mod coach;
pub mod config;
pub mod gateway;
pub mod inbound;
pub mod init;
pub mod llm;
pub mod sheets;
pub mod twilio;
