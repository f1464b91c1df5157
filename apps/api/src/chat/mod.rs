//! Conversation core: prompts, persistence, the turn engine, and the
//! HTTP handlers that tie them together.

pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod store;
