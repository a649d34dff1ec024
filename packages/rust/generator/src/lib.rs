//! Prompt-to-element generation.
//!
//! A prompt goes to the chat-completion endpoint first. Whenever that fails
//! (transport error, non-2xx, unparsable reply) the deterministic template
//! generator answers instead, so callers never see an AI outage.

mod client;
mod extract;
mod templates;

pub use client::{ChatMessage, CompletionClient, build_messages, build_system_prompt};
pub use extract::{default_text, extract_text};
pub use templates::fallback;
