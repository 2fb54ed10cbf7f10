//! LLM integration module.
//!
//! Provides an OpenAI-compatible client used by the summary-generation
//! collaborator, plus the prompts it sends.

mod client;
mod prompts;

pub use client::LlmClient;
pub use prompts::Prompts;
