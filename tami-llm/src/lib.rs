//! # tami-llm: the pet's voice
//!
//! Everything Tami says beyond the fixed refusal lines goes through here:
//!   - **Mistral** (default, OpenAI-compatible chat completions)
//!   - **OpenAI-compatible API** (any `/v1/chat/completions` server)
//!   - **Ollama** (local)
//!
//! The [`Companion`] turns a [`tami_core::ChatSnapshot`] into prompts, calls a
//! [`ChatDelegate`] under a hard timeout, and converts every failure into a
//! short line of text. Nothing in this crate is ever fatal to the pet.

pub mod chat;
pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use chat::{ChatDelegate, Companion};
pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use types::{LlmRequest, LlmResponse};
