//! The pet's side of a conversation.
//!
//! [`Companion`] never touches the live pet: it works from a
//! [`ChatSnapshot`] taken under the session lock, so a slow backend can
//! never hold up ticks or actions. Every backend call runs under a hard
//! timeout and every failure becomes a short line of text.

use std::future::Future;
use std::time::Duration;

use tami_core::config::LlmConfig;
use tami_core::memory::relevant_memories;
use tami_core::{ChatSnapshot, Refusal, advisory};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::prompt;

/// Shown when no backend is configured.
pub const APOLOGY: &str = "Sorry, I can't process messages right now.";

/// Something that can complete a system + user prompt pair.
pub trait ChatDelegate: Send + Sync {
    /// Whether calls can succeed at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Complete one exchange.
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Turns pet snapshots into prompts and backend answers into display text.
#[derive(Debug)]
pub struct Companion<D> {
    delegate: D,
    timeout: Duration,
}

impl<D: ChatDelegate> Companion<D> {
    /// Wrap `delegate`, cutting every call off after `timeout`.
    #[must_use]
    pub fn new(delegate: D, timeout: Duration) -> Self {
        Self { delegate, timeout }
    }

    /// Wrap `delegate` using `config.request_timeout_ms`.
    #[must_use]
    pub fn from_config(delegate: D, config: &LlmConfig) -> Self {
        Self::new(delegate, Duration::from_millis(config.request_timeout_ms))
    }

    /// The wrapped delegate.
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Answer the owner. `None` for blank input.
    ///
    /// A dead pet gives the same silent answer it gives to every action, and
    /// the backend is never asked.
    pub async fn reply(&self, message: &str, snapshot: &ChatSnapshot) -> Option<String> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        if !snapshot.alive {
            return Some(Refusal::Dead.to_string());
        }
        if prompt::is_off_topic(message) {
            debug!("Declining off-topic message");
            return Some(prompt::OFF_TOPIC_REPLY.to_string());
        }
        if !self.delegate.is_available() {
            return Some(APOLOGY.to_string());
        }

        let memories = relevant_memories(&snapshot.memories, message);
        let stats = prompt::asks_for_status(message).then_some(&snapshot.vitals);
        let system = prompt::system(prompt::INTERACTION_SYSTEM, &snapshot.pet_name);
        let user = prompt::interaction_user(message, &memories, stats);

        debug!(memories = memories.len(), with_stats = stats.is_some(), "Sending chat");
        Some(match self.call(&system, &user).await {
            Ok(text) => text,
            Err(e) => format!("Error processing the message: {e}"),
        })
    }

    /// Voice the pet's pressing needs, if it has any.
    ///
    /// Silent (`None`) when nothing is low or the backend fails.
    pub async fn needs_message(&self, snapshot: &ChatSnapshot) -> Option<String> {
        if !snapshot.alive || !self.delegate.is_available() {
            return None;
        }
        let needs = advisory::need_phrases(&snapshot.vitals);
        if needs.is_empty() {
            return None;
        }
        let system = prompt::system(prompt::NEEDS_SYSTEM, &snapshot.pet_name);
        match self.call(&system, &prompt::needs_user(&needs)).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Needs message failed");
                None
            }
        }
    }

    /// A short conversation opener based on current stats.
    ///
    /// `None` when there is no backend to ask.
    pub async fn opener(&self, snapshot: &ChatSnapshot) -> Option<String> {
        if !snapshot.alive || !self.delegate.is_available() {
            return None;
        }
        let system = prompt::system(prompt::OPENER_SYSTEM, &snapshot.pet_name);
        Some(match self.call(&system, &prompt::opener_user(&snapshot.vitals)).await {
            Ok(text) => text,
            Err(e) => format!("Error processing the message: {e}"),
        })
    }

    async fn call(&self, system: &str, user: &str) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.delegate.complete(system, user)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms = ms, "Chat call timed out");
                Err(LlmError::Timeout(ms))
            }
        }
    }
}
