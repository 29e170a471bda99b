//! Prompt templates for the pet's chat.
//!
//! Templates use `{placeholder}` slots filled by [`render_template`]. The
//! builders below assemble the optional context blocks so callers never
//! hand-format prompt text.

use tami_core::Vital;
use tami_core::Vitals;

/// Persona for replies to the owner.
pub const INTERACTION_SYSTEM: &str = r"You are {pet_name}, a friendly and empathetic virtual pet.
You hold natural conversations and never mention your stats
unless you are asked about them directly.
When your owner shares something about their day, you show real
interest and ask relevant questions to keep the conversation going.";

/// Reply prompt. `{memories_block}` and `{stats_block}` may be empty.
pub const INTERACTION_USER: &str = r"Conversation context:
- Owner's message: {message}
{memories_block}{stats_block}
Instructions:
- Answer naturally and warmly, like a companion
- Do not mention your stats unless you are specifically asked about them
- Keep a conversational, empathetic tone
- If the owner shares something about their day, show interest and ask relevant questions";

/// Persona for voicing pressing needs.
pub const NEEDS_SYSTEM: &str = r"You are {pet_name}, a virtual pet who needs to tell its owner what it needs.
Say it naturally and kindly, without repeating yourself.
Be brief but expressive.";

/// Needs prompt. `{needs}` is a comma-separated list of need phrases.
pub const NEEDS_USER: &str = r"I need to say that: {needs}

Instructions:
- Mention only these pressing needs
- Be natural and friendly
- Be brief but expressive";

/// Persona for starting a conversation.
pub const OPENER_SYSTEM: &str = r"You are {pet_name}, a virtual pet. Your personality is fun and a little sarcastic, but always friendly.
Write a 1-2 sentence message to start a conversation.";

/// Opener prompt.
pub const OPENER_USER: &str = r"Your current state is:
{stats}";

/// Fixed reply when the owner asks about something a pet has no business discussing.
pub const OFF_TOPIC_REPLY: &str = "I'm your virtual pet! I love playing and chatting with you, but I can't help you with that. How about we play, or you tell me about your day?";

/// Topics the pet declines to discuss.
pub const OFF_TOPIC_KEYWORDS: &[&str] = &["war", "politics", "history", "math", "science"];

/// Phrases that mean the owner is asking how the pet is doing.
pub const STATUS_KEYWORDS: &[&str] = &["status", "how are you", "stats"];

/// Simple `{key}` replacement template renderer.
///
/// Fills every slot in one pass over `template`; substituted values are
/// copied verbatim and never scanned for slots. Unknown `{...}` text is kept.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter().find(|(k, _)| *k == key).map(|(_, value)| (close, *value))
        });
        match slot {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Whether `message` strays into an off-topic subject.
///
/// Matches whole words so "warm" or "award" do not count as "war".
#[must_use]
pub fn is_off_topic(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| OFF_TOPIC_KEYWORDS.contains(&word))
}

/// Whether `message` asks about the pet's condition.
#[must_use]
pub fn asks_for_status(message: &str) -> bool {
    let lower = message.to_lowercase();
    STATUS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// One `- Label: N%` line per vital.
#[must_use]
pub fn format_stats(vitals: &Vitals) -> String {
    Vital::ALL
        .iter()
        .map(|&v| format!("- {}: {}%", capitalize(v.label()), vitals.percent(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render the reply prompt.
///
/// Memories and the message are owner text; braces inside them pass through
/// untouched.
#[must_use]
pub fn interaction_user(message: &str, memories: &[String], vitals: Option<&Vitals>) -> String {
    let memories_block = if memories.is_empty() {
        String::new()
    } else {
        format!("\nRelevant memories:\n{}\n", memories.join("\n"))
    };
    let stats_block = vitals
        .map(|v| format!("\nMy current state:\n{}\n", format_stats(v)))
        .unwrap_or_default();
    render_template(
        INTERACTION_USER,
        &[
            ("memories_block", &memories_block),
            ("stats_block", &stats_block),
            ("message", message),
        ],
    )
}

/// Render the needs prompt.
#[must_use]
pub fn needs_user(needs: &[&str]) -> String {
    render_template(NEEDS_USER, &[("needs", &needs.join(", "))])
}

/// Render the opener prompt.
#[must_use]
pub fn opener_user(vitals: &Vitals) -> String {
    render_template(OPENER_USER, &[("stats", &format_stats(vitals))])
}

/// Render any persona template with the pet's name.
#[must_use]
pub fn system(template: &str, pet_name: &str) -> String {
    render_template(template, &[("pet_name", pet_name)])
}
