//! The pet's memory store.
//!
//! Memories are keyed by category: saving a second fact under the same
//! category replaces the first. The storage half lives in
//! [`crate::persistence`]; this module owns the taxonomy, content validation
//! and the relevance filter used to pick context for chat.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;
use crate::error::{Result, TamiError};

/// What a memory is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryCategory {
    /// The owner's name.
    Name,
    /// Things the owner likes.
    Likes,
    /// The owner's family and home.
    Family,
    /// Anything else.
    Other,
}

impl MemoryCategory {
    /// Every category, in display order.
    pub const ALL: [MemoryCategory; 4] = [Self::Name, Self::Likes, Self::Family, Self::Other];

    /// Stored / displayed name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Likes => "Likes",
            Self::Family => "Family",
            Self::Other => "Other",
        }
    }

    /// Message keywords that make every memory of this category relevant.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name", "called", "call me"],
            Self::Likes => &["like", "favorite", "prefer", "enjoy"],
            Self::Family => &[
                "family", "parents", "siblings", "brother", "sister", "mother", "father", "live",
            ],
            Self::Other => &[],
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = TamiError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TamiError::UnknownCategory(wanted.to_string()))
    }
}

/// One remembered fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// What the fact is about.
    pub category: MemoryCategory,
    /// The fact itself, trimmed.
    pub content: String,
    /// When it was (last) saved.
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    /// `"<category>: <content>"`, the form handed to the chat layer.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}: {}", self.category, self.content)
    }
}

/// Trim `content` and check it against the configured limits.
///
/// # Errors
/// Returns `TamiError::InvalidMemory` for empty or oversized content.
pub fn validate_content(content: &str, config: &MemoryConfig) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TamiError::InvalidMemory {
            reason: "content is empty".to_string(),
        });
    }
    let chars = trimmed.chars().count();
    if chars > config.max_content_chars {
        return Err(TamiError::InvalidMemory {
            reason: format!(
                "content is {chars} characters, limit is {}",
                config.max_content_chars
            ),
        });
    }
    Ok(trimmed.to_string())
}

const MIN_WORD_LEN: usize = 3;

/// Memories worth mentioning in a reply to `message`, rendered one per line.
///
/// An entry is relevant if a message word of at least three characters
/// appears in its content, or if the message uses one of its category's
/// keywords.
#[must_use]
pub fn relevant_memories(entries: &[MemoryEntry], message: &str) -> Vec<String> {
    let message = message.to_lowercase();
    let words: Vec<&str> = message
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .collect();

    entries
        .iter()
        .filter(|entry| {
            let content = entry.content.to_lowercase();
            words.iter().any(|w| content.contains(w))
                || entry.category.keywords().iter().any(|k| message.contains(k))
        })
        .map(MemoryEntry::render)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: MemoryCategory, content: &str) -> MemoryEntry {
        MemoryEntry {
            category,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn category_parsing_ignores_case() {
        assert_eq!("likes".parse::<MemoryCategory>().ok(), Some(MemoryCategory::Likes));
        assert_eq!(" FAMILY ".parse::<MemoryCategory>().ok(), Some(MemoryCategory::Family));
        assert!(matches!(
            "hobbies".parse::<MemoryCategory>(),
            Err(TamiError::UnknownCategory(c)) if c == "hobbies"
        ));
    }

    #[test]
    fn content_is_trimmed() {
        let config = MemoryConfig::default();
        assert_eq!(validate_content("  pizza \n", &config).ok().as_deref(), Some("pizza"));
    }

    #[test]
    fn empty_and_oversized_content_is_rejected() {
        let config = MemoryConfig::default();
        assert!(validate_content("   ", &config).is_err());
        let long = "a".repeat(config.max_content_chars + 1);
        assert!(validate_content(&long, &config).is_err());
        let exact = "a".repeat(config.max_content_chars);
        assert!(validate_content(&exact, &config).is_ok());
    }

    #[test]
    fn word_overlap_makes_an_entry_relevant() {
        let entries = [
            entry(MemoryCategory::Likes, "Pizza with extra cheese"),
            entry(MemoryCategory::Other, "Has a red bicycle"),
        ];
        let found = relevant_memories(&entries, "Want some PIZZA?");
        assert_eq!(found, vec!["Likes: Pizza with extra cheese"]);
    }

    #[test]
    fn short_words_do_not_match() {
        let entries = [entry(MemoryCategory::Other, "a cat on a mat")];
        assert!(relevant_memories(&entries, "on a").is_empty());
    }

    #[test]
    fn category_keywords_match() {
        let entries = [
            entry(MemoryCategory::Name, "Alex"),
            entry(MemoryCategory::Family, "Two sisters"),
        ];
        assert_eq!(relevant_memories(&entries, "what's my name?"), vec!["Name: Alex"]);
        assert_eq!(
            relevant_memories(&entries, "where do I live?"),
            vec!["Family: Two sisters"]
        );
    }
}
