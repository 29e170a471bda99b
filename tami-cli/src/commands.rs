//! Input line parsing.
//!
//! Care commands are recognised only when they make up the whole line, so
//! "feed" feeds the pet while "feed me too" is just chat.

use tami_core::MemoryCategory;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Feed,
    Play,
    Clean,
    Sleep,
    Status,
    Remember {
        category: MemoryCategory,
        text: String,
    },
    Memories(Option<MemoryCategory>),
    Say(String),
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  feed | play | clean | sleep      take care of your pet
  status                           show how your pet is doing
  remember <category> <text>       tell your pet something (name, likes, family, other)
  memories [category]              list what your pet remembers
  say <text>                       talk to your pet (any other text works too)
  help                             show this help
  quit                             save and exit";

/// Parse one line. `Err` carries a usage message for the user.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match (head.to_lowercase().as_str(), rest.is_empty()) {
        ("feed", true) => Command::Feed,
        ("play", true) => Command::Play,
        ("clean" | "bath", true) => Command::Clean,
        ("sleep", true) => Command::Sleep,
        ("status", true) => Command::Status,
        ("help" | "?", true) => Command::Help,
        ("quit" | "exit", true) => Command::Quit,
        ("memories", true) => Command::Memories(None),
        ("memories", false) => Command::Memories(Some(parse_category(rest)?)),
        ("remember", _) => {
            let Some((category, text)) = rest.split_once(char::is_whitespace) else {
                return Err("usage: remember <category> <text>".to_string());
            };
            Command::Remember {
                category: parse_category(category)?,
                text: text.trim().to_string(),
            }
        }
        ("say", _) => Command::Say(rest.to_string()),
        _ => Command::Say(line.to_string()),
    };
    Ok(command)
}

fn parse_category(raw: &str) -> Result<MemoryCategory, String> {
    raw.parse::<MemoryCategory>().map_err(|_| {
        format!("unknown category '{raw}' (expected name, likes, family or other)")
    })
}
