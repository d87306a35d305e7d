//! `*INCLUDE, INPUT=...` expansion.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::card::{Card, Deck};
use crate::error::ParseError;

impl Deck {
    /// Parse `path` and splice every included deck right after its `*INCLUDE` card.
    /// Relative include paths resolve against the including file's directory.
    pub fn parse_file_with_includes(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let mut stack = IncludeStack::default();
        expand(path.as_ref(), &mut stack)
    }
}

#[derive(Default)]
struct IncludeStack {
    chain: Vec<PathBuf>,
    active: HashSet<PathBuf>,
}

fn expand(path: &Path, stack: &mut IncludeStack) -> Result<Deck, ParseError> {
    let key = normalize_path(path);
    if !stack.active.insert(key.clone()) {
        let mut chain: Vec<String> = stack.chain.iter().map(|p| p.display().to_string()).collect();
        chain.push(key.display().to_string());
        return Err(ParseError::new(
            0,
            format!("include cycle detected: {}", chain.join(" -> ")),
        ));
    }
    stack.chain.push(key.clone());

    let result = expand_cards(path, stack);

    stack.chain.pop();
    stack.active.remove(&key);
    result
}

fn expand_cards(path: &Path, stack: &mut IncludeStack) -> Result<Deck, ParseError> {
    let parsed = Deck::parse_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut cards = Vec::<Card>::with_capacity(parsed.cards.len());

    for card in parsed.cards {
        if card.normalized_keyword() != "INCLUDE" {
            cards.push(card);
            continue;
        }
        let target = card.parameter("INPUT").map(str::to_string).ok_or_else(|| {
            ParseError::new(card.line_start, "missing INPUT parameter in *INCLUDE card")
        })?;
        cards.push(card);

        let include_path = base_dir.join(target.trim());
        let included = expand(&include_path, stack).map_err(|err| ParseError {
            line: err.line,
            message: format!(
                "{} (while expanding include {})",
                err.message,
                include_path.display()
            ),
        })?;
        cards.extend(included.cards);
    }

    Ok(Deck { cards })
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
