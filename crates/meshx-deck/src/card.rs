//! Keyword-card splitting for `*KEYWORD, PARAM=value` decks.

use std::fs;
use std::path::Path;

use crate::cursor::LineCursor;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deck {
    pub cards: Vec<Card>,
}

/// One keyword line (with its continuation lines) and the data lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Upper-cased keyword without the leading `*`
    pub keyword: String,
    pub parameters: Vec<Parameter>,
    /// Trimmed, non-empty, non-comment lines up to the next card
    pub data_lines: Vec<String>,
    /// 1-based line of the keyword
    pub line_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

impl Card {
    /// Value of parameter `key` (case-insensitive), quotes removed.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .and_then(|p| p.value.as_deref())
            .map(|v| v.trim_matches('"').trim_matches('\''))
    }

    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters.iter().any(|p| p.key.eq_ignore_ascii_case(key))
    }

    /// Keyword with whitespace and underscores removed, for loose matching.
    pub fn normalized_keyword(&self) -> String {
        normalized_keyword(&self.keyword)
    }
}

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ParseError::new(0, format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse_str(&raw)
    }

    pub fn parse_str(raw: &str) -> Result<Self, ParseError> {
        let mut cursor = LineCursor::new(raw);
        let mut cards = Vec::new();

        while let Some(line) = cursor.advance() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }

            if !trimmed.starts_with('*') {
                return Err(ParseError::new(
                    cursor.line_number(),
                    "expected card starting with '*'",
                ));
            }

            let line_start = cursor.line_number();
            let mut header = trimmed.trim_start_matches('*').trim().to_string();
            if header.is_empty() {
                // bare "*" separator line
                continue;
            }

            // Header continuation lines start with a comma.
            while let Some(next) = cursor.peek() {
                let next = next.trim();
                if !next.starts_with(',') {
                    break;
                }
                header.push_str(next);
                cursor.advance();
            }

            let (keyword, parameters) = parse_header(&header, line_start)?;

            let mut data_lines = Vec::new();
            while let Some(candidate) = cursor.peek() {
                let candidate = candidate.trim();
                if candidate.starts_with('*') && !is_comment(candidate) {
                    break;
                }
                cursor.advance();
                if candidate.is_empty() || is_comment(candidate) {
                    continue;
                }
                data_lines.push(candidate.to_string());
            }

            cards.push(Card {
                keyword,
                parameters,
                data_lines,
                line_start,
            });
        }

        Ok(Deck { cards })
    }
}

pub(crate) fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

pub(crate) fn normalized_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_ascii_uppercase()
}

fn parse_header(header: &str, line: usize) -> Result<(String, Vec<Parameter>), ParseError> {
    let fields = split_header_fields(header);
    let keyword_raw = fields.first().map(String::as_str).unwrap_or("").trim();
    if keyword_raw.is_empty() {
        return Err(ParseError::new(line, "empty card keyword"));
    }

    let parameters = fields
        .iter()
        .skip(1)
        .map(|part| part.trim())
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((k, v)) => Parameter {
                key: k.trim().to_ascii_uppercase(),
                value: Some(v.trim().to_string()),
            },
            None => Parameter {
                key: item.to_ascii_uppercase(),
                value: None,
            },
        })
        .collect();

    Ok((keyword_raw.to_ascii_uppercase(), parameters))
}

/// Split on commas that are not inside single or double quotes.
fn split_header_fields(header: &str) -> Vec<String> {
    let mut fields = Vec::<String>::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in header.chars() {
        match (ch, quote) {
            ('\'' | '"', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(open)) if c == open => {
                quote = None;
                current.push(ch);
            }
            (',', None) => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
