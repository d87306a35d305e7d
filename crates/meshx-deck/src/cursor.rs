//! Single-pass line cursor shared by the text codecs.
//!
//! A line handed out by [`LineCursor::advance`] or [`LineCursor::take`] is consumed:
//! block parsers pull exactly the lines their record layout declares, and the outer
//! scan loop resumes after them.

use crate::error::ParseError;

#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// Next line without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Consume and return the next line.
    pub fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// Consume exactly `n` lines.
    pub fn take(&mut self, n: usize) -> Result<Vec<&'a str>, ParseError> {
        let available = self.lines.len() - self.pos;
        if available < n {
            return Err(ParseError::new(
                self.lines.len(),
                format!("expected {n} more lines, found {available}"),
            ));
        }
        let taken = self.lines[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(taken)
    }

    /// Consume lines while `keep` holds for them.
    pub fn skip_while(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let start = self.pos;
        while let Some(line) = self.peek() {
            if !keep(line) {
                break;
            }
            self.pos += 1;
        }
        self.pos - start
    }

    /// 1-based number of the most recently consumed line (0 before the first).
    pub fn line_number(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumed_lines_are_not_seen_again() {
        let mut cursor = LineCursor::new("a\nb\nc\nd\n");
        assert_eq!(cursor.peek(), Some("a"));
        assert_eq!(cursor.advance(), Some("a"));
        assert_eq!(cursor.take(2).unwrap(), vec!["b", "c"]);
        assert_eq!(cursor.line_number(), 3);
        assert_eq!(cursor.advance(), Some("d"));
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn take_past_end_fails_without_consuming() {
        let mut cursor = LineCursor::new("only\n");
        let err = cursor.take(2).expect_err("two lines are not available");
        assert!(err.message.contains("expected 2 more lines"));
        assert_eq!(cursor.advance(), Some("only"));
    }

    #[test]
    fn skip_while_stops_at_first_rejected_line() {
        let mut cursor = LineCursor::new("! one\n! two\n.NOE\n");
        assert_eq!(cursor.skip_while(|l| l.starts_with('!')), 2);
        assert_eq!(cursor.peek(), Some(".NOE"));
    }
}
