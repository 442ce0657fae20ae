//! The line source every grammar rule reads from.
//!
//! Input text is split into numbered [`Line`]s once. Rules then move a
//! [`Cursor`] over that slice; a cursor is a cheap copyable position, so
//! backtracking is just holding on to an earlier cursor.

/// A single line of source text with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The 1-based line number in the source.
    pub number: usize,
    /// The raw text of the line, without the trailing newline.
    pub text: String,
}

impl Line {
    /// Whether this line contains nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The line's text with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Splits raw text into numbered lines.
///
/// Both `\n` and `\r\n` line endings are accepted. An empty input still yields
/// a single (blank) line, so every source has at least one line number to
/// report errors against.
#[must_use]
pub fn split_lines(text: &str) -> Vec<Line> {
    text.split('\n')
        .enumerate()
        .map(|(index, text)| Line {
            number: index + 1,
            text: text.strip_suffix('\r').unwrap_or(text).to_string(),
        })
        .collect()
}

/// A position within a slice of [`Line`]s.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    lines: &'a [Line],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `lines`.
    #[must_use]
    pub const fn new(lines: &'a [Line]) -> Self {
        Self { lines, position: 0 }
    }

    /// Moves past any blank lines.
    #[must_use]
    pub fn skip_blank(self) -> Self {
        let skipped = self.lines[self.position..]
            .iter()
            .take_while(|line| line.is_blank())
            .count();
        Self {
            position: self.position + skipped,
            ..self
        }
    }

    /// The next line, if any, without skipping blanks.
    #[must_use]
    pub fn peek(&self) -> Option<&'a Line> {
        self.lines.get(self.position)
    }

    /// The cursor positioned after the next line.
    #[must_use]
    pub fn advance(self) -> Self {
        Self {
            position: (self.position + 1).min(self.lines.len()),
            ..self
        }
    }

    /// Whether only blank lines remain.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.skip_blank().peek().is_none()
    }

    /// The line number errors at this position should be reported against.
    ///
    /// This is the next non-blank line, or the last line of the source once
    /// the input is exhausted.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.skip_blank()
            .peek()
            .or_else(|| self.lines.last())
            .map_or(0, |line| line.number)
    }

    /// The index of the next line within the underlying slice.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_numbered_from_one() {
        let lines = split_lines("first\r\nsecond\n\nfourth");
        let numbers: Vec<_> = lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(lines[1].text, "second");
        assert!(lines[2].is_blank());
    }

    #[test]
    fn empty_text_has_one_line() {
        assert_eq!(split_lines("").len(), 1);
    }

    #[test]
    fn skip_blank_stops_at_content() {
        let lines = split_lines("\n   \ncontent");
        let cursor = Cursor::new(&lines).skip_blank();
        assert_eq!(cursor.peek().map(Line::trimmed), Some("content"));
        assert_eq!(cursor.line_number(), 3);
    }

    #[test]
    fn exhausted_cursor_reports_last_line() {
        let lines = split_lines("only\n\n");
        let cursor = Cursor::new(&lines).skip_blank().advance();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.line_number(), 3);
    }
}
