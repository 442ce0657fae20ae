use std::cmp::Ordering;

/// The category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A line did not match any rule expected at that position.
    Syntax,
    /// The input was structurally valid but semantically wrong, e.g. a table
    /// row with the wrong number of columns.
    Validation,
}

/// A failure to parse a requirements document.
///
/// Every error carries the 1-based line it should be reported against. When
/// two alternatives fail, the one with the greater line number wins, since it
/// got further into the input. On the same line a validation error beats a
/// syntax error, because its alternative did recognise the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// The 1-based line number.
    pub line: usize,
    /// Whether this is a syntax or a validation failure.
    pub kind: ErrorKind,
    /// A human readable description of the problem.
    pub message: String,
}

impl ParseError {
    /// A syntax error at the given line.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: ErrorKind::Syntax,
            message: message.into(),
        }
    }

    /// A validation error at the given line.
    pub fn validation(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Picks whichever of two errors occurred deeper in the input.
    ///
    /// On the same line a validation error is preferred; remaining ties go to
    /// `other`, the later alternative.
    #[must_use]
    pub fn deepest(self, other: Self) -> Self {
        match self.line.cmp(&other.line) {
            Ordering::Greater => self,
            Ordering::Less => other,
            Ordering::Equal
                if self.kind == ErrorKind::Validation && other.kind == ErrorKind::Syntax =>
            {
                self
            }
            Ordering::Equal => other,
        }
    }
}

/// A validation failure raised inside [`try_map`](super::Parser::try_map).
///
/// Without an explicit line the failure is reported against the first line of
/// the construct being validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub(crate) line: Option<usize>,
    pub(crate) message: String,
}

impl Invalid {
    /// A failure reported at the start of the construct.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    /// A failure pinned to a specific line.
    pub fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

impl From<String> for Invalid {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for Invalid {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepest_prefers_greater_line() {
        let shallow = ParseError::syntax(2, "shallow");
        let deep = ParseError::validation(7, "deep");
        assert_eq!(shallow.clone().deepest(deep.clone()), deep);
        assert_eq!(deep.clone().deepest(shallow), deep);
    }

    #[test]
    fn deepest_tie_goes_to_later_alternative() {
        let first = ParseError::syntax(3, "first");
        let second = ParseError::syntax(3, "second");
        assert_eq!(first.deepest(second).message, "second");
    }

    #[test]
    fn deepest_tie_prefers_validation() {
        let validation = ParseError::validation(3, "validation");
        let syntax = ParseError::syntax(3, "syntax");
        assert_eq!(validation.clone().deepest(syntax.clone()).message, "validation");
        assert_eq!(syntax.deepest(validation).message, "validation");
    }

    #[test]
    fn display_includes_line() {
        let error = ParseError::syntax(12, "unexpected token");
        assert_eq!(error.to_string(), "line 12: unexpected token");
    }
}
