//! Line-based parsing of requirements documents.
//!
//! The [`combinator`] engine is shared by the two grammars, [`gherkin`] and
//! [`reqsml`], which both produce the same [`Document`](crate::Document)
//! model.

pub mod combinator;
pub(crate) mod data;
mod error;
pub(crate) mod gherkin;
pub mod line;
pub(crate) mod reqsml;

pub use combinator::{
    ParseResult, Parser, end, line, not, one_or_more, optional, peek_line, zero_or_more,
};
pub use error::{ErrorKind, Invalid, ParseError};
pub use line::{Cursor, Line, split_lines};

/// A line beginning with one of `keywords` followed by a non-empty title.
///
/// Yields the title with surrounding whitespace removed.
pub(crate) fn titled(keywords: &'static [&'static str]) -> impl Parser<String> {
    line(move |line: &Line| {
        let text = line.trimmed();
        let keyword = keywords
            .iter()
            .find(|keyword| text.starts_with(*keyword))
            .ok_or_else(|| format!("line doesn't begin with {}", quoted(keywords)))?;
        let title = text[keyword.len()..].trim();
        if title.is_empty() {
            return Err(format!(
                "there must be a non-empty description after the \"{keyword}\" keyword"
            ));
        }
        Ok(title.to_string())
    })
}

/// A line consisting of exactly one of `keywords` and nothing else.
pub(crate) fn alone(keywords: &'static [&'static str]) -> impl Parser<()> {
    line(move |line: &Line| {
        let text = line.trimmed();
        let keyword = keywords
            .iter()
            .find(|keyword| text.starts_with(*keyword))
            .ok_or_else(|| format!("no {} keyword found", quoted(keywords)))?;
        if text.len() == keyword.len() {
            Ok(())
        } else {
            Err(format!(
                "the \"{keyword}\" keyword should be on a line by itself with nothing after it"
            ))
        }
    })
}

fn quoted(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|keyword| format!("\"{keyword}\""))
        .collect::<Vec<_>>()
        .join(" or ")
}
