//! A flat view of a document for test harnesses.
//!
//! A harness registers one test per requirement, runs each example's
//! statements in order, and skips examples the active label expression
//! excludes. These descriptors give it everything it needs without walking
//! the tree itself.

use super::{
    document::{Data, Document, Example, Requirement, StatementType},
    label_expression::LabelExpression,
};

const MAX_NAME_LEN: usize = 100;

/// One example in the context of its document and requirement.
#[derive(Debug, Clone, Copy)]
pub struct ExampleCase<'a> {
    /// The document containing the example.
    pub document: &'a Document,
    /// The requirement containing the example.
    pub requirement: &'a Requirement,
    /// The example itself.
    pub example: &'a Example,
    /// Whether the label filter selects the example.
    pub included: bool,
}

/// One statement of an [`ExampleCase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementCase<'a> {
    /// Whether this is a precondition, action or expectation.
    pub kind: StatementType,
    /// The statement text, matched against the harness's handlers.
    pub description: &'a str,
    /// Structured data attached to the statement.
    pub data: Option<&'a Data>,
    /// The line the statement was written on, if known.
    pub line: Option<usize>,
}

impl<'a> ExampleCase<'a> {
    /// The example's statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = StatementCase<'a>> + 'a {
        self.example.statements.iter().map(|statement| StatementCase {
            kind: statement.kind,
            description: &statement.description,
            data: statement.data.as_ref(),
            line: statement.line,
        })
    }

    /// An identifier-safe name for the example.
    ///
    /// Falls back to the requirement's description when the example has
    /// none of its own.
    #[must_use]
    pub fn test_name(&self) -> String {
        test_name(
            self.example
                .description
                .as_deref()
                .unwrap_or(&self.requirement.description),
        )
    }
}

impl Document {
    /// Every example in document order, flagged with whether `filter`
    /// selects it. Without a filter every example is included.
    pub fn cases<'a>(
        &'a self,
        filter: Option<&'a LabelExpression>,
    ) -> impl Iterator<Item = ExampleCase<'a>> + 'a {
        self.requirements.iter().flat_map(move |requirement| {
            requirement.examples.iter().map(move |example| ExampleCase {
                document: self,
                requirement,
                example,
                included: filter.is_none_or(|filter| filter.matches(example.labels.as_deref())),
            })
        })
    }

    /// Whether any example survives `filter`.
    #[must_use]
    pub fn has_included_examples(&self, filter: Option<&LabelExpression>) -> bool {
        self.cases(filter).any(|case| case.included)
    }

    /// An identifier-safe name for the document, from its title or file name.
    #[must_use]
    pub fn test_name(&self) -> String {
        test_name(self.description.as_deref().unwrap_or_else(|| self.name()))
    }
}

impl Requirement {
    /// An identifier-safe name for the requirement.
    #[must_use]
    pub fn test_name(&self) -> String {
        test_name(&self.description)
    }
}

/// Turns free text into an identifier.
///
/// Only the first line is used. Words are capitalised and joined, anything
/// outside `[A-Za-z0-9_]` is dropped, leading digits are removed and the
/// result is cut to 100 characters.
#[must_use]
pub fn test_name(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or_default();
    let joined: String = first_line
        .split_whitespace()
        .flat_map(|word| {
            let mut characters = word.chars();
            characters
                .next()
                .into_iter()
                .flat_map(char::to_uppercase)
                .chain(characters)
        })
        .filter(|character| character.is_ascii_alphanumeric() || *character == '_')
        .collect();

    let trimmed = joined.trim_start_matches(|character: char| character.is_ascii_digit());
    let mut characters = trimmed.chars();
    characters
        .next()
        .map(|first| first.to_ascii_uppercase())
        .into_iter()
        .chain(characters)
        .take(MAX_NAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::document::Syntax;

    const DOCUMENT: &str = "\
Requirement: Sums are checked
  #quick (fast)
  Example: adding
    If: two numbers
    Expect: their sum

  Example: overflowing
    If: large numbers
      | 1 |
    Expect: an error
";

    fn document() -> Document {
        Document::parse("sums.requirements", Syntax::ReqsMl, DOCUMENT).unwrap()
    }

    #[test_case("simple words" => "SimpleWords")]
    #[test_case("first line\nsecond line" => "FirstLine")]
    #[test_case("what's up, doc?" => "WhatsUpDoc")]
    #[test_case("2 fast 2 furious" => "Fast2Furious")]
    #[test_case("snake_case stays" => "Snake_caseStays")]
    #[test_case("" => "")]
    fn derives_test_names(description: &str) -> String {
        test_name(description)
    }

    #[test]
    fn test_names_are_truncated() {
        let long = "word ".repeat(50);
        assert_eq!(test_name(&long).len(), MAX_NAME_LEN);
    }

    #[test]
    fn every_example_is_included_without_a_filter() {
        let document = document();
        let cases: Vec<_> = document.cases(None).collect();
        assert_eq!(cases.len(), 2);
        assert!(cases.iter().all(|case| case.included));
        assert_eq!(cases[0].test_name(), "Adding");
        assert_eq!(cases[0].requirement.test_name(), "SumsAreChecked");
    }

    #[test]
    fn filter_marks_excluded_examples() {
        let document = document();
        let filter = LabelExpression::label("fast");
        let included: Vec<_> = document
            .cases(Some(&filter))
            .map(|case| case.included)
            .collect();
        assert_eq!(included, [true, false]);
        assert!(document.has_included_examples(Some(&filter)));
        assert!(!document.has_included_examples(Some(&LabelExpression::label("slow"))));
    }

    #[test]
    fn statement_cases_follow_the_example() {
        let document = document();
        let case = document.cases(None).nth(1).unwrap();
        let statements: Vec<_> = case.statements().collect();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].kind, StatementType::If);
        assert_eq!(statements[0].description, "large numbers");
        assert_eq!(statements[0].line, Some(8));
        assert!(statements[0].data.is_some());
        assert_eq!(statements[1].data, None);
    }

    #[test]
    fn document_test_name_falls_back_to_file_name() {
        assert_eq!(document().test_name(), "Sums");
    }
}
