//! The Gherkin-like grammar.
//!
//! A feature holds either a list of `Rule:` blocks, each becoming a
//! requirement, or scenarios directly, which become a single requirement
//! named after the feature. Tags written on a feature or rule are inherited
//! by everything beneath it.

use std::path::PathBuf;

use super::{
    Cursor, Invalid, Line, ParseError, ParseResult, Parser, alone,
    data::{Dialect, TableRow, optional_data, table_row},
    end, line, not, one_or_more, peek_line, split_lines, titled, zero_or_more,
};
use crate::domain::{
    document::{Document, Example, ExampleSet, Requirement, Statement, StatementType, Syntax},
    labels,
    template::{self, TemplateRow},
};

const SCENARIO: &[&str] = &["Example:", "Scenario:"];
const OUTLINE: &[&str] = &["Scenario Outline:", "Scenario Template:"];

/// Comments and tags that may precede a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Header {
    comments: Option<Vec<String>>,
    tags: Option<Vec<String>>,
}

enum Body {
    Rules(Vec<Requirement>),
    Scenarios(Vec<Example>),
}

pub(crate) fn parse(source: PathBuf, text: &str) -> Result<Document, ParseError> {
    let lines = split_lines(text);
    let mut cursor = Cursor::new(&lines);
    let ((header, description), body) = header
        .then(titled(&["Feature:"]))
        .then_ignore(extended_description)
        .then(
            one_or_more("rule", rule, end())
                .map(|rules| Body::Rules(rules.into()))
                .or(examples.then_ignore(end()).map(Body::Scenarios)),
        )
        .parse(&mut cursor)?;

    let tags = header.tags;
    let requirements = match body {
        Body::Rules(rules) => rules
            .into_iter()
            .map(|rule| inherit(tags.as_deref(), rule))
            .collect(),
        Body::Scenarios(examples) => vec![inherit(
            tags.as_deref(),
            Requirement {
                comments: None,
                identifier: None,
                labels: None,
                explicit_labels: None,
                description: description.clone(),
                examples,
            },
        )],
    };
    tracing::trace!(count = requirements.len(), "parsed requirements");

    Ok(Document {
        source,
        comments: header.comments,
        labels: tags,
        description: Some(description),
        syntax: Syntax::Gherkin,
        requirements,
    })
}

/// Pushes `inherited` labels down into a requirement and its examples.
fn inherit(inherited: Option<&[String]>, requirement: Requirement) -> Requirement {
    let combined = labels::merge(inherited, requirement.explicit_labels.as_deref());
    let examples = requirement
        .examples
        .into_iter()
        .map(|example| Example {
            labels: labels::merge(combined.as_deref(), example.labels.as_deref()),
            ..example
        })
        .collect();
    Requirement {
        labels: combined,
        examples,
        ..requirement
    }
}

fn comment(input: &mut Cursor<'_>) -> ParseResult<String> {
    line(|line: &Line| {
        let text = line.trimmed();
        if !text.starts_with('#') {
            return Err("can't parse comment because the line doesn't start with #".to_string());
        }
        Ok(text.trim_start_matches('#').trim().to_string())
    })
    .parse(input)
}

fn optional_comments(input: &mut Cursor<'_>) -> ParseResult<Option<Vec<String>>> {
    zero_or_more(comment, end().or(not(comment)))
        .map(|comments| (!comments.is_empty()).then_some(comments))
        .parse(input)
}

fn parse_tags(text: &str) -> Result<Vec<String>, String> {
    text.split_whitespace()
        .map(|tag| match tag.strip_prefix('@') {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(format!("tags must all be prefixed with @, found '{tag}'")),
        })
        .collect()
}

/// A tag line. Once a line starts with `@` it must be well formed.
fn optional_tags(input: &mut Cursor<'_>) -> ParseResult<Option<Vec<String>>> {
    let marked = line(|line: &Line| {
        let text = line.trimmed();
        if text.starts_with('@') {
            Ok(text.to_string())
        } else {
            Err("not a tag line".to_string())
        }
    });
    let mut probe = *input;
    if marked.parse(&mut probe).is_err() {
        return Ok(None);
    }
    marked
        .try_map(|text| parse_tags(&text).map_err(Invalid::from))
        .map(Some)
        .parse(input)
}

fn header(input: &mut Cursor<'_>) -> ParseResult<Header> {
    optional_comments
        .then(optional_tags)
        .then(optional_comments)
        .map(|((before, tags), after)| {
            let comments = match (before, after) {
                (Some(mut before), Some(after)) => {
                    before.extend(after);
                    Some(before)
                }
                (before, after) => before.or(after),
            };
            Header { comments, tags }
        })
        .parse(input)
}

/// Whether a line starts something other than free description text.
fn begins_block(text: &str) -> bool {
    let first_word = text.split_whitespace().next().unwrap_or_default();
    text.starts_with("Rule:")
        || OUTLINE.iter().chain(SCENARIO).any(|keyword| text.starts_with(keyword))
        || matches!(first_word, "Given" | "When" | "Then")
        || text.starts_with('#')
        || text.starts_with('@')
}

/// Free text following a title, which is read and discarded.
fn extended_description(input: &mut Cursor<'_>) -> ParseResult<()> {
    let boundary = peek_line(|line: &Line| {
        if begins_block(line.trimmed()) {
            Ok(())
        } else {
            Err("description text".to_string())
        }
    });
    zero_or_more(line(|_: &Line| Ok(())), end().or(boundary))
        .map(|_| ())
        .parse(input)
}

fn statement_keyword(input: &mut Cursor<'_>) -> ParseResult<(StatementType, String, usize)> {
    line(|line: &Line| {
        let text = line.trimmed();
        let (keyword, description) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let kind = match keyword {
            "Given" => StatementType::If,
            "When" => StatementType::When,
            "Then" => StatementType::Expect,
            _ => return Err("no Given, When or Then keyword found".to_string()),
        };
        let description = description.trim();
        if description.is_empty() {
            return Err(format!(
                "a statement must have a description after the {keyword} keyword"
            ));
        }
        Ok((kind, description.to_string(), line.number))
    })
    .parse(input)
}

fn continuation_line(input: &mut Cursor<'_>) -> ParseResult<(String, usize)> {
    line(|line: &Line| {
        let text = line.trimmed();
        let description = if let Some(rest) = text.strip_prefix('*') {
            rest
        } else {
            match text.split_once(char::is_whitespace) {
                Some(("And" | "But", rest)) => rest,
                _ => return Err("not a statement that starts with And, But or *".to_string()),
            }
        };
        let description = description.trim();
        if description.is_empty() {
            return Err("a statement must have a description after the And, But or * keyword".to_string());
        }
        Ok((description.to_string(), line.number))
    })
    .parse(input)
}

fn statement(input: &mut Cursor<'_>) -> ParseResult<Statement> {
    optional_comments
        .then(statement_keyword)
        .then(optional_data(Dialect::Gherkin))
        .map(|((comments, (kind, description, line)), data)| Statement {
            comments,
            kind,
            description,
            data,
            line: Some(line),
        })
        .parse(input)
}

fn continuation(kind: StatementType) -> impl Parser<Statement> {
    optional_comments
        .then(continuation_line)
        .then(optional_data(Dialect::Gherkin))
        .map(move |((comments, (description, line)), data)| Statement {
            comments,
            kind,
            description,
            data,
            line: Some(line),
        })
}

fn continuation_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    optional_comments.then(continuation_line).map(|_| ()).parse(input)
}

/// A statement followed by any `And`/`But`/`*` statements of the same type.
fn statement_group(input: &mut Cursor<'_>) -> ParseResult<Vec<Statement>> {
    let mut cursor = *input;
    let first = statement.parse(&mut cursor)?;
    let rest = zero_or_more(continuation(first.kind), end().or(not(continuation_start)))
        .parse(&mut cursor)?;
    *input = cursor;
    Ok(std::iter::once(first).chain(rest).collect())
}

fn statement_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    optional_comments.then(statement_keyword).map(|_| ()).parse(input)
}

fn statements(input: &mut Cursor<'_>) -> ParseResult<Vec<Statement>> {
    one_or_more("statement", statement_group, end().or(not(statement_start)))
        .map(|groups| groups.into_iter().flatten().collect())
        .parse(input)
}

fn scenario(input: &mut Cursor<'_>) -> ParseResult<Example> {
    header
        .then(titled(SCENARIO))
        .then_ignore(extended_description)
        .then(statements)
        .try_map(|((header, description), statements)| {
            let templated = statements.iter().find(|statement| !statement.tokens().is_empty());
            if let Some(statement) = templated {
                return Err(Invalid::at(
                    statement.line.unwrap_or_default(),
                    "a Scenario can't have template tokens; use a Scenario Outline with an Examples: table",
                ));
            }
            Ok(Example {
                comments: header.comments,
                identifier: None,
                labels: header.tags.clone(),
                explicit_labels: header.tags,
                description: Some(description),
                statements,
                example_set: None,
                specification: None,
            })
        })
        .parse(input)
}

fn example_row(input: &mut Cursor<'_>) -> ParseResult<TemplateRow> {
    header
        .then(table_row)
        .map(|(header, TableRow { line, cells })| TemplateRow {
            line,
            comments: header.comments,
            identifier: None,
            labels: header.tags,
            cells,
        })
        .parse(input)
}

fn outline(input: &mut Cursor<'_>) -> ParseResult<Vec<Example>> {
    let line = input.line_number();
    header
        .then(titled(OUTLINE))
        .then_ignore(extended_description)
        .then(statements)
        .then_ignore(alone(&["Examples:", "Scenarios:"]))
        .then(one_or_more("examples row", example_row, end().or(not(example_row))))
        .try_map(move |(((header, description), statements), rows)| {
            let set = ExampleSet {
                comments: header.comments,
                identifier: None,
                labels: header.tags,
                description: Some(description),
                statements,
                line: Some(line),
            };
            if rows.tail.is_empty() {
                return Err(Invalid::new(
                    "examples should be a table containing at least 2 rows: a header row and at least one row of values",
                ));
            }
            template::expand(&set, &rows.head, &rows.tail)
        })
        .parse(input)
}

fn example_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    let keyword = peek_line(|line: &Line| {
        let text = line.trimmed();
        if OUTLINE.iter().chain(SCENARIO).any(|keyword| text.starts_with(keyword)) {
            Ok(())
        } else {
            Err("not a scenario".to_string())
        }
    });
    header.then(keyword).map(|_| ()).parse(input)
}

fn examples(input: &mut Cursor<'_>) -> ParseResult<Vec<Example>> {
    let block = outline.or(scenario.map(|example| vec![example]));
    one_or_more("scenario", block, end().or(not(example_start)))
        .map(|blocks| blocks.into_iter().flatten().collect())
        .parse(input)
}

fn rule(input: &mut Cursor<'_>) -> ParseResult<Requirement> {
    header
        .then(titled(&["Rule:"]))
        .then_ignore(extended_description)
        .then(examples)
        .map(|((header, description), examples)| Requirement {
            comments: header.comments,
            identifier: None,
            labels: header.tags.clone(),
            explicit_labels: header.tags,
            description,
            examples,
        })
        .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::document::Data, parsing::ErrorKind};

    fn parse_text(text: &str) -> Result<Document, ParseError> {
        parse(PathBuf::from("test.feature"), text)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_scenarios_directly_under_a_feature() {
        let document = parse_text(
            "@web\nFeature: Login\n  Users sign in here.\n\n  Scenario: Success\n    Given a user\n    When they sign in\n    Then they see the dashboard",
        )
        .unwrap();
        assert_eq!(document.description.as_deref(), Some("Login"));
        assert_eq!(document.labels, Some(strings(&["web"])));
        assert_eq!(document.requirements.len(), 1);
        let requirement = &document.requirements[0];
        assert_eq!(requirement.description, "Login");
        assert_eq!(requirement.labels, Some(strings(&["web"])));
        let example = &requirement.examples[0];
        assert_eq!(example.description.as_deref(), Some("Success"));
        let kinds: Vec<_> = example.statements.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [StatementType::If, StatementType::When, StatementType::Expect]);
        assert_eq!(example.labels, Some(strings(&["web"])));
    }

    #[test]
    fn parses_rules() {
        let document = parse_text(
            "@feature\nFeature: Shop\n\n  @rule\n  Rule: Discounts\n    @example\n    Example: Ten percent\n      Given a basket\n      Then a discount\n\n  Rule: Shipping\n    Scenario: Free\n      Given a big order\n      Then free shipping",
        )
        .unwrap();
        assert_eq!(document.requirements.len(), 2);
        let discounts = &document.requirements[0];
        assert_eq!(discounts.labels, Some(strings(&["rule", "feature"])));
        assert_eq!(discounts.explicit_labels, Some(strings(&["rule"])));
        let example = &discounts.examples[0];
        assert_eq!(example.labels, Some(strings(&["example", "rule", "feature"])));
        assert_eq!(example.explicit_labels, Some(strings(&["example"])));
        let shipping = &document.requirements[1];
        assert_eq!(shipping.labels, Some(strings(&["feature"])));
    }

    #[test]
    fn continuations_share_the_statement_type() {
        let document = parse_text(
            "Feature: F\n  Scenario: S\n    Given one\n    And two\n    * three\n    Then four\n    But not five",
        )
        .unwrap();
        let statements = &document.requirements[0].examples[0].statements;
        let kinds: Vec<_> = statements.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                StatementType::If,
                StatementType::If,
                StatementType::If,
                StatementType::Expect,
                StatementType::Expect
            ]
        );
        assert_eq!(statements[4].description, "not five");
    }

    #[test]
    fn comments_surround_tags() {
        let document = parse_text(
            "# one\n@a @b\n# two\nFeature: F\n  Scenario: S\n    Given x\n    Then y",
        )
        .unwrap();
        assert_eq!(document.comments, Some(strings(&["one", "two"])));
        assert_eq!(document.labels, Some(strings(&["a", "b"])));
    }

    #[test]
    fn malformed_tags_are_rejected() {
        let error = parse_text("@a b\nFeature: F\n  Scenario: S\n    Given x").unwrap_err();
        assert_eq!(error.line, 1);
        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn expands_outlines() {
        let document = parse_text(
            "Feature: Maths\n  @sums\n  Scenario Outline: adding <a>\n    Given <a> and <b>\n    Then <c>\n\n    Examples:\n      | a | b | c |\n      @big\n      | 1 | 2 | 3 |\n      | 4 | 5 | 9 |",
        )
        .unwrap();
        let examples = &document.requirements[0].examples;
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].description.as_deref(), Some("adding 1"));
        assert_eq!(examples[0].labels, Some(strings(&["big", "sums"])));
        assert_eq!(examples[1].labels, Some(strings(&["sums"])));
        assert_eq!(examples[1].statements[0].description, "4 and 5");
        assert_eq!(examples[1].statements[1].description, "9");
    }

    #[test]
    fn outline_description_column() {
        let document = parse_text(
            "Feature: Maths\n  Scenario Template: adding\n    Given <a>\n    Then ok\n    Scenarios:\n      |   | a |\n      | first | 1 |",
        )
        .unwrap();
        let example = &document.requirements[0].examples[0];
        assert_eq!(example.description.as_deref(), Some("first"));
    }

    #[test]
    fn outline_header_cannot_be_tagged() {
        let error = parse_text(
            "Feature: F\n  Scenario Outline: o\n    Given <a>\n    Examples:\n      @tag\n      | a |\n      | 1 |",
        )
        .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.contains("header row"), "{error}");
    }

    #[test]
    fn outline_tokens_must_match_columns() {
        let error = parse_text(
            "Feature: F\n  Scenario Outline: o\n    Given <a>\n    Then <b>\n    Examples:\n      | a |\n      | 1 |",
        )
        .unwrap_err();
        assert_eq!(error.line, 6);
    }

    #[test]
    fn data_tables_and_doc_strings() {
        let document = parse_text(
            "Feature: F\n  Scenario: S\n    Given users\n      | name | role | team |\n      | Ann  | admin | ops |\n    And a note\n      \"\"\"\n      hello\n      \"\"\"\n    Then ok",
        )
        .unwrap();
        let statements = &document.requirements[0].examples[0].statements;
        let table = statements[0].data.as_ref().and_then(Data::as_table).unwrap();
        assert_eq!(table[0]["role"], "admin");
        assert_eq!(statements[1].data, Some(Data::Text("hello".to_string())));
    }

    #[test]
    fn scenario_with_tokens_needs_an_outline() {
        let error = parse_text("Feature: F\n  Scenario: S\n    Given <a>\n    Then b").unwrap_err();
        assert_eq!(error.line, 3);
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.contains("Scenario Outline"), "{error}");
    }

    #[test]
    fn statement_needs_description() {
        let error = parse_text("Feature: F\n  Scenario: S\n    Given\n    Then ok").unwrap_err();
        assert_eq!(error.line, 3);
    }

    #[test]
    fn feature_description_is_required() {
        let error = parse_text("Feature:\n  Scenario: S\n    Given x").unwrap_err();
        assert_eq!(error.line, 1);
    }
}
