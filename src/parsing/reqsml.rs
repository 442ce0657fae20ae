//! The ReqsML grammar.
//!
//! ```text
//! // optional comments
//! #identifier (label, label)
//! Requirement: description
//!   Example: description
//!     If: precondition
//!     When: action
//!     Expect:
//!       - outcome
//!       - another outcome
//! ```
//!
//! A requirement holds either a single in-line example, one or more
//! `Example:`/`Example Set:` blocks, or an in-line template followed by an
//! `Examples:` table.

use std::path::PathBuf;

use super::{
    Cursor, Invalid, Line, ParseError, ParseResult, Parser, alone,
    data::{Dialect, is_separator, optional_data, split_cells},
    end, line, not, one_or_more, peek_line, split_lines, titled, zero_or_more,
};
use crate::domain::{
    document::{Document, Example, ExampleSet, Requirement, Statement, StatementType, Syntax},
    labels,
    template::{self, TemplateRow},
};

/// The comments, identifier and labels that may precede a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Header {
    comments: Option<Vec<String>>,
    identifier: Option<String>,
    labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Metadata {
    identifier: Option<String>,
    labels: Option<Vec<String>>,
}

pub(crate) fn parse(source: PathBuf, text: &str) -> Result<Document, ParseError> {
    let lines = split_lines(text);
    let mut cursor = Cursor::new(&lines);
    let requirements = one_or_more("requirement", requirement, end()).parse(&mut cursor)?;
    tracing::trace!(count = requirements.len(), "parsed requirements");
    Ok(Document {
        source,
        comments: None,
        labels: None,
        description: None,
        syntax: Syntax::ReqsMl,
        requirements: requirements.into(),
    })
}

fn comment(input: &mut Cursor<'_>) -> ParseResult<String> {
    line(|line: &Line| {
        let text = line.trimmed();
        if !text.starts_with("//") {
            return Err("can't parse comment because the line doesn't start with //".to_string());
        }
        Ok(text.trim_start_matches('/').trim().to_string())
    })
    .parse(input)
}

fn optional_comments(input: &mut Cursor<'_>) -> ParseResult<Option<Vec<String>>> {
    zero_or_more(comment, end().or(not(comment)))
        .map(|comments| (!comments.is_empty()).then_some(comments))
        .parse(input)
}

/// Parses `#identifier (label, label)`, where either part may be omitted.
fn parse_metadata(text: &str) -> Result<Metadata, String> {
    let rest = text
        .strip_prefix('#')
        .ok_or_else(|| "an identifier or labels must be preceded by #".to_string())?;
    let (identifier, label_text) = rest.find('(').map_or((rest, ""), |open| rest.split_at(open));
    let identifier = identifier.trim();
    let label_text = label_text.trim();

    if identifier.is_empty() && label_text.is_empty() {
        return Err(
            "a # must be followed by an identifier, labels in parentheses, or both".to_string(),
        );
    }
    if label_text.is_empty() {
        return Ok(Metadata {
            identifier: Some(identifier.to_string()),
            labels: None,
        });
    }
    let inner = label_text
        .strip_prefix('(')
        .and_then(|text| text.strip_suffix(')'))
        .ok_or_else(|| "missing closing parenthesis on labels".to_string())?;
    let labels: Vec<String> = inner.split(',').map(|label| label.trim().to_string()).collect();
    if labels.iter().any(String::is_empty) {
        return Err(
            "labels inside parentheses must be non-empty and separated by commas".to_string(),
        );
    }
    Ok(Metadata {
        identifier: (!identifier.is_empty()).then(|| identifier.to_string()),
        labels: Some(labels),
    })
}

/// A metadata line. Once a line starts with `#` it must be well formed.
fn optional_metadata(input: &mut Cursor<'_>) -> ParseResult<Option<Metadata>> {
    let marked = line(|line: &Line| {
        let text = line.trimmed();
        if text.starts_with('#') {
            Ok(text.to_string())
        } else {
            Err("not a metadata line".to_string())
        }
    });
    let mut probe = *input;
    if marked.parse(&mut probe).is_err() {
        return Ok(None);
    }
    marked
        .try_map(|text| parse_metadata(&text).map_err(Invalid::from))
        .map(Some)
        .parse(input)
}

fn header(input: &mut Cursor<'_>) -> ParseResult<Header> {
    optional_comments
        .then(optional_metadata)
        .map(|(comments, metadata)| {
            let metadata = metadata.unwrap_or_default();
            Header {
                comments,
                identifier: metadata.identifier,
                labels: metadata.labels,
            }
        })
        .parse(input)
}

fn statement_keyword(input: &mut Cursor<'_>) -> ParseResult<(StatementType, String, usize)> {
    line(|line: &Line| {
        let text = line.trimmed();
        let (keyword, description) = text
            .split_once(':')
            .ok_or_else(|| "no If:, When: or Expect: keyword found".to_string())?;
        let kind = match keyword {
            "If" => StatementType::If,
            "When" => StatementType::When,
            "Expect" => StatementType::Expect,
            _ => return Err("no If:, When: or Expect: keyword found".to_string()),
        };
        Ok((kind, description.trim().to_string(), line.number))
    })
    .parse(input)
}

fn statement(input: &mut Cursor<'_>) -> ParseResult<Statement> {
    optional_comments
        .then(statement_keyword)
        .then(optional_data(Dialect::ReqsMl))
        .map(|((comments, (kind, description, line)), data)| Statement {
            comments,
            kind,
            description,
            data,
            line: Some(line),
        })
        .parse(input)
}

/// The comments and description of a bullet item, with its line.
fn list_item_line(input: &mut Cursor<'_>) -> ParseResult<(String, usize)> {
    line(|line: &Line| {
        let text = line.trimmed();
        let description = text
            .strip_prefix(['-', '*', '•'])
            .ok_or_else(|| "not a list item because the line doesn't start with -, * or •".to_string())?
            .trim();
        if description.is_empty() {
            return Err("a list item must have a description and cannot be empty".to_string());
        }
        Ok((description.to_string(), line.number))
    })
    .parse(input)
}

fn list_item_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    optional_comments.then(list_item_line).map(|_| ()).parse(input)
}

fn list_item(kind: StatementType) -> impl Parser<Statement> {
    optional_comments
        .then(list_item_line)
        .then(optional_data(Dialect::ReqsMl))
        .map(move |((comments, (description, line)), data)| Statement {
            comments,
            kind,
            description,
            data,
            line: Some(line),
        })
}

/// A statement with an in-line description, or a keyword followed by a
/// bulleted list of statements of the same type.
fn statement_group(input: &mut Cursor<'_>) -> ParseResult<Vec<Statement>> {
    let single = statement.try_map(|statement| {
        if statement.description.is_empty() {
            return Err(Invalid::new(format!(
                "a statement must have a description following the {}: keyword",
                statement.kind
            )));
        }
        Ok(vec![statement])
    });

    let list = |input: &mut Cursor<'_>| -> ParseResult<Vec<Statement>> {
        let mut cursor = *input;
        let keyword = statement.parse(&mut cursor)?;
        let line = keyword.line.unwrap_or_default();
        let items = zero_or_more(list_item(keyword.kind), end().or(not(list_item_start)))
            .parse(&mut cursor)?;
        if items.is_empty() {
            return Err(ParseError::validation(
                line,
                format!(
                    "a statement must have a description following the {}: keyword, or a list of items below it",
                    keyword.kind
                ),
            ));
        }
        if keyword.comments.is_some() {
            return Err(ParseError::validation(
                line,
                "comments for a statement list must be placed above each list item, not above the statement keyword",
            ));
        }
        if !keyword.description.is_empty() {
            return Err(ParseError::validation(
                line,
                format!(
                    "a statement can't have both a description and a list; remove the text after the {}: keyword",
                    keyword.kind
                ),
            ));
        }
        *input = cursor;
        Ok(items)
    };

    single.or(list).parse(input)
}

fn statement_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    optional_comments.then(statement_keyword).map(|_| ()).parse(input)
}

fn statements(input: &mut Cursor<'_>) -> ParseResult<Vec<Statement>> {
    one_or_more("statement", statement_group, end().or(not(statement_start)))
        .map(|groups| groups.into_iter().flatten().collect())
        .parse(input)
}

/// The statements of an example written directly under its requirement.
///
/// Leading comments belong to the first statement; an identifier or labels
/// would have nowhere to go.
fn inline_statements(input: &mut Cursor<'_>) -> ParseResult<Vec<Statement>> {
    let mut probe = *input;
    let found = header.parse(&mut probe)?;
    if found.identifier.is_some() || found.labels.is_some() {
        return Err(ParseError::validation(
            input.line_number(),
            "when a requirement has a single in-line example that example can't have its own identifier or labels",
        ));
    }
    statements.parse(input)
}

fn example(input: &mut Cursor<'_>) -> ParseResult<Example> {
    header
        .then(titled(&["Example:"]))
        .then(statements)
        .try_map(|((header, description), statements)| {
            let templated = statements.iter().find(|statement| !statement.tokens().is_empty());
            if let Some(statement) = templated {
                return Err(Invalid::at(
                    statement.line.unwrap_or_default(),
                    "an Example can't have template tokens; use an Example Set with an Examples: table",
                ));
            }
            Ok(Example {
                comments: header.comments,
                identifier: header.identifier,
                labels: header.labels.clone(),
                explicit_labels: header.labels,
                description: Some(description),
                statements,
                example_set: None,
                specification: None,
            })
        })
        .parse(input)
}

fn examples_keyword(input: &mut Cursor<'_>) -> ParseResult<()> {
    alone(&["Examples:"]).parse(input)
}

/// One row of an examples table, optionally prefixed by metadata.
fn example_row(input: &mut Cursor<'_>) -> ParseResult<TemplateRow> {
    let row = line(|line: &Line| {
        let text = line.trimmed();
        let (prefix, table) = text.find('|').map_or((text, ""), |pipe| text.split_at(pipe));
        let prefix = prefix.trim();
        let metadata = if prefix.is_empty() {
            Metadata::default()
        } else if prefix.starts_with('#') {
            parse_metadata(prefix)?
        } else {
            return Err("examples rows can only have an identifier and/or labels before the table, e.g. '#identifier (label) | value | value |'".to_string());
        };
        Ok(TemplateRow {
            line: line.number,
            comments: None,
            identifier: metadata.identifier,
            labels: metadata.labels,
            cells: split_cells(table)?,
        })
    });
    optional_comments
        .then(row)
        .map(|(comments, row)| TemplateRow { comments, ..row })
        .parse(input)
}

/// An `Examples:` table expanded against `set`.
fn expand_table(set: &ExampleSet, rows: &[TemplateRow]) -> Result<Vec<Example>, Invalid> {
    let [header, separator, values @ ..] = rows else {
        return Err(Invalid::new(
            "examples should be a table containing at least 3 rows: a header row, a separator row, and at least one row of values",
        ));
    };
    if values.is_empty() {
        return Err(Invalid::new(
            "examples should be a table containing at least 3 rows: a header row, a separator row, and at least one row of values",
        ));
    }
    if !separator.cells.iter().all(|cell| is_separator(cell)) {
        return Err(Invalid::at(
            separator.line,
            "examples must start with a header row, followed by a row with '---' (three or more hyphens) for each column",
        ));
    }
    template::expand(set, header, values)
}

fn example_rows(input: &mut Cursor<'_>) -> ParseResult<Vec<TemplateRow>> {
    one_or_more("examples row", example_row, end().or(not(example_row)))
        .map(Vec::from)
        .parse(input)
}

fn example_set(input: &mut Cursor<'_>) -> ParseResult<Vec<Example>> {
    let line = input.line_number();
    header
        .then(titled(&["Example Set:", "ExampleSet:"]))
        .then(statements)
        .then_ignore(examples_keyword)
        .then(example_rows)
        .try_map(move |(((header, description), statements), rows)| {
            let set = ExampleSet {
                comments: header.comments,
                identifier: header.identifier,
                labels: header.labels,
                description: Some(description),
                statements,
                line: Some(line),
            };
            if set.statements.iter().all(|statement| statement.tokens().is_empty()) {
                return Err(Invalid::new(
                    "there are no template tokens in the example set's statements",
                ));
            }
            expand_table(&set, &rows)
        })
        .parse(input)
}

fn example_start(input: &mut Cursor<'_>) -> ParseResult<()> {
    header
        .then(titled(&["Example:", "Example Set:", "ExampleSet:"]))
        .map(|_| ())
        .parse(input)
}

fn examples(input: &mut Cursor<'_>) -> ParseResult<Vec<Example>> {
    let block = example_set.or(example.map(|example| vec![example]));
    one_or_more("example", block, end().or(not(example_start)))
        .map(|blocks| blocks.into_iter().flatten().collect())
        .parse(input)
}

/// The examples of a requirement written without an `Example:` header: a
/// single example, or a template followed by an `Examples:` table.
fn inline_examples(input: &mut Cursor<'_>) -> ParseResult<Vec<Example>> {
    let table_follows = peek_line(|line: &Line| {
        if line.trimmed().starts_with("Examples:") {
            Ok(())
        } else {
            Err("no examples table".to_string())
        }
    });
    let table = move |input: &mut Cursor<'_>| -> ParseResult<Option<Vec<TemplateRow>>> {
        let mut probe = *input;
        if table_follows.parse(&mut probe).is_err() {
            return Ok(None);
        }
        examples_keyword.ignore_then(example_rows).map(Some).parse(input)
    };

    let line = input.line_number();
    inline_statements
        .then(table)
        .try_map(move |(statements, rows)| {
            let Some(rows) = rows else {
                if !template::example_tokens(None, &statements).is_empty() {
                    return Err(Invalid::new(
                        "a single example requirement can't have template tokens without an Examples: table",
                    ));
                }
                return Ok(vec![Example {
                    comments: None,
                    identifier: None,
                    labels: None,
                    explicit_labels: None,
                    description: None,
                    statements,
                    example_set: None,
                    specification: None,
                }]);
            };
            let set = ExampleSet {
                comments: None,
                identifier: None,
                labels: None,
                description: None,
                statements,
                line: Some(line),
            };
            expand_table(&set, &rows)
        })
        .parse(input)
}

fn requirement(input: &mut Cursor<'_>) -> ParseResult<Requirement> {
    header
        .then(titled(&["Requirement:"]))
        .then(inline_examples.or(examples))
        .map(|((header, description), examples)| {
            let examples = examples
                .into_iter()
                .map(|example| Example {
                    labels: labels::merge(header.labels.as_deref(), example.labels.as_deref()),
                    ..example
                })
                .collect();
            Requirement {
                comments: header.comments,
                identifier: header.identifier,
                labels: header.labels.clone(),
                explicit_labels: header.labels,
                description,
                examples,
            }
        })
        .parse(input)
}
