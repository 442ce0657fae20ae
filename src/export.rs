//! Canonical ReqsML output.
//!
//! Any [`Document`] can be written as ReqsML, whatever syntax it was parsed
//! from. Parsing the output of a ReqsML document yields an equal document.
//!
//! Layout rules:
//! - statements are grouped as `If`, then `When`, then `Expect`; several
//!   statements of one type become a bullet list under a single keyword;
//! - examples expanded from the same example set are written back as one
//!   templated block with a single `Examples:` table;
//! - a lone example without metadata is written inline below its
//!   requirement;
//! - table columns are padded to their widest cell, and never narrower than
//!   three characters so separator rows stay valid.

use std::io::{self, Write};

use indexmap::IndexMap;
use tracing::instrument;

use crate::domain::{
    Data, Document, Example, ExampleSet, ExampleSpecification, Requirement, Statement,
};

const MIN_COLUMN_WIDTH: usize = 3;
const INDENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Text(String),
    Blank,
}

/// Renders `document` as canonical ReqsML text.
#[must_use]
#[instrument(skip_all, fields(source = %document.source.display()))]
pub fn to_reqsml(document: &Document) -> String {
    let lines: Vec<Line> = document
        .requirements
        .iter()
        .flat_map(requirement)
        .collect();
    let mut output = String::new();
    for line in consolidate(lines) {
        if let Line::Text(text) = line {
            output.push_str(text.trim_end());
        }
        output.push('\n');
    }
    tracing::trace!(bytes = output.len(), "exported document");
    output
}

/// Writes `document` as canonical ReqsML text.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_reqsml<W: Write>(document: &Document, writer: &mut W) -> io::Result<()> {
    writer.write_all(to_reqsml(document).as_bytes())
}

/// Collapses runs of blank lines to one and drops leading and trailing
/// blank lines.
fn consolidate(lines: Vec<Line>) -> Vec<Line> {
    let mut consolidated: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        let redundant = line == Line::Blank
            && consolidated.last().is_none_or(|previous| *previous == Line::Blank);
        if !redundant {
            consolidated.push(line);
        }
    }
    if consolidated.last() == Some(&Line::Blank) {
        consolidated.pop();
    }
    consolidated
}

fn indent(lines: Vec<Line>, by: usize) -> impl Iterator<Item = Line> {
    lines.into_iter().map(move |line| match line {
        Line::Text(text) if !text.is_empty() => Line::Text(format!("{:by$}{text}", "")),
        other => other,
    })
}

fn comments(comments: Option<&[String]>) -> Vec<Line> {
    comments.map_or_else(Vec::new, |comments| {
        std::iter::once(Line::Blank)
            .chain(comments.iter().map(|comment| Line::Text(format!("// {comment}"))))
            .collect()
    })
}

fn metadata(identifier: Option<&str>, labels: Option<&[String]>) -> Option<String> {
    match (identifier, labels) {
        (None, None) => None,
        (Some(identifier), None) => Some(format!("#{identifier}")),
        (None, Some(labels)) => Some(format!("#({})", labels.join(", "))),
        (Some(identifier), Some(labels)) => Some(format!("#{identifier} ({})", labels.join(", "))),
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn cell(value: &str, width: usize) -> String {
    format!("| {value:<width$} ")
}

fn separator(width: usize) -> String {
    cell(&"-".repeat(width), width)
}

/// The width of each column, in first-seen order.
fn column_widths<'a>(
    rows: impl IntoIterator<Item = &'a IndexMap<String, String>>,
) -> IndexMap<&'a str, usize> {
    let mut widths = IndexMap::new();
    for row in rows {
        for (key, value) in row {
            let entry = widths
                .entry(key.as_str())
                .or_insert_with(|| width(key).max(MIN_COLUMN_WIDTH));
            *entry = (*entry).max(width(value));
        }
    }
    widths
}

fn value<'a>(row: &'a IndexMap<String, String>, key: &str) -> &'a str {
    row.get(key).map_or("", String::as_str)
}

fn requirement(requirement: &Requirement) -> Vec<Line> {
    let mut lines = comments(requirement.comments.as_deref());
    lines.extend(
        metadata(
            requirement.identifier.as_deref(),
            requirement.explicit_labels.as_deref(),
        )
        .map(Line::Text),
    );
    lines.push(Line::Text(format!("Requirement: {}", requirement.description)));
    lines.push(Line::Blank);

    let groups = group_by_set(&requirement.examples);
    let body = match groups.as_slice() {
        [group] if example_set_of(group).is_some_and(is_bare) => inline_template(group),
        [group] if group.len() == 1 && example_set_of(group).is_none() => example(group[0]),
        _ => groups.iter().flat_map(|group| example_group(group)).collect(),
    };
    lines.extend(indent(body, INDENT));
    lines
}

/// Splits examples into runs sharing the same example set. Examples
/// without a set are grouped together.
fn group_by_set(examples: &[Example]) -> Vec<Vec<&Example>> {
    let mut groups: Vec<Vec<&Example>> = Vec::new();
    for example in examples {
        match groups.last_mut() {
            Some(group) if same_set(group[0], example) => group.push(example),
            _ => groups.push(vec![example]),
        }
    }
    groups
}

/// Whether two examples were expanded from the same written set.
fn same_set(first: &Example, second: &Example) -> bool {
    match (&first.example_set, &second.example_set) {
        (Some(first), Some(second)) => first == second && first.line == second.line,
        (None, None) => true,
        _ => false,
    }
}

/// The example set a group was expanded from, if any.
fn example_set_of<'a>(group: &[&'a Example]) -> Option<&'a ExampleSet> {
    group.first().and_then(|example| example.example_set.as_ref())
}

/// An example set written without its own header.
const fn is_bare(set: &ExampleSet) -> bool {
    set.comments.is_none()
        && set.identifier.is_none()
        && set.labels.is_none()
        && set.description.is_none()
}

fn inline_template(group: &[&Example]) -> Vec<Line> {
    let Some(set) = example_set_of(group) else {
        return Vec::new();
    };
    let mut lines = statements(&set.statements);
    lines.push(Line::Text("Examples:".to_string()));
    lines.push(Line::Blank);
    lines.extend(indent(examples_table(group), INDENT));
    lines.push(Line::Blank);
    lines
}

fn example_group(group: &[&Example]) -> Vec<Line> {
    match example_set_of(group) {
        Some(set) => example_set(set, group),
        None => group.iter().flat_map(|example| self::example(example)).collect(),
    }
}

fn example_set(set: &ExampleSet, group: &[&Example]) -> Vec<Line> {
    let mut lines = comments(set.comments.as_deref());
    lines.extend(metadata(set.identifier.as_deref(), set.labels.as_deref()).map(Line::Text));
    lines.push(Line::Text(format!(
        "Example Set: {}",
        set.description.as_deref().unwrap_or_default()
    )));
    lines.push(Line::Blank);
    lines.extend(indent(inline_template(group), INDENT));
    lines
}

fn examples_table(group: &[&Example]) -> Vec<Line> {
    let specifications: Vec<&ExampleSpecification> = group
        .iter()
        .filter_map(|example| example.specification.as_ref())
        .collect();
    let row_metadata: Vec<Option<String>> = specifications
        .iter()
        .map(|specification| {
            metadata(
                specification.identifier.as_deref(),
                specification.labels.as_deref(),
            )
        })
        .collect();
    let metadata_width = row_metadata.iter().flatten().map(|text| width(text)).max();
    let description_width = specifications
        .iter()
        .filter_map(|specification| specification.description.as_deref())
        .map(width)
        .max()
        .map(|longest| longest.max(MIN_COLUMN_WIDTH));
    let columns = column_widths(specifications.iter().map(|specification| &specification.values));

    let prefix = |metadata: &str| {
        metadata_width.map_or_else(String::new, |width| format!("{metadata:<width$} "))
    };
    let render = |metadata: &str, description: Option<String>, values: String| {
        format!("{}{}{values}|", prefix(metadata), description.unwrap_or_default())
    };

    let mut lines = vec![
        Line::Text(render(
            "",
            description_width.map(|width| cell("", width)),
            columns.iter().map(|(key, width)| cell(key, *width)).collect(),
        )),
        Line::Text(render(
            "",
            description_width.map(separator),
            columns.values().map(|width| separator(*width)).collect(),
        )),
    ];
    for (specification, metadata) in specifications.iter().zip(&row_metadata) {
        lines.extend(comments(specification.comments.as_deref()));
        lines.push(Line::Text(render(
            metadata.as_deref().unwrap_or_default(),
            description_width.map(|width| {
                cell(specification.description.as_deref().unwrap_or_default(), width)
            }),
            columns
                .iter()
                .map(|(key, width)| cell(value(&specification.values, key), *width))
                .collect(),
        )));
    }
    lines
}

fn example(example: &Example) -> Vec<Line> {
    let body = statements(&example.statements);
    if example.comments.is_none()
        && example.identifier.is_none()
        && example.explicit_labels.is_none()
        && example.description.is_none()
    {
        return body;
    }
    let mut lines = comments(example.comments.as_deref());
    lines.extend(
        metadata(
            example.identifier.as_deref(),
            example.explicit_labels.as_deref(),
        )
        .map(Line::Text),
    );
    lines.push(Line::Text(format!(
        "Example: {}",
        example.description.as_deref().unwrap_or_default()
    )));
    lines.push(Line::Blank);
    lines.extend(indent(body, INDENT));
    lines.push(Line::Blank);
    lines
}

/// Statements in their original order. Each run of one kind shares a
/// keyword.
fn statements(statements: &[Statement]) -> Vec<Line> {
    statements
        .chunk_by(|previous, next| previous.kind == next.kind)
        .flat_map(statement_group)
        .collect()
}

fn statement_group(statements: &[Statement]) -> Vec<Line> {
    match statements {
        [] => Vec::new(),
        [single] => {
            let mut lines = comments(single.comments.as_deref());
            lines.push(Line::Text(format!("{}: {}", single.kind, single.description)));
            lines.extend(data(single.data.as_ref()));
            lines.push(Line::Blank);
            lines
        }
        several @ [first, ..] => {
            let mut lines = vec![Line::Text(format!("{}:", first.kind))];
            for statement in several {
                lines.extend(comments(statement.comments.as_deref()));
                lines.push(Line::Text(format!("- {}", statement.description)));
                lines.extend(data(statement.data.as_ref()));
            }
            lines.push(Line::Blank);
            lines
        }
    }
}

/// A data block, indented below its statement.
fn data(data: Option<&Data>) -> Vec<Line> {
    let Some(data) = data else {
        return Vec::new();
    };
    let rows: Vec<String> = match data {
        Data::Text(text) => std::iter::once("```".to_string())
            .chain(text.split('\n').map(ToString::to_string))
            .chain(std::iter::once("```".to_string()))
            .collect(),
        Data::List(items) => {
            let longest = items.iter().map(|item| width(item)).max().unwrap_or_default();
            items.iter().map(|item| format!("{}|", cell(item, longest))).collect()
        }
        Data::KeyValues(pairs) => {
            let longest = pairs
                .iter()
                .map(|(key, value)| width(key) + width(value))
                .max()
                .unwrap_or_default();
            pairs
                .iter()
                .map(|(key, value)| {
                    let padding = longest + 1 - width(key);
                    format!("| {key}: {value:<padding$}|")
                })
                .collect()
        }
        Data::Table(table) => {
            let columns = column_widths(table);
            let mut rows = vec![
                columns.iter().map(|(key, width)| cell(key, *width)).collect::<String>() + "|",
                columns.values().map(|width| separator(*width)).collect::<String>() + "|",
            ];
            rows.extend(table.iter().map(|row| {
                columns
                    .iter()
                    .map(|(key, width)| cell(value(row, key), *width))
                    .collect::<String>()
                    + "|"
            }));
            rows
        }
        Data::Matrix(matrix) => {
            let key_width = matrix
                .keys()
                .map(|key| width(key))
                .max()
                .unwrap_or_default()
                .max(MIN_COLUMN_WIDTH);
            let columns = column_widths(matrix.values());
            let mut rows = vec![
                cell("", key_width)
                    + &columns.iter().map(|(key, width)| cell(key, *width)).collect::<String>()
                    + "|",
                separator(key_width)
                    + &columns.values().map(|width| separator(*width)).collect::<String>()
                    + "|",
            ];
            rows.extend(matrix.iter().map(|(key, row)| {
                cell(key, key_width)
                    + &columns
                        .iter()
                        .map(|(column, width)| cell(value(row, column), *width))
                        .collect::<String>()
                    + "|"
            }));
            rows
        }
    };
    indent(rows.into_iter().map(Line::Text).collect(), INDENT)
        .chain(std::iter::once(Line::Blank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Syntax;

    fn parse(text: &str) -> Document {
        Document::parse("test.requirements", Syntax::ReqsMl, text).unwrap()
    }

    fn assert_canonical(text: &str) {
        let document = parse(text);
        let exported = to_reqsml(&document);
        assert_eq!(exported, text);
        assert_eq!(parse(&exported), document);
    }

    #[test]
    fn inline_example() {
        assert_canonical("Requirement: R\n\n  If: x\n\n  When: y\n\n  Expect: z\n");
    }

    #[test]
    fn blank_lines_are_consolidated() {
        let document = parse("\n\n\nRequirement: R\n\n\n\n  If: x\n  Expect: z\n\n\n");
        assert_eq!(to_reqsml(&document), "Requirement: R\n\n  If: x\n\n  Expect: z\n");
    }

    #[test]
    fn statements_keep_their_order() {
        assert_canonical("Requirement: R\n\n  Example: E\n\n    Expect: b\n\n    If: a\n\n    Expect: c\n");
    }

    #[test]
    fn runs_of_one_kind_share_a_keyword() {
        let document = parse("Requirement: R\n  If: a\n  If: b\n  Expect: c\n");
        let exported = to_reqsml(&document);
        assert_eq!(exported, "Requirement: R\n\n  If:\n  - a\n  - b\n\n  Expect: c\n");
        assert_eq!(parse(&exported), document);
    }

    #[test]
    fn identical_adjacent_sets_stay_separate() {
        assert_canonical(
            "Requirement: R\n\n  Example Set: doubling <a>\n\n    If: <a>\n\n    Expect: <b>\n\n    Examples:\n\n      | a   | b   |\n      | --- | --- |\n      | 1   | 2   |\n\n  Example Set: doubling <a>\n\n    If: <a>\n\n    Expect: <b>\n\n    Examples:\n\n      | a   | b   |\n      | --- | --- |\n      | 3   | 6   |\n",
        );
    }

    #[test]
    fn examples_with_metadata() {
        assert_canonical(
            "// about R\n#req-1 (core, fast)\nRequirement: R\n\n  #ex-1\n  Example: first\n\n    If: x\n\n    Expect: y\n\n  // second one\n  #(slow)\n  Example: second\n\n    If: x\n\n    Expect: z\n",
        );
    }

    #[test]
    fn bullet_lists_with_comments_and_data() {
        assert_canonical(
            "Requirement: R\n\n  If:\n  - one\n\n  // about two\n  - two\n    | a |\n    | b |\n\n  Expect: done\n",
        );
    }

    #[test]
    fn data_blocks_are_aligned() {
        assert_canonical(
            "Requirement: R\n\n  If: data\n    | name | role  |\n    | ---- | ----- |\n    | Ann  | admin |\n    | Bob  | user  |\n\n  When: pairs\n    | key: value |\n    | longer: v  |\n\n  Expect: grid\n    |       | x   | y   |\n    | ----- | --- | --- |\n    | first | 1   | 2   |\n    | s     | 3   | 4   |\n",
        );
    }

    #[test]
    fn text_blocks_keep_blank_lines() {
        assert_canonical("Requirement: R\n\n  If: a note\n    ```\n    one\n\n    two\n    ```\n\n  Expect: y\n");
    }

    #[test]
    fn inline_template_table() {
        assert_canonical(
            "Requirement: Sums\n\n  If: <a> and <b>\n\n  Expect: <sum>\n\n  Examples:\n\n                | a   | b   | sum |\n                | --- | --- | --- |\n    #big (slow) | 10  | 20  | 30  |\n                | 1   | 2   | 3   |\n",
        );
    }

    #[test]
    fn example_set_with_description_column() {
        assert_canonical(
            "Requirement: R\n\n  #(maths)\n  Example Set: adding <a>\n\n    If: <a>\n\n    Expect: <b>\n\n    Examples:\n\n      |       | a   | b   |\n      | ----- | --- | --- |\n      | small | 1   | 2   |\n\n      // big numbers\n      | large | 100 | 200 |\n\n  Example: plain\n\n    If: x\n\n    Expect: y\n",
        );
    }

    #[test]
    fn gherkin_documents_export_as_reqsml() {
        let document = Document::parse(
            "test.feature",
            Syntax::Gherkin,
            "Feature: F\n  Scenario: S\n    Given x\n    And y\n    Then z",
        )
        .unwrap();
        assert_eq!(
            to_reqsml(&document),
            "Requirement: F\n\n  Example: S\n\n    If:\n    - x\n    - y\n\n    Expect: z\n"
        );
    }

    #[test]
    fn writes_to_a_writer() {
        let document = parse("Requirement: R\n  If: x\n  Expect: y");
        let mut buffer = Vec::new();
        write_reqsml(&document, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), to_reqsml(&document));
    }
}
