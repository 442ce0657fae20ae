//! Template tokens and table-driven example expansion.
//!
//! A template token is any `<...>` run within a single line of text. An
//! examples table binds each token to a column; every row of the table then
//! yields one concrete [`Example`] with the tokens replaced by that row's
//! values.

use std::{
    collections::{BTreeSet, HashSet},
    sync::LazyLock,
};

use indexmap::IndexMap;
use regex::Regex;

use super::{
    document::{Data, Example, ExampleSet, ExampleSpecification, Statement},
    labels,
};
use crate::parsing::Invalid;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("<.+?>").expect("token pattern is a valid regex"));

/// The names of the template tokens in `text`, without angle brackets.
#[must_use]
pub fn tokens(text: &str) -> BTreeSet<String> {
    TOKEN
        .find_iter(text)
        .map(|token| token.as_str().trim_matches(['<', '>']).to_string())
        .collect()
}

fn replace(text: &str, name: &str, value: &str) -> String {
    text.replace(&format!("<{name}>"), value)
}

fn replace_map(map: &IndexMap<String, String>, name: &str, value: &str) -> IndexMap<String, String> {
    map.iter()
        .map(|(k, v)| (replace(k, name, value), replace(v, name, value)))
        .collect()
}

fn map_tokens(map: &IndexMap<String, String>) -> impl Iterator<Item = String> + '_ {
    map.iter().flat_map(|(k, v)| tokens(k).into_iter().chain(tokens(v)))
}

impl Data {
    /// The template tokens used anywhere in this data.
    #[must_use]
    pub fn tokens(&self) -> BTreeSet<String> {
        match self {
            Self::Text(text) => tokens(text),
            Self::List(list) => list.iter().flat_map(|item| tokens(item)).collect(),
            Self::KeyValues(key_values) => map_tokens(key_values).collect(),
            Self::Table(rows) => rows.iter().flat_map(map_tokens).collect(),
            Self::Matrix(matrix) => matrix
                .iter()
                .flat_map(|(key, row)| tokens(key).into_iter().chain(map_tokens(row)))
                .collect(),
        }
    }

    fn replacing(&self, name: &str, value: &str) -> Self {
        match self {
            Self::Text(text) => Self::Text(replace(text, name, value)),
            Self::List(list) => Self::List(list.iter().map(|item| replace(item, name, value)).collect()),
            Self::KeyValues(key_values) => Self::KeyValues(replace_map(key_values, name, value)),
            Self::Table(rows) => Self::Table(
                rows.iter()
                    .map(|row| replace_map(row, name, value))
                    .collect(),
            ),
            Self::Matrix(matrix) => Self::Matrix(
                matrix
                    .iter()
                    .map(|(key, row)| (replace(key, name, value), replace_map(row, name, value)))
                    .collect(),
            ),
        }
    }
}

impl Statement {
    /// The template tokens used in the description and data.
    #[must_use]
    pub fn tokens(&self) -> BTreeSet<String> {
        let mut found = tokens(&self.description);
        if let Some(data) = &self.data {
            found.extend(data.tokens());
        }
        found
    }

    fn replacing(&self, name: &str, value: &str) -> Self {
        Self {
            comments: self.comments.clone(),
            kind: self.kind,
            description: replace(&self.description, name, value),
            data: self.data.as_ref().map(|data| data.replacing(name, value)),
            line: self.line,
        }
    }
}

/// The template tokens used by an example's description and statements.
pub(crate) fn example_tokens(description: Option<&str>, statements: &[Statement]) -> BTreeSet<String> {
    let mut found = description.map(tokens).unwrap_or_default();
    for statement in statements {
        found.extend(statement.tokens());
    }
    found
}

impl ExampleSet {
    /// The template tokens used by the set's description and statements.
    #[must_use]
    pub fn tokens(&self) -> BTreeSet<String> {
        example_tokens(self.description.as_deref(), &self.statements)
    }
}

/// One row of an examples table, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TemplateRow {
    pub(crate) line: usize,
    pub(crate) comments: Option<Vec<String>>,
    pub(crate) identifier: Option<String>,
    pub(crate) labels: Option<Vec<String>>,
    pub(crate) cells: Vec<String>,
}

impl TemplateRow {
    fn has_metadata(&self) -> bool {
        self.comments.is_some() || self.identifier.is_some() || self.labels.is_some()
    }
}

/// Validates an examples table against its template and expands every value
/// row into a concrete example.
///
/// An empty first header marks a description column: each row's value in it
/// becomes that example's description. Otherwise examples take the set's
/// description. Either way tokens are substituted.
pub(crate) fn expand(
    set: &ExampleSet,
    header: &TemplateRow,
    rows: &[TemplateRow],
) -> Result<Vec<Example>, Invalid> {
    let template_tokens = set.tokens();
    if template_tokens.is_empty() {
        return Err(Invalid::new("there are no template tokens in the example template"));
    }

    let Some((first, rest)) = header.cells.split_first() else {
        return Err(Invalid::at(header.line, "the examples table has no header"));
    };
    if rest.is_empty() && first.is_empty() {
        return Err(Invalid::at(
            header.line,
            "an examples table can't have a single column with no header",
        ));
    }
    if rest.iter().any(String::is_empty) {
        return Err(Invalid::at(
            header.line,
            "only the first column of an examples table can have an empty header, which marks it as the description column",
        ));
    }
    if header.has_metadata() {
        return Err(Invalid::at(
            header.line,
            "the examples header row can't have comments, identifiers or labels",
        ));
    }

    let has_description = first.is_empty();
    let columns = if has_description { rest } else { &header.cells[..] };

    let mut seen = HashSet::new();
    if let Some(duplicate) = columns.iter().find(|column| !seen.insert(column.as_str())) {
        return Err(Invalid::at(
            header.line,
            format!("the examples table has more than one column named '{duplicate}'"),
        ));
    }

    for row in rows {
        if row.cells.len() != header.cells.len() {
            return Err(Invalid::at(
                row.line,
                format!(
                    "every row in the examples table must have the same number of columns as the header (expected {}, found {})",
                    header.cells.len(),
                    row.cells.len()
                ),
            ));
        }
        if has_description && row.cells.first().is_some_and(String::is_empty) {
            return Err(Invalid::at(
                row.line,
                "when the examples table has a description column, every row must provide a description",
            ));
        }
    }

    let column_names: BTreeSet<String> = columns.iter().cloned().collect();
    if column_names != template_tokens {
        let unbound: Vec<_> = template_tokens.difference(&column_names).cloned().collect();
        let unused: Vec<_> = column_names.difference(&template_tokens).cloned().collect();
        return Err(Invalid::at(
            header.line,
            format!(
                "every unique token must have exactly one matching column in the examples table (tokens without a column: [{}]; columns without a token: [{}])",
                unbound.join(", "),
                unused.join(", ")
            ),
        ));
    }

    Ok(rows
        .iter()
        .map(|row| expand_row(set, columns, has_description, row))
        .collect())
}

fn expand_row(set: &ExampleSet, columns: &[String], has_description: bool, row: &TemplateRow) -> Example {
    let (row_description, cells) = match row.cells.split_first() {
        Some((first, rest)) if has_description => (Some(first.clone()), rest),
        _ => (None, &row.cells[..]),
    };
    let values: IndexMap<String, String> = columns.iter().cloned().zip(cells.iter().cloned()).collect();

    let mut description = row_description.clone().or_else(|| set.description.clone());
    let mut statements = set.statements.clone();
    for (name, value) in &values {
        description = description.map(|text| replace(&text, name, value));
        statements = statements
            .iter()
            .map(|statement| statement.replacing(name, value))
            .collect();
    }

    Example {
        comments: row.comments.clone(),
        identifier: row.identifier.clone(),
        labels: labels::merge(set.labels.as_deref(), row.labels.as_deref()),
        explicit_labels: row.labels.clone(),
        description,
        statements,
        example_set: Some(set.clone()),
        specification: Some(ExampleSpecification {
            comments: row.comments.clone(),
            identifier: row.identifier.clone(),
            labels: row.labels.clone(),
            description: row_description,
            values,
        }),
    }
}
