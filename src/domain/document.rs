//! The canonical, syntax-independent document model.
//!
//! Both grammars produce these types. Every node owns its children; nothing
//! is shared and nothing changes after parsing.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::instrument;

use crate::parsing::{self, ParseError};

/// The concrete syntax a document was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    /// The Gherkin-like narrative syntax (`.feature` files).
    Gherkin,
    /// The tabular ReqsML syntax (`.requirements` files).
    ReqsMl,
}

impl Syntax {
    /// Selects a syntax from a file's extension.
    ///
    /// Returns `None` for anything other than `.feature` or `.requirements`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "feature" => Some(Self::Gherkin),
            "requirements" => Some(Self::ReqsMl),
            _ => None,
        }
    }

    /// The file extension associated with this syntax, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gherkin => "feature",
            Self::ReqsMl => "requirements",
        }
    }
}

/// One parsed requirements file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Where the document was read from.
    pub source: PathBuf,
    /// Comments preceding the document's header.
    pub comments: Option<Vec<String>>,
    /// Labels applying to the whole document.
    pub labels: Option<Vec<String>>,
    /// The document's title, if the syntax has one.
    pub description: Option<String>,
    /// The syntax the document was written in.
    pub syntax: Syntax,
    /// The requirements, in source order.
    pub requirements: Vec<Requirement>,
}

impl Document {
    /// Parses `text` with the grammar for `syntax`.
    ///
    /// `source` is recorded on the document; it is never read.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying the offending line if the text does
    /// not conform to the grammar.
    #[instrument(skip_all, fields(source = %source.as_ref().display(), ?syntax))]
    pub fn parse(source: impl AsRef<Path>, syntax: Syntax, text: &str) -> Result<Self, ParseError> {
        let source = source.as_ref().to_path_buf();
        let result = match syntax {
            Syntax::Gherkin => parsing::gherkin::parse(source, text),
            Syntax::ReqsMl => parsing::reqsml::parse(source, text),
        };
        if let Err(error) = &result {
            tracing::debug!(%error, "parse failed");
        }
        result
    }

    /// The file name of the source without its extension.
    #[must_use]
    pub fn name(&self) -> &str {
        self.source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }
}

/// A named rule grouping one or more examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Comments preceding the requirement.
    pub comments: Option<Vec<String>>,
    /// An identifier for the requirement (ReqsML only).
    pub identifier: Option<String>,
    /// Labels written on the requirement merged with inherited ones.
    pub labels: Option<Vec<String>>,
    /// Only the labels written on the requirement itself.
    pub explicit_labels: Option<Vec<String>>,
    /// The requirement's description.
    pub description: String,
    /// The requirement's examples, in source order.
    pub examples: Vec<Example>,
}

/// A single concrete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    /// Comments preceding the example.
    pub comments: Option<Vec<String>>,
    /// An identifier for the example (ReqsML only).
    pub identifier: Option<String>,
    /// Labels written on the example merged with inherited ones.
    pub labels: Option<Vec<String>>,
    /// Only the labels written on the example itself.
    pub explicit_labels: Option<Vec<String>>,
    /// The example's description, if it has one.
    pub description: Option<String>,
    /// The example's statements, in source order.
    pub statements: Vec<Statement>,
    /// The template this example was expanded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_set: Option<ExampleSet>,
    /// The table row this example was expanded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specification: Option<ExampleSpecification>,
}

/// A template shared by a group of table-driven examples.
///
/// Two sets are equal regardless of the line they came from.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct ExampleSet {
    /// Comments preceding the set.
    pub comments: Option<Vec<String>>,
    /// An identifier for the set.
    pub identifier: Option<String>,
    /// Labels written on the set.
    pub labels: Option<Vec<String>>,
    /// The set's description, possibly containing `<token>`s.
    pub description: Option<String>,
    /// The template statements, possibly containing `<token>`s.
    pub statements: Vec<Statement>,
    /// The 1-based line the set starts on. Sets written out one after the
    /// other stay separate on export when their lines differ.
    pub line: Option<usize>,
}

impl PartialEq for ExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.comments == other.comments
            && self.identifier == other.identifier
            && self.labels == other.labels
            && self.description == other.description
            && self.statements == other.statements
    }
}

/// One row of an examples table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleSpecification {
    /// Comments preceding the row.
    pub comments: Option<Vec<String>>,
    /// The row's identifier.
    pub identifier: Option<String>,
    /// The row's labels.
    pub labels: Option<Vec<String>>,
    /// The value of the row's description column, if the table has one.
    pub description: Option<String>,
    /// Token names mapped to this row's values, in column order.
    pub values: IndexMap<String, String>,
}

/// The kind of a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementType {
    /// A precondition (`If:` / `Given`).
    If,
    /// An action (`When:` / `When`).
    When,
    /// An expected outcome (`Expect:` / `Then`).
    Expect,
}

impl StatementType {
    /// The ReqsML keyword for this statement type, without the colon.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::If => "If",
            Self::When => "When",
            Self::Expect => "Expect",
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single `If`/`When`/`Expect` clause.
///
/// Two statements are equal regardless of the line they came from.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Statement {
    /// Comments preceding the statement.
    pub comments: Option<Vec<String>>,
    /// The kind of statement.
    #[serde(rename = "type")]
    pub kind: StatementType,
    /// The statement's description.
    pub description: String,
    /// Structured data attached to the statement.
    pub data: Option<Data>,
    /// The 1-based line the statement was read from.
    pub line: Option<usize>,
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.comments == other.comments
            && self.kind == other.kind
            && self.description == other.description
            && self.data == other.data
    }
}

/// Structured data attached to a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Data {
    /// A free-form block of text.
    Text(String),
    /// An ordered single column of values.
    List(Vec<String>),
    /// An ordered mapping with unique keys.
    KeyValues(IndexMap<String, String>),
    /// Rows keyed by shared column headers.
    Table(Vec<IndexMap<String, String>>),
    /// A two-dimensional grid keyed by row and then by column.
    Matrix(IndexMap<String, IndexMap<String, String>>),
}

impl Data {
    /// The text, if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The values, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// The mapping, if this is a set of key-value pairs.
    #[must_use]
    pub const fn as_key_values(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::KeyValues(key_values) => Some(key_values),
            _ => None,
        }
    }

    /// The rows, if this is a table.
    #[must_use]
    pub fn as_table(&self) -> Option<&[IndexMap<String, String>]> {
        match self {
            Self::Table(rows) => Some(rows),
            _ => None,
        }
    }

    /// The grid, if this is a matrix.
    #[must_use]
    pub const fn as_matrix(&self) -> Option<&IndexMap<String, IndexMap<String, String>>> {
        match self {
            Self::Matrix(matrix) => Some(matrix),
            _ => None,
        }
    }
}
