//! Data blocks attached to statements.
//!
//! Both grammars share the same table-shaped rows and differ only in the
//! text delimiter, whether tables carry a `---` separator row, and the order
//! in which the table interpretations are tried.

use std::collections::HashSet;

use indexmap::IndexMap;
use nonempty::NonEmpty;

use super::{
    Cursor, Invalid, Line, ParseError, ParseResult, Parser, end, line, not, one_or_more, peek_line,
};
use crate::domain::document::Data;

/// The grammar a data block is being read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Gherkin,
    ReqsMl,
}

impl Dialect {
    const fn text_delimiter(self) -> &'static str {
        match self {
            Self::Gherkin => "\"\"\"",
            Self::ReqsMl => "```",
        }
    }

    /// Rows preceding the values: a header, plus a separator in ReqsML.
    const fn header_rows(self) -> usize {
        match self {
            Self::Gherkin => 1,
            Self::ReqsMl => 2,
        }
    }
}

/// A table-shaped line, split into trimmed cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableRow {
    pub(crate) line: usize,
    pub(crate) cells: Vec<String>,
}

/// Splits `| a | b |` into its cells.
///
/// Exactly one pipe is stripped from each end, so empty cells survive.
pub(crate) fn split_cells(text: &str) -> Result<Vec<String>, String> {
    let inner = text
        .strip_prefix('|')
        .and_then(|rest| rest.strip_suffix('|'))
        .ok_or_else(|| "table rows must be contained inside pipe | characters".to_string())?;
    if inner.trim().is_empty() {
        return Err("line is not a table row because it has no content between the | characters".to_string());
    }
    Ok(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}

/// Parses a single table row.
pub(crate) fn table_row(input: &mut Cursor<'_>) -> ParseResult<TableRow> {
    line(|line: &Line| {
        Ok(TableRow {
            line: line.number,
            cells: split_cells(line.trimmed())?,
        })
    })
    .parse(input)
}

/// Whether a cell is a run of at least three hyphens.
pub(crate) fn is_separator(cell: &str) -> bool {
    cell.len() >= 3 && cell.chars().all(|c| c == '-')
}

fn table_rows(input: &mut Cursor<'_>) -> ParseResult<NonEmpty<TableRow>> {
    one_or_more("table row", table_row, end().or(not(table_row))).parse(input)
}

fn text_block(dialect: Dialect, input: &mut Cursor<'_>) -> ParseResult<Data> {
    let delimiter = dialect.text_delimiter();
    let opening = line(|line: &Line| {
        if line.trimmed() == delimiter {
            Ok(())
        } else {
            Err(format!(
                "text data must start and end with the {delimiter} delimiter on a line of its own"
            ))
        }
    });

    let mut cursor = *input;
    opening.parse(&mut cursor)?;
    let start = cursor.line_number();

    let mut body = Vec::new();
    loop {
        let Some(next) = cursor.peek() else {
            return Err(ParseError::syntax(
                cursor.line_number(),
                format!("text data is missing its closing {delimiter} delimiter"),
            ));
        };
        cursor = cursor.advance();
        if next.trimmed() == delimiter {
            break;
        }
        body.push(next.trimmed());
    }

    if body.iter().all(|line| line.is_empty()) {
        return Err(ParseError::validation(start, "text data can't be empty"));
    }
    *input = cursor;
    Ok(Data::Text(body.join("\n")))
}

/// The first row whose cell count differs from the header's.
fn check_column_counts(rows: &NonEmpty<TableRow>, kind: &str) -> Result<(), Invalid> {
    let expected = rows.head.cells.len();
    match rows.tail.iter().find(|row| row.cells.len() != expected) {
        Some(row) => Err(Invalid::at(
            row.line,
            format!(
                "all rows of {kind} data must have the same number of columns (expected {expected}, found {})",
                row.cells.len()
            ),
        )),
        None => Ok(()),
    }
}

fn check_separator(dialect: Dialect, rows: &NonEmpty<TableRow>, kind: &str) -> Result<(), Invalid> {
    if dialect == Dialect::Gherkin {
        return Ok(());
    }
    match rows.get(1) {
        Some(row) if row.cells.iter().all(|cell| is_separator(cell)) => Ok(()),
        Some(row) => Err(Invalid::at(
            row.line,
            format!(
                "{kind} data must start with a header row, followed by a row with '---' (three or more hyphens) for each column"
            ),
        )),
        None => Err(Invalid::new(format!("{kind} data needs a header row"))),
    }
}

fn values(dialect: Dialect, rows: &NonEmpty<TableRow>) -> impl Iterator<Item = &TableRow> {
    rows.iter().skip(dialect.header_rows())
}

fn matrix(dialect: Dialect, rows: &NonEmpty<TableRow>) -> Result<Data, Invalid> {
    let header = &rows.head.cells;
    if header.len() < 2 || rows.len() < 3 {
        return Err(Invalid::new(
            "matrix data must have at least two columns and at least three rows",
        ));
    }
    check_separator(dialect, rows, "matrix")?;
    check_column_counts(rows, "matrix")?;
    let Some((corner, columns)) = header.split_first() else {
        return Err(Invalid::new("matrix data needs a header row"));
    };
    if !corner.is_empty() {
        return Err(Invalid::new("the first column header of matrix data must be empty"));
    }
    check_unique(columns, rows.head.line, "matrix column")?;

    let mut matrix = IndexMap::new();
    for row in values(dialect, rows) {
        let Some((key, cells)) = row.cells.split_first() else {
            continue;
        };
        let entries = columns.iter().cloned().zip(cells.iter().cloned()).collect();
        if matrix.insert(key.clone(), entries).is_some() {
            return Err(Invalid::at(
                row.line,
                format!("matrix data has more than one row named '{key}'"),
            ));
        }
    }
    Ok(Data::Matrix(matrix))
}

fn table(dialect: Dialect, rows: &NonEmpty<TableRow>) -> Result<Data, Invalid> {
    let minimum = dialect.header_rows() + 1;
    if rows.len() < minimum {
        return Err(Invalid::new(format!(
            "table data must have at least one column and at least {minimum} rows"
        )));
    }
    let columns = &rows.head.cells;
    // An empty header is the corner of a matrix, and matrix errors stand.
    if columns.iter().any(String::is_empty) {
        return Err(Invalid::at(
            rows.head.line,
            "every column header of table data must be non-empty",
        ));
    }
    check_separator(dialect, rows, "table")?;
    check_column_counts(rows, "table")?;
    check_unique(columns, rows.head.line, "table column")?;

    Ok(Data::Table(
        values(dialect, rows)
            .map(|row| columns.iter().cloned().zip(row.cells.iter().cloned()).collect())
            .collect(),
    ))
}

fn single_column<'a>(rows: &'a NonEmpty<TableRow>, kind: &str) -> Result<Vec<&'a str>, Invalid> {
    rows.iter()
        .map(|row| match row.cells.as_slice() {
            [cell] => Ok(cell.as_str()),
            _ => Err(Invalid::at(
                row.line,
                format!("{kind} data must be formatted as a single column table"),
            )),
        })
        .collect()
}

fn key_values(rows: &NonEmpty<TableRow>) -> Result<Data, Invalid> {
    let cells = single_column(rows, "key value")?;
    let mut map = IndexMap::new();
    for (row, cell) in rows.iter().zip(cells) {
        let parts: Vec<&str> = cell
            .split(':')
            .filter(|part| !part.is_empty())
            .map(str::trim)
            .collect();
        let [key, value] = parts.as_slice() else {
            return Err(Invalid::at(
                row.line,
                "each row of key value data must have the format '| key: value |'",
            ));
        };
        // A repeated key keeps the last value.
        map.insert((*key).to_string(), (*value).to_string());
    }
    Ok(Data::KeyValues(map))
}

fn list(rows: &NonEmpty<TableRow>) -> Result<Data, Invalid> {
    let cells = single_column(rows, "list")?;
    Ok(Data::List(cells.into_iter().map(ToString::to_string).collect()))
}

fn check_unique(names: &[String], line: usize, what: &str) -> Result<(), Invalid> {
    let mut seen = HashSet::new();
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(name) => Err(Invalid::at(line, format!("duplicate {what} '{name}'"))),
        None => Ok(()),
    }
}

fn gherkin_data(input: &mut Cursor<'_>) -> ParseResult<Data> {
    let dialect = Dialect::Gherkin;
    (|input: &mut Cursor<'_>| text_block(dialect, input))
        .or(table_rows.try_map(|rows| matrix(dialect, &rows)))
        .or(table_rows.try_map(|rows| key_values(&rows)))
        .or(table_rows.try_map(|rows| list(&rows)))
        .or(table_rows.try_map(|rows| table(dialect, &rows)))
        .parse(input)
}

fn reqsml_data(input: &mut Cursor<'_>) -> ParseResult<Data> {
    let dialect = Dialect::ReqsMl;
    (|input: &mut Cursor<'_>| text_block(dialect, input))
        .or(table_rows.try_map(|rows| matrix(dialect, &rows)))
        .or(table_rows.try_map(|rows| table(dialect, &rows)))
        .or(table_rows.try_map(|rows| key_values(&rows)))
        .or(table_rows.try_map(|rows| list(&rows)))
        .parse(input)
}

/// Parses a data block, trying each interpretation in the dialect's order.
pub(crate) fn data(dialect: Dialect) -> fn(&mut Cursor<'_>) -> ParseResult<Data> {
    match dialect {
        Dialect::Gherkin => gherkin_data,
        Dialect::ReqsMl => reqsml_data,
    }
}

/// Parses a data block if one starts on the next line.
///
/// Once a table row or text delimiter follows, the block is committed: if it
/// is malformed the error is reported rather than treating it as absent.
pub(crate) fn optional_data(dialect: Dialect) -> impl Parser<Option<Data>> {
    let starts_block = peek_line(move |line: &Line| {
        let text = line.trimmed();
        if text == dialect.text_delimiter() || split_cells(text).is_ok() {
            Ok(())
        } else {
            Err("no data block here".to_string())
        }
    });
    let parser = data(dialect);
    move |input: &mut Cursor<'_>| {
        let mut probe = *input;
        if starts_block.parse(&mut probe).is_err() {
            return Ok(None);
        }
        parser.parse(input).map(Some)
    }
}
