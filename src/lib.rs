//! Plain-text behavioural requirements.
//!
//! Requirements are written either in a Gherkin-like syntax (`.feature`) or
//! in ReqsML (`.requirements`). Both are parsed into the same [`Document`]
//! model, which can be written back out as canonical ReqsML, filtered with a
//! [`LabelExpression`], and flattened into cases for a test harness.
//!
//! ```
//! use reqkit::{Document, Syntax};
//!
//! let text = "Requirement: Sums\n  If: two numbers\n  Expect: their sum\n";
//! let document = Document::parse("sums.requirements", Syntax::ReqsMl, text).unwrap();
//! assert_eq!(document.requirements[0].examples[0].statements.len(), 2);
//! assert_eq!(
//!     reqkit::export::to_reqsml(&document),
//!     "Requirement: Sums\n\n  If: two numbers\n\n  Expect: their sum\n"
//! );
//! ```

pub mod domain;
pub use domain::{
    Config, ConfigError, Data, Document, Example, ExampleCase, ExampleSet, ExampleSpecification,
    ExpressionError, LabelExpression, Requirement, Statement, StatementCase, StatementType, Syntax,
};

/// Canonical ReqsML output.
pub mod export;

/// Line-based parsing shared by both grammars.
pub mod parsing;
pub use parsing::{ErrorKind, ParseError};

/// Reading documents from disk.
pub mod storage;
pub use storage::LoadError;
