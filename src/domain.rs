//! Domain models for requirements documents.
//!
//! This module contains the syntax-independent document model, template
//! expansion, label handling and configuration.

/// The parsed document model.
pub mod document;
pub use document::{
    Data, Document, Example, ExampleSet, ExampleSpecification, Requirement, Statement,
    StatementType, Syntax,
};

pub mod case;
pub use case::{ExampleCase, StatementCase};

mod config;
pub use config::{Config, ConfigError};

pub mod label_expression;
pub use label_expression::{ExpressionError, LabelExpression};

pub mod labels;

pub mod template;
