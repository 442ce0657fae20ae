//! Reading requirements documents from disk.
//!
//! The grammar is chosen by file extension: `.feature` files are parsed as
//! Gherkin and `.requirements` files as ReqsML.

use std::{
    io,
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use tracing::instrument;

use crate::{
    domain::{Document, Syntax},
    parsing::ParseError,
};

mod directory;
pub use directory::{discover, load_all};

/// Errors that can occur when loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid text.
    #[error("{} is not valid UTF-8 text", path.display())]
    Decode {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: FromUtf8Error,
    },

    /// The file's extension doesn't select a grammar.
    #[error("{} is not a .feature or .requirements file", path.display())]
    UnsupportedExtension {
        /// The file being read.
        path: PathBuf,
    },

    /// The file's contents don't conform to its grammar.
    #[error("{}: {source}", path.display())]
    Parse {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    /// The file the error relates to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Decode { path, .. }
            | Self::UnsupportedExtension { path }
            | Self::Parse { path, .. } => path,
        }
    }
}

/// Reads and parses the document at `path`.
///
/// # Errors
///
/// Returns an error if the extension is not recognised, the file cannot be
/// read or decoded, or its contents do not parse.
#[instrument(fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Document, LoadError> {
    let syntax = Syntax::from_path(path).ok_or_else(|| LoadError::UnsupportedExtension {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(?syntax, "selected grammar");

    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Document::parse(path, syntax, &text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
