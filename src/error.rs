//! Errors raised while reading, parsing, or linking a definition file.

use std::path::PathBuf;

use thiserror::Error;

/// The first failure aborts the whole parse; there are no partial results.
#[derive(Debug, Error)]
pub enum DefError {
    #[error("failed to read definition file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read definition source: {0}")]
    Read(#[from] std::io::Error),

    #[error("the definition source is empty")]
    EmptySource,

    #[error("the definition source declares no entity")]
    NoEntities,

    #[error("line {line}: invalid header `{text}`: {reason}")]
    MalformedHeader {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("line {line}: invalid body `{text}`: {reason}")]
    MalformedBody {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("line {line}: body `{text}` appears before any CMTCODE header")]
    BodyBeforeHeader { line: usize, text: String },

    #[error("the tag {tag} is duplicated in {code}")]
    DuplicateTag { tag: String, code: String },

    #[error("the cmt code {code} is duplicated")]
    DuplicateCode { code: String },

    #[error("{code} names itself as its parent")]
    SelfParent { code: String },

    #[error("{code} references parent {parent}, which is declared later in the file")]
    ForwardParent { code: String, parent: String },

    #[error("{code} references unknown parent {parent}")]
    UnknownParent { code: String, parent: String },

    #[error("path {path} of {parent} is claimed by both {first} and {second}")]
    AmbiguousEmbedding {
        parent: String,
        path: String,
        first: String,
        second: String,
    },
}

impl DefError {
    /// Source line (1-based) the error points at, when it is tied to one line.
    pub fn line(&self) -> Option<usize> {
        match self {
            DefError::MalformedHeader { line, .. }
            | DefError::MalformedBody { line, .. }
            | DefError::BodyBeforeHeader { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DefError>;
