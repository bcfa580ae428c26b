//! # cmtdef — CMTCODE record definition reader
//!
//! Reads a flat, line-oriented definition file describing message/record types and
//! links it into a forest of nested entities, ready for an encode/decode code generator.
//!
//! ## File format
//!
//! - **Header**: `CMTCODE:<code> <label> PATH:<path> ParentCMTCODE:<parent|NULL>` opens an entity
//! - **Body**: `<tag> <description> <path> <M|O> <y|n> <type>` adds a field to the open entity
//! - Blank lines and lines starting with `#` are ignored; a leading byte-order mark is stripped
//!
//! A non-root entity is embedded into every field of its parent whose path equals the
//! entity's header path. Such a field is an *embedded set*: repeated instances of the
//! nested record rather than a scalar.
//!
//! ## Example
//!
//! ```text
//! CMTCODE:MSG1 v1 PATH:/root ParentCMTCODE:NULL
//! F1 Field1 /root/f1 M y int
//! F2 Field2 /root/group O n group
//! CMTCODE:GRP1 v1 PATH:/root/group ParentCMTCODE:MSG1
//! G1 Sub1 /root/group/g1 M n int
//! ```
//!
//! yields a single root `MSG1` whose field `F2` embeds `GRP1`.
//!
//! ## Ordering
//!
//! A parent must be declared before its children. Forward, unknown and self
//! references are errors, as are duplicate codes and duplicate tags within an entity.

pub mod ast;
pub mod dump;
pub mod error;
pub mod parser;
pub mod source;
pub mod tree;

use std::io::BufRead;
use std::path::Path;

use tracing::debug;

pub use ast::{DefForest, Entity, Field, Header, ParentCode, ROOT_SENTINEL};
pub use dump::{dump_forest, render_source};
pub use error::DefError;
pub use tree::build_tree;

fn build(lines: &[source::SourceLine]) -> Result<DefForest, DefError> {
    let entities = parser::parse_entities(lines)?;
    parser::validate_tags(&entities)?;
    let forest = build_tree(entities)?;
    debug!(roots = forest.len(), "definition forest built");
    Ok(forest)
}

/// Read and link a definition file. Returns the root entities keyed by code.
pub fn read_def_file(path: impl AsRef<Path>) -> Result<DefForest, DefError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading definition file");
    build(&source::read_file_lines(path)?)
}

pub fn read_def<R: BufRead>(reader: R) -> Result<DefForest, DefError> {
    build(&source::read_lines(reader)?)
}

pub fn parse_def(source: &str) -> Result<DefForest, DefError> {
    build(&source::lines_from_str(source))
}
