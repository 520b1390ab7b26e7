//! Infers flattened field lists from JSON documents and re-shapes documents
//! with path-based mapping rules.
//!
//! The crate has three parts, meant to be used as a pipeline:
//!
//! 1. The [`Analyzer`] walks a document and describes every reachable location
//!    as a [`Field`]: a path such as `items[0].name`, a type tag such as
//!    `string` or `array<object>`, and a few convenience flags.
//! 2. [`check`] tells whether a value of one field's type can be written into
//!    another field. Its [`Verdict`] is advisory only.
//! 3. [`apply`] builds a new document from an ordered list of
//!    [`MappingRule`]s, each reading a source path, optionally running a
//!    [`Transformation`], and writing a target path.
//!
//! If you are looking to use this package as a CLI tool or HTTP service, see
//! the `json-mapper` binary's `--help`.
//!
//! # Quick start
//!
//! ```
//! use json_mapper::{apply_mapping, parse_metadata, MappingRule};
//!
//! let text = r#"{"book":{"title":"Gatsby","author":{"name":"Fitzgerald"}}}"#;
//!
//! let entities = parse_metadata(text).unwrap();
//! let paths: Vec<_> = entities[0].fields.iter().map(|f| f.path.as_str()).collect();
//! assert_eq!(vec!["book", "book.title", "book.author", "book.author.name"], paths);
//!
//! let outcome = apply_mapping(text, &[
//!     MappingRule::new("book.title", "name"),
//!     MappingRule::new("book.author.name", "creator.fullName"),
//!     MappingRule::new("book.isbn", "isbn"),
//! ]).unwrap();
//!
//! assert_eq!(
//!     serde_json::json!({"name":"Gatsby","creator":{"fullName":"Fitzgerald"}}),
//!     outcome.result,
//! );
//!
//! // The rule with a missing source is reported, not fatal.
//! assert_eq!(2, outcome.warnings[0].rule);
//! ```

mod analyzer;
mod catalog;
mod compat;
mod engine;
mod error;
mod fetch;
mod field;
mod field_type;
mod path;
mod session;
mod transform;

pub mod serve;

pub use crate::analyzer::{Analyzer, DEFAULT_MAX_DEPTH};
pub use crate::catalog::{target_entities, target_field};
pub use crate::compat::{check, check_types, Verdict};
pub use crate::engine::{
    apply, check_rules, MappingOutcome, MappingRule, RuleCheck, RuleReport, RuleWarning,
    WarningKind,
};
pub use crate::error::{Error, Result};
pub use crate::fetch::{fetch_metadata, FetchError};
pub use crate::field::{Entity, Field};
pub use crate::field_type::FieldType;
pub use crate::path::{Path, PathError, Segment, MAX_WRITE_INDEX};
pub use crate::session::Session;
pub use crate::transform::{Converter, TransformError, Transformation};

use serde_json::Value;

/// Parses document text and groups its fields into entities with the default
/// [`Analyzer`].
pub fn parse_metadata(text: &str) -> Result<Vec<Entity>> {
    let document: Value = serde_json::from_str(text)?;
    Ok(Analyzer::default().group_into_entities(&document))
}

/// Checks two fields for compatibility. Never fails.
pub fn validate_mapping(source: &Field, target: &Field) -> Verdict {
    check(source, target)
}

/// Parses document text and applies `rules` to it.
///
/// Only malformed text is an error. Rules that cannot be applied are listed in
/// the outcome's warnings.
pub fn apply_mapping(text: &str, rules: &[MappingRule]) -> Result<MappingOutcome> {
    let document: Value = serde_json::from_str(text)?;
    Ok(apply(&document, rules))
}
