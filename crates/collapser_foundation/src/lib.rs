//! Core support types for the Collapser engine.
//!
//! This crate provides:
//! - [`Span`] - Source positions recorded at lex time
//! - [`SourceMap`] - Mapping byte offsets back to `% file` chunks
//! - [`Error`] - Rich error types with source context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod source_map;
pub mod span;

pub use error::{Error, ErrorKind, Result, SourceContext};
pub use source_map::{FILE_MARKER, SourceMap};
pub use span::Span;
