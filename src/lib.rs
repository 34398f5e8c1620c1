//! Collapser - Template-resolution engine for annotated manuscripts
//!
//! This crate re-exports all layers of the collapser system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: collapser_confirm    — Interactive variant review, confirmation store
//! Layer 2: collapser_engine     — Variables, macros, control sequences, collapse
//! Layer 1: collapser_lexer      — Bracket-DSL tokens and token streams
//! Layer 0: collapser_foundation — Errors, spans, source mapping
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use collapser_confirm as confirm;
pub use collapser_engine as engine;
pub use collapser_foundation as foundation;
pub use collapser_lexer as lexer;
