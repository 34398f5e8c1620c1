//! Lexing for annotated manuscript source.
//!
//! This crate provides:
//! - [`Token`] / [`TokenKind`] - Lexed tokens with spans
//! - [`Lexer`] - Converts source text into validated token vectors
//! - [`TokenStream`] / [`SequenceStream`] - Cursors over lexed tokens

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod lexer;
pub mod stream;
pub mod token;

pub use lexer::Lexer;
pub use stream::{SequenceStream, TokenStream};
pub use token::{Token, TokenKind};
