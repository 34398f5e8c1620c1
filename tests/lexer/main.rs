//! Integration tests for Layer 1: Lexer
//!
//! Tests for bracket-DSL tokenization, structural validation, and
//! lexer robustness on arbitrary input.

mod tokens;
