//! Integration tests for macro expansion and jump control flow.

mod jumps;
