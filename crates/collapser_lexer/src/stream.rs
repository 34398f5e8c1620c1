//! Cursors over lexed tokens.
//!
//! [`TokenStream`] walks a token vector chunk by chunk: either a single
//! narrative text token, or one complete control sequence from `[` to
//! `]`. [`SequenceStream`] pre-collects only the control sequences and
//! adds lookahead/lookbehind, which the confirmation subsystem uses to
//! substitute neighboring variants into context excerpts.

use collapser_foundation::{Error, Result};

use crate::token::{Token, TokenKind};

/// Cursor yielding text chunks and whole control sequences.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
    last_end: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a stream over the given tokens.
    #[must_use]
    pub const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            last_end: 0,
        }
    }

    /// Returns true if the chunk most recently returned was plain text.
    #[must_use]
    pub fn was_text(&self) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].is_text()
    }

    /// Byte offset of the `]` closing the most recent control sequence.
    #[must_use]
    pub const fn last_end(&self) -> usize {
        self.last_end
    }

    /// Returns the next chunk: a one-token text slice, or a complete
    /// `[` .. `]` slice including both brackets.
    ///
    /// # Errors
    ///
    /// Returns an error when a token that belongs inside a control
    /// sequence appears at the top level.
    pub fn next_chunk(&mut self) -> Result<Option<&'a [Token]>> {
        let Some(tok) = self.tokens.get(self.pos) else {
            return Ok(None);
        };
        if tok.is_text() {
            let chunk = &self.tokens[self.pos..=self.pos];
            self.pos += 1;
            return Ok(Some(chunk));
        }
        if matches!(tok.kind, TokenKind::CtrlBegin) {
            let start = self.pos;
            let mut end = self.pos + 1;
            while end < self.tokens.len() && !matches!(self.tokens[end].kind, TokenKind::CtrlEnd) {
                end += 1;
            }
            if end >= self.tokens.len() {
                // The lexer guarantees matched brackets.
                return Err(Error::internal("control sequence missing its CTRLEND token"));
            }
            self.last_end = self.tokens[end].span.start;
            self.pos = end + 1;
            return Ok(Some(&self.tokens[start..=end]));
        }
        Err(Error::parse(format!(
            "Unexpected token type found '{}'",
            tok.kind.name()
        )))
    }
}

/// Cursor over only the control sequences of a token vector, with
/// brackets stripped, plus the byte offset of each closing `]`.
pub struct SequenceStream<'a> {
    sequences: Vec<(&'a [Token], usize)>,
    pos: usize,
}

impl<'a> SequenceStream<'a> {
    /// Collects every control sequence in the token vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream finds a stray token.
    pub fn new(tokens: &'a [Token]) -> Result<Self> {
        let mut stream = TokenStream::new(tokens);
        let mut sequences = Vec::new();
        while let Some(chunk) = stream.next_chunk()? {
            if !stream.was_text() {
                let inner = &chunk[1..chunk.len() - 1];
                sequences.push((inner, stream.last_end()));
            }
        }
        Ok(Self { sequences, pos: 0 })
    }

    /// Returns the next sequence and advances the cursor.
    pub fn next_sequence(&mut self) -> Option<(&'a [Token], usize)> {
        let seq = self.sequences.get(self.pos).copied()?;
        self.pos += 1;
        Some(seq)
    }

    /// Returns the sequence `offset` places before the current one.
    #[must_use]
    pub fn preceding(&self, offset: usize) -> Option<(&'a [Token], usize)> {
        if self.pos <= offset + 1 {
            return None;
        }
        self.sequences.get(self.pos - 2 - offset).copied()
    }

    /// Returns the sequence `offset` places after the current one.
    #[must_use]
    pub fn following(&self, offset: usize) -> Option<(&'a [Token], usize)> {
        self.sequences.get(self.pos + offset).copied()
    }
}
