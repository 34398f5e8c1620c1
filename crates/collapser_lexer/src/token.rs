//! Token types for annotated manuscript source.

use collapser_foundation::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this token is narrative text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text(_))
    }
}

/// Token types for annotated manuscript source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of narrative text (everything outside the control alphabet).
    Text(String),
    /// `[` opening a control sequence.
    CtrlBegin,
    /// `]` closing a control sequence.
    CtrlEnd,
    /// `|` separating alternatives.
    Divider,
    /// `^` marking the author-preferred alternative.
    Author,
    /// `~` marking always-printed text.
    Always,
    /// `@name` referencing a variable; a trailing `>` is consumed.
    Variable(String),
    /// `NN>` probability prefix, 0-99.
    Number(u8),
    /// The `DEFINE` keyword.
    Define,
    /// The `MACRO` or `STICKY_MACRO` keyword.
    Macro {
        /// True for `STICKY_MACRO`, whose first rendering is memoized.
        sticky: bool,
    },
    /// The `LABEL` keyword.
    Label,
    /// `*name*` naming a control sequence for later reuse.
    CtrlSeqLabel(String),
}

impl TokenKind {
    /// Returns the token type name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "TEXT",
            Self::CtrlBegin => "CTRLBEGIN",
            Self::CtrlEnd => "CTRLEND",
            Self::Divider => "DIVIDER",
            Self::Author => "AUTHOR",
            Self::Always => "ALWAYS",
            Self::Variable(_) => "VARIABLE",
            Self::Number(_) => "NUMBER",
            Self::Define => "DEFINE",
            Self::Macro { .. } => "MACRO",
            Self::Label => "LABEL",
            Self::CtrlSeqLabel(_) => "CTRLSEQ_LABEL",
        }
    }
}
