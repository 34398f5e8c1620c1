//! Error types for the Collapser engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! The first violation found aborts the pass; there is no recovery.

use std::fmt;

use thiserror::Error;

/// Convenient result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Collapser operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where in the source the error occurred.
    pub context: Option<SourceContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds source context to this error.
    #[must_use]
    pub fn with_context(mut self, context: SourceContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a lexing error.
    #[must_use]
    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lex(message.into()))
    }

    /// Creates a parse/registration error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse(message.into()))
    }

    /// Creates a macro expansion error.
    #[must_use]
    pub fn expansion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expansion(message.into()))
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization(message.into()))
    }

    /// Creates an error indicating the reviewer aborted the run.
    #[must_use]
    pub fn aborted() -> Self {
        Self::new(ErrorKind::Aborted)
    }

    /// Creates an internal error (should not happen).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Renders a full terminal report for this error, pointing a caret
    /// at the offending column when source context is available.
    #[must_use]
    pub fn report(&self) -> String {
        let Some(ctx) = &self.context else {
            return format!("** {}", self.kind);
        };

        // Window long lines so the excerpt fits an 80-column terminal.
        let mut col = ctx.column;
        let mut line_text = ctx.line_text.clone();
        if col > 80 {
            if line_text.len() < 120 {
                line_text.push_str(&" ".repeat(40));
            }
            let lo = floor_boundary(&line_text, col - 40);
            let hi = floor_boundary(&line_text, col + 40);
            line_text = line_text[lo..hi].to_string();
            col = 40;
        } else if line_text.len() > 80 {
            line_text.truncate(floor_boundary(&line_text, 80));
        }

        let caret = format!("{}^", " ".repeat(col - 1 + 2));
        format!(
            "******************************************************\n \
             {} found a problem in {} line {} column {}:\n ** {}\n\n> {}\n{}",
            self.kind.stage(),
            ctx.file,
            ctx.line,
            ctx.column,
            self.kind,
            line_text,
            caret
        )
    }
}

/// Clamps `index` down to the nearest char boundary in `text`.
fn floor_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Structural violation found while lexing.
    #[error("{0}")]
    Lex(String),

    /// Violation found while registering symbols or rendering sequences.
    #[error("{0}")]
    Parse(String),

    /// Violation found while expanding macros or processing jumps.
    #[error("{0}")]
    Expansion(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The reviewer chose to abort; the run produces no output.
    #[error("aborted by reviewer")]
    Aborted,

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the pipeline stage name used in error reports.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Lex(_) => "Lexer",
            Self::Parse(_) | Self::Expansion(_) => "Parser",
            Self::Io(_) | Self::Serialization(_) => "Storage",
            Self::Aborted | Self::Internal(_) => "Collapser",
        }
    }
}

/// Where in the assembled source an error occurred.
///
/// Line numbers are relative to the `% file` chunk containing the
/// offending position, matching how authors navigate their manuscripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    /// Name of the source file chunk.
    pub file: String,
    /// 1-based line number within that file.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// The full text of the offending line.
    pub line_text: String,
}

impl SourceContext {
    /// Creates a new source context.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        line: usize,
        column: usize,
        line_text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            line_text: line_text.into(),
        }
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
