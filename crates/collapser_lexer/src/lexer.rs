//! Lexer for annotated manuscript source.
//!
//! The lexer converts source text into a validated stream of tokens.
//! Narrative text is a maximal run of characters outside the control
//! alphabet `[ ] | > @ ^ # ~ *`; everything else is structure. Keyword
//! tokens are recognized only when they begin at the current scan
//! position, so a `MACRO` buried mid-sentence stays narrative text.
//!
//! Validation happens during lexing: the first structural violation
//! aborts with an error carrying full source context.

use collapser_foundation::{Error, Result, SourceMap, Span};

use crate::token::{Token, TokenKind};

/// Lexer for annotated manuscript source.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// True while between `[` and `]`.
    in_ctrl_sequence: bool,
    /// True between a `DEFINE` keyword and the closing `]`.
    in_define: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            in_ctrl_sequence: false,
            in_define: false,
        }
    }

    /// Tokenizes the whole source, validating token adjacency as it goes.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found, with source context.
    pub fn tokenize_all(source: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens: Vec<Token> = Vec::new();
        while let Some(token) = lexer.next_token()? {
            lexer.validate(&tokens, &token)?;
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or `None` at end of input.
    ///
    /// Comments are consumed and never surface as tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for structural violations at the current position.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let Some(c) = self.peek_char() else {
                if self.in_ctrl_sequence {
                    let pos = self.source.rfind('[').unwrap_or(0);
                    return Err(self.error_at("No ending control sequence character", pos));
                }
                return Ok(None);
            };

            let start = self.position;
            let start_line = self.line;
            let start_column = self.column;

            let kind = match c {
                '[' => {
                    if self.rest[1..].starts_with(']') {
                        return Err(self.error_at("Empty control sequence", start));
                    }
                    if self.in_ctrl_sequence {
                        return Err(self.error_at("Illegal nested control sequence", start));
                    }
                    self.advance();
                    self.in_ctrl_sequence = true;
                    TokenKind::CtrlBegin
                }
                ']' => {
                    if !self.in_ctrl_sequence {
                        return Err(
                            self.error_at("Unmatched closing control sequence character", start)
                        );
                    }
                    self.advance();
                    self.in_ctrl_sequence = false;
                    self.in_define = false;
                    TokenKind::CtrlEnd
                }
                '|' => {
                    if !self.in_ctrl_sequence {
                        return Err(self.error_at("Divider symbol found outside [ ]", start));
                    }
                    self.advance();
                    TokenKind::Divider
                }
                '^' => {
                    self.advance();
                    TokenKind::Author
                }
                '~' => {
                    self.advance();
                    TokenKind::Always
                }
                '>' => {
                    // Reachable only when no NUMBER or VARIABLE consumed it.
                    return Err(self.error_at("Number op > appeared in unexpected spot", start));
                }
                '@' => self.scan_variable(start)?,
                '#' => {
                    self.scan_comment(start)?;
                    continue;
                }
                '*' => {
                    let Some(kind) = self.scan_ctrlseq_label(start)? else {
                        // A stray `*` matches no rule; skip it.
                        self.advance();
                        continue;
                    };
                    kind
                }
                c if c.is_ascii_digit() => self.scan_number_or_text(start)?,
                _ => self.scan_keyword_or_text(),
            };

            return Ok(Some(Token::new(
                kind,
                Span::new(start, self.position, start_line, start_column),
            )));
        }
    }

    /// Scans `@name` with an optional trailing `>` (consumed, not kept).
    fn scan_variable(&mut self, start: usize) -> Result<TokenKind> {
        self.advance(); // consume '@'
        if !self.peek_char().is_some_and(is_name_start) {
            return Err(self.error_at(
                "Variable op @ appeared but what came after was not recognized as a variable",
                start,
            ));
        }
        let name = self.scan_name();
        if self.peek_char() == Some('>') {
            self.advance();
        }
        Ok(TokenKind::Variable(name))
    }

    /// Scans `*name*`; returns `None` when the closing `*` never appears.
    fn scan_ctrlseq_label(&mut self, start: usize) -> Result<Option<TokenKind>> {
        let mut chars = self.rest.chars().skip(1);
        let Some(first) = chars.next() else {
            return Ok(None);
        };
        if !is_name_start(first) {
            return Ok(None);
        }
        for c in chars {
            if c == '*' {
                self.advance(); // opening '*'
                let name = self.scan_name();
                self.advance(); // closing '*'
                if !self.in_ctrl_sequence {
                    return Err(self.error_at(
                        format!(
                            "CtrlSeq labels not allowed except at the start of control sequences. '*{name}'"
                        ),
                        start,
                    ));
                }
                return Ok(Some(TokenKind::CtrlSeqLabel(name)));
            }
            if !is_name_char(c) {
                return Ok(None);
            }
        }
        Ok(None)
    }

    /// Consumes a `#` comment through its newline.
    fn scan_comment(&mut self, start: usize) -> Result<()> {
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
        if self.in_ctrl_sequence {
            let comment = &self.source[start..self.position];
            return Err(self.error_at(
                format!("Comments not allowed within control sequences. Comment was: '{comment}'"),
                start,
            ));
        }
        Ok(())
    }

    /// At a digit: `NN>` is a probability, a literal `100` is rejected,
    /// anything else is the start of narrative text.
    fn scan_number_or_text(&mut self, start: usize) -> Result<TokenKind> {
        let bytes = self.rest.as_bytes();
        if bytes.len() >= 3 && bytes[1].is_ascii_digit() && bytes[2] == b'>' {
            let value = self.rest[..2].parse::<u8>().map_err(|e| {
                Error::internal(format!("two-digit probability failed to parse: {e}"))
            })?;
            self.advance();
            self.advance();
            self.advance();
            return Ok(TokenKind::Number(value));
        }
        if bytes.len() >= 2 && bytes[1] == b'>' {
            let value = self.rest[..1].parse::<u8>().map_err(|e| {
                Error::internal(format!("one-digit probability failed to parse: {e}"))
            })?;
            self.advance();
            self.advance();
            return Ok(TokenKind::Number(value));
        }
        if self.rest.starts_with("100") {
            return Err(self.error_at("Don't use NUMBER 100, just do the thing.", start));
        }
        Ok(self.scan_text())
    }

    /// At an ordinary character: keywords first, then narrative text.
    fn scan_keyword_or_text(&mut self) -> TokenKind {
        if self.rest.starts_with("STICKY_MACRO") {
            self.advance_by("STICKY_MACRO".len());
            self.skip_keyword_whitespace();
            return TokenKind::Macro { sticky: true };
        }
        if self.rest.starts_with("MACRO") {
            self.advance_by("MACRO".len());
            self.skip_keyword_whitespace();
            return TokenKind::Macro { sticky: false };
        }
        if self.rest.starts_with("LABEL") {
            self.advance_by("LABEL".len());
            self.skip_keyword_whitespace();
            return TokenKind::Label;
        }
        if self.rest.starts_with("DEFINE") {
            self.advance_by("DEFINE".len());
            self.skip_keyword_whitespace();
            self.in_define = true;
            return TokenKind::Define;
        }
        self.scan_text()
    }

    /// Scans a maximal run of narrative text.
    fn scan_text(&mut self) -> TokenKind {
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if is_control_char(c) {
                break;
            }
            self.advance();
        }
        TokenKind::Text(self.source[start..self.position].to_string())
    }

    /// Scans a name: letters, digits, `_`, `-`.
    fn scan_name(&mut self) -> String {
        let start = self.position;
        while self.peek_char().is_some_and(is_name_char) {
            self.advance();
        }
        self.source[start..self.position].to_string()
    }

    /// Consumes whitespace trailing a keyword so the following text
    /// token starts at its first meaningful character.
    fn skip_keyword_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Advances past `count` bytes of ASCII (keywords only).
    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn error_at(&self, message: impl Into<String>, pos: usize) -> Error {
        Error::lex(message).with_context(SourceMap::new(self.source).context(pos))
    }

    /// Validates the new token against its predecessors.
    fn validate(&self, tokens: &[Token], tok: &Token) -> Result<()> {
        let prev = tokens.last();
        let penult = tokens.len().checked_sub(2).map(|i| &tokens[i]);

        if let Some(prev) = prev {
            let tok_is_marker = matches!(tok.kind, TokenKind::Author | TokenKind::Always);
            let prev_is_marker = matches!(prev.kind, TokenKind::Author | TokenKind::Always);
            if tok_is_marker && prev.is_text() {
                return Err(self.error_at(
                    format!("{} can only come at the start of a text", tok.kind.name()),
                    tok.span.start,
                ));
            }
            let before_valid = matches!(
                tok.kind,
                TokenKind::Text(_)
                    | TokenKind::Divider
                    | TokenKind::Variable(_)
                    | TokenKind::CtrlEnd
            );
            if prev_is_marker && !before_valid {
                return Err(self.error_at(
                    format!(
                        "Found '{}' but this is only allowed before TEXT, DIVIDER, VARIABLE, or CTRLEND",
                        tok.kind.name()
                    ),
                    tok.span.start,
                ));
            }
        }

        if matches!(tok.kind, TokenKind::Define)
            && !prev.is_some_and(|p| matches!(p.kind, TokenKind::CtrlBegin))
        {
            return Err(self.error_at(
                "DEFINE can only appear at the start of a control sequence.",
                tok.span.start,
            ));
        }

        if matches!(tok.kind, TokenKind::Variable(_))
            && !prev.is_some_and(|p| {
                matches!(
                    p.kind,
                    TokenKind::Define
                        | TokenKind::Author
                        | TokenKind::Number(_)
                        | TokenKind::CtrlBegin
                        | TokenKind::Divider
                        | TokenKind::CtrlSeqLabel(_)
                )
            })
        {
            return Err(self.error_at(
                "Found a @variable but in an unexpected spot.",
                tok.span.start,
            ));
        }

        if let Some(prev) = prev {
            if matches!(prev.kind, TokenKind::Define)
                && !matches!(
                    tok.kind,
                    TokenKind::Variable(_) | TokenKind::Author | TokenKind::Number(_)
                )
            {
                return Err(self.error_at(
                    "DEFINE must be followed by a variable name, as in [DEFINE @var].",
                    prev.span.start,
                ));
            }

            if matches!(tok.kind, TokenKind::Divider)
                && matches!(prev.kind, TokenKind::Number(_))
                && self.in_define
            {
                return Err(self.error_at(
                    "A divider can't immediately follow a number within a define.",
                    tok.span.start,
                ));
            }

            if self.in_ctrl_sequence
                && matches!(tok.kind, TokenKind::Number(_))
                && matches!(prev.kind, TokenKind::Number(_))
            {
                return Err(self.error_at(
                    "Two numbers immediately following each other is invalid.",
                    tok.span.start,
                ));
            }

            if penult.is_some_and(|p| matches!(p.kind, TokenKind::CtrlBegin))
                && matches!(prev.kind, TokenKind::Variable(_))
                && matches!(tok.kind, TokenKind::CtrlEnd)
            {
                return Err(self.error_at(
                    "Can't have a standalone [@variable]: must show text to print if true, i.e. [@var>hello].",
                    tok.span.start,
                ));
            }

            if matches!(prev.kind, TokenKind::Macro { .. }) && !tok.is_text() {
                return Err(self.error_at("MACRO must be followed by text.", tok.span.start));
            }

            if matches!(prev.kind, TokenKind::Label) && !tok.is_text() {
                return Err(self.error_at("LABEL must be followed by text.", tok.span.start));
            }
        }

        if matches!(tok.kind, TokenKind::CtrlSeqLabel(_))
            && !prev.is_some_and(|p| matches!(p.kind, TokenKind::CtrlBegin))
        {
            return Err(self.error_at(
                "CTRLSEQ_LABEL can only appear as the first thing in a control sequence.",
                tok.span.start,
            ));
        }

        Ok(())
    }
}

/// Returns true for characters in the control alphabet.
const fn is_control_char(c: char) -> bool {
    matches!(c, '[' | ']' | '|' | '>' | '@' | '^' | '#' | '~' | '*')
}

/// Returns true if `c` can start a variable or label name.
const fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

/// Returns true if `c` can appear in a variable or label name.
const fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}
