//! Macro registration, expansion, and jump control flow.
//!
//! A `[MACRO name]` definition binds the next control sequence to
//! `name`; `{name}` or `$name` in rendered text re-renders it in
//! place. Sticky macros render once and repeat that first rendering.
//! `{JUMP label}` cuts everything up to a forward `[LABEL ...]`.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use collapser_foundation::{Error, Result};
use collapser_lexer::{Token, TokenKind, TokenStream};
use regex::Regex;

use crate::config::ParseParams;
use crate::context::ResolutionContext;
use crate::{ctrlseq, parse_error_at};

/// Expansions may nest this deep before we assume a macro cycle.
const MAX_MACRO_DEPTH: u32 = 6;

/// Codes passed through to the output renderer rather than expanded.
pub const FORMATTING_CODES: &[&str] = &[
    "section_break",
    "chapter",
    "part",
    "end_part_page",
    "verse",
    "verse_inline",
    "verse_inline_sc",
    "epigraph",
    "pp",
    "i",
    "b",
    "vspace",
    "sc",
    "scwide",
    "start_colophon",
    "finish_colophon",
    "url",
    "alternate_scene",
    "columns",
    "end_columns",
    "endmatter",
    "stars",
];

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[LABEL .*\]").expect("label pattern"));

/// Registered macro bodies and jump labels.
#[derive(Clone, Debug, Default)]
pub struct Macros {
    macros: HashMap<String, Vec<Token>>,
    sticky_originals: HashMap<String, Vec<Token>>,
    sticky_rendered: HashMap<String, String>,
    labels: HashSet<String>,
}

impl Macros {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a macro with this name is registered.
    #[must_use]
    pub fn is_macro(&self, key: &str) -> bool {
        self.macros.contains_key(key) || self.sticky_originals.contains_key(key)
    }

    /// Returns true when a label with this name is registered.
    #[must_use]
    pub fn is_label(&self, key: &str) -> bool {
        self.labels.contains(key)
    }

    /// Registers a jump label.
    pub fn define_label(&mut self, key: impl Into<String>) {
        self.labels.insert(key.into());
    }

    /// Registers a macro body.
    pub fn define_macro(&mut self, key: impl Into<String>, body: Vec<Token>, sticky: bool) {
        if sticky {
            self.sticky_originals.insert(key.into(), body);
        } else {
            self.macros.insert(key.into(), body);
        }
    }
}

/// Renders a macro by name, or `None` when no such macro exists.
/// Sticky macros memoize their first rendering.
///
/// # Errors
///
/// Returns an error when the macro body fails to render.
pub fn render_macro(
    key: &str,
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    source: &str,
) -> Result<Option<String>> {
    if let Some(text) = ctx.macros.sticky_rendered.get(key) {
        return Ok(Some(text.clone()));
    }
    if let Some(body) = ctx.macros.sticky_originals.get(key).cloned() {
        let rendered = ctrlseq::render(&body, params, ctx, source)?;
        ctx.macros
            .sticky_rendered
            .insert(key.to_string(), rendered.clone());
        return Ok(Some(rendered));
    }
    if let Some(body) = ctx.macros.macros.get(key).cloned() {
        return Ok(Some(ctrlseq::render(&body, params, ctx, source)?));
    }
    Ok(None)
}

/// Registers all macro definitions (removing them and their bodies
/// from the stream) and all labels (leaving them in place), returning
/// the remaining tokens.
///
/// # Errors
///
/// Returns an error for duplicate names or a macro definition not
/// followed by a control sequence.
pub fn handle_defs(
    tokens: &[Token],
    ctx: &mut ResolutionContext,
    source: &str,
) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut stream = TokenStream::new(tokens);
    while let Some(chunk) = stream.next_chunk()? {
        if stream.was_text() {
            output.extend_from_slice(chunk);
            continue;
        }
        match chunk.get(1).map(|t| &t.kind) {
            Some(TokenKind::Macro { sticky }) => {
                let sticky = *sticky;
                let key = match (chunk.len(), chunk.get(2).map(|t| &t.kind)) {
                    (4, Some(TokenKind::Text(name))) => name.to_lowercase(),
                    _ => {
                        return Err(parse_error_at(
                            source,
                            "MACRO must be followed by text.",
                            chunk[0].span.start,
                        ));
                    }
                };
                if ctx.macros.is_macro(&key) {
                    return Err(parse_error_at(
                        source,
                        format!("Macro '{key}' is defined twice."),
                        stream.last_end(),
                    ));
                }
                let body = stream.next_chunk()?;
                let Some(body) = body else {
                    return Err(parse_error_at(
                        source,
                        format!("Macro '{key}' must be immediately followed by a control sequence."),
                        stream.last_end(),
                    ));
                };
                if stream.was_text() {
                    return Err(parse_error_at(
                        source,
                        format!("Macro '{key}' must be immediately followed by a control sequence."),
                        stream.last_end(),
                    ));
                }
                let body = body[1..body.len() - 1].to_vec();
                ctx.macros.define_macro(key, body, sticky);
            }
            Some(TokenKind::Label) => {
                let key = match chunk.get(2).map(|t| &t.kind) {
                    Some(TokenKind::Text(name)) => name.to_lowercase(),
                    _ => {
                        return Err(parse_error_at(
                            source,
                            "LABEL must be followed by text.",
                            chunk[0].span.start,
                        ));
                    }
                };
                if ctx.macros.is_label(&key) {
                    return Err(parse_error_at(
                        source,
                        format!("Label '{key}' is defined twice."),
                        stream.last_end(),
                    ));
                }
                ctx.macros.define_label(key);
                output.extend_from_slice(chunk);
            }
            _ => output.extend_from_slice(chunk),
        }
    }
    Ok(output)
}

/// Removes macro definitions and their bodies without registering
/// anything. Used on the selection after registration ran on the full
/// manuscript.
///
/// # Errors
///
/// Returns an error when the stream contains a stray top-level token.
pub fn strip_macros(tokens: &[Token]) -> Result<Vec<Token>> {
    let mut output = Vec::new();
    let mut stream = TokenStream::new(tokens);
    while let Some(chunk) = stream.next_chunk()? {
        if stream.was_text()
            || !matches!(chunk.get(1).map(|t| &t.kind), Some(TokenKind::Macro { .. }))
        {
            output.extend_from_slice(chunk);
            continue;
        }
        // Skip the macro body too.
        stream.next_chunk()?;
    }
    Ok(output)
}

/// Finds the next macro invocation at or after `from`: `{multi word}`
/// or `$word`. Returns the byte range (start of the sigil, end at the
/// closing brace or one past the last word char).
///
/// With `partial` set, text cut off mid-macro yields `None` instead of
/// an error; excerpts are routinely truncated that way.
fn next_macro(text: &str, from: usize, partial: bool) -> Result<Option<(usize, usize)>> {
    let Some(rel) = text[from..].find(['{', '$']) else {
        return Ok(None);
    };
    let start = from + rel;
    let end = if text[start..].starts_with('{') {
        match text[start + 1..].find('}') {
            Some(rel_end) => start + 1 + rel_end,
            None => {
                if partial {
                    return Ok(None);
                }
                return Err(Error::expansion(format!(
                    "Incomplete macro sequence in text '{}'",
                    &text[from..]
                )));
            }
        }
    } else {
        let mut end = text.len();
        for (offset, ch) in text[start + 1..].char_indices() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                end = start + 1 + offset;
                break;
            }
        }
        end
    };
    if end - start == 1 {
        return Err(Error::expansion("Can't have empty macro sequence {}"));
    }
    Ok(Some((start, end)))
}

fn contains_macro(text: &str, partial: bool) -> bool {
    matches!(next_macro(text, 0, partial), Ok(Some(_)))
}

/// Expands every macro invocation and jump in the rendered text, then
/// strips any labels no jump consumed.
///
/// # Errors
///
/// Returns an error for unrecognized macros, malformed or backward
/// jumps, and suspected macro recursion.
pub fn expand(
    text: &str,
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    partial: bool,
    source: &str,
) -> Result<String> {
    let mut text = text.to_string();
    let mut start_pos = 0;
    let mut depth = 0u32;

    while let Some((start, end)) = next_macro(&text, start_pos, partial)? {
        start_pos = start;
        let name = text[start + 1..end].to_lowercase();

        if name.split(' ').next() == Some("jump") {
            text = handle_goto(&name, &text, start_pos, partial, ctx)?;
            continue;
        }

        let Some(rendered) = render_macro(&name, params, ctx, source)? else {
            // Not a macro; let formatting codes through untouched.
            let family = name.split('/').next().unwrap_or("");
            if !FORMATTING_CODES.contains(&family) {
                return Err(Error::expansion(format!("Unrecognized macro {{{name}}}")));
            }
            start_pos += 1;
            continue;
        };

        if contains_macro(&rendered, partial) {
            depth += 1;
        } else {
            depth = 0;
        }
        if depth > MAX_MACRO_DEPTH {
            return Err(Error::expansion("Possibly recursive macro loop near here"));
        }

        // The closing brace is consumed; the delimiter after a $word
        // invocation is not.
        let mut end_pos = end;
        if end_pos < text.len() && !text[end_pos..].starts_with('}') {
            end_pos -= 1;
        }
        let tail = text.get(end_pos + 1..).unwrap_or("");
        text = format!("{}{rendered}{tail}", &text[..start_pos]);
    }

    Ok(LABEL_RE.replace_all(&text, "").into_owned())
}

/// Processes one `{JUMP label}`: removes everything from the jump to
/// just past the matching label.
fn handle_goto(
    key: &str,
    text: &str,
    start_pos: usize,
    partial: bool,
    ctx: &ResolutionContext,
) -> Result<String> {
    let mut parts = key.split(' ');
    let label_id = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(id), None) => id.to_lowercase(),
        _ => {
            return Err(Error::expansion(format!(
                "Invalid GOTO: expected {{JUMP labelToJumpTo}}, found '{key}'"
            )));
        }
    };
    if !ctx.macros.is_label(&label_id) {
        return Err(Error::expansion(format!(
            "Invalid GOTO: labelId '{key}' is not defined."
        )));
    }
    let needle = format!("[label {label_id}]");
    let label_len = "[LABEL ]".len() + label_id.len();
    let lowered = text.to_ascii_lowercase();
    match lowered.get(start_pos..).and_then(|rest| rest.find(&needle)) {
        Some(rel) => {
            let after_label = start_pos + rel + label_len;
            let tail = text.get(after_label..).unwrap_or("");
            Ok(format!("{}{tail}", &text[..start_pos]))
        }
        None => {
            if !partial {
                return Err(Error::expansion(format!(
                    "Found {{JUMP {label_id}}} but no [LABEL {label_id}] after this point, \
                     probably because you're trying to jump backward (only forward jumps are allowed)."
                )));
            }
            // Truncated excerpt: drop the jump itself and move on.
            let tail = text.get(start_pos + label_len..).unwrap_or("");
            Ok(format!("{}{tail}", &text[..start_pos]))
        }
    }
}
