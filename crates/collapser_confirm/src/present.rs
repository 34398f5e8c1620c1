//! Terminal presentation of a variant in its surrounding context.
//!
//! Raw manuscript text is unfit for a review prompt: it still carries
//! comments, macro and variable declarations, smart quotes, and
//! half-open bracket sequences at the excerpt edges. The helpers here
//! scrub all that, wrap the result to the terminal width, and draw
//! carets marking where the candidate text sits.

use std::sync::LazyLock;

use regex::Regex;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#%].*\n").expect("comment pattern"));
static TRAILING_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\n").expect("trailing whitespace pattern"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank lines pattern"));
static PARA_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\{pp\}\s*").expect("paragraph break pattern"));
static DOUBLE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"  +").expect("double space pattern"));

/// Scrubs a raw excerpt for display: comments, declarations, smart
/// quotes, and partial bracket sequences at either edge all go.
#[must_use]
pub fn clean_for_terminal(text: &str) -> String {
    let text = COMMENT_RE.replace_all(text, "\n");
    let text = TRAILING_WS_RE.replace_all(&text, "\n\n");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    let text = fix_unicode(&text);
    let text = strip_macro_declarations(text);
    let mut text = strip_define_declarations(text);

    // A `]` before any `[` means the excerpt starts mid-sequence.
    let c_start = text.find('[');
    let c_end = text.find(']');
    if let Some(end) = c_end {
        if c_start.is_none_or(|start| end < start) {
            text = text[end + 1..].to_string();
        }
    }
    // And a trailing `[` past the last `]` means it ends mid-sequence.
    let l_start = text.rfind('[');
    let l_end = text.rfind(']');
    if let Some(start) = l_start {
        if l_end.is_none_or(|end| start > end) {
            text.truncate(start);
        }
    }
    text
}

/// Removes `[MACRO name][body]` pairs. A pair cut off by the excerpt
/// edge truncates the text at the point it began.
fn strip_macro_declarations(mut text: String) -> String {
    while let Some(pos) = text.find("[MACRO") {
        let Some(def_end) = text[pos..].find(']').map(|p| pos + p) else {
            text.truncate(pos);
            break;
        };
        let Some(body_end) = text[def_end + 1..].find(']').map(|p| def_end + 1 + p) else {
            text.truncate(pos);
            break;
        };
        let tail = text[body_end + 1..].to_string();
        text.truncate(pos);
        text.push_str(&tail);
    }
    text
}

/// Removes `[DEFINE ...]` declarations along with the character that
/// preceded each one (normally the space or newline joining it to the
/// surrounding prose).
fn strip_define_declarations(mut text: String) -> String {
    let mut from = 0;
    while let Some(pos) = text[from..].find("[DEFINE").map(|p| from + p) {
        if let Some(end) = text[pos..].find(']').map(|p| pos + p) {
            let cut = if pos > 0 {
                floor_char_boundary(&text, pos - 1)
            } else {
                0
            };
            let tail = text[end + 1..].to_string();
            text.truncate(cut);
            text.push_str(&tail);
        }
        from = pos + 1;
        if from >= text.len() {
            break;
        }
        from = floor_char_boundary(&text, from);
    }
    text
}

/// Replaces smart quotes with their ASCII equivalents and turns `{pp}`
/// paragraph markers into blank lines.
#[must_use]
pub fn fix_unicode(text: &str) -> String {
    let text = text
        .replace(['\u{2019}', '\u{2018}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"");
    PARA_BREAK_RE.replace_all(&text, "\n\n").into_owned()
}

/// Collapses runs of spaces to a single space.
#[must_use]
pub fn fix_spacing(text: &str) -> String {
    DOUBLE_SPACE_RE.replace_all(text, " ").into_owned()
}

/// Greedy word wrap, line by line. Each input line becomes one or more
/// output lines, each ending in a newline.
#[must_use]
pub fn wrap(text: &str, width: usize) -> String {
    let mut output = String::new();
    for line in text.split('\n') {
        let mut filled = String::new();
        let mut line_len = 0;
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > width {
                filled.push('\n');
                line_len = 0;
            } else if line_len > 0 {
                filled.push(' ');
                line_len += 1;
            }
            filled.push_str(word);
            line_len += word_len;
        }
        output.push_str(&filled);
        output.push('\n');
    }
    output
}

/// Elides the middle of a very long candidate so the excerpt stays
/// readable, keeping the opening and closing stretches.
#[must_use]
pub fn summarize_if_necessary(variant: &str, width: usize) -> String {
    if variant.len() <= width * 5 {
        return variant.to_string();
    }
    let head_end = floor_char_boundary(variant, (width * 2).min(variant.len()));
    let tail_from = floor_char_boundary(variant, variant.len().saturating_sub(width * 2));
    let (Some(start), Some(end)) = (
        variant[..head_end].rfind(' '),
        variant[tail_from..].find(' ').map(|p| tail_from + p),
    ) else {
        return variant.to_string();
    };
    format!("{}.... ... ....{}", &variant[..start], &variant[end..])
}

/// The `count` bytes of text ending just before `pos`.
#[must_use]
pub fn chars_before(text: &str, pos: usize, count: usize) -> &str {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    let start = floor_char_boundary(text, pos.saturating_sub(count));
    &text[start..pos]
}

/// The `count` bytes of text starting just after `pos` (the character
/// at `pos` itself is excluded).
#[must_use]
pub fn chars_after(text: &str, pos: usize, count: usize) -> &str {
    if pos + 1 >= text.len() {
        return "";
    }
    let start = floor_char_boundary(text, pos + 1);
    let end = floor_char_boundary(text, (start + count).min(text.len()));
    &text[start..end]
}

/// Keeps the trailing (before-context) or leading (after-context) `len`
/// bytes of a snippet.
#[must_use]
pub fn clip(text: &str, is_before: bool, len: usize) -> &str {
    if is_before {
        &text[floor_char_boundary(text, text.len().saturating_sub(len))..]
    } else {
        &text[..floor_char_boundary(text, len.min(text.len()))]
    }
}

/// Assembles the final review excerpt: context, candidate, context,
/// wrapped to the terminal and decorated with carets marking the span
/// the candidate occupies.
#[must_use]
pub fn render_variant(
    trunc_start: &str,
    pre: &str,
    variant: &str,
    post: &str,
    trunc_end: &str,
    max_line_length: usize,
) -> String {
    let variant = fix_spacing(variant);
    let variant = fix_unicode(&variant);
    let variant = summarize_if_necessary(&variant, max_line_length);

    let rendered = format!("{trunc_start}{pre}{variant}{post}{trunc_end}");
    let rendered = fix_spacing(&rendered);
    let wrapped = wrap(&rendered, max_line_length);

    let start_pos = trunc_start.len() + pre.len();
    let prev_nl = find_previous(&wrapped, '\n', start_pos);
    let num_spaces = start_pos.saturating_sub(prev_nl);
    let tail_len = variant.len() + post.len() + trunc_end.len();
    if num_spaces + tail_len < max_line_length && !post.contains('\n') {
        place_single_line_caret(wrapped, &variant, num_spaces)
    } else {
        let wrapped = place_caret_above(wrapped, prev_nl, num_spaces);
        place_caret_below(wrapped, post, trunc_end)
    }
}

/// Position just past the last `needle` before `pos`, or 0.
fn find_previous(text: &str, needle: char, pos: usize) -> usize {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    text[..pos].rfind(needle).map_or(0, |p| p + 1)
}

fn place_single_line_caret(wrapped: String, variant: &str, num_spaces: usize) -> String {
    let spaces = " ".repeat(num_spaces);
    let between = " ".repeat(variant.len().saturating_sub(2));
    format!("{wrapped}{spaces}^{between}^\n")
}

fn place_caret_above(wrapped: String, prev_nl: usize, num_spaces: usize) -> String {
    let spaces = " ".repeat(num_spaces);
    if prev_nl == 0 {
        return format!("{spaces}v\n{wrapped}");
    }
    format!(
        "{}\n{spaces}v{}",
        &wrapped[..prev_nl - 1],
        &wrapped[prev_nl - 1..]
    )
}

fn place_caret_below(wrapped: String, post: &str, trunc_end: &str) -> String {
    let Some(end_variant_pos) = wrapped
        .len()
        .checked_sub(post.len() + trunc_end.len() + 2)
    else {
        return wrapped;
    };
    let end_variant_pos = floor_char_boundary(&wrapped, end_variant_pos);
    let bytes = wrapped.as_bytes();
    let variant_ends_with_newline = bytes.get(end_variant_pos) == Some(&b'\n');
    let char_after_is_newline = bytes.get(end_variant_pos + 1) == Some(&b'\n');

    let (pivot, previous_newline_pos) = if char_after_is_newline {
        (
            end_variant_pos + 2,
            find_previous(&wrapped, '\n', end_variant_pos + 1),
        )
    } else {
        let pivot = wrapped[end_variant_pos..]
            .find('\n')
            .map_or(wrapped.len(), |p| end_variant_pos + p + 1);
        let prev = if variant_ends_with_newline {
            end_variant_pos
        } else {
            find_previous(&wrapped, '\n', end_variant_pos + 2)
        };
        (pivot, prev)
    };

    let spaces = if end_variant_pos < previous_newline_pos {
        String::new()
    } else {
        let run = " ".repeat(end_variant_pos - previous_newline_pos);
        if variant_ends_with_newline {
            format!("\n{run}")
        } else {
            run
        }
    };

    let pivot = floor_char_boundary(&wrapped, pivot.min(wrapped.len()));
    format!("{}{spaces}^\n{}", &wrapped[..pivot], &wrapped[pivot..])
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}
