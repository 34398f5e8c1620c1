//! The collapse pipeline: one annotated manuscript in, one fully
//! resolved permutation out.
//!
//! Registration always runs over the full manuscript so a selection
//! can reference variables and macros defined anywhere, then the
//! selection alone is rendered.

use collapser_foundation::Result;
use collapser_lexer::{Lexer, Token, TokenKind, TokenStream};

use crate::config::{ParseParams, Strategy};
use crate::context::ResolutionContext;
use crate::{ctrlseq, macros, variables};

/// One resolved permutation and the choices that produced it.
#[derive(Clone, Debug)]
pub struct Collapsed {
    /// The rendered text.
    pub text: String,
    /// The seed the pass was driven by.
    pub seed: u64,
    /// One line per variable group naming its chosen member.
    pub signature: String,
    /// Sorted names of all variables that ended up true.
    pub variables: Vec<String>,
}

/// Collapses `selected_text` (usually the whole of `full_text`) into a
/// single permutation under the given seed.
///
/// # Errors
///
/// Returns an error for any structural violation in the manuscript;
/// the first violation found aborts the pass.
pub fn collapse(
    full_text: &str,
    selected_text: &str,
    params: &ParseParams,
    seed: u64,
) -> Result<Collapsed> {
    let mut params = params.normalized();
    let tokens = Lexer::tokenize_all(full_text)?;

    // Longest/shortest ignore the seed for variable choices; they test
    // each group member and keep whichever moves the length furthest.
    if matches!(params.strategy, Strategy::Longest | Strategy::Shortest) {
        params.set_defines = defines_for_longest_shortest(&tokens, &params, full_text, seed)?;
    }

    let mut ctx = ResolutionContext::new(seed);
    variables::handle_defines(&tokens, &params, &mut ctx, full_text)?;
    macros::handle_defs(&tokens, &mut ctx, full_text)?;

    let selected_tokens = Lexer::tokenize_all(selected_text)?;
    let prepped = variables::strip_defines(&selected_tokens)?;
    let prepped = macros::strip_macros(&prepped)?;

    let rendered = process(&prepped, &params, &mut ctx, selected_text)?;
    let text = macros::expand(&rendered, &params, &mut ctx, false, selected_text)?;

    Ok(Collapsed {
        text,
        seed,
        signature: ctx.variables.signature(),
        variables: ctx.variables.active(),
    })
}

/// Renders a prepared token stream chunk by chunk, storing each control
/// sequence under its label (or a running id) for later review.
///
/// # Errors
///
/// Returns an error when any sequence fails to render.
pub fn process(
    tokens: &[Token],
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    source: &str,
) -> Result<String> {
    let mut output = String::new();
    ctx.stored.clear();
    ctx.chooser.reset_iter("ctrlSeqIds");
    ctx.discourse.reset();

    let mut stream = TokenStream::new(tokens);
    while let Some(chunk) = stream.next_chunk()? {
        if stream.was_text() {
            if let TokenKind::Text(text) = &chunk[0].kind {
                output.push_str(text);
            }
            continue;
        }
        let seq_id = match chunk.get(1).map(|t| &t.kind) {
            Some(TokenKind::CtrlSeqLabel(name)) => name.clone(),
            _ => ctx.chooser.iter("ctrlSeqIds").to_string(),
        };
        ctx.stored.insert(seq_id, chunk.to_vec());
        let rendered = ctrlseq::render(chunk, params, ctx, source)?;
        output.push_str(&rendered);
    }
    Ok(output)
}

/// Determines which variable in each group maximizes (or minimizes)
/// the rendered length, returning forced defines for the main pass.
fn defines_for_longest_shortest(
    tokens: &[Token],
    params: &ParseParams,
    source: &str,
    seed: u64,
) -> Result<Vec<String>> {
    let mut best_defines = Vec::new();
    let mut ctx = ResolutionContext::new(seed);
    let temp = variables::handle_defines(tokens, params, &mut ctx, source)?;
    let temp = macros::handle_defs(&temp, &mut ctx, source)?;
    let churn = u64::from(ctx.chooser.number(100_000));
    ctx.chooser.reseed(churn);

    let shortest = params.strategy == Strategy::Shortest;
    for group in ctx.variables.group_names() {
        let mut opts = ctx.variables.vars_in_group(&group);
        // A lone variable is tried both on and off.
        if opts.len() == 1 {
            opts.push(format!("^{}", opts[0]));
        }

        let mut best: Option<(usize, usize)> = None;
        for (pos, key) in opts.iter().enumerate() {
            ctx.variables.set_all(false);
            if !key.starts_with('^') {
                ctx.variables.set(key, true);
            }
            let rendered = process(&temp, params, &mut ctx, source)?;
            let expanded = macros::expand(&rendered, params, &mut ctx, false, source)?;
            let this_len = expanded.len();
            let better = match best {
                None => true,
                Some((len, _)) => {
                    if shortest {
                        this_len < len
                    } else {
                        this_len > len
                    }
                }
            };
            if better {
                best = Some((this_len, pos));
            }
        }
        if let Some((_, pos)) = best {
            best_defines.push(opts[pos].clone());
        }
    }
    Ok(best_defines)
}
