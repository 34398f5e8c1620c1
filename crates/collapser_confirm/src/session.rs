//! The confirmation loop.
//!
//! Walks every control sequence in a prepared manuscript, shows each
//! unconfirmed one to the reviewer with all of its branches rendered
//! in context, and records the verdicts in the store. Confirmed keys
//! survive across sessions; everything else is asked about again next
//! time, capped at a handful of questions per run.

use std::mem;

use collapser_engine::ctrlseq::Item;
use collapser_engine::{ctrlseq, macros, ParseParams, ResolutionContext};
use collapser_foundation::{Error, Result, SourceMap};
use collapser_lexer::{SequenceStream, Token};

use crate::present;
use crate::reviewer::{Decision, Reviewer};
use crate::store::ConfirmStore;

/// New confirmations accepted before the session stops asking.
const MAX_PER_SESSION: u32 = 5;
/// Raw context gathered around a sequence before cleaning.
const DEFAULT_BUFFER_LEN: usize = 850;
/// Cleaned context kept on each side of the variant.
const FINAL_BUFFER_LEN: usize = 60;
/// Context folded into each sequence's identity key.
const KEY_PADDING_LEN: usize = 60;
/// Terminal width the excerpts are wrapped to.
const MAX_LINE_LENGTH: usize = 80;

/// Runs a confirmation pass over a prepared token stream.
///
/// The tokens must already have their DEFINE and MACRO declarations
/// registered in `ctx` and stripped, the same preparation a collapse
/// pass performs. Discourse scoring is disabled for the pass so every
/// branch renders verbatim.
///
/// # Errors
///
/// Returns an error when rendering fails, when the store cannot be
/// saved, or with an abort error when the reviewer quits. The store is
/// saved before the abort is reported.
pub fn process<R: Reviewer>(
    store: &mut ConfirmStore,
    reviewer: &mut R,
    params: &ParseParams,
    tokens: &[Token],
    source: &str,
    ctx: &mut ResolutionContext,
) -> Result<()> {
    let mut params = params.normalized();
    params.discourse_var_chance = 0;

    // An excerpt render never walks the whole manuscript, so prior
    // confirmations would otherwise be lost on save.
    if !params.only_show.is_empty() {
        store.reconfirm_all();
    }

    let mut session = Session {
        store,
        reviewer,
        params,
        source,
        ctx,
        counter: 0,
    };
    let mut seqs = SequenceStream::new(tokens)?;
    let mut aborted = false;
    while let Some((seq, end_pos)) = seqs.next_sequence() {
        match session.confirm_sequence(seq, &seqs, end_pos)? {
            Outcome::NewlyConfirmed => session.counter += 1,
            Outcome::Abort => aborted = true,
            Outcome::Unchanged | Outcome::CapReached => {}
        }
    }
    session.store.finish()?;
    if aborted {
        return Err(Error::aborted());
    }
    Ok(())
}

enum Outcome {
    NewlyConfirmed,
    Unchanged,
    CapReached,
    Abort,
}

struct Session<'a, R: Reviewer> {
    store: &'a mut ConfirmStore,
    reviewer: &'a mut R,
    params: ParseParams,
    source: &'a str,
    ctx: &'a mut ResolutionContext,
    counter: u32,
}

impl<R: Reviewer> Session<'_, R> {
    fn confirm_sequence(
        &mut self,
        seq: &[Token],
        seqs: &SequenceStream<'_>,
        end_pos: usize,
    ) -> Result<Outcome> {
        let start_pos = self.source[..end_pos].rfind('[').unwrap_or(0);
        let map = SourceMap::new(self.source);
        let filename = map.filename(start_pos);
        let original = &self.source[start_pos..=end_pos];
        let key = make_key(self.source, &filename, start_pos, end_pos, original);

        if self.store.is_confirmed(&key) {
            self.store.confirm(key);
            return Ok(Outcome::Unchanged);
        }
        if self.counter > MAX_PER_SESSION {
            return Ok(Outcome::CapReached);
        }

        let line = map.file_line(start_pos);
        let column = map.column(start_pos);
        let mut presentation = format!(
            "#################################################################\n\
             VARIANT FOUND IN {filename} LINE {line} COL {column}:\n\
             {original}\n\
             #################################################################\n"
        );
        let variants = ctrlseq::render_all(seq, &self.params, self.ctx, true, self.source)?;
        for item in variants.items() {
            presentation.push_str("************************************\n");
            presentation.push_str(&self.contextualized_variant(start_pos, end_pos, seqs, item)?);
            presentation.push('\n');
        }
        presentation.push_str("************************************");

        match self.reviewer.review(&presentation)? {
            Decision::Confirm => {
                self.store.confirm(key);
                Ok(Outcome::NewlyConfirmed)
            }
            Decision::Skip => Ok(Outcome::Unchanged),
            Decision::Regenerate => self.confirm_sequence(seq, seqs, end_pos),
            Decision::Done => {
                self.counter = MAX_PER_SESSION + 1;
                Ok(Outcome::Unchanged)
            }
            Decision::Abort => {
                self.counter = MAX_PER_SESSION + 1;
                Ok(Outcome::Abort)
            }
        }
    }

    /// Renders one branch inside its cleaned and wrapped surroundings.
    /// The branch's own variable is forced on for the render so text
    /// conditional on it stays consistent; everything is restored after.
    fn contextualized_variant(
        &mut self,
        start_pos: usize,
        end_pos: usize,
        seqs: &SequenceStream<'_>,
        item: &Item,
    ) -> Result<String> {
        let forced = item
            .from_variable
            .clone()
            .map_or_else(Vec::new, |var| vec![var]);
        let saved_defines = mem::replace(&mut self.params.set_defines, forced);
        let snapshot = self.ctx.variables.clone();
        self.ctx.variables.set_all(false);

        let result = self.build_excerpt(start_pos, end_pos, seqs, &item.text);

        self.params.set_defines = saved_defines;
        self.ctx.variables = snapshot;
        result
    }

    fn build_excerpt(
        &mut self,
        start_pos: usize,
        end_pos: usize,
        seqs: &SequenceStream<'_>,
        text: &str,
    ) -> Result<String> {
        let variant = macros::expand(text, &self.params, self.ctx, true, self.source)?;

        let pre = present::chars_before(self.source, start_pos, DEFAULT_BUFFER_LEN).to_string();
        let pre = self.clean_and_expand(&pre, true, DEFAULT_BUFFER_LEN)?;
        let pre = self.context_expansions(pre, seqs, false)?;
        let pre = self.clean_and_expand(&pre, true, FINAL_BUFFER_LEN)?;

        let post = present::chars_after(self.source, end_pos, DEFAULT_BUFFER_LEN).to_string();
        let post = self.clean_and_expand(&post, false, DEFAULT_BUFFER_LEN)?;
        let post = self.context_expansions(post, seqs, true)?;
        let post = self.clean_and_expand(&post, false, FINAL_BUFFER_LEN)?;

        Ok(present::render_variant(
            "...",
            &pre,
            &variant,
            &post,
            "...",
            MAX_LINE_LENGTH,
        ))
    }

    fn clean_and_expand(
        &mut self,
        snippet: &str,
        is_before: bool,
        buffer_len: usize,
    ) -> Result<String> {
        let snippet = present::clean_for_terminal(snippet);
        let snippet = macros::expand(&snippet, &self.params, self.ctx, true, self.source)?;
        let snippet = present::fix_spacing(&snippet);
        Ok(present::clip(&snippet, is_before, buffer_len).to_string())
    }

    /// Replaces each bracketed sequence still visible in a context
    /// snippet with one of its own rendered branches, working outward
    /// from the sequence under review.
    fn context_expansions(
        &mut self,
        mut snippet: String,
        seqs: &SequenceStream<'_>,
        is_after: bool,
    ) -> Result<String> {
        let mut offset = 0;
        loop {
            let neighbor = if is_after {
                seqs.following(offset)
            } else {
                seqs.preceding(offset)
            };
            let Some((neighbor_seq, _)) = neighbor else {
                break;
            };
            let start = if is_after {
                snippet.find('[')
            } else {
                snippet.rfind('[')
            };
            let Some(start) = start else {
                break;
            };
            let end = if is_after {
                snippet[start..]
                    .find(']')
                    .map_or(snippet.len(), |p| start + p)
            } else {
                match snippet.rfind(']') {
                    Some(end) if end >= start => end,
                    _ => break,
                }
            };

            let variants =
                ctrlseq::render_all(neighbor_seq, &self.params, self.ctx, true, self.source)?;
            let text = variants.by_from_variable(
                &self.params.set_defines,
                &mut self.ctx.variables,
                &mut self.ctx.chooser,
            );
            snippet = format!(
                "{}{}{}",
                &snippet[..start],
                text,
                snippet.get(end + 1..).unwrap_or("")
            );
            offset += 1;
        }
        Ok(snippet)
    }
}

/// Builds the sequence's identity key: filename, surrounding context,
/// and the sequence itself, reduced to alphanumerics so whitespace
/// reflow doesn't invalidate confirmations.
fn make_key(
    source: &str,
    filename: &str,
    start_pos: usize,
    end_pos: usize,
    original: &str,
) -> String {
    let pre = present::chars_before(source, start_pos, KEY_PADDING_LEN);
    let post = present::chars_after(source, end_pos, KEY_PADDING_LEN);
    format!("{filename}:{pre}{original}{post}")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
