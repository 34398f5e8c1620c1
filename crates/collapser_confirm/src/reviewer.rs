//! The seam between the confirmation loop and whoever answers it.
//!
//! The session logic only needs something that can look at a rendered
//! presentation and hand back a [`Decision`]; wiring that through a
//! trait keeps the loop testable without a terminal attached.

use std::collections::VecDeque;

use collapser_foundation::{Error, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// What the reviewer wants done with the variant just shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Accept the variant; record it so it is never asked about again.
    Confirm,
    /// Leave it unconfirmed and move on.
    Skip,
    /// Show the same variant again with freshly rendered context.
    Regenerate,
    /// Stop asking for the rest of this session.
    Done,
    /// Abort the run after the store is saved.
    Abort,
}

/// Something that can review a variant presentation.
pub trait Reviewer {
    /// Shows the presentation and returns the reviewer's decision.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying input channel fails.
    fn review(&mut self, presentation: &str) -> Result<Decision>;
}

/// Interactive reviewer reading decisions from the terminal.
pub struct TerminalReviewer {
    editor: DefaultEditor,
}

impl TerminalReviewer {
    /// Creates a reviewer bound to the current terminal.
    ///
    /// # Errors
    ///
    /// Returns an error when the line editor cannot be initialized.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| Error::io(format!("initializing terminal input: {e}")))?;
        Ok(Self { editor })
    }
}

impl Reviewer for TerminalReviewer {
    fn review(&mut self, presentation: &str) -> Result<Decision> {
        println!("\n\n{presentation}");
        loop {
            let line = match self
                .editor
                .readline("\n1) Confirm, 2) Skip, 3) Regen, 4) Done Confirming, 5) Quit > ")
            {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    return Ok(Decision::Abort);
                }
                Err(e) => return Err(Error::io(format!("reading decision: {e}"))),
            };
            let decision = match line.trim() {
                "1" => {
                    println!(" >>> Confirmed.");
                    Decision::Confirm
                }
                "2" => {
                    println!(" >>> Skipping.");
                    Decision::Skip
                }
                "3" => {
                    println!(" >>> Regenerating.");
                    Decision::Regenerate
                }
                "4" => {
                    println!(" >>> Done Confirming.");
                    Decision::Done
                }
                "5" => {
                    println!(" >>> Quit.");
                    Decision::Abort
                }
                _ => continue,
            };
            return Ok(decision);
        }
    }
}

/// Scripted reviewer for tests: plays back queued decisions and keeps
/// every presentation it was shown.
pub struct MockReviewer {
    script: VecDeque<Decision>,
    /// Every presentation passed to [`Reviewer::review`], in order.
    pub seen: Vec<String>,
}

impl MockReviewer {
    /// Creates a reviewer that will answer with the given decisions.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: script.into_iter().collect(),
            seen: Vec::new(),
        }
    }
}

impl Reviewer for MockReviewer {
    fn review(&mut self, presentation: &str) -> Result<Decision> {
        self.seen.push(presentation.to_string());
        self.script
            .pop_front()
            .ok_or_else(|| Error::internal("scripted reviewer ran out of decisions"))
    }
}
