//! Per-pass resolution state.

use std::collections::HashMap;

use collapser_lexer::Token;

use crate::chooser::Chooser;
use crate::discourse::DiscourseStats;
use crate::macros::Macros;
use crate::variables::Variables;

/// All mutable state for one collapse pass.
///
/// A fresh context is built for every pass; nothing leaks between
/// renderings of the same manuscript under different seeds.
pub struct ResolutionContext {
    /// Registered discourse variables and their groups.
    pub variables: Variables,
    /// Registered macros and jump labels.
    pub macros: Macros,
    /// Seeded source of all random draws.
    pub chooser: Chooser,
    /// Control sequences seen so far, keyed by sequence label or a
    /// running counter. The confirmation subsystem reads these back.
    pub stored: HashMap<String, Vec<Token>>,
    /// Counters tracking how often each discourse flag changed a choice.
    pub discourse: DiscourseStats,
}

impl ResolutionContext {
    /// Creates a context whose random stream is derived from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            variables: Variables::new(),
            macros: Macros::new(),
            chooser: Chooser::new(seed),
            stored: HashMap::new(),
            discourse: DiscourseStats::default(),
        }
    }

    /// The seed this context was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.chooser.seed()
    }
}
