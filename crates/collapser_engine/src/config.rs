//! Rendering configuration.

use std::fmt;
use std::str::FromStr;

use collapser_foundation::Error;

/// How alternatives are selected when a control sequence is rendered.
///
/// `Pair` renders like `Random`; generating two divergent texts from
/// the same seed is the caller's policy, built on variable signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Seeded random selection, weighted by probabilities when present.
    #[default]
    Random,
    /// Always take the author-preferred alternative.
    Author,
    /// Take the alternative that maximizes output length.
    Longest,
    /// Take the alternative that minimizes output length.
    Shortest,
    /// Random selection intended for paired divergent generations.
    Pair,
}

impl Strategy {
    /// Returns the lowercase name of this strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Author => "author",
            Self::Longest => "longest",
            Self::Shortest => "shortest",
            Self::Pair => "pair",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "author" => Ok(Self::Author),
            "longest" => Ok(Self::Longest),
            "shortest" => Ok(Self::Shortest),
            "pair" => Ok(Self::Pair),
            other => Err(Error::parse(format!(
                "Unrecognized choose strategy '{other}'"
            ))),
        }
    }
}

/// Parameters governing a single collapse pass.
#[derive(Clone, Debug)]
pub struct ParseParams {
    /// Selection strategy for control sequences.
    pub strategy: Strategy,
    /// Variables to force during DEFINE resolution. A leading `^`
    /// forces the variable false instead of true.
    pub set_defines: Vec<String>,
    /// Percent chance (0-100) that an eligible choice defers to the
    /// discourse-variable scorer.
    pub discourse_var_chance: u8,
    /// Whether to run the interactive confirmation pass first.
    pub do_confirm: bool,
    /// When non-empty, only these files are being rendered; prior
    /// confirmations are carried forward wholesale.
    pub only_show: Vec<String>,
    /// Key identifying the input file set in the confirmation store.
    pub file_set_key: String,
}

impl ParseParams {
    /// Creates parameters with the given strategy and defaults.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Returns a copy with `set_defines` lowercased, preserving any
    /// leading `^` negation markers.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut params = self.clone();
        params.set_defines = params
            .set_defines
            .iter()
            .map(|d| d.to_lowercase())
            .collect();
        params
    }
}

impl Default for ParseParams {
    fn default() -> Self {
        Self {
            strategy: Strategy::Random,
            set_defines: Vec::new(),
            discourse_var_chance: 80,
            do_confirm: false,
            only_show: Vec::new(),
            file_set_key: String::new(),
        }
    }
}
