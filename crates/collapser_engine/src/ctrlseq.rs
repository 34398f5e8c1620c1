//! Control-sequence rendering.
//!
//! A control sequence is everything between one `[` and its `]`. Its
//! tokens are gathered into an [`Alts`] collection of candidate texts,
//! and one candidate is selected according to the active strategy.

use std::fmt;

use collapser_foundation::{Error, Result};
use collapser_lexer::{Token, TokenKind};

use crate::chooser::Chooser;
use crate::config::{ParseParams, Strategy};
use crate::context::ResolutionContext;
use crate::variables::Variables;
use crate::{discourse, parse_error_at, variables};

/// Candidates longer than this never defer to the discourse scorer.
const MAX_CHARS_FOR_DISCOURSE_VARS: usize = 160;

/// One candidate text with its selection metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Item {
    /// The text this candidate would render as.
    pub text: String,
    /// Probability weight 1-99, when the author gave one.
    pub prob: Option<u8>,
    /// True when the author marked this candidate with `^`.
    pub author_preferred: bool,
    /// The variable this candidate is conditional on, when it came from
    /// a conditional sequence.
    pub from_variable: Option<String>,
}

impl Item {
    /// Creates a plain text candidate.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a candidate with an optional probability weight.
    #[must_use]
    pub fn with_prob(text: impl Into<String>, prob: Option<u8>) -> Self {
        Self {
            text: text.into(),
            prob,
            ..Self::default()
        }
    }

    /// Creates a candidate conditional on a variable.
    #[must_use]
    pub fn from_var(text: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from_variable: Some(var.into()),
            ..Self::default()
        }
    }
}

/// The outcome of a random selection.
pub enum Pick<'a> {
    /// A probability-weighted draw; the text is already resolved.
    Weighted(String),
    /// A uniform draw over the candidates.
    Uniform(&'a Item),
}

impl Pick<'_> {
    /// The selected text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Weighted(text) => text,
            Self::Uniform(item) => &item.text,
        }
    }
}

/// The candidate texts of one control sequence.
#[derive(Clone, Debug, Default)]
pub struct Alts {
    alts: Vec<Item>,
    author_preferred_pos: usize,
    probability_total: u32,
}

impl Alts {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate. Zero-probability candidates are dropped.
    pub fn add(&mut self, item: Item) {
        if item.prob == Some(0) {
            return;
        }
        if let Some(prob) = item.prob {
            self.probability_total += u32::from(prob);
        }
        self.alts.push(item);
    }

    /// Marks the next candidate added as the author-preferred one.
    pub fn set_author_preferred(&mut self) {
        self.author_preferred_pos = self.alts.len();
    }

    /// The candidates in order of appearance.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.alts
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alts.len()
    }

    /// True when no candidates were gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alts.is_empty()
    }

    /// The author-preferred candidate's text. Defaults to the first
    /// candidate when no `^` marker was seen.
    #[must_use]
    pub fn author_preferred(&self) -> &str {
        self.alts
            .get(self.author_preferred_pos)
            .or_else(|| self.alts.first())
            .map_or("", |item| item.text.as_str())
    }

    /// The longest candidate's text.
    #[must_use]
    pub fn longest(&self) -> &str {
        self.alts
            .iter()
            .max_by_key(|item| item.text.len())
            .map_or("", |item| item.text.as_str())
    }

    /// The shortest candidate's text.
    #[must_use]
    pub fn shortest(&self) -> &str {
        self.alts
            .iter()
            .min_by_key(|item| item.text.len())
            .map_or("", |item| item.text.as_str())
    }

    /// True when any candidate carries a probability weight.
    #[must_use]
    pub const fn has_probabilities(&self) -> bool {
        self.probability_total != 0
    }

    /// Sum of all probability weights.
    #[must_use]
    pub const fn probability_total(&self) -> u32 {
        self.probability_total
    }

    /// Selects a candidate at random: a weighted dartboard draw when
    /// probabilities are present, a uniform draw otherwise.
    pub fn random_pick(&self, chooser: &mut Chooser) -> Pick<'_> {
        if self.has_probabilities() {
            return Pick::Weighted(self.distributed_pick(chooser));
        }
        match chooser.one_of(&self.alts) {
            Some(item) => Pick::Uniform(item),
            None => Pick::Weighted(String::new()),
        }
    }

    /// Selects a candidate at random and returns only its text.
    pub fn random_text(&self, chooser: &mut Chooser) -> String {
        self.random_pick(chooser).text().to_string()
    }

    /// Weighted draw. An unweighted candidate acts as the remainder
    /// bucket; if the total falls short of 100 the draw can land on
    /// nothing and the sequence renders empty.
    fn distributed_pick(&self, chooser: &mut Chooser) -> String {
        let pick = chooser.number(100);
        let mut measure = 0;
        for item in &self.alts {
            let Some(prob) = item.prob else {
                return item.text.clone();
            };
            measure += u32::from(prob);
            if pick <= measure {
                return item.text.clone();
            }
        }
        String::new()
    }

    /// Selects the candidate whose source variable is already true or
    /// forced on. Falls back to a random pick, recording the decision
    /// in the variable store so later excerpts stay consistent.
    pub fn by_from_variable(
        &self,
        set_defines: &[String],
        vars: &mut Variables,
        chooser: &mut Chooser,
    ) -> String {
        for alt in &self.alts {
            if let Some(var) = &alt.from_variable {
                if set_defines.iter().any(|d| d == var) || vars.check(var) {
                    return alt.text.clone();
                }
            }
        }
        match self.random_pick(chooser) {
            Pick::Weighted(text) => text,
            Pick::Uniform(item) => {
                if let Some(var) = &item.from_variable {
                    vars.set(var, true);
                }
                item.text.clone()
            }
        }
    }
}

impl fmt::Display for Alts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .alts
            .iter()
            .enumerate()
            .map(|(pos, item)| {
                let marker = if pos == self.author_preferred_pos && pos > 0 {
                    "^"
                } else {
                    ""
                };
                match item.prob {
                    Some(prob) => format!("{prob}>{marker}{}", item.text),
                    None => format!("{marker}{}", item.text),
                }
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Renders one control sequence to its selected text.
///
/// Labels render as a `[LABEL name]` placeholder; they are consumed
/// later when jumps are processed.
///
/// # Errors
///
/// Returns an error when the sequence misuses variables or declares
/// more than 100% total probability.
pub fn render(
    tokens: &[Token],
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    source: &str,
) -> Result<String> {
    let mut tokens = tokens;
    if matches!(tokens.first().map(|t| &t.kind), Some(TokenKind::CtrlBegin)) {
        tokens = &tokens[1..tokens.len() - 1];
    }
    if matches!(tokens.first().map(|t| &t.kind), Some(TokenKind::Label)) {
        let Some(TokenKind::Text(name)) = tokens.get(1).map(|t| &t.kind) else {
            return Err(Error::internal("label sequence without a name"));
        };
        return Ok(format!("[LABEL {name}]"));
    }

    let alts = render_all(tokens, params, ctx, false, source)?;
    if alts.is_empty() {
        return Ok(String::new());
    }
    let rendered = match params.strategy {
        Strategy::Longest => alts.longest().to_string(),
        Strategy::Shortest => alts.shortest().to_string(),
        Strategy::Author => alts.author_preferred().to_string(),
        Strategy::Random | Strategy::Pair => {
            if alts.len() > 1
                && alts.longest().len() < MAX_CHARS_FOR_DISCOURSE_VARS
                && !alts.has_probabilities()
                && ctx.chooser.percent(params.discourse_var_chance)
            {
                discourse::preferred(&alts, ctx)
            } else {
                match alts.random_pick(&mut ctx.chooser) {
                    Pick::Weighted(text) => text,
                    Pick::Uniform(item) => {
                        if let Some(var) = &item.from_variable {
                            ctx.variables.set(var, true);
                        }
                        item.text.clone()
                    }
                }
            }
        }
    };
    Ok(rendered)
}

/// Gathers every candidate a control sequence could render as.
///
/// With `show_all_vars` set, conditional sequences yield one candidate
/// per variable branch instead of resolving against current values;
/// the confirmation subsystem uses this to review every branch.
///
/// # Errors
///
/// Returns an error for misplaced variables or probabilities over 100.
pub fn render_all(
    tokens: &[Token],
    params: &ParseParams,
    ctx: &mut ResolutionContext,
    show_all_vars: bool,
    source: &str,
) -> Result<Alts> {
    let mut alts = Alts::new();
    let mut tokens = tokens;
    if tokens.is_empty() {
        return Ok(alts);
    }

    // Sequence labels served their purpose during processing.
    if matches!(tokens[0].kind, TokenKind::CtrlSeqLabel(_)) {
        tokens = &tokens[1..];
    }

    if tokens.is_empty() {
        return Ok(alts);
    }

    if matches!(tokens[0].kind, TokenKind::Variable(_)) {
        if show_all_vars {
            for item in variables::render_all_variants(tokens, &ctx.variables)? {
                alts.add(item);
            }
        } else {
            let text = variables::render_conditional(tokens, params, &ctx.variables, source)?;
            alts.add(Item::new(text));
        }
    } else if tokens.len() == 1 && tokens[0].is_text() {
        // [text]: a coin flip between nothing and the text. The author
        // rendition never shows it.
        alts.add(Item::new(""));
        if params.strategy != Strategy::Author {
            if let TokenKind::Text(text) = &tokens[0].kind {
                alts.add(Item::new(text.clone()));
            }
        }
    } else if tokens.len() == 2
        && matches!(tokens[0].kind, TokenKind::Author)
        && tokens[1].is_text()
    {
        // [^text]: same coin flip, but the author rendition keeps it.
        if let TokenKind::Text(text) = &tokens[1].kind {
            alts.add(Item::new(text.clone()));
        }
        if params.strategy != Strategy::Author {
            alts.add(Item::new(""));
        }
    } else if tokens.len() == 2
        && matches!(tokens[0].kind, TokenKind::Always)
        && tokens[1].is_text()
    {
        if let TokenKind::Text(text) = &tokens[1].kind {
            alts.add(Item::new(text.clone()));
        }
    } else {
        for bits in tokens.split(|t| matches!(t.kind, TokenKind::Divider)) {
            let item = parse_item(bits, false, source)?;
            if item.author_preferred {
                alts.set_author_preferred();
            }
            alts.add(Item::with_prob(item.text, item.prob));
        }
        if alts.probability_total() > 100 {
            return Err(parse_error_at(
                source,
                format!(
                    "Probabilities in a group can't exceed 100: found {} instead.",
                    alts.probability_total()
                ),
                tokens[0].span.start,
            ));
        }
    }

    Ok(alts)
}

/// Parses one alternative's tokens (the bits between dividers) into an
/// [`Item`]: text or a variable name, an optional `^` marker, and an
/// optional probability.
pub(crate) fn parse_item(bits: &[Token], variables_allowed: bool, source: &str) -> Result<Item> {
    let mut item = Item::default();
    for token in bits {
        match &token.kind {
            TokenKind::Variable(name) if !variables_allowed => {
                return Err(parse_error_at(
                    source,
                    format!("Found unexpected variable '{name}'"),
                    token.span.start,
                ));
            }
            TokenKind::Text(text) => item.text = text.clone(),
            TokenKind::Variable(name) => {
                item.text = name.to_lowercase();
                item.from_variable = Some(name.clone());
            }
            TokenKind::Author => item.author_preferred = true,
            TokenKind::Number(prob) => item.prob = Some(*prob),
            TokenKind::Label => {}
            other => {
                return Err(parse_error_at(
                    source,
                    format!(
                        "Unhandled token {}: '{}'",
                        other.name(),
                        token.span.text(source)
                    ),
                    token.span.start,
                ));
            }
        }
    }
    Ok(item)
}
