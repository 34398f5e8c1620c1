//! Discourse-variable scoring.
//!
//! When the manuscript defines style flags (`@wordy`, `@slang`,
//! `@avoidme`, ...) and a flag is true for this pass, eligible choices
//! are nudged toward candidates matching the active style instead of
//! drawn uniformly. This keeps one rendering's narrator consistent.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::ResolutionContext;
use crate::ctrlseq::Alts;

const POLARITY_CUTOFF: f64 = -0.35;
const SUBJECTIVITY_CUTOFF: f64 = 0.3;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern"));

static SLANG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(thing|things|stuff|okay|ok|cool|guys|dude|junk|sucks|sucked|whatever|wanna|gonna|gotta|dunno|kinda|whatcha|lemme|outta|gimme|ain't|yeah|yep|yup|actually|shit|shitty|fuck|fucking|fucked|till|little|nope|huh|uh|um|umm|ah|ahh|aha|aww|eh|er|eww|hey|hmm|uh-huh|wow|yay|lot|lots|tons|'em|weird|jet|poke)\b",
    )
    .expect("slang pattern")
});

static ME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(i|i'm|i'll|i'd|me|my|myself|mine)\b").expect("first-person pattern")
});

static SIMILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(like|as if)\b").expect("simile pattern"));

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{201c}.*\u{201d}").expect("quote pattern"));

/// Words counted as positive sentiment.
const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "wonderful", "beautiful", "lovely", "happy", "happily", "joy", "joyful",
    "bright", "warm", "hope", "hopeful", "love", "loved", "calm", "gentle", "safe", "better",
    "best", "glad", "laugh", "laughed", "smile", "smiled", "pleasant", "perfect", "comfort",
    "comfortable", "easy", "fine", "alive", "sweet", "soft", "kind", "luck", "lucky", "delight",
    "delighted", "relief", "relieved",
];

/// Words counted as negative sentiment.
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "awful", "terrible", "horrible", "hate", "hated", "dark", "cold", "dead", "death",
    "die", "dying", "fear", "afraid", "scared", "wrong", "worse", "worst", "lost", "alone",
    "lonely", "empty", "hopeless", "miserable", "pain", "painful", "hurt", "broken", "cruel",
    "grim", "dread", "despair", "rot", "rotting", "sick", "ugly", "bitter", "sad", "sadly",
    "sorrow", "grief", "never", "nothing", "gone",
];

/// Opinion markers counted toward subjectivity.
const SUBJECTIVE_WORDS: &[&str] = &[
    "think", "thought", "feel", "felt", "believe", "believed", "seem", "seemed", "maybe",
    "perhaps", "probably", "certainly", "surely", "obviously", "really", "very", "quite",
    "rather", "somehow", "wonder", "wondered", "guess", "guessed", "suppose", "supposed",
    "imagine", "imagined", "hope", "hoped", "wish", "wished", "must", "should",
];

/// Counters tracking how many times each discourse flag changed a
/// candidate's weight during a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct DiscourseStats {
    pub wordy: u32,
    pub succinct: u32,
    pub depressive: u32,
    pub optimist: u32,
    pub subjective: u32,
    pub objective: u32,
    pub bigwords: u32,
    pub slang: u32,
    pub formal: u32,
    pub alliteration: u32,
    pub noalliteration: u32,
    pub avoidme: u32,
    pub likesimile: u32,
    pub dislikesimile: u32,
    pub avoiddialogue: u32,
}

impl DiscourseStats {
    /// Zeroes all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ranks candidates against the active discourse flags and picks at
/// random among the best-ranked.
pub fn preferred(alts: &Alts, ctx: &mut ResolutionContext) -> String {
    let items = alts.items();
    let mut quality = vec![0i32; items.len()];
    let longest_len = alts.longest().len();
    let shortest_len = alts.shortest().len();

    let mut pos_of_biggest = 0usize;
    let mut biggest_word_len: Option<u32> = None;
    let mut skip_biggest = false;

    for (pos, item) in items.iter().enumerate() {
        if ctx.variables.check("wordy") {
            if item.text.len() == longest_len && item.text.len() > 30 {
                ctx.discourse.wordy += 1;
                quality[pos] += 1;
            }
        } else if ctx.variables.check("succinct") && item.text.len() == shortest_len {
            ctx.discourse.succinct += 1;
            quality[pos] += 1;
        }

        if ctx.variables.check("bigwords") {
            let word_len = avg_word_len(&item.text);
            if word_len <= 2 {
                skip_biggest = true;
            } else if biggest_word_len.is_none_or(|best| word_len > best) {
                pos_of_biggest = pos;
                biggest_word_len = Some(word_len);
            }
        }

        if ctx.variables.check("slang") || ctx.variables.check("formal") {
            let slanginess = count_slang(&item.text);
            if slanginess > 0 {
                if ctx.variables.check("slang") {
                    ctx.discourse.slang += 1;
                    quality[pos] += 1;
                } else {
                    ctx.discourse.formal += 1;
                    quality[pos] -= 1;
                }
            }
        }

        if ctx.variables.check("alliteration") || ctx.variables.check("noalliteration") {
            let count = count_alliteration(&item.text);
            if count > 0 {
                if ctx.variables.check("alliteration") {
                    ctx.discourse.alliteration += 1;
                    quality[pos] += count;
                } else {
                    ctx.discourse.noalliteration += 1;
                    quality[pos] -= count;
                }
            }
        }

        if ctx.variables.check("avoidme") {
            let me_words = count_me_words(&item.text);
            if me_words > 0 {
                ctx.discourse.avoidme += 1;
                quality[pos] -= me_words;
            }
        }

        if ctx.variables.check("likesimile") || ctx.variables.check("dislikesimile") {
            let similes = count_similes(&item.text);
            if similes > 0 {
                // The word lists miss plenty of analogies, so the ones
                // caught weigh double.
                if ctx.variables.check("likesimile") {
                    ctx.discourse.likesimile += 1;
                    quality[pos] += 2;
                } else {
                    ctx.discourse.dislikesimile += 1;
                    quality[pos] -= 2;
                }
            }
        }

        if ctx.variables.check("avoiddialogue") && has_quoted_speech(&item.text) {
            ctx.discourse.avoiddialogue += 1;
            quality[pos] -= 1;
        }

        if ctx.variables.check("depressive")
            || ctx.variables.check("optimist")
            || ctx.variables.check("subjective")
            || ctx.variables.check("objective")
        {
            let (polarity, subjectivity) = sentiment(&item.text);
            if polarity <= POLARITY_CUTOFF {
                if ctx.variables.check("depressive") {
                    ctx.discourse.depressive += 1;
                    quality[pos] += 1;
                } else if ctx.variables.check("optimist") {
                    ctx.discourse.optimist += 1;
                    quality[pos] -= 1;
                }
            }
            if subjectivity > SUBJECTIVITY_CUTOFF {
                if ctx.variables.check("subjective") {
                    ctx.discourse.subjective += 1;
                    quality[pos] += 1;
                } else if ctx.variables.check("objective") {
                    ctx.discourse.objective += 1;
                    quality[pos] -= 1;
                }
            }
        }
    }

    if ctx.variables.check("bigwords") && !skip_biggest {
        if let Some(best) = biggest_word_len {
            if best > 7 {
                ctx.discourse.bigwords += 1;
                quality[pos_of_biggest] += 1;
            }
        }
    }

    let best = highest_positions(&quality);
    let selected = ctx.chooser.one_of(&best).copied().unwrap_or(0);
    items
        .get(selected)
        .map_or_else(String::new, |item| item.text.clone())
}

/// Positions of the highest value in the array, ties included.
fn highest_positions(quality: &[i32]) -> Vec<usize> {
    let mut best_rank = i32::MIN;
    let mut positions = Vec::new();
    for (pos, &rank) in quality.iter().enumerate() {
        if positions.is_empty() || rank > best_rank {
            best_rank = rank;
            positions = vec![pos];
        } else if rank == best_rank {
            positions.push(pos);
        }
    }
    positions
}

/// Integer average length of significant words (4+ chars). Texts still
/// carrying macros score 0 so unexpanded noise never wins.
fn avg_word_len(text: &str) -> u32 {
    if text.contains('{') {
        return 0;
    }
    let lengths: Vec<u32> = WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().chars().count())
        .filter(|&len| len >= 4)
        .map(|len| u32::try_from(len).unwrap_or(u32::MAX))
        .collect();
    if lengths.is_empty() {
        return 0;
    }
    lengths.iter().sum::<u32>() / u32::try_from(lengths.len()).unwrap_or(u32::MAX)
}

fn count_slang(text: &str) -> i32 {
    let text = normalize_quotes(text);
    count_matches(&SLANG_RE, &text)
}

fn count_me_words(text: &str) -> i32 {
    let text = normalize_quotes(text);
    count_matches(&ME_RE, &text)
}

fn count_similes(text: &str) -> i32 {
    count_matches(&SIMILE_RE, text)
}

fn has_quoted_speech(text: &str) -> bool {
    QUOTED_RE.is_match(text)
}

fn count_matches(re: &Regex, text: &str) -> i32 {
    i32::try_from(re.find_iter(text).count()).unwrap_or(i32::MAX)
}

fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{2018}', '\u{2019}'], "'")
}

/// Adjacent significant words sharing a first letter.
fn count_alliteration(text: &str) -> i32 {
    let text = text.to_lowercase();
    if text.contains('{') {
        return 0;
    }
    let mut count = 0;
    let mut last_first: Option<char> = None;
    for word in WORD_RE.find_iter(&text) {
        let word = word.as_str();
        if word.chars().count() < 4 {
            continue;
        }
        let first = word.chars().next();
        if first.is_some() && first == last_first {
            count += 1;
        }
        last_first = first;
    }
    count
}

/// Lexicon-based sentiment: polarity is the signed average over matched
/// sentiment words, subjectivity the share of opinionated words.
fn sentiment(text: &str) -> (f64, f64) {
    let lowered = normalize_quotes(&text.to_lowercase());
    let words: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return (0.0, 0.0);
    }
    let mut signed = 0i32;
    let mut polar = 0u32;
    let mut opinionated = 0u32;
    for word in &words {
        if POSITIVE_WORDS.contains(word) {
            signed += 1;
            polar += 1;
            opinionated += 1;
        } else if NEGATIVE_WORDS.contains(word) {
            signed -= 1;
            polar += 1;
            opinionated += 1;
        } else if SUBJECTIVE_WORDS.contains(word) {
            opinionated += 1;
        }
    }
    let polarity = if polar == 0 {
        0.0
    } else {
        f64::from(signed) / f64::from(polar)
    };
    let total = u32::try_from(words.len()).unwrap_or(u32::MAX);
    let subjectivity = f64::from(opinionated) / f64::from(total);
    (polarity, subjectivity)
}
