//! Integration tests for selection strategies.

use collapser_engine::{collapse, ParseParams, Strategy};

fn parse(text: &str, params: &ParseParams, seed: u64) -> String {
    collapse(text, text, params, seed).unwrap().text
}

fn author() -> ParseParams {
    ParseParams::new(Strategy::Author)
}

#[test]
fn author_takes_the_marked_alternative() {
    for seed in 0..10 {
        assert_eq!(parse("[A|B|C]", &author(), seed), "A");
        assert_eq!(parse("[^A|B|C]", &author(), seed), "A");
        assert_eq!(parse("[A|B|^C|D]", &author(), seed), "C");
        assert_eq!(parse("[A|^Z]", &author(), seed), "Z");
    }
}

#[test]
fn author_can_prefer_the_empty_alternative() {
    for seed in 0..10 {
        assert_eq!(parse("[A|^|C|D|E|F|G|H|I|J|K]", &author(), seed), "");
        assert_eq!(
            parse("The author prefers no [|flowery |disgusting ]adjectives.", &author(), seed),
            "The author prefers no adjectives."
        );
    }
}

#[test]
fn author_handles_optional_text() {
    for seed in 0..10 {
        assert_eq!(parse("A[^B]C", &author(), seed), "ABC");
        assert_eq!(parse("A[B]C", &author(), seed), "AC");
    }
}

#[test]
fn author_preference_overrides_probabilities() {
    let text = "[80>alpha|10>beta|10>^gamma]";
    let result = parse(text, &ParseParams::default(), 3);
    assert!(["alpha", "beta", "gamma"].contains(&result.as_str()));
    for seed in 0..10 {
        assert_eq!(parse(text, &author(), seed), "gamma");
    }
}

#[test]
fn author_prefers_blank_over_weighted_text() {
    let text = "[50> as mine|^]";
    let mut found: Vec<String> = Vec::new();
    for seed in 0..100 {
        let result = parse(text, &ParseParams::default(), seed);
        if !found.contains(&result) {
            found.push(result);
        }
    }
    assert!(found.contains(&" as mine".to_string()));
    assert!(found.contains(&String::new()));
    for seed in 0..10 {
        assert_eq!(parse(text, &author(), seed), "");
    }
}

#[test]
fn longest_and_shortest_take_extremes() {
    let text = "This is [so very super long|short] and that is [quick|such a laborious process].";
    let longest = ParseParams::new(Strategy::Longest);
    let shortest = ParseParams::new(Strategy::Shortest);
    for seed in 0..10 {
        assert_eq!(
            parse(text, &longest, seed),
            "This is so very super long and that is such a laborious process."
        );
        assert_eq!(parse(text, &shortest, seed), "This is short and that is quick.");
    }
}

#[test]
fn longest_spans_multiple_sequences() {
    let text = "[A|B|The longest possible option] is [A|definitely absolutely the longest|pretty long] and [this is the longest for sure|also pretty long, really|not so long].";
    let longest = ParseParams::new(Strategy::Longest);
    for seed in 0..10 {
        assert_eq!(
            parse(text, &longest, seed),
            "The longest possible option is definitely absolutely the longest and this is the longest for sure."
        );
    }
}

#[test]
fn length_strategies_steer_boolean_defines() {
    let text = "[DEFINE @alpha][DEFINE @beta]This is [@alpha>quite long|short] and this is [@beta>extremely long|small].";
    let longest = ParseParams::new(Strategy::Longest);
    let shortest = ParseParams::new(Strategy::Shortest);
    for seed in 0..10 {
        assert_eq!(
            parse(text, &longest, seed),
            "This is quite long and this is extremely long."
        );
        assert_eq!(
            parse(text, &shortest, seed),
            "This is short and this is small."
        );
    }
}

#[test]
fn pair_renders_from_the_same_option_space() {
    let text = "[one|two|three]";
    let pair = ParseParams::new(Strategy::Pair);
    for seed in 0..20 {
        let result = parse(text, &pair, seed);
        assert!(["one", "two", "three"].contains(&result.as_str()), "got '{result}'");
    }
}

#[test]
fn full_manuscript_author_rendition() {
    let text = "# A note about the scene.\n\
                [DEFINE ^@storm]\n\
                The night was [@storm>wild|calm]. {closer}\n\
                [MACRO closer][~Rain came later.]";
    for seed in 0..5 {
        assert_eq!(
            parse(text, &author(), seed),
            "\nThe night was wild. Rain came later.\n"
        );
    }
}
