//! Integration tests for control-sequence alternations.

use collapser_engine::{collapse, ParseParams};

fn parse(text: &str, seed: u64) -> String {
    collapse(text, text, &ParseParams::default(), seed)
        .unwrap()
        .text
}

fn parse_err(text: &str) -> String {
    collapse(text, text, &ParseParams::default(), 1)
        .unwrap_err()
        .to_string()
}

/// Collapses the text across many seeds and checks that every option
/// appears at least once and nothing outside the option set ever does.
fn verify_each_is_found(options: &[&str], text: &str) {
    let mut found = vec![false; options.len()];
    for seed in 0..300 {
        let result = parse(text, seed);
        match options.iter().position(|o| *o == result) {
            Some(pos) => found[pos] = true,
            None => panic!("got '{result}', expected one of {options:?}"),
        }
        if found.iter().all(|f| *f) {
            return;
        }
    }
    let missing: Vec<&&str> = options
        .iter()
        .zip(&found)
        .filter(|(_, f)| !**f)
        .map(|(o, _)| o)
        .collect();
    panic!("never produced {missing:?} for '{text}'");
}

#[test]
fn alternations_produce_only_declared_options() {
    let options = ["We could be heroes.", "We could be villains."];
    for seed in 0..10 {
        let result = parse("We could be [heroes|villains].", seed);
        assert!(options.contains(&result.as_str()), "got '{result}'");
    }
}

#[test]
fn adjacent_sequences_combine() {
    let options = [
        "a1", "b1", "c1", "d1", "e1", "a2", "b2", "c2", "d2", "e2",
    ];
    for seed in 0..10 {
        let result = parse("[a|b|c|d|e][1|2]", seed);
        assert!(options.contains(&result.as_str()), "got '{result}'");
    }
}

#[test]
fn spacing_survives_selection() {
    let options = ["a .", "a ...", "aaa .", "aaa ..."];
    for seed in 0..10 {
        let result = parse("[a|aaa] [.|...]", seed);
        assert!(options.contains(&result.as_str()), "got '{result}'");
    }
}

#[test]
fn every_alternative_is_reachable() {
    verify_each_is_found(&["A", "B", "C"], "[A|B|C]");
}

#[test]
fn empty_alternatives_are_real_options() {
    verify_each_is_found(&["A", "B", ""], "[A|B|]");
    verify_each_is_found(&["A", "B", ""], "[A||B]");
    verify_each_is_found(&["A", "B", ""], "[|A|B]");
}

#[test]
fn empty_alternatives_in_running_prose() {
    let options = ["Let's go already.", "Let's go."];
    for seed in 0..10 {
        let result = parse("Let's go[ already].", seed);
        assert!(options.contains(&result.as_str()), "got '{result}'");
    }
    let options = ["She was charming.", "She was rather charming."];
    for seed in 0..10 {
        let result = parse("She was [rather |]charming.", seed);
        assert!(options.contains(&result.as_str()), "got '{result}'");
    }
}

#[test]
fn single_text_is_a_coin_flip() {
    verify_each_is_found(&["alpha beta gamma", "alpha gamma"], "alpha [beta ]gamma");
}

#[test]
fn always_text_always_renders() {
    for seed in 0..10 {
        assert_eq!(parse("[~alpha]", seed), "alpha");
    }
}

#[test]
fn always_marker_is_exclusive() {
    assert!(collapse("[~alpha|beta]", "[~alpha|beta]", &ParseParams::default(), 1).is_err());
}

#[test]
fn probabilities_cannot_exceed_100() {
    for seed in 0..10 {
        let result = parse("[50>alpha|50>omega]", seed);
        assert!(result == "alpha" || result == "omega");
    }
    assert_eq!(
        parse_err("[50>alpha|51>omega]"),
        "Probabilities in a group can't exceed 100: found 101 instead."
    );
    assert!(parse_err("[50>a|50>b|50>c|50>d|50>e]").starts_with("Probabilities in a group"));
}

#[test]
fn probability_skews_the_draw() {
    let mut times_a = 0;
    let mut times_b = 0;
    for seed in 0..100 {
        match parse("[90>alpha|10>beta]", seed).as_str() {
            "alpha" => times_a += 1,
            "beta" => times_b += 1,
            other => panic!("got '{other}'"),
        }
    }
    assert!(times_a > times_b, "{times_a} vs {times_b}");
}

#[test]
fn partial_probability_totals_can_render_blank() {
    verify_each_is_found(&["alpha", "beta", ""], "[25>alpha|35>beta]");
}

#[test]
fn blanks_can_carry_probabilities() {
    verify_each_is_found(&["", "pizza"], "[60>|40>pizza]");
    verify_each_is_found(&["", "pizza"], "[65>pizza|35>]");
}

#[test]
fn zero_probability_is_never_selected() {
    for seed in 0..250 {
        let result = parse("[99>alpha|1>gamma|0>beta]", seed);
        assert!(result == "alpha" || result == "gamma", "got '{result}'");
    }
    for seed in 0..250 {
        assert_eq!(
            parse("Test of [0>null ]probability.", seed),
            "Test of probability."
        );
    }
    for seed in 0..250 {
        assert_eq!(
            parse("[DEFINE 0>@never]This will [@never>certainly not ]appear.", seed),
            "This will appear."
        );
    }
}

#[test]
fn zero_weighted_branch_never_appears_among_others() {
    for seed in 0..250 {
        let result = parse("Alpha [50>acceptable |50>also acceptable |0>never okay ]beta.", seed);
        assert_ne!(result, "Alpha never okay beta.");
    }
}

#[test]
fn sequence_labels_do_not_interfere() {
    let result = parse("[*label*alpha|beta]", 3);
    assert!(result == "alpha" || result == "beta");

    let result = parse("[DEFINE @kalamazoo]Let's go to [*area*@kalamazoo>KZ|NY].", 3);
    assert!(result == "Let's go to KZ." || result == "Let's go to NY.");

    let result = parse("[*BigLongLabelWith25Numbers*10>A|40>B|C]", 3);
    assert!(["A", "B", "C"].contains(&result.as_str()));
}

#[test]
fn seed_fully_determines_the_output() {
    let text = "He was [tall|short], [50>laughed|50>scowled] often, and kept [cats|dogs|birds].";
    for seed in 0..25 {
        let first = parse(text, seed);
        assert_eq!(parse(text, seed), first);
    }
}
