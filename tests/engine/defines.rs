//! Integration tests for variable groups and conditional text.

use collapser_engine::{collapse, Collapsed, ParseParams, Strategy};

fn parse(text: &str, seed: u64) -> String {
    go(text, &ParseParams::default(), seed).text
}

fn go(text: &str, params: &ParseParams, seed: u64) -> Collapsed {
    collapse(text, text, params, seed).unwrap()
}

fn author() -> ParseParams {
    ParseParams::new(Strategy::Author)
}

fn with_defines(defines: &[&str]) -> ParseParams {
    let mut params = ParseParams::default();
    params.set_defines = defines.iter().map(|d| (*d).to_string()).collect();
    params
}

fn is_err(text: &str) -> bool {
    collapse(text, text, &ParseParams::default(), 1).is_err()
}

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
    panic!("some options never appeared for '{text}'");
}

#[test]
fn defines_are_stripped_from_output() {
    let text =
        "[DEFINE @test1][DEFINE @test2]This is a test of [DEFINE @test3]stripping.[DEFINE   @test4]";
    assert_eq!(parse(text, 5), "This is a test of stripping.");
}

#[test]
fn simple_defines_set_randomly() {
    let mut found_on = false;
    let mut found_off = false;
    for seed in 0..100 {
        let out = go("[DEFINE @test]", &ParseParams::default(), seed);
        if out.variables.iter().any(|v| v == "test") {
            found_on = true;
        } else {
            found_off = true;
        }
        if found_on && found_off {
            return;
        }
    }
    panic!("single define never varied");
}

#[test]
fn author_rendition_honors_define_markers() {
    for seed in 0..20 {
        let out = go("[DEFINE ^@test]", &author(), seed);
        assert!(out.variables.contains(&"test".to_string()));

        let out = go("[DEFINE @test]", &author(), seed);
        assert!(out.variables.is_empty());

        let out = go("[DEFINE ^@test1][DEFINE @test2]", &author(), seed);
        assert_eq!(out.variables, vec!["test1".to_string()]);
    }
}

#[test]
fn author_rendition_with_probability_groups() {
    for seed in 0..20 {
        let out = go("A [DEFINE 80>@beta|20>^@barcelona] C", &author(), seed);
        assert!(out.variables.contains(&"barcelona".to_string()));
    }
}

#[test]
fn define_probabilities_must_sum_to_100() {
    assert!(is_err("[DEFINE 80>@A|19>@B]"));
    assert!(is_err("[DEFINE 80>@A|21>@B]"));
    assert!(is_err("[DEFINE 10>@A|15>@B|31>@D|38>@E|2>@F]"));
    assert_eq!(parse("[DEFINE 10>@A|15>@B|4>@C|31>@D|38>@E|2>@F]", 2), "");
}

#[test]
fn single_variable_probability_defines_are_fine() {
    verify_each_is_found(
        &["We say this.", "We say that."],
        "[DEFINE 45>@A]We say [@A>this|that].",
    );
}

#[test]
fn unweighted_groups_distribute_evenly() {
    verify_each_is_found(
        &[
            "I am a rather wordy person.",
            "I am a normal person.",
            "I am a quiet person.",
        ],
        "[DEFINE @wordy|@average|@taciturn]I am a [@wordy>rather wordy|@average>normal|@taciturn>quiet] person.",
    );
}

#[test]
fn variables_cannot_be_defined_twice() {
    assert!(is_err(
        "[DEFINE @alpha] Some text. [@alpha>Yes.] Some more. [DEFINE 80>@beta|20>@alpha]. Some final text."
    ));
    assert!(is_err("[DEFINE 25>@alpha|75>^@alpha]."));
}

#[test]
fn defines_can_come_after_first_use() {
    let text = "[@test>Test test.] Then stuff. [DEFINE ^@test]";
    assert_eq!(go(text, &author(), 1).text, "Test test. Then stuff. ");
}

#[test]
fn all_group_members_are_registered() {
    let out = go(
        "[DEFINE @alpha][DEFINE 50>@beta|50>@gamma]Hello, friends![DEFINE @omega]",
        &ParseParams::default(),
        9,
    );
    assert_eq!(out.text, "Hello, friends!");
    // Signature lists every group whether its member came up true or not.
    assert_eq!(out.signature.lines().count(), 3);
}

#[test]
fn conditional_text_follows_the_variable() {
    let text = "[DEFINE ^@test][@test>This is a test message. ]Huzzah!";
    assert_eq!(go(text, &author(), 1).text, "This is a test message. Huzzah!");
    let text = "[DEFINE @test][@test>This is a test message. ]Huzzah!";
    assert_eq!(go(text, &author(), 1).text, "Huzzah!");
}

#[test]
fn undefined_variables_are_rejected() {
    assert!(is_err("[DEFINE @alphabet]This is a [@alphabe>test]."));
    assert!(is_err("[DEFINE @alphabet]This is a [@alphabej>test]."));
    assert!(is_err("[DEFINE @alphabet]This is a [@alphabeta>test]."));
}

#[test]
fn else_branch_renders_when_variable_is_false() {
    let text = "A [DEFINE @test][@test>if text|else text] C";
    assert_eq!(go(text, &author(), 1).text, "A else text C");
    let text = "A [DEFINE ^@test][@test>if text|else text] C";
    assert_eq!(go(text, &author(), 1).text, "A if text C");
}

#[test]
fn empty_if_branch_with_else_only() {
    let text = "A[DEFINE ^@test][@test>| else text only ]C";
    assert_eq!(go(text, &author(), 1).text, "AC");
    let text = "A[DEFINE @test][@test>| else text only ]C";
    assert_eq!(go(text, &author(), 1).text, "A else text only C");
}

#[test]
fn fully_named_groups_pick_exactly_one() {
    let text = "[DEFINE 25>@alpha|25>@beta|25>@gamma|25>@epsilon][@alpha>Adam|@beta>Barney|@gamma>Gerald|@epsilon>Ernie]";
    let result = parse(text, 4);
    assert!(["Adam", "Barney", "Gerald", "Ernie"].contains(&result.as_str()));
}

#[test]
fn unnamed_branches_allowed_only_in_last_position() {
    assert!(is_err("[DEFINE 50>@alpha|50>@beta][Barney|@alpha>Arnold]"));
    assert!(is_err(
        "[DEFINE 33>@alpha|33>@beta|34>@gamma][@alpha>Andrew|Bailey|@gamma>Gary]"
    ));
}

#[test]
fn branches_cannot_mix_variable_groups() {
    assert!(is_err(
        "[DEFINE 25>@alpha|25>@beta|25>@gamma|25>@epsilon][DEFINE 50>@larry|25>@moe|25>@curly][@alpha>Adam|@beta>Barney|@larry>Gerald|@epsilon>Ernie]"
    ));
}

#[test]
fn variable_names_are_case_insensitive() {
    assert!(is_err("[DEFINE @ALPHA][DEFINE @alpha]"));

    let text = "[DEFINE @Alpha|@Beta]Bob [@alpha>A.|@beta>B.] Smith";
    for seed in 0..10 {
        let result = parse(text, seed);
        assert!(result == "Bob A. Smith" || result == "Bob B. Smith", "got '{result}'");
    }
    let text = "[DEFINE @alpha|@beta]Bob [@ALPHa>A.|@bETA>B.] Smith";
    for seed in 0..10 {
        let result = parse(text, seed);
        assert!(result == "Bob A. Smith" || result == "Bob B. Smith", "got '{result}'");
    }
    for seed in 0..10 {
        assert_eq!(
            go(text, &with_defines(&["ALPHA"]), seed).text,
            "Bob A. Smith"
        );
        assert_eq!(
            go(text, &with_defines(&["bEtA"]), seed).text,
            "Bob B. Smith"
        );
    }
}

#[test]
fn set_defines_force_their_variables() {
    let text = "[DEFINE @alpha][@alpha>This is A text. |This is null. ][DEFINE 34>@gamma|33>@omega|33>@delta][@omega>This is O text. ][@delta>This is D text. ]";
    for seed in 0..10 {
        assert_eq!(
            go(text, &with_defines(&["alpha", "omega"]), seed).text,
            "This is A text. This is O text. "
        );
    }
    for seed in 0..10 {
        let result = go(text, &with_defines(&["delta"]), seed).text;
        assert!(
            result == "This is A text. This is D text. "
                || result == "This is null. This is D text. ",
            "got '{result}'"
        );
    }
}

#[test]
fn negated_set_defines_force_variables_off() {
    let text = "[DEFINE @alpha][@alpha>This is A text. |This is null. ][DEFINE 34>@gamma|33>@omega|33>@delta][@omega>This is O text. ][@delta>This is D text. ]";
    for seed in 0..10 {
        assert_eq!(
            go(text, &with_defines(&["^alpha", "^omega", "delta"]), seed).text,
            "This is null. This is D text. "
        );
    }
}

#[test]
fn signature_names_the_chosen_member() {
    let out = go("[DEFINE @hot|@cold]", &ParseParams::default(), 6);
    assert!(out.signature == "group1: hot\n" || out.signature == "group1: cold\n");
}
