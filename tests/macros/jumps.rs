//! Integration tests for labels and forward jumps.

use collapser_engine::{collapse, ParseParams};

fn parse(text: &str, seed: u64) -> String {
    collapse(text, text, &ParseParams::default(), seed)
        .unwrap()
        .text
}

fn err_text(text: &str) -> String {
    collapse(text, text, &ParseParams::default(), 1)
        .unwrap_err()
        .to_string()
}

#[test]
fn unused_labels_disappear_from_output() {
    assert_eq!(parse("text [LABEL lonely] more", 1), "text  more");
    assert_eq!(parse("[LABEL opener]text", 1), "text");
}

#[test]
fn labels_cannot_be_defined_twice() {
    assert_eq!(
        err_text("[LABEL here] some text [LABEL here]"),
        "Label 'here' is defined twice."
    );
}

#[test]
fn jumps_cut_forward_to_their_label() {
    assert_eq!(
        parse("Start. {JUMP ending} skip all this [LABEL ending] End.", 1),
        "Start.  End."
    );
}

#[test]
fn jumping_to_a_label_at_the_very_end() {
    assert_eq!(
        parse("Before. {JUMP fin} everything after is cut [LABEL fin]", 1),
        "Before. "
    );
}

#[test]
fn jumping_to_an_undefined_label_is_rejected() {
    assert_eq!(
        err_text("Start. {JUMP nowhere} End."),
        "Invalid GOTO: labelId 'jump nowhere' is not defined."
    );
}

#[test]
fn backward_jumps_are_rejected() {
    let msg = err_text("[LABEL back] some text {JUMP back}");
    assert!(
        msg.starts_with("Found {JUMP back} but no [LABEL back]"),
        "got '{msg}'"
    );
}

#[test]
fn jumps_work_inside_conditional_branches() {
    let text = "[DEFINE @alpha]Intro. [@alpha>alpha road {JUMP aftermath}|omega road {JUMP aftermath}] middle [LABEL aftermath] End.";
    for seed in 0..20 {
        let result = parse(text, seed);
        assert!(
            result == "Intro. alpha road  End." || result == "Intro. omega road  End.",
            "got '{result}'"
        );
    }
}

#[test]
fn jumps_work_from_macro_expansions() {
    let text = "Well that's a fine {howdoyado}. [MACRO howdoyado][~How do ya {JUMP finalDo}]    poopy    [LABEL finalDo]dooo.";
    assert_eq!(parse(text, 1), "Well that's a fine How do ya dooo.");
}
