//! Confirmation sessions driven through the public API with a
//! scripted reviewer, including persistence across sessions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use collapser_confirm::{process, ConfirmStore, Decision, MockReviewer};
use collapser_engine::{macros, variables, ParseParams, ResolutionContext};
use collapser_foundation::Result;
use collapser_lexer::{Lexer, Token};

static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

fn scratch_dir() -> PathBuf {
    let n = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("collapser_flow_test_{}_{n}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn prepare(source: &str, seed: u64) -> (Vec<Token>, ResolutionContext) {
    let tokens = Lexer::tokenize_all(source).unwrap();
    let mut ctx = ResolutionContext::new(seed);
    let params = ParseParams::default();
    variables::handle_defines(&tokens, &params, &mut ctx, source).unwrap();
    macros::handle_defs(&tokens, &mut ctx, source).unwrap();
    let prepped = variables::strip_defines(&tokens).unwrap();
    let prepped = macros::strip_macros(&prepped).unwrap();
    (prepped, ctx)
}

fn run_session(
    dir: &PathBuf,
    store_key: &str,
    reviewer: &mut MockReviewer,
    source: &str,
) -> Result<()> {
    let (tokens, mut ctx) = prepare(source, 11);
    let mut store = ConfirmStore::open(dir, store_key).unwrap();
    process(
        &mut store,
        reviewer,
        &ParseParams::default(),
        &tokens,
        source,
        &mut ctx,
    )
}

#[test]
fn presentation_is_framed_by_separators() {
    let dir = scratch_dir();
    let source = "The door was [locked|ajar] when she arrived.";
    let mut mock = MockReviewer::new([Decision::Skip]);
    run_session(&dir, "framing", &mut mock, source).unwrap();

    let shown = &mock.seen[0];
    assert!(shown.starts_with(
        "#################################################################\n"
    ));
    assert!(shown.contains("[locked|ajar]"));
    assert!(shown.ends_with("************************************"));
    assert_eq!(shown.matches("************************************").count(), 3);
}

#[test]
fn session_stops_after_enough_confirmations() {
    let dir = scratch_dir();
    let source = "One [a1|b1] two [a2|b2] three [a3|b3] four [a4|b4] five \
                  [a5|b5] six [a6|b6] seven [a7|b7] eight [a8|b8] done.";
    let mut mock = MockReviewer::new(vec![Decision::Confirm; 6]);
    run_session(&dir, "cap", &mut mock, source).unwrap();
    assert_eq!(mock.seen.len(), 6);

    // The remaining two come up in the next session.
    let mut rest = MockReviewer::new([Decision::Confirm, Decision::Confirm]);
    run_session(&dir, "cap", &mut rest, source).unwrap();
    assert_eq!(rest.seen.len(), 2);
    assert!(rest.seen[0].contains("[a7|b7]"));
    assert!(rest.seen[1].contains("[a8|b8]"));

    // Everything is confirmed now.
    let mut silent = MockReviewer::new([]);
    run_session(&dir, "cap", &mut silent, source).unwrap();
    assert!(silent.seen.is_empty());
}

#[test]
fn file_markers_name_each_sequence_source() {
    let dir = scratch_dir();
    let source = "% file one.txt\nAlpha [x|y] omega.\n% file two.txt\nBeta [p|q] end.\n";
    let mut mock = MockReviewer::new([Decision::Skip, Decision::Skip]);
    run_session(&dir, "markers", &mut mock, source).unwrap();

    assert_eq!(mock.seen.len(), 2);
    assert!(mock.seen[0].contains("VARIANT FOUND IN one.txt"));
    assert!(mock.seen[1].contains("VARIANT FOUND IN two.txt"));
}

#[test]
fn stores_are_isolated_per_file_set() {
    let dir = scratch_dir();
    let source = "The lamp [flickered|died] at dusk.";
    let mut mock = MockReviewer::new([Decision::Confirm]);
    run_session(&dir, "set-a", &mut mock, source).unwrap();

    // A different file set knows nothing about that confirmation.
    let mut other = MockReviewer::new([Decision::Skip]);
    run_session(&dir, "set-b", &mut other, source).unwrap();
    assert_eq!(other.seen.len(), 1);
}

#[test]
fn file_set_key_names_a_usable_store() {
    let dir = scratch_dir();
    let key = ConfirmStore::file_set_key(&["chapter1.txt", "chapter2.txt"]);
    let source = "She [smiled|frowned] and left.";

    let mut mock = MockReviewer::new([Decision::Confirm]);
    run_session(&dir, &key, &mut mock, source).unwrap();

    let mut silent = MockReviewer::new([]);
    run_session(&dir, &key, &mut silent, source).unwrap();
    assert!(silent.seen.is_empty());
}

#[test]
fn forced_variables_keep_conditional_context_consistent() {
    let dir = scratch_dir();
    let source = "[DEFINE @a|@b]Text [@a>one|@b>two] more [@a>ONE|@b>TWO] end.";
    let mut mock = MockReviewer::new([Decision::Skip, Decision::Skip]);
    run_session(&dir, "forced", &mut mock, source).unwrap();

    // In the first prompt, each branch's excerpt resolves the later
    // conditional with the same variable forced on.
    let blocks: Vec<&str> = mock.seen[0].split("************************************\n").collect();
    let one = blocks
        .iter()
        .skip(1)
        .find(|b| b.contains("one"))
        .expect("branch for @a shown");
    assert!(one.contains("ONE"), "got:\n{one}");
    let two = blocks
        .iter()
        .skip(1)
        .find(|b| b.contains("two"))
        .expect("branch for @b shown");
    assert!(two.contains("TWO"), "got:\n{two}");
}

#[test]
fn macro_bodies_are_never_asked_about() {
    let dir = scratch_dir();
    let source = "[MACRO aside][quietly|loudly]She spoke {aside} and [left|stayed].";
    let mut mock = MockReviewer::new([Decision::Skip]);
    run_session(&dir, "macro-bodies", &mut mock, source).unwrap();

    // Only the surviving sequence prompts; the macro body was stripped.
    assert_eq!(mock.seen.len(), 1);
    assert!(mock.seen[0].contains("[left|stayed]"));
}
