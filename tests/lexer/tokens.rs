//! Integration tests for tokenization and structural validation.

use collapser_lexer::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn err(source: &str) -> String {
    Lexer::tokenize_all(source).unwrap_err().to_string()
}

fn text(s: &str) -> TokenKind {
    TokenKind::Text(s.into())
}

#[test]
fn narrative_text_is_one_token() {
    assert_eq!(
        kinds("We could be heroes."),
        vec![text("We could be heroes.")]
    );
}

#[test]
fn alternation_with_all_the_trimmings() {
    assert_eq!(
        kinds("[50>alpha|25>^beta|]"),
        vec![
            TokenKind::CtrlBegin,
            TokenKind::Number(50),
            text("alpha"),
            TokenKind::Divider,
            TokenKind::Number(25),
            TokenKind::Author,
            text("beta"),
            TokenKind::Divider,
            TokenKind::CtrlEnd,
        ]
    );
}

#[test]
fn define_with_group_members() {
    assert_eq!(
        kinds("[DEFINE 50>@alpha|50>@beta]"),
        vec![
            TokenKind::CtrlBegin,
            TokenKind::Define,
            TokenKind::Number(50),
            TokenKind::Variable("alpha".into()),
            TokenKind::Divider,
            TokenKind::Number(50),
            TokenKind::Variable("beta".into()),
            TokenKind::CtrlEnd,
        ]
    );
}

#[test]
fn conditional_consumes_the_gt_after_a_variable() {
    assert_eq!(
        kinds("[@alpha>yes|no]"),
        vec![
            TokenKind::CtrlBegin,
            TokenKind::Variable("alpha".into()),
            text("yes"),
            TokenKind::Divider,
            text("no"),
            TokenKind::CtrlEnd,
        ]
    );
}

#[test]
fn macro_and_label_keywords() {
    let tokens = kinds("[MACRO greet][~hi][STICKY_MACRO pick][a|b][LABEL end]");
    assert!(tokens.contains(&TokenKind::Macro { sticky: false }));
    assert!(tokens.contains(&TokenKind::Macro { sticky: true }));
    assert!(tokens.contains(&TokenKind::Label));
    assert!(tokens.contains(&TokenKind::Always));
}

#[test]
fn keywords_mid_sentence_stay_text() {
    assert_eq!(
        kinds("the macro DEFINEs nothing here"),
        vec![text("the macro DEFINEs nothing here")]
    );
}

#[test]
fn sequence_labels_lex_at_sequence_start() {
    assert_eq!(
        kinds("[*twins*A|B]")[1],
        TokenKind::CtrlSeqLabel("twins".into())
    );
}

#[test]
fn comments_never_surface() {
    assert_eq!(kinds("# private note\nvisible"), vec![text("visible")]);
}

#[test]
fn spans_point_back_into_the_source() {
    let source = "intro [a|b] outro";
    let tokens = Lexer::tokenize_all(source).unwrap();
    for token in &tokens {
        assert!(token.span.end <= source.len());
        assert!(token.span.start <= token.span.end);
    }
    let close = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::CtrlEnd))
        .unwrap();
    assert_eq!(&source[close.span.start..close.span.end], "]");
}

#[test]
fn unbalanced_brackets_rejected() {
    assert_eq!(err("open [a|b"), "No ending control sequence character");
    assert_eq!(
        err("close ] only"),
        "Unmatched closing control sequence character"
    );
    assert_eq!(err("[]"), "Empty control sequence");
    assert_eq!(err("[a [b] c]"), "Illegal nested control sequence");
}

#[test]
fn misplaced_operators_rejected() {
    assert_eq!(err("a | b"), "Divider symbol found outside [ ]");
    assert_eq!(err("[alpha>beta]"), "Number op > appeared in unexpected spot");
    assert_eq!(
        err("[100>all|none]"),
        "Don't use NUMBER 100, just do the thing."
    );
}

#[test]
fn define_placement_rules() {
    assert_eq!(
        err("[x|DEFINE @a]"),
        "DEFINE can only appear at the start of a control sequence."
    );
    assert_eq!(
        err("[DEFINE nothing]"),
        "DEFINE must be followed by a variable name, as in [DEFINE @var]."
    );
    assert_eq!(
        err("[DEFINE 50>|@b]"),
        "A divider can't immediately follow a number within a define."
    );
}

#[test]
fn standalone_variable_rejected() {
    assert!(err("[@alpha]").contains("Can't have a standalone [@variable]"));
}

#[test]
fn comment_inside_a_sequence_rejected() {
    assert!(err("[choice # why\n|other]").contains("Comments not allowed within control sequences"));
}

#[test]
fn errors_carry_file_context() {
    let source = "% file chapter1.txt\n\nfine line\nbad [] line\n";
    let e = Lexer::tokenize_all(source).unwrap_err();
    let ctx = e.context.expect("context");
    assert_eq!(ctx.file, "chapter1.txt");
    assert_eq!(ctx.line_text, "bad [] line");
}
