//! Matching rules of the scanning loop, exercised through the bundled
//! calculator grammar.

use nfalex::{
    dev::gen_valid_source,
    lexer::{
        Lexer, Span, StrCharStream, Token, TokenStream, lex_all_parallel, lex_str,
        tables::{TokenKind, calc_tables},
    },
};
use rand::{SeedableRng, rngs::StdRng};

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens
        .iter()
        .map(|t| TokenKind::try_from(t.kind).expect("known kind"))
        .collect()
}

fn lex(src: &str) -> Vec<Token> {
    lex_str(calc_tables(), src).expect("input should lex")
}

fn reassemble(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        let specials: Vec<&Token> = tok.specials().collect();
        for sp in specials.iter().rev() {
            out.push_str(&sp.image);
        }
        out.push_str(&tok.image);
    }
    out
}

#[test]
fn number_plus_number() {
    use TokenKind::*;
    let toks = lex("123 + 456");
    assert_eq!(kinds(&toks), vec![Number, Plus, Number, Eof]);

    assert_eq!(toks[0].image, "123");
    assert_eq!(toks[0].span, Some(Span { begin_line: 1, begin_column: 1, end_line: 1, end_column: 3 }));
    assert!(toks[0].special.is_none());

    let plus = &toks[1];
    assert_eq!(plus.image, "+");
    let sp = plus.special.as_deref().expect("whitespace before '+'");
    assert_eq!(sp.kind, Whitespace.id());
    assert_eq!(sp.image, " ");
    assert_eq!(plus.special_count(), 1);

    assert_eq!(toks[2].image, "456");
    assert_eq!(toks[2].special_count(), 1);
    assert_eq!(toks[2].span.map(|s| s.begin_column), Some(7));

    assert_eq!(toks[3].image, "");
    assert_eq!(toks[3].span, Some(Span::at(1, 9)));
}

#[test]
fn empty_input_is_just_eof() {
    let toks = lex("");
    assert_eq!(toks.len(), 1);
    assert!(toks[0].is_eof());
    assert!(toks[0].special.is_none());
}

#[test]
fn trailing_specials_hang_off_eof() {
    let toks = lex("x // done\n");
    let eof = toks.last().unwrap();
    assert!(eof.is_eof());
    let images: Vec<&str> = eof.specials().map(|t| t.image.as_str()).collect();
    assert_eq!(images, vec!["\n", "// done", " "]);
}

#[test]
fn longest_match_wins() {
    use TokenKind::*;
    assert_eq!(kinds(&lex("+++")), vec![PlusPlus, Plus, Eof]);
    assert_eq!(kinds(&lex("===")), vec![EqEq, Assign, Eof]);
    assert_eq!(kinds(&lex("iffy")), vec![Ident, Eof]);
    assert_eq!(kinds(&lex("a/b")), vec![Ident, Slash, Ident, Eof]);
}

#[test]
fn earlier_kind_wins_on_equal_length() {
    use TokenKind::*;
    assert_eq!(kinds(&lex("if else let")), vec![If, Else, Let, Eof]);
    assert_eq!(kinds(&lex("if1")), vec![Ident, Eof]);
}

#[test]
fn literal_kinds_use_their_canonical_image() {
    let toks = lex("let");
    assert_eq!(toks[0].image, "let");
    assert_eq!(calc_tables().literal_image(TokenKind::Let.id()), Some("let"));
    assert_eq!(calc_tables().literal_image(TokenKind::Ident.id()), None);
}

#[test]
fn specials_chain_most_recent_first() {
    let toks = lex("  // c\n/* b */ x");
    let x = &toks[0];
    assert_eq!(x.image, "x");
    let images: Vec<&str> = x.specials().map(|t| t.image.as_str()).collect();
    assert_eq!(images, vec![" ", "/* b */", "\n", "// c", "  "]);
    assert_eq!(x.special_count(), 5);
}

#[test]
fn strings_and_comments_are_assembled_from_pieces() {
    use TokenKind::*;
    let toks = lex(r#""a\"b" /* ж * / */"#);
    assert_eq!(kinds(&toks), vec![String, Eof]);
    assert_eq!(toks[0].image, r#""a\"b""#);
    assert_eq!(
        toks[0].span,
        Some(Span { begin_line: 1, begin_column: 1, end_line: 1, end_column: 6 })
    );
    let comment = toks[1].specials().next().unwrap();
    assert_eq!(comment.kind, BlockComment.id());
    assert_eq!(comment.image, "/* ж * / */");
}

#[test]
fn non_ascii_identifiers() {
    use TokenKind::*;
    let toks = lex("λ中𝑥1 Яж");
    assert_eq!(kinds(&toks), vec![Ident, Ident, Eof]);
    assert_eq!(toks[0].image, "λ中𝑥1");
    assert_eq!(toks[0].span.map(|s| (s.begin_column, s.end_column)), Some((1, 4)));
    assert_eq!(toks[1].image, "Яж");
}

#[test]
fn line_terminators_and_tabs() {
    let toks = lex("a\r\nb\rc\n\nd");
    let lines: Vec<(usize, usize)> = toks
        .iter()
        .filter_map(|t| t.span.map(|s| (s.begin_line, s.begin_column)))
        .collect();
    assert_eq!(lines, vec![(1, 1), (2, 1), (3, 1), (5, 1), (5, 1)]);

    let t = calc_tables();
    let tab4: Vec<Token> = Lexer::new(t, StrCharStream::with_tab_size("a\n\tb", 4))
        .tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tab4[1].span.map(|s| (s.begin_line, s.begin_column)), Some((2, 5)));

    let tab1 = lex("\tb");
    assert_eq!(tab1[0].span.map(|s| s.begin_column), Some(2));
}

#[test]
fn token_stream_links_by_index() {
    let t = calc_tables();
    let mut ts = TokenStream::new(Lexer::new(t, StrCharStream::new("x = 1;")));
    let first = ts.advance().unwrap();
    assert_eq!(ts.get(first).image, "x");
    assert_eq!(ts.next_of(first), None);

    assert_eq!(ts.token(3).unwrap().image, ";");
    assert_eq!(ts.next_of(first).map(|id| id.index()), Some(1));
    assert!(ts.token(100).unwrap().is_eof());
    assert_eq!(ts.tokens().len(), 5);

    let last = ts.advance().unwrap();
    assert_eq!(last.index(), 4);
    assert_eq!(ts.into_tokens().len(), 5);
}

#[test]
fn generated_sources_round_trip() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in [0usize, 1, 17, 256, 4096] {
        let src = gen_valid_source(&mut rng, len);
        let toks = lex(&src);
        assert_eq!(reassemble(&toks), src, "len={len}");
        assert!(toks.last().unwrap().is_eof());
        assert_eq!(toks.iter().filter(|t| t.is_eof()).count(), 1);
    }
}

#[test]
fn parallel_batch_keeps_input_order() {
    let inputs = ["a + 1", "#", "let x = \"s\"", ""];
    let out = lex_all_parallel(calc_tables(), &inputs);
    assert_eq!(out.len(), inputs.len());
    for (src, res) in inputs.iter().zip(&out) {
        assert_eq!(res, &lex_str(calc_tables(), src), "{src:?}");
    }
    assert!(out[1].is_err());
    assert_eq!(out[3].as_ref().unwrap().len(), 1);
}
