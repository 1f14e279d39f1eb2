//! Lexical states, action classes and user hooks.

use nfalex::lexer::{
    ActionContext, LexError, LexicalActions, Lexer, NoActions, StrCharStream, Tables, Token,
    TokenAction,
    tables::{
        CharSet, Piece, TablesBuilder, TokenKind, calc_tables,
        tokens::{DEFAULT, IN_STRING},
    },
};

// Two states: lowercase words in A, digits in B, runs of spaces are special
// in both.
struct WordsThenNumbers {
    tables: Tables,
    a: usize,
    b: usize,
    word: u32,
    num: u32,
}

fn words_then_numbers(word_switches_back: bool) -> WordsThenNumbers {
    let mut b = TablesBuilder::new();
    let sa = b.lex_state("A");
    let sb = b.lex_state("B");
    let space = b.kind("SPACE", TokenAction::Special);
    let word = b.kind("WORD", TokenAction::Token);
    let num = b.kind("NUM", TokenAction::Token);
    for lex in [sa, sb] {
        b.sequence(lex, space, &[Piece::one_or_more(CharSet::single(' '))])
            .unwrap();
    }
    b.sequence(sa, word, &[Piece::one_or_more(CharSet::range('a', 'z'))])
        .unwrap();
    b.sequence(sb, num, &[Piece::one_or_more(CharSet::range('0', '9'))])
        .unwrap();
    if word_switches_back {
        b.switch_after(word, sa).unwrap();
    }
    WordsThenNumbers {
        tables: b.build().unwrap(),
        a: sa,
        b: sb,
        word,
        num,
    }
}

struct SwitchAfterWord {
    word: u32,
    target: usize,
}

impl LexicalActions for SwitchAfterWord {
    fn token_action(&mut self, ctx: &mut ActionContext<'_>, token: &mut Token) {
        if token.kind == self.word {
            ctx.switch_to(self.target).unwrap();
            assert!(ctx.switch_to(42).is_err());
        }
    }
}

#[test]
fn action_requests_a_state_switch() {
    let g = words_then_numbers(false);
    let actions = SwitchAfterWord {
        word: g.word,
        target: g.b,
    };
    let toks: Vec<Token> = Lexer::with_actions(&g.tables, StrCharStream::new("ab 12"), actions)
        .tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![g.word, g.num, 0]
    );
    assert_eq!(toks[1].image, "12");
    assert_eq!(toks[1].special_count(), 1);
}

#[test]
fn declared_switch_overrides_action_request() {
    let g = words_then_numbers(true);
    let actions = SwitchAfterWord {
        word: g.word,
        target: g.b,
    };
    let mut lexer = Lexer::with_actions(&g.tables, StrCharStream::new("ab 12"), actions);
    assert_eq!(lexer.get_next_token().unwrap().kind, g.word);
    assert_eq!(lexer.lex_state(), g.a);
    match lexer.get_next_token() {
        Err(LexError::Lexical {
            character: Some('1'),
            lex_state,
            ..
        }) => assert_eq!(lex_state, g.a),
        other => panic!("expected a lexical error, got {other:?}"),
    }
}

#[derive(Default)]
struct Recorder {
    more: Vec<(String, usize, usize)>,
    tokens: Vec<(u32, String, usize, usize)>,
    skips: Vec<(u32, bool)>,
}

impl LexicalActions for Recorder {
    fn skip_action(&mut self, _ctx: &mut ActionContext<'_>, kind: u32, special: Option<&Token>) {
        self.skips.push((kind, special.is_some()));
    }

    fn more_action(&mut self, ctx: &mut ActionContext<'_>, _kind: u32) {
        self.more
            .push((ctx.image().to_string(), ctx.length_of_match(), ctx.image_len()));
    }

    fn token_action(&mut self, ctx: &mut ActionContext<'_>, token: &mut Token) {
        self.tokens.push((
            token.kind,
            ctx.image().to_string(),
            ctx.length_of_match(),
            ctx.image_len(),
        ));
    }
}

#[test]
fn more_pieces_accumulate_into_one_token() {
    let mut lexer = Lexer::with_actions(calc_tables(), StrCharStream::new("\"ab\""), Recorder::default());
    let tok = lexer.get_next_token().unwrap();
    assert_eq!(tok.kind, TokenKind::String.id());
    assert_eq!(tok.image, "\"ab\"");
    assert_eq!(lexer.lex_state(), DEFAULT);
    assert!(lexer.get_next_token().unwrap().is_eof());

    let rec = lexer.into_actions();
    assert_eq!(
        rec.more,
        vec![
            ("\"".to_string(), 1, 1),
            ("\"a".to_string(), 1, 2),
            ("\"ab".to_string(), 1, 3),
        ]
    );
    assert_eq!(rec.tokens[0], (TokenKind::String.id(), "\"ab\"".to_string(), 1, 3));
    // <EOF> goes through the token hook too.
    assert_eq!(rec.tokens[1].0, 0);
}

#[test]
fn skip_hook_sees_special_tokens_only_for_special_kinds() {
    let mut b = TablesBuilder::new();
    let lex = b.lex_state("DEFAULT");
    let ws = b.kind("WS", TokenAction::Skip);
    let note = b.kind("NOTE", TokenAction::Special);
    let id = b.kind("ID", TokenAction::Token);
    b.sequence(lex, ws, &[Piece::one_or_more(CharSet::single(' '))]).unwrap();
    b.sequence(lex, note, &[Piece::one_or_more(CharSet::single('!'))]).unwrap();
    b.sequence(lex, id, &[Piece::one_or_more(CharSet::range('a', 'z'))]).unwrap();
    let tables = b.build().unwrap();

    let mut lexer = Lexer::with_actions(&tables, StrCharStream::new("x !! y"), Recorder::default());
    let x = lexer.get_next_token().unwrap();
    let y = lexer.get_next_token().unwrap();
    assert_eq!((x.image.as_str(), y.image.as_str()), ("x", "y"));
    let chained: Vec<&str> = y.specials().map(|t| t.image.as_str()).collect();
    assert_eq!(chained, vec!["!!"]);
    assert_eq!(lexer.actions().skips, vec![(ws, false), (note, true), (ws, false)]);
}

struct Upper;

impl LexicalActions for Upper {
    fn token_action(&mut self, _ctx: &mut ActionContext<'_>, token: &mut Token) {
        if token.kind == TokenKind::Ident.id() {
            token.image = token.image.to_uppercase();
        }
    }
}

#[test]
fn token_hook_can_rewrite_the_token() {
    let toks: Vec<Token> = Lexer::with_actions(calc_tables(), StrCharStream::new("let abc"), Upper)
        .tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(toks[0].image, "let");
    assert_eq!(toks[1].image, "ABC");
}

#[test]
fn eof_switches_lexical_state() {
    let mut b = TablesBuilder::new();
    let a = b.lex_state("A");
    let after = b.lex_state("AFTER_EOF");
    let x = b.kind("X", TokenAction::Token);
    b.literal(a, x, "x").unwrap();
    b.on_eof_switch_to(after).unwrap();
    let tables = b.build().unwrap();

    let mut lexer = Lexer::new(&tables, StrCharStream::new("x"));
    assert_eq!(lexer.get_next_token().unwrap().image, "x");
    assert_eq!(lexer.lex_state(), a);
    assert!(lexer.get_next_token().unwrap().is_eof());
    assert_eq!(lexer.lex_state(), after);
}

#[test]
fn empty_match_switches_state() {
    let mut b = TablesBuilder::new();
    let a = b.lex_state("A");
    let sb = b.lex_state("B");
    let empty = b.kind("EMPTY", TokenAction::Token);
    let x = b.kind("X", TokenAction::Token);
    b.literal(a, empty, "").unwrap().switch_after(empty, sb).unwrap();
    b.literal(sb, x, "x").unwrap();
    let tables = b.build().unwrap();
    assert_eq!(tables.lex_states()[a].empty_match, Some(empty));

    let toks: Vec<Token> = Lexer::new(&tables, StrCharStream::new("x"))
        .tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(toks.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![empty, x, 0]);
    assert_eq!(toks[0].image, "");
}

#[test]
fn longer_match_beats_empty_match() {
    let mut b = TablesBuilder::new();
    let a = b.lex_state("A");
    let empty = b.kind("EMPTY", TokenAction::Token);
    let x = b.kind("X", TokenAction::Token);
    b.literal(a, empty, "").unwrap();
    b.literal(a, x, "x").unwrap();
    let tables = b.build().unwrap();

    let mut lexer = Lexer::new(&tables, StrCharStream::new("x"));
    assert_eq!(lexer.get_next_token().unwrap().kind, x);
    assert!(lexer.get_next_token().unwrap().is_eof());
}

#[test]
fn repeated_empty_match_is_an_error() {
    let mut b = TablesBuilder::new();
    let a = b.lex_state("A");
    let empty = b.kind("EMPTY", TokenAction::Token);
    b.literal(a, empty, "").unwrap();
    let tables = b.build().unwrap();

    let mut lexer = Lexer::new(&tables, StrCharStream::new("y"));
    assert_eq!(lexer.get_next_token().unwrap().kind, empty);
    assert!(matches!(
        lexer.get_next_token(),
        Err(LexError::EmptyMatchLoop { lex_state: 0, .. })
    ));
}

#[test]
fn start_in_another_lexical_state() {
    let t = calc_tables();
    let mut lexer = Lexer::new_from_state(t, StrCharStream::new("ab\" 1"), NoActions, IN_STRING).unwrap();
    assert_eq!(lexer.default_lex_state(), IN_STRING);
    let s = lexer.get_next_token().unwrap();
    assert_eq!(s.kind, TokenKind::String.id());
    assert_eq!(s.image, "ab\"");
    assert_eq!(lexer.lex_state(), DEFAULT);
    assert_eq!(lexer.get_next_token().unwrap().kind, TokenKind::Number.id());
}

#[test]
fn spans_are_optional() {
    let mut b = TablesBuilder::new();
    b.keep_line_column(false);
    let a = b.lex_state("A");
    let x = b.kind("X", TokenAction::Token);
    b.literal(a, x, "x").unwrap();
    let tables = b.build().unwrap();

    let toks: Vec<Token> = Lexer::new(&tables, StrCharStream::new("xx"))
        .tokens()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(toks.len(), 3);
    assert!(toks.iter().all(|t| t.span.is_none()));
}
