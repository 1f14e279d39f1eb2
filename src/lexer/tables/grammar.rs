// src/lexer/tables/grammar.rs
//! The bundled calculator grammar used by the binaries, the fuzzer and the
//! tests.

use std::sync::OnceLock;

use super::{
    Tables,
    build::{CharSet, Piece, TablesBuilder},
    tokens::{DEFAULT, IN_BLOCK_COMMENT, IN_STRING, TokenKind},
};
use crate::lexer::{actions::TokenAction, error::TableError};

fn ident_start() -> CharSet {
    CharSet::range('a', 'z')
        .union(&CharSet::range('A', 'Z'))
        .union(&CharSet::single('_'))
        // Greek, Cyrillic, CJK unified ideographs
        .union(&CharSet::range('\u{0391}', '\u{03C9}'))
        .union(&CharSet::range('\u{0400}', '\u{04FF}'))
        .union(&CharSet::range('\u{4E00}', '\u{9FFF}'))
        // mathematical alphanumerics
        .union(&CharSet::range('\u{1D400}', '\u{1D7FF}'))
}

pub fn build_calc_tables() -> Result<Tables, TableError> {
    use TokenKind as K;

    let mut b = TablesBuilder::new();
    let default = b.lex_state("DEFAULT");
    let in_comment = b.lex_state("IN_BLOCK_COMMENT");
    let in_string = b.lex_state("IN_STRING");
    debug_assert_eq!(
        (default, in_comment, in_string),
        (DEFAULT, IN_BLOCK_COMMENT, IN_STRING)
    );

    // Declaration order fixes the kind ids in `TokenKind`.
    for &kind in &K::ALL[1..] {
        let action = match kind {
            K::Whitespace | K::LineComment | K::BlockComment => TokenAction::Special,
            K::BlockCommentStart
            | K::BlockCommentChar
            | K::StringStart
            | K::StringEscape
            | K::StringChar => TokenAction::More,
            _ => TokenAction::Token,
        };
        let id = b.kind(kind.name(), action);
        debug_assert_eq!(id, kind.id());
    }

    let digit = CharSet::range('0', '9');
    let start = ident_start();

    b.sequence(default, K::Whitespace.id(), &[Piece::one_or_more(CharSet::of(" \t\r\n"))])?;
    b.sequence(
        default,
        K::LineComment.id(),
        &[
            Piece::once(CharSet::single('/')),
            Piece::once(CharSet::single('/')),
            Piece::zero_or_more(CharSet::any_except("\n\r")),
        ],
    )?;

    b.literal(default, K::BlockCommentStart.id(), "/*")?
        .switch_after(K::BlockCommentStart.id(), in_comment)?;
    b.sequence(
        in_comment,
        K::BlockComment.id(),
        &[Piece::once(CharSet::single('*')), Piece::once(CharSet::single('/'))],
    )?
    .switch_after(K::BlockComment.id(), default)?;
    b.sequence(in_comment, K::BlockCommentChar.id(), &[Piece::once(CharSet::any())])?;

    b.literal(default, K::StringStart.id(), "\"")?
        .switch_after(K::StringStart.id(), in_string)?;
    b.sequence(in_string, K::String.id(), &[Piece::once(CharSet::single('"'))])?
        .switch_after(K::String.id(), default)?;
    b.sequence(
        in_string,
        K::StringEscape.id(),
        &[
            Piece::once(CharSet::single('\\')),
            Piece::once(CharSet::any_except("\n\r")),
        ],
    )?;
    b.sequence(in_string, K::StringChar.id(), &[Piece::once(CharSet::any_except("\"\\\n\r"))])?;

    for (kind, text) in [
        (K::If, "if"),
        (K::Else, "else"),
        (K::Let, "let"),
        (K::PlusPlus, "++"),
        (K::Plus, "+"),
        (K::Minus, "-"),
        (K::Star, "*"),
        (K::Slash, "/"),
        (K::Assign, "="),
        (K::EqEq, "=="),
        (K::LParen, "("),
        (K::RParen, ")"),
        (K::Semicolon, ";"),
    ] {
        b.literal(default, kind.id(), text)?;
    }

    b.sequence(default, K::Number.id(), &[Piece::one_or_more(digit.clone())])?;
    b.sequence(
        default,
        K::Ident.id(),
        &[
            Piece::once(start.clone()),
            Piece::zero_or_more(start.union(&digit)),
        ],
    )?;

    b.build()
}

/// Shared tables of the bundled grammar, built on first use.
pub fn calc_tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| build_calc_tables().expect("bundled grammar is valid"))
}
