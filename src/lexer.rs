// src/lexer.rs
//! Table-driven NFA lexer runtime.
//!
//! The grammar compiler (or [`tables::TablesBuilder`]) produces immutable
//! [`tables::Tables`]; a [`Lexer`] walks any [`CharStream`] against them and
//! hands out [`Token`]s one at a time.

pub mod actions;
pub mod chars;
pub mod driver;
pub mod error;
pub mod states;
pub mod tables;
pub mod token;

use rayon::prelude::*;

pub use actions::{ActionContext, LexicalActions, NoActions, TokenAction};
pub use chars::{CharStream, EndOfInput, StrCharStream};
pub use driver::{Lexer, Tokens};
pub use error::{LexError, TableError};
pub use tables::Tables;
pub use token::{Span, Token, TokenId, TokenStream};

/// Lex all of `text`, `<EOF>` token included.
pub fn lex_str(tables: &Tables, text: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(tables, StrCharStream::new(text)).tokens().collect()
}

/// Lex independent inputs in parallel against shared tables. Results are in
/// input order.
pub fn lex_all_parallel(tables: &Tables, inputs: &[&str]) -> Vec<Result<Vec<Token>, LexError>> {
    inputs.par_iter().map(|text| lex_str(tables, text)).collect()
}
