// src/lexer/error.rs
use thiserror::Error;

/// Failures surfaced by the scanning loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A switch to a lexical state the tables do not define.
    #[error("invalid lexical state {state} (tables define {count})")]
    InvalidLexState { state: usize, count: usize },

    /// No automaton state accepted anything at this position.
    ///
    /// `character` is `None` when the input ended inside a token, e.g. an
    /// unterminated string assembled from several pieces.
    #[error(
        "lexical error at line {line}, column {column}: encountered {found} after {after:?}",
        found = encountered(.character)
    )]
    Lexical {
        line: usize,
        column: usize,
        offset: usize,
        character: Option<char>,
        after: String,
        lex_state: usize,
    },

    #[error("repeated empty-string matches in lexical state {lex_state} at line {line}, column {column}")]
    EmptyMatchLoop {
        lex_state: usize,
        line: usize,
        column: usize,
    },
}

fn encountered(character: &Option<char>) -> String {
    match character {
        Some(c) => format!("{c:?} ({})", *c as u32),
        None => "<EOF>".to_string(),
    }
}

/// Malformed or unreadable transition tables.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("invalid tables: {0}")]
    Invalid(String),
    #[error("failed to parse tables JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed binary tables: {0}")]
    Binary(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
