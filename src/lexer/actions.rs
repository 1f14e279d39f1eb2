// src/lexer/actions.rs
//! What happens to a resolved match: the per-kind action class from the
//! tables plus optional user hooks.

use super::{error::LexError, token::Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAction {
    /// Return the token to the caller.
    Token,
    /// Discard the match.
    Skip,
    /// Discard from the parser's view but chain into the next token's
    /// `special` list.
    Special,
    /// Keep the text and continue the same token with the next match.
    More,
}

/// View of the lexer handed to user actions.
pub struct ActionContext<'a> {
    image: &'a str,
    length_of_match: usize,
    image_len: usize,
    lex_state: usize,
    lex_state_count: usize,
    requested: &'a mut Option<usize>,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(
        image: &'a str,
        length_of_match: usize,
        image_len: usize,
        lex_state: usize,
        lex_state_count: usize,
        requested: &'a mut Option<usize>,
    ) -> Self {
        Self {
            image,
            length_of_match,
            image_len,
            lex_state,
            lex_state_count,
            requested,
        }
    }

    /// Text of the current token so far, including earlier `More` pieces.
    pub fn image(&self) -> &str {
        self.image
    }

    /// Characters in the match that triggered this action.
    pub fn length_of_match(&self) -> usize {
        self.length_of_match
    }

    /// Characters accumulated by `More` matches of the current token.
    pub fn image_len(&self) -> usize {
        self.image_len
    }

    pub fn lex_state(&self) -> usize {
        self.lex_state
    }

    /// Request a lexical state for the next scan. A switch declared for the
    /// matched kind in the tables takes precedence.
    pub fn switch_to(&mut self, lex_state: usize) -> Result<(), LexError> {
        if lex_state >= self.lex_state_count {
            return Err(LexError::InvalidLexState {
                state: lex_state,
                count: self.lex_state_count,
            });
        }
        *self.requested = Some(lex_state);
        Ok(())
    }
}

/// Hooks run after a match is resolved. Every method defaults to a no-op, so
/// any kind without a hook falls through harmlessly.
pub trait LexicalActions {
    /// `special` is the filled token for special kinds, `None` for plain skips.
    fn skip_action(&mut self, _ctx: &mut ActionContext<'_>, _kind: u32, _special: Option<&Token>) {
    }

    fn more_action(&mut self, _ctx: &mut ActionContext<'_>, _kind: u32) {}

    fn token_action(&mut self, _ctx: &mut ActionContext<'_>, _token: &mut Token) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoActions;

impl LexicalActions for NoActions {}
