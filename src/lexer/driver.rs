// src/lexer/driver.rs
//! The scanning loop: begin a token, simulate the NFA for the current
//! lexical state as far as it goes, keep the longest accepted match, put
//! back what was read past it and apply the kind's action.

use super::{
    actions::{ActionContext, LexicalActions, NoActions, TokenAction},
    chars::{CharStream, EndOfInput},
    error::LexError,
    states::StateTracker,
    tables::Tables,
    token::{Span, Token},
};

pub struct Lexer<'t, S, A = NoActions> {
    tables: &'t Tables,
    input_stream: S,
    actions: A,
    cur_lex_state: usize,
    default_lex_state: usize,
    states: StateTracker,
    matched_kind: Option<u32>,
    // Characters in the best match of the current piece; 0 for empty matches.
    matched_len: usize,
    length_of_match: usize,
    // Characters kept by `More` matches of the current token.
    jjimage_len: usize,
    cur_char: char,
    // The last scan step found no state moving on `cur_char`.
    stalled: bool,
    // Offset of the last empty match per lexical state.
    empty_match_at: Vec<Option<usize>>,
}

impl<'t, S: CharStream> Lexer<'t, S, NoActions> {
    pub fn new(tables: &'t Tables, input_stream: S) -> Self {
        Self::with_actions(tables, input_stream, NoActions)
    }
}

impl<'t, S: CharStream, A: LexicalActions> Lexer<'t, S, A> {
    pub fn with_actions(tables: &'t Tables, input_stream: S, actions: A) -> Self {
        Self {
            tables,
            input_stream,
            actions,
            cur_lex_state: tables.default_lex_state,
            default_lex_state: tables.default_lex_state,
            states: StateTracker::new(tables.states.len()),
            matched_kind: None,
            matched_len: 0,
            length_of_match: 0,
            jjimage_len: 0,
            cur_char: '\0',
            stalled: false,
            empty_match_at: vec![None; tables.lex_state_count()],
        }
    }

    /// Lexer that starts in, and treats as default, `lex_state`.
    pub fn new_from_state(
        tables: &'t Tables,
        input_stream: S,
        actions: A,
        lex_state: usize,
    ) -> Result<Self, LexError> {
        let mut lexer = Self::with_actions(tables, input_stream, actions);
        lexer.switch_to(lex_state)?;
        lexer.default_lex_state = lex_state;
        Ok(lexer)
    }

    pub fn switch_to(&mut self, lex_state: usize) -> Result<(), LexError> {
        let count = self.tables.lex_state_count();
        if lex_state >= count {
            return Err(LexError::InvalidLexState {
                state: lex_state,
                count,
            });
        }
        if lex_state != self.cur_lex_state {
            log::debug!(
                "switching lexical state {} -> {}",
                self.tables.lex_state_name(self.cur_lex_state),
                self.tables.lex_state_name(lex_state)
            );
        }
        self.cur_lex_state = lex_state;
        Ok(())
    }

    pub fn lex_state(&self) -> usize {
        self.cur_lex_state
    }

    pub fn default_lex_state(&self) -> usize {
        self.default_lex_state
    }

    pub fn tables(&self) -> &'t Tables {
        self.tables
    }

    pub fn input(&self) -> &S {
        &self.input_stream
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.actions
    }

    pub fn into_actions(self) -> A {
        self.actions
    }

    /// Iterator over the remaining tokens, ending after `<EOF>` or the first
    /// error.
    pub fn tokens(self) -> Tokens<'t, S, A> {
        Tokens {
            lexer: self,
            done: false,
        }
    }

    /// Restart state-stamp numbering at `round`.
    pub fn set_round(&mut self, round: u32) {
        self.states = StateTracker::starting_at(self.tables.states.len(), round);
    }

    /// Discard the character a lexical error was reported on so scanning can
    /// resume after it.
    pub fn resync(&mut self) -> Option<char> {
        self.input_stream.begin_token().ok()
    }

    pub fn get_next_token(&mut self) -> Result<Token, LexError> {
        let tables = self.tables;
        let mut special: Option<Box<Token>> = None;

        'eof: loop {
            match self.input_stream.begin_token() {
                Ok(c) => self.cur_char = c,
                Err(EndOfInput) => return self.eof_token(special),
            }
            self.jjimage_len = 0;

            loop {
                let cur_pos = self.scan(tables);

                let Some(kind) = self.matched_kind else {
                    return Err(self.lexical_error());
                };
                if self.matched_len < cur_pos {
                    self.input_stream.backup(cur_pos - self.matched_len);
                }
                self.length_of_match = self.matched_len;
                if self.length_of_match == 0 {
                    self.check_empty_match()?;
                }

                log::debug!(
                    "<{}> matched {} {:?}",
                    tables.lex_state_name(self.cur_lex_state),
                    tables.kind_name(kind),
                    self.input_stream.image()
                );

                match tables.action_of(kind) {
                    TokenAction::Token => {
                        let mut token = self.fill_token(kind);
                        token.special = special.take();
                        self.token_lexical_actions(&mut token, tables.new_lex_state(kind))?;
                        return Ok(token);
                    }
                    action @ (TokenAction::Skip | TokenAction::Special) => {
                        let filled = (action == TokenAction::Special).then(|| {
                            let mut token = self.fill_token(kind);
                            token.special = special.take();
                            token
                        });
                        self.skip_lexical_actions(kind, filled.as_ref())?;
                        if let Some(token) = filled {
                            special = Some(Box::new(token));
                        }
                        continue 'eof;
                    }
                    TokenAction::More => {
                        self.jjimage_len += self.length_of_match;
                        self.more_lexical_actions(kind)?;
                        match self.input_stream.read_char() {
                            Ok(c) => self.cur_char = c,
                            Err(EndOfInput) => return Err(self.eof_error()),
                        }
                    }
                }
            }
        }
    }

    /// Run the automaton of the current lexical state starting at `cur_char`.
    /// Returns the number of characters read in this piece.
    fn scan(&mut self, tables: &'t Tables) -> usize {
        let lex = &tables.lex_states[self.cur_lex_state];
        self.matched_kind = lex.empty_match;
        self.matched_len = 0;
        self.states.seed(&lex.initial);

        let mut cur_pos = 0;
        loop {
            let c = self.cur_char as u32;

            #[cfg(feature = "debug-token-manager")]
            log::trace!(
                "<{}> current character {:?} ({c}) with {} active states",
                tables.lex_state_name(self.cur_lex_state),
                self.cur_char,
                self.states.len()
            );

            self.states.reset_epoch();
            let mut kind: Option<u32> = None;
            let mut moved = false;
            for i in 0..self.states.len() {
                let state = &tables.states[self.states.active()[i]];
                if !tables.can_move(state, c) {
                    continue;
                }
                moved = true;
                if let Some(k) = state.kind {
                    kind = Some(kind.map_or(k, |cur| cur.min(k)));
                }
                match state.next_len {
                    0 => {}
                    1 => self.states.add(tables.next_states[state.next_start]),
                    2 => self.states.add_pair(
                        tables.next_states[state.next_start],
                        tables.next_states[state.next_start + 1],
                    ),
                    n => self.states.add_range(
                        &tables.next_states,
                        state.next_start,
                        state.next_start + n - 1,
                    ),
                }
            }
            self.states.advance();
            self.stalled = !moved;
            cur_pos += 1;

            if kind.is_some() {
                self.matched_kind = kind;
                self.matched_len = cur_pos;
            }
            if self.states.is_empty() {
                return cur_pos;
            }
            match self.input_stream.read_char() {
                Ok(c) => self.cur_char = c,
                Err(EndOfInput) => return cur_pos,
            }
        }
    }

    fn fill_token(&self, kind: u32) -> Token {
        let image = match self.tables.literal_image(kind) {
            Some(literal) if self.jjimage_len == 0 => literal.to_owned(),
            _ => self.input_stream.image().to_owned(),
        };
        if !self.tables.keep_line_column {
            return Token::new(kind, image);
        }
        let span = if self.length_of_match == 0 && self.jjimage_len == 0 {
            Span::at(self.input_stream.end_line(), self.input_stream.end_column())
        } else {
            Span {
                begin_line: self.input_stream.begin_line(),
                begin_column: self.input_stream.begin_column(),
                end_line: self.input_stream.end_line(),
                end_column: self.input_stream.end_column(),
            }
        };
        Token::with_span(kind, image, span)
    }

    fn eof_token(&mut self, special: Option<Box<Token>>) -> Result<Token, LexError> {
        #[cfg(feature = "debug-token-manager")]
        log::trace!("returning the <EOF> token");

        self.length_of_match = 0;
        self.jjimage_len = 0;
        let mut token = if self.tables.keep_line_column {
            let span = Span::at(self.input_stream.end_line(), self.input_stream.end_column());
            Token::with_span(0, "", span)
        } else {
            Token::new(0, "")
        };
        token.special = special;
        self.token_lexical_actions(&mut token, self.tables.eof_lex_state)?;
        Ok(token)
    }

    // A second empty match in the same lexical state at the same offset
    // would repeat forever.
    fn check_empty_match(&mut self) -> Result<(), LexError> {
        let offset = self.input_stream.offset();
        let slot = &mut self.empty_match_at[self.cur_lex_state];
        if *slot == Some(offset) {
            return Err(LexError::EmptyMatchLoop {
                lex_state: self.cur_lex_state,
                line: self.input_stream.end_line(),
                column: self.input_stream.end_column(),
            });
        }
        *slot = Some(offset);
        Ok(())
    }

    fn token_lexical_actions(
        &mut self,
        token: &mut Token,
        declared: Option<usize>,
    ) -> Result<(), LexError> {
        let mut requested = None;
        let mut ctx = ActionContext::new(
            self.input_stream.image(),
            self.length_of_match,
            self.jjimage_len,
            self.cur_lex_state,
            self.tables.lex_state_count(),
            &mut requested,
        );
        self.actions.token_action(&mut ctx, token);
        self.apply_switch(requested, declared)
    }

    fn skip_lexical_actions(&mut self, kind: u32, special: Option<&Token>) -> Result<(), LexError> {
        let mut requested = None;
        let mut ctx = ActionContext::new(
            self.input_stream.image(),
            self.length_of_match,
            self.jjimage_len,
            self.cur_lex_state,
            self.tables.lex_state_count(),
            &mut requested,
        );
        self.actions.skip_action(&mut ctx, kind, special);
        self.apply_switch(requested, self.tables.new_lex_state(kind))
    }

    fn more_lexical_actions(&mut self, kind: u32) -> Result<(), LexError> {
        let mut requested = None;
        let mut ctx = ActionContext::new(
            self.input_stream.image(),
            self.length_of_match,
            self.jjimage_len,
            self.cur_lex_state,
            self.tables.lex_state_count(),
            &mut requested,
        );
        self.actions.more_action(&mut ctx, kind);
        self.apply_switch(requested, self.tables.new_lex_state(kind))
    }

    // The switch declared in the tables wins over one requested by an action.
    fn apply_switch(
        &mut self,
        requested: Option<usize>,
        declared: Option<usize>,
    ) -> Result<(), LexError> {
        match declared.or(requested) {
            Some(lex_state) => self.switch_to(lex_state),
            None => Ok(()),
        }
    }

    // No kind matched. The offending character is the one every state died
    // on: `cur_char` if nothing moved on it, otherwise the next one. The
    // stream is left just before it so `resync` skips exactly that character.
    fn lexical_error(&mut self) -> LexError {
        let offending = if self.stalled {
            Some(self.cur_char)
        } else {
            self.input_stream.read_char().ok()
        };
        let Some(c) = offending else {
            return self.eof_error();
        };
        let line = self.input_stream.end_line();
        let column = self.input_stream.end_column();
        let offset = self.input_stream.offset() - c.len_utf8();
        self.input_stream.backup(1);
        LexError::Lexical {
            line,
            column,
            offset,
            character: Some(c),
            after: self.input_stream.image().to_owned(),
            lex_state: self.cur_lex_state,
        }
    }

    // Input ended inside a token. Reported one column past the last
    // character, or at column 0 of the next line after a line terminator.
    fn eof_error(&mut self) -> LexError {
        let after = self.input_stream.image().to_owned();
        let (line, column) = match after.chars().next_back() {
            Some('\n' | '\r') => (self.input_stream.end_line() + 1, 0),
            _ => (self.input_stream.end_line(), self.input_stream.end_column() + 1),
        };
        LexError::Lexical {
            line,
            column,
            offset: self.input_stream.offset(),
            character: None,
            after,
            lex_state: self.cur_lex_state,
        }
    }
}

/// Pull-based token iterator, fused after `<EOF>` or an error.
pub struct Tokens<'t, S, A> {
    lexer: Lexer<'t, S, A>,
    done: bool,
}

impl<'t, S, A> Tokens<'t, S, A> {
    pub fn into_lexer(self) -> Lexer<'t, S, A> {
        self.lexer
    }
}

impl<S: CharStream, A: LexicalActions> Iterator for Tokens<'_, S, A> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.lexer.get_next_token();
        self.done = match &next {
            Ok(token) => token.is_eof(),
            Err(_) => true,
        };
        Some(next)
    }
}
