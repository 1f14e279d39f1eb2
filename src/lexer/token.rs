// src/lexer/token.rs
use std::fmt;

use super::{actions::LexicalActions, chars::CharStream, driver::Lexer, error::LexError};

/// Begin/end position of a token, 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub begin_line: usize,
    pub begin_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Zero-width span at one point.
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            begin_line: line,
            begin_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    /// Kind id; 0 is end of input.
    pub kind: u32,
    pub image: String,
    /// Present when the tables keep line/column information.
    pub span: Option<Span>,
    /// Most recent special token matched before this one. Each special
    /// token owns the one before it.
    pub special: Option<Box<Token>>,
}

impl Token {
    pub fn new(kind: u32, image: impl Into<String>) -> Self {
        Self {
            kind,
            image: image.into(),
            span: None,
            special: None,
        }
    }

    pub fn with_span(kind: u32, image: impl Into<String>, span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::new(kind, image)
        }
    }

    /// Zero-valued sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == 0
    }

    /// Special tokens preceding this one, most recent first.
    pub fn specials(&self) -> Specials<'_> {
        Specials {
            cur: self.special.as_deref(),
        }
    }

    pub fn special_count(&self) -> usize {
        self.specials().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.image)
    }
}

pub struct Specials<'a> {
    cur: Option<&'a Token>,
}

impl<'a> Iterator for Specials<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.cur?;
        self.cur = tok.special.as_deref();
        Some(tok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(usize);

impl TokenId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Parser-facing owner of the token sequence. Tokens are pulled lazily; the
/// `next` link of a token is the following index once that token exists.
pub struct TokenStream<'t, S, A> {
    lexer: Lexer<'t, S, A>,
    tokens: Vec<Token>,
}

impl<'t, S: CharStream, A: LexicalActions> TokenStream<'t, S, A> {
    pub fn new(lexer: Lexer<'t, S, A>) -> Self {
        Self {
            lexer,
            tokens: Vec::new(),
        }
    }

    fn reached_eof(&self) -> bool {
        self.tokens.last().is_some_and(Token::is_eof)
    }

    /// Pull the next token from the lexer and append it.
    pub fn advance(&mut self) -> Result<TokenId, LexError> {
        if self.reached_eof() {
            return Ok(TokenId(self.tokens.len() - 1));
        }
        let tok = self.lexer.get_next_token()?;
        self.tokens.push(tok);
        Ok(TokenId(self.tokens.len() - 1))
    }

    /// Token at `index`, pulling as many tokens as needed. Indexes past the
    /// end of input yield the `<EOF>` token.
    pub fn token(&mut self, index: usize) -> Result<&Token, LexError> {
        while self.tokens.len() <= index && !self.reached_eof() {
            self.advance()?;
        }
        let at = index.min(self.tokens.len() - 1);
        Ok(&self.tokens[at])
    }

    pub fn get(&self, id: TokenId) -> &Token {
        &self.tokens[id.0]
    }

    /// Successor of `id` among the tokens pulled so far.
    pub fn next_of(&self, id: TokenId) -> Option<TokenId> {
        let next = id.0 + 1;
        (next < self.tokens.len()).then_some(TokenId(next))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn lexer(&self) -> &Lexer<'t, S, A> {
        &self.lexer
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}
