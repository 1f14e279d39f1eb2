// src/lexer/tables/tokens.rs

/// Kind 0 is always end of input.
pub const EOF: u32 = 0;

// Lexical states of the bundled grammar.
pub const DEFAULT: usize = 0;
pub const IN_BLOCK_COMMENT: usize = 1;
pub const IN_STRING: usize = 2;

macro_rules! token_kinds {
    ($($variant:ident = $id:literal => $name:literal,)*) => {
        /// Token kinds of the bundled calculator grammar, in declaration order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum TokenKind {
            $($variant = $id,)*
        }

        impl TokenKind {
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$variant,)*];

            /// Display name as stored in the tables.
            pub fn name(self) -> &'static str {
                match self {
                    $(TokenKind::$variant => $name,)*
                }
            }
        }

        impl core::convert::TryFrom<u32> for TokenKind {
            type Error = ();
            fn try_from(v: u32) -> Result<Self, ()> {
                match v {
                    $($id => Ok(TokenKind::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

token_kinds! {
    Eof = 0 => "<EOF>",
    Whitespace = 1 => "<WHITESPACE>",
    LineComment = 2 => "<LINE_COMMENT>",
    BlockCommentStart = 3 => "<BLOCK_COMMENT_START>",
    BlockComment = 4 => "<BLOCK_COMMENT>",
    BlockCommentChar = 5 => "<BLOCK_COMMENT_CHAR>",
    StringStart = 6 => "<STRING_START>",
    String = 7 => "<STRING>",
    StringEscape = 8 => "<STRING_ESCAPE>",
    StringChar = 9 => "<STRING_CHAR>",
    If = 10 => "<IF>",
    Else = 11 => "<ELSE>",
    Let = 12 => "<LET>",
    PlusPlus = 13 => "<PLUS_PLUS>",
    Plus = 14 => "<PLUS>",
    Minus = 15 => "<MINUS>",
    Star = 16 => "<STAR>",
    Slash = 17 => "<SLASH>",
    Assign = 18 => "<ASSIGN>",
    EqEq = 19 => "<EQ_EQ>",
    LParen = 20 => "<LPAREN>",
    RParen = 21 => "<RPAREN>",
    Semicolon = 22 => "<SEMICOLON>",
    Number = 23 => "<NUMBER>",
    Ident = 24 => "<IDENT>",
}

impl TokenKind {
    pub fn id(self) -> u32 {
        self as u32
    }
}
