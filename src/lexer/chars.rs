// src/lexer/chars.rs
//! Character source consumed by the scanning loop.

/// The stream has no more characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfInput;

pub trait CharStream {
    /// Start a new token and return its first character.
    fn begin_token(&mut self) -> Result<char, EndOfInput>;

    /// Next character of the current token.
    fn read_char(&mut self) -> Result<char, EndOfInput>;

    /// Put back the last `amount` characters. Never rewinds past the start
    /// of the current token.
    fn backup(&mut self, amount: usize);

    /// Text read since `begin_token`.
    fn image(&self) -> &str;

    fn begin_line(&self) -> usize;
    fn begin_column(&self) -> usize;

    /// Position of the last character read.
    fn end_line(&self) -> usize;
    fn end_column(&self) -> usize;

    /// Byte offset of the next unread character.
    fn offset(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
    prev_cr: bool,
    prev_lf: bool,
}

/// In-memory stream over a `&str`. `\n`, `\r` and `\r\n` end a line; a tab
/// advances the column to the next multiple of the tab size.
pub struct StrCharStream<'a> {
    text: &'a str,
    tab_size: usize,
    cursor: Cursor,
    token_start: usize,
    begin_line: usize,
    begin_column: usize,
    // Cursor before each character read since `begin_token`.
    trail: Vec<Cursor>,
}

impl<'a> StrCharStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_tab_size(text, 1)
    }

    pub fn with_tab_size(text: &'a str, tab_size: usize) -> Self {
        Self {
            text,
            tab_size: tab_size.max(1),
            cursor: Cursor {
                offset: 0,
                line: 1,
                column: 0,
                prev_cr: false,
                prev_lf: false,
            },
            token_start: 0,
            begin_line: 1,
            begin_column: 1,
            trail: Vec::new(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    fn advance(&mut self, c: char) {
        let cur = &mut self.cursor;
        cur.offset += c.len_utf8();
        cur.column += 1;

        if cur.prev_lf {
            cur.prev_lf = false;
            cur.line += 1;
            cur.column = 1;
        } else if cur.prev_cr {
            cur.prev_cr = false;
            if c == '\n' {
                cur.prev_lf = true;
            } else {
                cur.line += 1;
                cur.column = 1;
            }
        }

        match c {
            '\r' => cur.prev_cr = true,
            '\n' => cur.prev_lf = true,
            '\t' => {
                cur.column -= 1;
                cur.column += self.tab_size - (cur.column % self.tab_size);
            }
            _ => {}
        }
    }
}

impl CharStream for StrCharStream<'_> {
    fn begin_token(&mut self) -> Result<char, EndOfInput> {
        self.trail.clear();
        self.token_start = self.cursor.offset;
        let c = self.read_char()?;
        self.begin_line = self.cursor.line;
        self.begin_column = self.cursor.column;
        Ok(c)
    }

    fn read_char(&mut self) -> Result<char, EndOfInput> {
        let c = self.text[self.cursor.offset..]
            .chars()
            .next()
            .ok_or(EndOfInput)?;
        self.trail.push(self.cursor);
        self.advance(c);
        Ok(c)
    }

    fn backup(&mut self, amount: usize) {
        debug_assert!(amount <= self.trail.len(), "backup past token start");
        for _ in 0..amount {
            match self.trail.pop() {
                Some(prev) => self.cursor = prev,
                None => break,
            }
        }
    }

    fn image(&self) -> &str {
        &self.text[self.token_start..self.cursor.offset]
    }

    fn begin_line(&self) -> usize {
        self.begin_line
    }

    fn begin_column(&self) -> usize {
        self.begin_column
    }

    fn end_line(&self) -> usize {
        self.cursor.line
    }

    fn end_column(&self) -> usize {
        self.cursor.column
    }

    fn offset(&self) -> usize {
        self.cursor.offset
    }
}
