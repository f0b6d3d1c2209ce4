//! Byte cursor shared by the text decoders.

use crate::error::ParseError;

const SNIPPET_LEN: usize = 12;

pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume `c` if it is next (after whitespace).
    pub fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn expect_char(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("`{}`", c)))
        }
    }

    /// Consume `word` if it is next (after whitespace). Words are matched
    /// literally; callers check the boundary when it matters.
    pub fn eat_keyword(&mut self, word: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.error(format!("`{}`", word)))
        }
    }

    /// Identifier `[A-Za-z_][A-Za-z0-9_]*`. Returns the start offset with it.
    pub fn ident(&mut self) -> Result<(usize, &'a str), ParseError> {
        self.skip_ws();
        let start = self.pos;
        let rest = self.rest();
        let mut len = 0;
        for (i, c) in rest.char_indices() {
            let ok = if i == 0 {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            len = i + c.len_utf8();
        }
        if len == 0 {
            return Err(self.error("identifier"));
        }
        self.pos += len;
        Ok((start, &rest[..len]))
    }

    /// Run of ASCII digits. Returns the start offset with it.
    pub fn digits(&mut self) -> Result<(usize, &'a str), ParseError> {
        self.skip_ws();
        let start = self.pos;
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return Err(self.error("number"));
        }
        self.pos += len;
        Ok((start, &rest[..len]))
    }

    /// Decimal number. Overlong digit runs saturate so range checks still
    /// report them as out of range instead of as grammar errors.
    pub fn number(&mut self) -> Result<(usize, i64), ParseError> {
        let (start, text) = self.digits()?;
        let value = text.parse::<i64>().unwrap_or(i64::MAX);
        Ok((start, value))
    }

    /// A single ASCII digit, no whitespace skipping.
    pub fn digit(&mut self) -> Result<u8, ParseError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                self.pos += 1;
                Ok(c as u8 - b'0')
            }
            _ => Err(self.error("digit")),
        }
    }

    /// A single ASCII letter, no whitespace skipping.
    pub fn letter(&mut self) -> Result<char, ParseError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(self.error("letter code")),
        }
    }

    pub fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("end of input"))
        }
    }

    pub fn error(&self, expected: impl Into<String>) -> ParseError {
        self.error_at(self.pos, expected)
    }

    pub fn error_at(&self, offset: usize, expected: impl Into<String>) -> ParseError {
        let rest = self.src.get(offset..).unwrap_or("");
        let found = if rest.is_empty() {
            "end of input".to_string()
        } else {
            let snippet: String = rest.chars().take(SNIPPET_LEN).collect();
            format!("`{}`", snippet)
        };
        ParseError {
            offset,
            expected: expected.into(),
            found,
        }
    }
}
