//! Lexer for tokenizing byte patterns
//!
//! This module provides a tokenizer that converts a pattern byte sequence
//! into a stream of tokens for parsing. Inside brackets only `]`, `-`, `^`
//! and `\` are special; everything else is a literal byte.

use crate::ast::PredefinedClass;
use crate::error::ParseError;
use std::fmt;

/// A token in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Left bracket `[` (start of character class)
    LeftBracket,
    /// Right bracket `]` (end of character class)
    RightBracket,
    /// Left brace `{` (start of counted repetition)
    LeftBrace,
    /// Right brace `}` (end of counted repetition)
    RightBrace,
    /// Comma `,` (used in repetitions like {n,m})
    Comma,
    /// Pipe `|` (alternation)
    Pipe,
    /// Caret `^` (negation at the start of a character class)
    Caret,
    /// Minus `-` inside a character class
    Minus,
    /// Dot `.` (any byte)
    Dot,
    /// Star `*` (zero or more)
    Star,
    /// Plus `+` (one or more)
    Plus,
    /// Question `?` (optional)
    Question,
    /// Shorthand class (`\d`, `\w`, `\s` and their complements)
    Shorthand(PredefinedClass),
    /// A literal byte, possibly written as an escape
    Literal(u8),
    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::LeftBracket => write!(f, "`[`"),
            Token::RightBracket => write!(f, "`]`"),
            Token::LeftBrace => write!(f, "`{{`"),
            Token::RightBrace => write!(f, "`}}`"),
            Token::Comma => write!(f, "`,`"),
            Token::Pipe => write!(f, "`|`"),
            Token::Caret => write!(f, "`^`"),
            Token::Minus => write!(f, "`-`"),
            Token::Dot => write!(f, "`.`"),
            Token::Star => write!(f, "`*`"),
            Token::Plus => write!(f, "`+`"),
            Token::Question => write!(f, "`?`"),
            Token::Shorthand(class) => write!(f, "shorthand `{}`", class.mnemonic()),
            Token::Literal(b) if b.is_ascii_graphic() => write!(f, "literal `{}`", *b as char),
            Token::Literal(b) => write!(f, "literal 0x{:02x}", b),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// Lexer for tokenizing patterns
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    /// Start offset of the most recently returned token
    token_start: usize,
    /// Whether we're currently inside a character class
    in_char_class: bool,
    /// Whether the next class token is the first member (`]` is literal there)
    class_first: bool,
    /// Offset right after the `[` that opened the current class
    class_open_end: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given pattern
    pub fn new(input: &'a [u8]) -> Self {
        Lexer {
            input,
            position: 0,
            token_start: 0,
            in_char_class: false,
            class_first: false,
            class_open_end: 0,
        }
    }

    /// Offset of the most recently returned token
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// The raw byte at `position`
    pub fn byte_at(&self, position: usize) -> Option<u8> {
        self.input.get(position).copied()
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.current()?;
        self.position += 1;
        Some(byte)
    }

    fn hex_digit(&mut self) -> Result<u8, ParseError> {
        let byte = self.bump().ok_or(ParseError::UnexpectedEnd {
            expected: "hex digit",
        })?;
        match byte {
            b'0'..=b'9' => Ok(byte - b'0'),
            b'a'..=b'f' => Ok(byte - b'a' + 10),
            b'A'..=b'F' => Ok(byte - b'A' + 10),
            _ => Err(ParseError::InvalidEscape(self.token_start)),
        }
    }

    /// Read an escape sequence (assumes backslash was already consumed)
    fn read_escape(&mut self) -> Result<Token, ParseError> {
        let c = self.bump().ok_or(ParseError::UnexpectedEnd {
            expected: "escaped byte",
        })?;
        if let Some(class) = PredefinedClass::from_escape(c) {
            return Ok(Token::Shorthand(class));
        }
        let byte = match c {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'0' => 0x00,
            b'x' => {
                let high = self.hex_digit()?;
                let low = self.hex_digit()?;
                (high << 4) | low
            }
            other => other,
        };
        Ok(Token::Literal(byte))
    }

    fn next_class_token(&mut self, c: u8) -> Result<Token, ParseError> {
        let first = std::mem::replace(&mut self.class_first, false);
        let token = match c {
            b'\\' => return self.read_escape(),
            b']' if !first => {
                self.in_char_class = false;
                Token::RightBracket
            }
            b'^' if first && self.token_start == self.class_open_end => {
                // `[^` keeps the following member in first position
                self.class_first = true;
                Token::Caret
            }
            b'-' => Token::Minus,
            other => Token::Literal(other),
        };
        Ok(token)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.token_start = self.position;
        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };

        if self.in_char_class {
            return self.next_class_token(c);
        }

        let token = match c {
            b'\\' => return self.read_escape(),
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            b'[' => {
                self.in_char_class = true;
                self.class_first = true;
                self.class_open_end = self.position;
                Token::LeftBracket
            }
            b']' => Token::RightBracket,
            b'{' => Token::LeftBrace,
            b'}' => Token::RightBrace,
            b',' => Token::Comma,
            b'|' => Token::Pipe,
            b'.' => Token::Dot,
            b'*' => Token::Star,
            b'+' => Token::Plus,
            b'?' => Token::Question,
            other => Token::Literal(other),
        };
        Ok(token)
    }

    /// Tokenize the entire input and return a vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            tokens.push(token);
            if token == Token::Eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_literal_sequence() {
        assert_eq!(
            tokens(b"abc"),
            vec![
                Token::Literal(b'a'),
                Token::Literal(b'b'),
                Token::Literal(b'c'),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokens(b""), vec![Token::Eof]);
    }

    #[test]
    fn test_quantifiers() {
        assert_eq!(
            tokens(b"a*b+c?"),
            vec![
                Token::Literal(b'a'),
                Token::Star,
                Token::Literal(b'b'),
                Token::Plus,
                Token::Literal(b'c'),
                Token::Question,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quantifier_braces() {
        assert_eq!(
            tokens(b"a{3,5}"),
            vec![
                Token::Literal(b'a'),
                Token::LeftBrace,
                Token::Literal(b'3'),
                Token::Comma,
                Token::Literal(b'5'),
                Token::RightBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_shorthands_and_dot() {
        assert_eq!(
            tokens(br"\d.\W"),
            vec![
                Token::Shorthand(PredefinedClass::Digit),
                Token::Dot,
                Token::Shorthand(PredefinedClass::NonWord),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(
            tokens(br"\n\t\\\.\x41\xfF"),
            vec![
                Token::Literal(b'\n'),
                Token::Literal(b'\t'),
                Token::Literal(b'\\'),
                Token::Literal(b'.'),
                Token::Literal(b'A'),
                Token::Literal(0xff),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_character_class_is_literal_inside() {
        assert_eq!(
            tokens(b"[.*(]"),
            vec![
                Token::LeftBracket,
                Token::Literal(b'.'),
                Token::Literal(b'*'),
                Token::Literal(b'('),
                Token::RightBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_negated_class_with_range() {
        assert_eq!(
            tokens(b"[^a-z]"),
            vec![
                Token::LeftBracket,
                Token::Caret,
                Token::Literal(b'a'),
                Token::Minus,
                Token::Literal(b'z'),
                Token::RightBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_leading_bracket_in_class_is_literal() {
        assert_eq!(
            tokens(b"[]a]"),
            vec![
                Token::LeftBracket,
                Token::Literal(b']'),
                Token::Literal(b'a'),
                Token::RightBracket,
                Token::Eof,
            ]
        );
        assert_eq!(
            tokens(b"[^]]"),
            vec![
                Token::LeftBracket,
                Token::Caret,
                Token::Literal(b']'),
                Token::RightBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_caret_after_first_member_is_literal() {
        assert_eq!(
            tokens(b"[a^]"),
            vec![
                Token::LeftBracket,
                Token::Literal(b'a'),
                Token::Literal(b'^'),
                Token::RightBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_minus_outside_class_is_literal() {
        assert_eq!(tokens(b"a-b")[1], Token::Literal(b'-'));
    }

    #[test]
    fn test_trailing_backslash() {
        let err = Lexer::new(b"ab\\").tokenize().unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEnd {
                expected: "escaped byte"
            }
        );
    }

    #[test]
    fn test_bad_hex_escape() {
        let err = Lexer::new(br"a\xzz").tokenize().unwrap_err();
        assert_eq!(err, ParseError::InvalidEscape(1));
    }

    #[test]
    fn test_token_start_tracks_offsets() {
        let mut lexer = Lexer::new(br"a\x41b");
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_start(), 0);
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_start(), 1);
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_start(), 5);
    }
}
