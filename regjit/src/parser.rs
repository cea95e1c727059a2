//! Parser for byte patterns
//!
//! This module provides a recursive descent parser that converts
//! tokens into a syntax tree.
//!
//! Grammar (in order of precedence, lowest to highest):
//!   regex       := alternation
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := repeated*
//!   repeated    := atom quantifier*
//!   quantifier  := '*' | '+' | '?' | '{' number? (',' number?)? '}'
//!   atom        := literal | group | char_class | '.' | shorthand
//!   group       := '(' alternation ')'
//!   char_class  := '[' '^'? class_item+ ']'
//!   class_item  := class_atom ( '-' class_atom )?

use crate::ast::{CharSpec, Regex};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token};

/// Parser for byte patterns
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    current_position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern
    pub fn new(input: &'a [u8]) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_position,
        })
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_start();
        Ok(())
    }

    /// Look at the token after the current one without consuming anything
    fn peek(&self) -> Result<Token, ParseError> {
        self.lexer.clone().next_token()
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.current_token {
            Token::Eof => ParseError::UnexpectedEnd { expected },
            _ => ParseError::UnexpectedByte {
                position: self.current_position,
                byte: self.lexer.byte_at(self.current_position).unwrap_or(0),
            },
        }
    }

    /// Parse the entire input and return the tree
    pub fn parse(&mut self) -> Result<Regex, ParseError> {
        let expr = self.parse_alternation()?;

        // Ensure we've consumed all tokens
        if self.current_token != Token::Eof {
            return Err(self.unexpected("end of pattern"));
        }

        Ok(expr.unwrap_or_else(|| Regex::Concatenation(Vec::new())))
    }

    /// Parse alternation (lowest precedence)
    /// alternation := sequence ( '|' sequence )*
    fn parse_alternation(&mut self) -> Result<Option<Regex>, ParseError> {
        let mut alternatives = vec![self.parse_sequence()?];

        while self.current_token == Token::Pipe {
            self.advance()?; // consume '|'
            alternatives.push(self.parse_sequence()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.pop().flatten())
        } else {
            Ok(Some(Regex::Alternation(alternatives)))
        }
    }

    /// Parse a sequence (concatenation)
    /// sequence := repeated*
    fn parse_sequence(&mut self) -> Result<Option<Regex>, ParseError> {
        let mut expressions = Vec::new();

        while !matches!(
            self.current_token,
            Token::Eof | Token::RightParen | Token::Pipe
        ) {
            expressions.push(self.parse_repeated()?);
        }

        match expressions.len() {
            0 => Ok(None),
            1 => Ok(expressions.pop()),
            _ => Ok(Some(Regex::Concatenation(
                expressions.into_iter().map(Some).collect(),
            ))),
        }
    }

    /// Parse an atom followed by any number of quantifiers
    /// repeated := atom quantifier*
    fn parse_repeated(&mut self) -> Result<Regex, ParseError> {
        let mut expr = self.parse_atom()?;

        while let Some((min, max)) = self.parse_quantifier()? {
            expr = Regex::Repetition {
                argument: Box::new(expr),
                min,
                max,
            };
        }

        Ok(expr)
    }

    /// Parse a quantifier if present, returning its bounds
    fn parse_quantifier(&mut self) -> Result<Option<(Option<u32>, Option<u32>)>, ParseError> {
        let bounds = match self.current_token {
            Token::Star => (Some(0), None),
            Token::Plus => (Some(1), None),
            Token::Question => (Some(0), Some(1)),
            Token::LeftBrace => return self.parse_counted().map(Some),
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(bounds))
    }

    /// Parse `{n}`, `{n,}`, `{n,m}` or `{,m}`
    fn parse_counted(&mut self) -> Result<(Option<u32>, Option<u32>), ParseError> {
        let open = self.current_position;
        self.advance()?; // consume '{'

        let min = self.parse_number()?;
        let bounds = if self.current_token == Token::Comma {
            self.advance()?; // consume ','
            let max = self.parse_number()?;
            match (min, max) {
                // The target engine has no upper-bound-only form
                (None, Some(max)) => (Some(0), Some(max)),
                (Some(min), max) => (Some(min), max),
                (None, None) => return Err(self.unexpected("repetition count")),
            }
        } else {
            match min {
                Some(n) => (Some(n), Some(n)),
                None => return Err(self.unexpected("repetition count")),
            }
        };

        if self.current_token != Token::RightBrace {
            return Err(self.unexpected("`}`"));
        }
        self.advance()?;

        if let (Some(min), Some(max)) = bounds
            && min > max
        {
            return Err(ParseError::InvalidRepetition {
                position: open,
                min,
                max,
            });
        }

        Ok(bounds)
    }

    /// Parse a decimal number, if one is present
    fn parse_number(&mut self) -> Result<Option<u32>, ParseError> {
        let start = self.current_position;
        let mut num: Option<u32> = None;
        while let Token::Literal(c) = self.current_token {
            if !c.is_ascii_digit() {
                break;
            }
            let digit = u32::from(c - b'0');
            num = Some(
                num.unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit))
                    .ok_or(ParseError::NumberTooLarge(start))?,
            );
            self.advance()?;
        }
        Ok(num)
    }

    /// Parse an atomic expression
    /// atom := literal | group | char_class | '.' | shorthand
    fn parse_atom(&mut self) -> Result<Regex, ParseError> {
        let expr = match self.current_token {
            Token::Literal(b) => Regex::literal(b),
            Token::Dot => Regex::wildcard(),
            Token::Shorthand(class) => Regex::character(CharSpec::Predefined(class)),
            // Only meaningful inside braces or brackets
            Token::Comma => Regex::literal(b','),
            Token::RightBrace => Regex::literal(b'}'),
            Token::RightBracket => Regex::literal(b']'),
            Token::LeftParen => return self.parse_group(),
            Token::LeftBracket => return self.parse_char_class(),
            Token::Star | Token::Plus | Token::Question | Token::LeftBrace => {
                return Err(ParseError::NothingToRepeat(self.current_position));
            }
            Token::Eof => return Err(ParseError::UnexpectedEnd {
                expected: "expression",
            }),
            Token::RightParen | Token::Pipe | Token::Caret | Token::Minus => {
                return Err(self.unexpected("expression"));
            }
        };
        self.advance()?;
        Ok(expr)
    }

    /// Parse a group
    /// group := '(' alternation ')'
    fn parse_group(&mut self) -> Result<Regex, ParseError> {
        let open = self.current_position;
        self.advance()?; // consume '('

        let inner = self.parse_alternation()?;

        if self.current_token != Token::RightParen {
            return Err(ParseError::UnclosedGroup(open));
        }
        self.advance()?;

        Ok(inner.unwrap_or_else(|| Regex::Concatenation(Vec::new())))
    }

    /// Parse a character class
    /// char_class := '[' '^'? class_item+ ']'
    fn parse_char_class(&mut self) -> Result<Regex, ParseError> {
        let open = self.current_position;
        self.advance()?; // consume '['

        let negated = if self.current_token == Token::Caret {
            self.advance()?;
            true
        } else {
            false
        };

        let mut members = Vec::new();
        while self.current_token != Token::RightBracket {
            if self.current_token == Token::Eof {
                return Err(ParseError::UnclosedClass(open));
            }
            members.push(self.parse_class_item()?);
        }
        self.advance()?; // consume ']'

        let union = CharSpec::Union(members);
        if negated {
            Ok(Regex::character(CharSpec::negation(union)))
        } else {
            Ok(Regex::character(union))
        }
    }

    /// Parse an item in a character class
    /// class_item := class_atom ( '-' class_atom )?
    fn parse_class_item(&mut self) -> Result<CharSpec, ParseError> {
        let start_position = self.current_position;
        let start = match self.current_token {
            Token::Literal(b) => b,
            Token::Minus => b'-',
            Token::Caret => b'^',
            Token::Shorthand(class) => {
                self.advance()?;
                return Ok(CharSpec::Predefined(class));
            }
            _ => return Err(self.unexpected("character class member")),
        };
        self.advance()?;

        // `a-` directly before `]` keeps the minus literal
        if self.current_token != Token::Minus || self.peek()? == Token::RightBracket {
            return Ok(CharSpec::Constant(start));
        }
        self.advance()?; // consume '-'

        let end = match self.current_token {
            Token::Literal(b) => b,
            Token::Minus => b'-',
            Token::Eof => return Err(ParseError::UnexpectedEnd {
                expected: "range end",
            }),
            _ => return Err(self.unexpected("range end")),
        };
        if start > end {
            return Err(ParseError::InvalidRange {
                position: start_position,
                start,
                end,
            });
        }
        self.advance()?;
        Ok(CharSpec::Range(start, end))
    }
}

/// Parse a pattern into a syntax tree
pub fn parse(input: &[u8]) -> Result<Regex, ParseError> {
    let mut parser = Parser::new(input)?;
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PredefinedClass;

    fn round_trip(pattern: &str) -> String {
        parse(pattern.as_bytes()).unwrap().to_regex_string()
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(
            parse(b"ab").unwrap(),
            Regex::Concatenation(vec![Some(Regex::literal(b'a')), Some(Regex::literal(b'b'))])
        );
        assert_eq!(parse(b"a").unwrap(), Regex::literal(b'a'));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(b"").unwrap(), Regex::Concatenation(Vec::new()));
        assert_eq!(round_trip(""), "");
    }

    #[test]
    fn test_parse_alternation_with_empty_branches() {
        assert_eq!(
            parse(b"|a|").unwrap(),
            Regex::Alternation(vec![None, Some(Regex::literal(b'a')), None])
        );
    }

    #[test]
    fn test_parse_group_keeps_precedence() {
        assert_eq!(round_trip("x(a|b)y"), "x(a|b)y");
        assert_eq!(round_trip("(ab)"), "ab");
    }

    #[test]
    fn test_parse_quantifiers() {
        assert_eq!(
            parse(b"a*").unwrap(),
            Regex::repetition(Regex::literal(b'a'), Some(0), None)
        );
        assert_eq!(round_trip("a+"), "(a)+");
        assert_eq!(round_trip("a?"), "(a)?");
        assert_eq!(round_trip("a{3}"), "(a){3}");
        assert_eq!(round_trip("a{2,5}"), "(a){2,5}");
        assert_eq!(round_trip("a{3,}"), "(a){3,}");
    }

    #[test]
    fn test_parse_upper_bound_only_gets_zero_minimum() {
        assert_eq!(
            parse(b"a{,3}").unwrap(),
            Regex::repetition(Regex::literal(b'a'), Some(0), Some(3))
        );
    }

    #[test]
    fn test_parse_stacked_quantifiers() {
        assert_eq!(round_trip("(a+)+b"), "((a)+)+b");
        assert_eq!(round_trip("a**"), "((a)*)*");
    }

    #[test]
    fn test_parse_wildcard_and_shorthands() {
        assert_eq!(parse(b".").unwrap(), Regex::wildcard());
        assert_eq!(
            parse(br"\s").unwrap(),
            Regex::character(CharSpec::Predefined(PredefinedClass::Space))
        );
    }

    #[test]
    fn test_parse_character_class() {
        assert_eq!(
            parse(b"[bB]").unwrap(),
            Regex::character(CharSpec::Union(vec![
                CharSpec::Constant(b'b'),
                CharSpec::Constant(b'B'),
            ]))
        );
        assert_eq!(round_trip("[a-z0-9_]"), "[a-z0-9_]");
    }

    #[test]
    fn test_parse_negated_class() {
        assert_eq!(
            parse(b"[^a-c]").unwrap(),
            Regex::character(CharSpec::negation(CharSpec::Union(vec![CharSpec::Range(
                b'a', b'c'
            )])))
        );
    }

    #[test]
    fn test_parse_class_special_members() {
        assert_eq!(
            parse(b"[-a-]").unwrap(),
            Regex::character(CharSpec::Union(vec![
                CharSpec::Constant(b'-'),
                CharSpec::Constant(b'a'),
                CharSpec::Constant(b'-'),
            ]))
        );
        assert_eq!(
            parse(br"[.\d]").unwrap(),
            Regex::character(CharSpec::Union(vec![
                CharSpec::Constant(b'.'),
                CharSpec::Predefined(PredefinedClass::Digit),
            ]))
        );
    }

    #[test]
    fn test_parse_example_pattern() {
        assert_eq!(
            round_trip(r"a[bB][0-9]\d\w?.\s"),
            r"a[bB][0-9]\d(\w)?.\s"
        );
    }

    #[test]
    fn test_parse_error_unclosed_group() {
        assert_eq!(parse(b"(abc"), Err(ParseError::UnclosedGroup(0)));
    }

    #[test]
    fn test_parse_error_unclosed_class() {
        assert_eq!(parse(b"x[abc"), Err(ParseError::UnclosedClass(1)));
    }

    #[test]
    fn test_parse_error_stray_paren() {
        assert_eq!(
            parse(b"ab)"),
            Err(ParseError::UnexpectedByte {
                position: 2,
                byte: b')'
            })
        );
    }

    #[test]
    fn test_parse_error_nothing_to_repeat() {
        assert_eq!(parse(b"*a"), Err(ParseError::NothingToRepeat(0)));
        assert_eq!(parse(b"a|+"), Err(ParseError::NothingToRepeat(2)));
    }

    #[test]
    fn test_parse_error_invalid_range() {
        assert_eq!(
            parse(b"[z-a]"),
            Err(ParseError::InvalidRange {
                position: 1,
                start: b'z',
                end: b'a'
            })
        );
    }

    #[test]
    fn test_parse_error_invalid_repetition() {
        assert_eq!(
            parse(b"a{5,2}"),
            Err(ParseError::InvalidRepetition {
                position: 1,
                min: 5,
                max: 2
            })
        );
        assert!(parse(b"a{}").is_err());
        assert!(parse(b"a{,}").is_err());
        assert!(parse(b"a{2").is_err());
    }

    #[test]
    fn test_parse_error_number_too_large() {
        assert_eq!(
            parse(b"a{99999999999}"),
            Err(ParseError::NumberTooLarge(2))
        );
    }
}
