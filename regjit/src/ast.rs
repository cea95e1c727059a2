//! Syntax tree for byte-oriented regex patterns
//!
//! This module defines the tree produced by the parser and consumed by the
//! converter. The node set is closed:
//! - Single characters (literal bytes, ranges, unions, negations, shorthands)
//! - Concatenation and alternation, both allowing empty (`None`) elements
//! - Repetition with optional lower and upper bounds
//!
//! `Display` renders a tree back into the native grammar accepted by
//! [`crate::parser::parse`].

use std::fmt;

/// A node of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// One input byte described by a [`CharSpec`]
    SingleCharacter(CharSpec),

    /// Parts matched one after another; `None` parts match the empty string
    Concatenation(Vec<Option<Regex>>),

    /// Any one of the parts; a `None` part is an empty branch
    Alternation(Vec<Option<Regex>>),

    /// Repeated expression (e.g., `a*`, `a+`, `a?`, `a{3,5}`)
    Repetition {
        /// The expression being repeated
        argument: Box<Regex>,
        /// Lower bound; absent only for the upper-bound-only form
        min: Option<u32>,
        /// Upper bound; absent means unbounded
        max: Option<u32>,
    },
}

/// What a single matched byte may be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharSpec {
    /// Exactly this byte
    Constant(u8),
    /// Any byte in `start..=end`
    Range(u8, u8),
    /// Any byte matched by one of the members
    Union(Vec<CharSpec>),
    /// Any byte not matched by the argument
    Negation(Box<CharSpec>),
    /// A named shorthand class
    Predefined(PredefinedClass),
}

/// Shorthand character classes of the native grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedClass {
    /// `\d`
    Digit,
    /// `\D`
    NonDigit,
    /// `\w`
    Word,
    /// `\W`
    NonWord,
    /// `\s`
    Space,
    /// `\S`
    NonSpace,
    /// `.` - any byte, line terminators included
    Wildcard,
}

impl PredefinedClass {
    /// The class as written in the native grammar
    pub fn mnemonic(self) -> &'static str {
        match self {
            PredefinedClass::Digit => "\\d",
            PredefinedClass::NonDigit => "\\D",
            PredefinedClass::Word => "\\w",
            PredefinedClass::NonWord => "\\W",
            PredefinedClass::Space => "\\s",
            PredefinedClass::NonSpace => "\\S",
            PredefinedClass::Wildcard => ".",
        }
    }

    /// The complementary shorthand, if the class has one
    pub fn complement(self) -> Option<PredefinedClass> {
        match self {
            PredefinedClass::Digit => Some(PredefinedClass::NonDigit),
            PredefinedClass::NonDigit => Some(PredefinedClass::Digit),
            PredefinedClass::Word => Some(PredefinedClass::NonWord),
            PredefinedClass::NonWord => Some(PredefinedClass::Word),
            PredefinedClass::Space => Some(PredefinedClass::NonSpace),
            PredefinedClass::NonSpace => Some(PredefinedClass::Space),
            PredefinedClass::Wildcard => None,
        }
    }

    /// Map the letter after a backslash to a shorthand class
    pub fn from_escape(letter: u8) -> Option<PredefinedClass> {
        match letter {
            b'd' => Some(PredefinedClass::Digit),
            b'D' => Some(PredefinedClass::NonDigit),
            b'w' => Some(PredefinedClass::Word),
            b'W' => Some(PredefinedClass::NonWord),
            b's' => Some(PredefinedClass::Space),
            b'S' => Some(PredefinedClass::NonSpace),
            _ => None,
        }
    }
}

impl Regex {
    /// Create a single literal byte
    pub fn literal(byte: u8) -> Self {
        Regex::SingleCharacter(CharSpec::Constant(byte))
    }

    /// Create a concatenation of literal bytes
    pub fn literal_bytes(bytes: &[u8]) -> Self {
        Regex::Concatenation(bytes.iter().map(|&b| Some(Regex::literal(b))).collect())
    }

    /// Create a single-character node
    pub fn character(spec: CharSpec) -> Self {
        Regex::SingleCharacter(spec)
    }

    /// Create the wildcard (`.`)
    pub fn wildcard() -> Self {
        Regex::SingleCharacter(CharSpec::Predefined(PredefinedClass::Wildcard))
    }

    /// Create a concatenation of the given parts
    pub fn concatenation(parts: Vec<Option<Regex>>) -> Self {
        Regex::Concatenation(parts)
    }

    /// Create an alternation of the given branches
    pub fn alternation(parts: Vec<Option<Regex>>) -> Self {
        Regex::Alternation(parts)
    }

    /// Create a repetition
    pub fn repetition(argument: Regex, min: Option<u32>, max: Option<u32>) -> Self {
        debug_assert!(
            min.is_some() || max.is_some(),
            "repetition needs at least one bound"
        );
        Regex::Repetition {
            argument: Box::new(argument),
            min,
            max,
        }
    }

    /// `argument*`
    pub fn star(argument: Regex) -> Self {
        Regex::repetition(argument, Some(0), None)
    }

    /// `argument+`
    pub fn plus(argument: Regex) -> Self {
        Regex::repetition(argument, Some(1), None)
    }

    /// `argument?`
    pub fn optional(argument: Regex) -> Self {
        Regex::repetition(argument, Some(0), Some(1))
    }

    /// Convert the tree back to the native grammar
    pub fn to_regex_string(&self) -> String {
        self.to_string()
    }
}

impl CharSpec {
    /// Create an inclusive byte range
    pub fn range(start: u8, end: u8) -> Self {
        CharSpec::Range(start, end)
    }

    /// Create a union of members
    pub fn union(members: Vec<CharSpec>) -> Self {
        CharSpec::Union(members)
    }

    /// Create the negation of `argument`
    pub fn negation(argument: CharSpec) -> Self {
        CharSpec::Negation(Box::new(argument))
    }

    /// Create a shorthand class
    pub fn predefined(class: PredefinedClass) -> Self {
        CharSpec::Predefined(class)
    }
}

/// Bytes that need a backslash in the native grammar
fn is_native_meta(byte: u8) -> bool {
    matches!(
        byte,
        b'\\' | b'.' | b'*' | b'+' | b'?' | b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'|' | b'^'
            | b'-'
    )
}

fn write_native_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte {
        b'\n' => f.write_str("\\n"),
        b'\r' => f.write_str("\\r"),
        b'\t' => f.write_str("\\t"),
        _ if is_native_meta(byte) => write!(f, "\\{}", byte as char),
        0x20..=0x7e => write!(f, "{}", byte as char),
        _ => write!(f, "\\x{:02x}", byte),
    }
}

impl CharSpec {
    fn fmt_class_member(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharSpec::Range(start, end) => {
                write_native_byte(f, *start)?;
                f.write_str("-")?;
                write_native_byte(f, *end)
            }
            CharSpec::Union(members) => {
                for member in members {
                    member.fmt_class_member(f)?;
                }
                Ok(())
            }
            // `.` inside brackets reads back as a literal dot
            CharSpec::Predefined(PredefinedClass::Wildcard) => f.write_str("\\s\\S"),
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for CharSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharSpec::Constant(byte) => write_native_byte(f, *byte),
            CharSpec::Range(..) | CharSpec::Union(_) => {
                f.write_str("[")?;
                self.fmt_class_member(f)?;
                f.write_str("]")
            }
            CharSpec::Negation(argument) => {
                f.write_str("[^")?;
                argument.fmt_class_member(f)?;
                f.write_str("]")
            }
            CharSpec::Predefined(class) => f.write_str(class.mnemonic()),
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::SingleCharacter(spec) => write!(f, "{}", spec),
            Regex::Concatenation(parts) => {
                for part in parts.iter().flatten() {
                    if matches!(part, Regex::Alternation(_)) {
                        write!(f, "({})", part)?;
                    } else {
                        write!(f, "{}", part)?;
                    }
                }
                Ok(())
            }
            Regex::Alternation(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    if let Some(part) = part {
                        write!(f, "{}", part)?;
                    }
                }
                Ok(())
            }
            Regex::Repetition { argument, min, max } => {
                write!(f, "({})", argument)?;
                match (min, max) {
                    (Some(0), None) => f.write_str("*"),
                    (Some(1), None) => f.write_str("+"),
                    (Some(0), Some(1)) => f.write_str("?"),
                    (Some(min), None) => write!(f, "{{{},}}", min),
                    (Some(min), Some(max)) if min == max => write!(f, "{{{}}}", min),
                    (Some(min), Some(max)) => write!(f, "{{{},{}}}", min, max),
                    (None, Some(max)) => write!(f, "{{,{}}}", max),
                    (None, None) => Ok(()),
                }
            }
        }
    }
}
