//! Converter from the syntax tree to the C++ `std::regex` dialect
//!
//! The output is meant to be pasted between the quotes of a C++ string
//! literal, so every escape is written twice: once for the ECMAScript regex
//! grammar and once more for the C string literal. A `\d` in the regex is
//! therefore emitted as the four characters `\\d`.
//!
//! Three points where the target grammar differs from the native one:
//! - `std::regex` has no nested class syntax, so unions are flattened into a
//!   single bracket expression.
//! - Its `.` does not match `\n` or `\r`; the native wildcard does.
//! - Its brackets give `.` no special meaning, so a wildcard member is
//!   written as the `\s\S` pair.

use crate::ast::{CharSpec, PredefinedClass, Regex};
use std::fmt::Write;

/// Regex-level escape for the target grammar, written for a C string literal
const BACKSLASH: &str = "\\\\";

/// Convert a syntax tree into a C-string-embeddable `std::regex` pattern
///
/// # Example
/// ```
/// use regjit::ast::{CharSpec, Regex};
/// use regjit::converter::convert;
///
/// let tree = Regex::concatenation(vec![
///     Some(Regex::literal(b'a')),
///     Some(Regex::optional(Regex::character(CharSpec::range(b'0', b'9')))),
/// ]);
/// assert_eq!(convert(&tree), "a([0-9])?");
/// ```
pub fn convert(tree: &Regex) -> String {
    let mut out = String::new();
    write_regex(&mut out, tree);
    out
}

/// Convert a single character spec, as it would appear outside brackets
pub fn convert_character(spec: &CharSpec) -> String {
    let mut out = String::new();
    write_character(&mut out, spec);
    out
}

/// Whether `byte` has a meaning of its own in an ECMAScript pattern,
/// inside or outside brackets
fn is_target_meta(byte: u8) -> bool {
    matches!(
        byte,
        b'^' | b'$'
            | b'\\'
            | b'.'
            | b'*'
            | b'+'
            | b'?'
            | b'('
            | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'|'
            | b'-'
            | b'/'
    )
}

/// Append one literal byte, escaped for the regex and then for the C string
pub fn write_literal_byte(out: &mut String, byte: u8) {
    match byte {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => out.push(byte as char),
        // regex `\\`, then each backslash doubled again for C
        b'\\' => {
            out.push_str(BACKSLASH);
            out.push_str(BACKSLASH);
        }
        _ if is_target_meta(byte) => {
            out.push_str(BACKSLASH);
            out.push(byte as char);
        }
        // Only special to the C string literal
        b'"' => out.push_str("\\\""),
        0x20..=0x7e => out.push(byte as char),
        _ => {
            out.push_str(BACKSLASH);
            let _ = write!(out, "x{:02x}", byte);
        }
    }
}

/// Escaped form of a single byte
pub fn escape_literal_byte(byte: u8) -> String {
    let mut out = String::new();
    write_literal_byte(&mut out, byte);
    out
}

fn write_shorthand(out: &mut String, class: PredefinedClass) {
    // `\d` becomes `\\d` inside the C literal
    out.push_str(&class.mnemonic().replace('\\', BACKSLASH));
}

fn write_range(out: &mut String, start: u8, end: u8) {
    // `std::regex<char>` may compare signed `char`, where 0x80..=0xff sort
    // below 0x00; split at the sign boundary so each half stays ordered
    if start < 0x80 && end >= 0x80 {
        write_range(out, start, 0x7f);
        write_range(out, 0x80, end);
        return;
    }
    write_literal_byte(out, start);
    out.push('-');
    write_literal_byte(out, end);
}

/// Append the members of a bracket expression, flattening nested unions
fn write_class_members(out: &mut String, spec: &CharSpec) {
    match spec {
        CharSpec::Union(members) => {
            for member in members {
                write_class_members(out, member);
            }
        }
        CharSpec::Range(start, end) => write_range(out, *start, *end),
        CharSpec::Predefined(PredefinedClass::Wildcard) => {
            // `(.|\n)` is not available inside brackets and `[.]` is a literal
            // dot, so cover every byte with a class and its complement
            write_shorthand(out, PredefinedClass::Space);
            write_shorthand(out, PredefinedClass::NonSpace);
        }
        CharSpec::Negation(argument) => match argument.as_ref() {
            CharSpec::Predefined(class) => match class.complement() {
                Some(complement) => write_shorthand(out, complement),
                None => write_character(out, spec),
            },
            _ => write_character(out, spec),
        },
        CharSpec::Constant(_) | CharSpec::Predefined(_) => write_character(out, spec),
    }
}

fn write_character(out: &mut String, spec: &CharSpec) {
    match spec {
        CharSpec::Constant(byte) => write_literal_byte(out, *byte),
        CharSpec::Range(start, end) => {
            out.push('[');
            write_range(out, *start, *end);
            out.push(']');
        }
        CharSpec::Union(_) => {
            out.push('[');
            write_class_members(out, spec);
            out.push(']');
        }
        CharSpec::Negation(argument) => {
            out.push_str("[^");
            write_class_members(out, argument);
            out.push(']');
        }
        CharSpec::Predefined(PredefinedClass::Wildcard) => {
            // std::regex `.` excludes line terminators
            out.push('(');
            write_shorthand(out, PredefinedClass::Space);
            out.push('|');
            write_shorthand(out, PredefinedClass::NonSpace);
            out.push(')');
        }
        CharSpec::Predefined(class) => write_shorthand(out, *class),
    }
}

fn write_regex(out: &mut String, tree: &Regex) {
    match tree {
        Regex::SingleCharacter(spec) => write_character(out, spec),
        Regex::Alternation(parts) => {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                if let Some(part) = part {
                    write_regex(out, part);
                }
            }
        }
        Regex::Concatenation(parts) => {
            for part in parts.iter().flatten() {
                if matches!(part, Regex::Alternation(_)) {
                    out.push('(');
                    write_regex(out, part);
                    out.push(')');
                } else {
                    write_regex(out, part);
                }
            }
        }
        Regex::Repetition { argument, min, max } => {
            out.push('(');
            write_regex(out, argument);
            out.push(')');
            write_quantifier(out, *min, *max);
        }
    }
}

fn write_quantifier(out: &mut String, min: Option<u32>, max: Option<u32>) {
    let _ = match (min, max) {
        (None, Some(max)) => write!(out, "{{,{}}}", max),
        (Some(0), None) => write!(out, "*"),
        (Some(1), None) => write!(out, "+"),
        (Some(min), None) => write!(out, "{{{},}}", min),
        (Some(0), Some(1)) => write!(out, "?"),
        (Some(min), Some(max)) => write!(out, "{{{},{}}}", min, max),
        // Not produced by the parser; a repetition always carries a bound
        (None, None) => Ok(()),
    };
}
