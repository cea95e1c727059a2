//! Generated C++ program wrapping one converted pattern
//!
//! The program holds the escaped pattern in a string constant, builds one
//! `std::regex` from it on first use and exports two C entry points:
//! - [`PREPARE_SYMBOL`] forces construction and reports whether
//!   `std::regex` accepted the pattern.
//! - [`MATCHES_SYMBOL`] runs a full match over a byte buffer.
//!
//! Construction happens behind a function-local static instead of at load
//! time, so a pattern rejected by `std::regex` comes back as an error code
//! rather than an exception escaping the dynamic loader.

use crate::ast::Regex;
use crate::converter::convert;

/// Exported symbol that constructs the matcher: `int (char*, size_t)`
pub const PREPARE_SYMBOL: &str = "regjit_prepare";

/// Exported symbol that runs a match: `int (const char*, size_t)`
pub const MATCHES_SYMBOL: &str = "regjit_matches";

/// Placeholder replaced with the converted pattern
const PATTERN_SLOT: &str = "@REGJIT_PATTERN@";

const TEMPLATE: &str = r#"#include <cstddef>
#include <cstring>
#include <exception>
#include <iostream>
#include <regex>

#if defined(_WIN32) || defined(_WIN64)
  #define REGJIT_EXPORT __declspec(dllexport)
#elif defined(__GNUC__) || defined(__clang__)
  #define REGJIT_EXPORT __attribute__((visibility("default")))
#else
  #define REGJIT_EXPORT
#endif

static const char REGJIT_PATTERN[] = "@REGJIT_PATTERN@";

static const std::regex& regjit_regex()
{
    static const std::regex compiled(REGJIT_PATTERN, sizeof(REGJIT_PATTERN) - 1, std::regex::ECMAScript);
    return compiled;
}

extern "C" REGJIT_EXPORT int regjit_prepare(char* message, std::size_t capacity)
{
    try {
        (void)regjit_regex();
        return 1;
    } catch (const std::exception& e) {
        if (message != nullptr && capacity > 0) {
            std::strncpy(message, e.what(), capacity - 1);
            message[capacity - 1] = '\0';
        }
        return 0;
    }
}

extern "C" REGJIT_EXPORT int regjit_matches(const char* input, std::size_t length)
{
    try {
        return std::regex_match(input, input + length, regjit_regex()) ? 1 : 0;
    } catch (const std::exception& e) {
        std::cerr << "regjit: " << e.what() << std::endl;
        return 0;
    }
}
"#;

/// A converted pattern together with the program that embeds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// The dialect string, already escaped for a C string literal
    pub dialect: String,
    /// Complete C++ translation unit
    pub source: String,
}

impl Program {
    /// Convert `tree` and render the program around it
    pub fn generate(tree: &Regex) -> Self {
        Program::from_dialect(convert(tree))
    }

    /// Render the program around an already converted pattern
    pub fn from_dialect(dialect: String) -> Self {
        let source = TEMPLATE.replacen(PATTERN_SLOT, &dialect, 1);
        Program { dialect, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_pattern_is_embedded_in_string_constant() {
        let program = Program::generate(&parse(br"a\d").unwrap());
        assert_eq!(program.dialect, "a\\\\d");
        assert!(
            program
                .source
                .contains("static const char REGJIT_PATTERN[] = \"a\\\\d\";")
        );
        assert!(!program.source.contains(PATTERN_SLOT));
    }

    #[test]
    fn test_exports_both_entry_points() {
        let program = Program::from_dialect("a".to_string());
        assert!(program.source.contains(&format!("int {}(char*", PREPARE_SYMBOL)));
        assert!(
            program
                .source
                .contains(&format!("int {}(const char*", MATCHES_SYMBOL))
        );
    }

    #[test]
    fn test_uses_full_match() {
        let program = Program::from_dialect("a".to_string());
        assert!(program.source.contains("std::regex_match("));
        assert!(!program.source.contains("std::regex_search("));
    }

    #[test]
    fn test_dialect_is_inserted_once() {
        let program = Program::from_dialect("x".to_string());
        assert_eq!(program.source.matches("\"x\"").count(), 1);
    }

    #[test]
    fn test_quote_in_pattern_does_not_terminate_literal() {
        let program = Program::generate(&parse(b"say \"hi\"").unwrap());
        assert!(
            program
                .source
                .contains(r#"REGJIT_PATTERN[] = "say \"hi\"";"#)
        );
    }
}
