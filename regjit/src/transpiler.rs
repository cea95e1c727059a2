//! Pattern-to-dialect conversion entry points
//!
//! These run the parse and convert stages without touching a compiler, which
//! is what the CLI's `convert` and `source` commands and most tests need.

use crate::error::Result;
use crate::parser::parse;
use crate::program::Program;

/// Convert a native pattern to its `std::regex` dialect string
///
/// The result is escaped for a C string literal.
///
/// # Example
/// ```
/// use regjit::to_dialect;
///
/// let dialect = to_dialect(br"a\d.").unwrap();
/// assert_eq!(dialect, r"a\\d(\\s|\\S)");
/// ```
pub fn to_dialect(input: &[u8]) -> Result<String> {
    let tree = parse(input)?;
    Ok(crate::converter::convert(&tree))
}

/// Convert with every intermediate stage kept for inspection
pub fn to_dialect_debug(input: &[u8]) -> Result<ConversionReport> {
    let tree = parse(input)?;
    let program = Program::generate(&tree);

    Ok(ConversionReport {
        input: String::from_utf8_lossy(input).into_owned(),
        ast: format!("{:?}", tree),
        normalized: tree.to_regex_string(),
        dialect: program.dialect,
        source: program.source,
    })
}

/// Result of a conversion with debug information
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// The original pattern
    pub input: String,
    /// The tree (debug format)
    pub ast: String,
    /// The tree rendered back in the native grammar
    pub normalized: String,
    /// The converted dialect string
    pub dialect: String,
    /// The generated C++ program
    pub source: String,
}

impl ConversionReport {
    /// Print a formatted report of the conversion
    pub fn report(&self) {
        println!("Conversion Report");
        println!("=================");
        println!("Input:      {}", self.input);
        println!("AST:        {}", self.ast);
        println!("Normalized: {}", self.normalized);
        println!("Dialect:    {}", self.dialect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegexError;

    #[test]
    fn test_to_dialect_literals() {
        assert_eq!(to_dialect(b"abc").unwrap(), "abc");
    }

    #[test]
    fn test_to_dialect_empty() {
        assert_eq!(to_dialect(b"").unwrap(), "");
    }

    #[test]
    fn test_to_dialect_optional() {
        assert_eq!(to_dialect(b"a?b").unwrap(), "(a)?b");
    }

    #[test]
    fn test_to_dialect_mixed_example() {
        assert_eq!(
            to_dialect(br"a[bB][0-9]\d\w?.\s").unwrap(),
            r"a[bB][0-9]\\d(\\w)?(\\s|\\S)\\s"
        );
    }

    #[test]
    fn test_to_dialect_error() {
        assert!(matches!(to_dialect(b"[ab"), Err(RegexError::Parse(_))));
    }

    #[test]
    fn test_to_dialect_debug() {
        let report = to_dialect_debug(b"x{2,}").unwrap();
        assert_eq!(report.input, "x{2,}");
        assert_eq!(report.dialect, "(x){2,}");
        assert_eq!(report.normalized, "(x){2,}");
        assert!(report.source.contains("\"(x){2,}\""));
        assert!(report.ast.contains("Repetition"));
    }
}
