//! Error types for the converter and the compile-and-cache engine
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by their source: parsing the native pattern,
//! building the native artifact, loading it, or the target engine rejecting
//! the converted pattern.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for regjit
#[derive(Error, Debug)]
pub enum RegexError {
    /// The pattern is not valid in the native grammar
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The external compiler failed or produced no artifact.
    ///
    /// The generated program is attached in full; the source is deterministic,
    /// so the same input against the same toolchain fails the same way.
    #[error("failed to compile generated C++ source: {reason}\n{source_code}")]
    Toolchain {
        /// Why the compiler run is considered failed
        reason: String,
        /// The complete generated program
        source_code: String,
    },

    /// The artifact was built but `std::regex` refused the converted pattern
    #[error("C++ regular expression parse failure ({message}):\n{dialect}")]
    Conversion {
        /// The dialect string that was rejected
        dialect: String,
        /// Diagnostic reported by the target engine
        message: String,
    },

    /// The artifact could not be opened, or an entry point is missing
    #[error("failed to load '{}': {message}", .path.display())]
    Load {
        /// Path of the artifact
        path: PathBuf,
        /// Loader diagnostic
        message: String,
    },

    /// Invalid toolchain configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Work directory or source file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while parsing a native pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A byte that cannot start or continue the current construct
    #[error("unexpected {} at position {position}", describe_byte(.byte))]
    UnexpectedByte {
        /// Position of the byte
        position: usize,
        /// The byte found
        byte: u8,
    },

    /// Input ended in the middle of a construct
    #[error("unexpected end of pattern, expected {expected}")]
    UnexpectedEnd {
        /// What was expected
        expected: &'static str,
    },

    /// `(` without a matching `)`
    #[error("unclosed group opened at position {0}")]
    UnclosedGroup(usize),

    /// `[` without a matching `]`
    #[error("unclosed character class opened at position {0}")]
    UnclosedClass(usize),

    /// Range whose start is above its end
    #[error("invalid range {}-{} at position {position}", describe_byte(.start), describe_byte(.end))]
    InvalidRange {
        /// Position of the range start
        position: usize,
        /// Range start
        start: u8,
        /// Range end
        end: u8,
    },

    /// `{m,n}` with `m > n`
    #[error("invalid repetition bounds {{{min},{max}}} at position {position}")]
    InvalidRepetition {
        /// Position of the opening brace
        position: usize,
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },

    /// Quantifier with no preceding atom
    #[error("nothing to repeat at position {0}")]
    NothingToRepeat(usize),

    /// Malformed escape sequence
    #[error("invalid escape sequence at position {0}")]
    InvalidEscape(usize),

    /// Repetition count that does not fit in `u32`
    #[error("repetition count too large at position {0}")]
    NumberTooLarge(usize),
}

fn describe_byte(byte: &u8) -> String {
    let byte = *byte;
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("byte 0x{:02x}", byte)
    }
}

/// Result type alias for regjit operations
pub type Result<T> = std::result::Result<T, RegexError>;
