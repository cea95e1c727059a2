//! Regjit Core Library
//!
//! Matches byte strings against regular expressions by converting each
//! pattern to the C++ `std::regex` dialect, compiling it into a shared
//! library with an external C++ compiler and caching the loaded matcher per
//! pattern.
//!
//! ```no_run
//! use regjit::{Engine, Pattern};
//!
//! let engine = Engine::new();
//! let pattern = Pattern::new("a?b");
//! assert!(engine.matches(&pattern, b"ab")?);
//! assert!(!engine.matches(&pattern, b"abc")?);
//! # Ok::<(), regjit::RegexError>(())
//! ```

pub mod ast;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod toolchain;
pub mod transpiler;

pub use ast::{CharSpec, PredefinedClass, Regex};
pub use config::{LanguageVersion, ToolchainConfig};
pub use converter::convert;
pub use engine::{CacheStats, Engine, Pattern};
pub use error::{ParseError, RegexError, Result};
pub use lexer::{Lexer, Token};
pub use parser::{Parser, parse};
pub use program::{MATCHES_SYMBOL, PREPARE_SYMBOL, Program};
pub use toolchain::{Artifact, Backend, Matcher, NativeBackend, NativeMatcher, Toolchain};
pub use transpiler::{ConversionReport, to_dialect, to_dialect_debug};
