//! Toolchain configuration
//!
//! Controls which C++ compiler builds the generated programs and how. Values
//! can be set with the builder methods or read from the environment:
//!
//! | variable          | meaning                                         |
//! |-------------------|-------------------------------------------------|
//! | `REGJIT_CXX`      | compiler driver (falls back to `CXX`, then `c++`) |
//! | `REGJIT_STD`      | language standard: `11`, `14`, `17` or `20`    |
//! | `REGJIT_CXXFLAGS` | extra flags, whitespace separated               |
//! | `REGJIT_WORK_DIR` | parent directory for temporary build directories |

use crate::error::{RegexError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// C++ language standard passed to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageVersion {
    /// C++11
    Cpp11,
    /// C++14
    Cpp14,
    /// C++17
    #[default]
    Cpp17,
    /// C++20
    Cpp20,
}

impl LanguageVersion {
    /// Compiler flag selecting this standard
    pub fn flag(self) -> &'static str {
        match self {
            LanguageVersion::Cpp11 => "-std=c++11",
            LanguageVersion::Cpp14 => "-std=c++14",
            LanguageVersion::Cpp17 => "-std=c++17",
            LanguageVersion::Cpp20 => "-std=c++20",
        }
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LanguageVersion::Cpp11 => "c++11",
            LanguageVersion::Cpp14 => "c++14",
            LanguageVersion::Cpp17 => "c++17",
            LanguageVersion::Cpp20 => "c++20",
        };
        f.write_str(name)
    }
}

impl FromStr for LanguageVersion {
    type Err = RegexError;

    /// Accepts `17`, `c++17` or `cpp17` (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("c++")
            .or_else(|| lower.strip_prefix("cpp"))
            .unwrap_or(lower.as_str());
        match digits {
            "11" => Ok(LanguageVersion::Cpp11),
            "14" => Ok(LanguageVersion::Cpp14),
            "17" => Ok(LanguageVersion::Cpp17),
            "20" => Ok(LanguageVersion::Cpp20),
            _ => Err(RegexError::Config(format!(
                "unsupported C++ standard '{}'",
                s
            ))),
        }
    }
}

/// How generated programs are compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Compiler driver invoked for every build
    pub compiler: PathBuf,
    /// Language standard
    pub standard: LanguageVersion,
    /// Extra arguments placed before the source file
    pub flags: Vec<String>,
    /// Where temporary build directories are created; system temp if `None`
    pub work_dir: Option<PathBuf>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            compiler: PathBuf::from("c++"),
            standard: LanguageVersion::default(),
            flags: Vec::new(),
            work_dir: None,
        }
    }
}

impl ToolchainConfig {
    /// Default configuration: `c++`, C++17, no extra flags
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ToolchainConfig::default();

        if let Some(compiler) = lookup("REGJIT_CXX")
            .or_else(|| lookup("CXX"))
            .filter(|value| !value.trim().is_empty())
        {
            config.compiler = PathBuf::from(compiler.trim());
        }
        if let Some(standard) = lookup("REGJIT_STD") {
            config.standard = standard.parse()?;
        }
        if let Some(flags) = lookup("REGJIT_CXXFLAGS") {
            config.flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = lookup("REGJIT_WORK_DIR").filter(|value| !value.is_empty()) {
            config.work_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Sets the compiler driver.
    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// Sets the language standard.
    pub fn with_standard(mut self, standard: LanguageVersion) -> Self {
        self.standard = standard;
        self
    }

    /// Appends an extra compiler flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Sets the parent directory for build directories.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}
