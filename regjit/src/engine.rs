//! Compile-and-cache matching engine
//!
//! [`Engine::matches`] takes a [`Pattern`] and an input and answers whether
//! the input fully matches. The first call for a pattern parses it, converts
//! it, builds a native matcher through the [`Backend`] and caches the result.
//! Later calls with the same pattern go straight to the cached matcher.
//!
//! The cache is keyed by pattern *identity*, not content. Two patterns built
//! separately from the same bytes are two keys and are compiled twice; clones
//! of one pattern share a key.

use crate::config::ToolchainConfig;
use crate::error::{RegexError, Result};
use crate::parser::parse;
use crate::program::Program;
use crate::toolchain::{Backend, Matcher, NativeBackend};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// A pattern in the native grammar with a stable identity
///
/// Cloning is cheap and keeps the identity; [`Pattern::new`] always creates a
/// new one, even for bytes equal to an existing pattern.
#[derive(Clone)]
pub struct Pattern {
    bytes: Arc<[u8]>,
}

impl Pattern {
    /// Create a pattern with a fresh identity
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Pattern {
            bytes: Arc::from(bytes.as_ref()),
        }
    }

    /// The pattern bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Identity key; equal for clones, distinct for separately created patterns
    /// that are alive at the same time
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.bytes).cast::<u8>() as usize
    }

    /// Whether `self` and `other` share an identity
    pub fn same_identity(&self, other: &Pattern) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("bytes", &self.bytes.escape_ascii().to_string())
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes.escape_ascii())
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::new(s)
    }
}

impl From<&[u8]> for Pattern {
    fn from(bytes: &[u8]) -> Self {
        Pattern::new(bytes)
    }
}

/// Cache entry: the matcher plus the pattern it was built for
struct Entry<M> {
    // Holding the pattern keeps its address from being reused as a key
    _pattern: Pattern,
    matcher: Arc<M>,
}

/// Counters describing the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Patterns with a cached matcher
    pub entries: usize,
    /// Builds handed to the backend, failed ones included
    pub compilations: u64,
    /// Calls answered from the cache
    pub hits: u64,
}

/// Matching engine with a per-pattern matcher cache
///
/// `Engine` is `Send + Sync`; share it by reference or inside an `Arc`.
/// Entries are never evicted.
pub struct Engine<B: Backend = NativeBackend> {
    backend: B,
    cache: RwLock<HashMap<usize, Entry<B::Matcher>>>,
    compilations: AtomicU64,
    hits: AtomicU64,
}

impl Engine<NativeBackend> {
    /// Engine compiling with the default toolchain (`c++`, C++17)
    pub fn new() -> Self {
        Self::native(ToolchainConfig::default())
    }

    /// Engine compiling with the given toolchain configuration
    pub fn native(config: ToolchainConfig) -> Self {
        Self::with_backend(NativeBackend::new(config))
    }
}

impl Default for Engine<NativeBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Engine<B> {
    /// Engine building matchers with `backend`
    pub fn with_backend(backend: B) -> Self {
        Engine {
            backend,
            cache: RwLock::new(HashMap::new()),
            compilations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// The backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `input` fully matches `pattern`
    ///
    /// The first call for a pattern compiles it, which can take a noticeable
    /// amount of time. Nothing is cached when that fails.
    ///
    /// # Errors
    /// - [`RegexError::Parse`] for a pattern outside the native grammar
    /// - [`RegexError::Toolchain`] when the compiler fails
    /// - [`RegexError::Load`] when the built library cannot be loaded
    /// - [`RegexError::Conversion`] when `std::regex` rejects the converted pattern
    pub fn matches(&self, pattern: &Pattern, input: &[u8]) -> Result<bool> {
        let matcher = self.matcher(pattern)?;
        Ok(matcher.is_match(input))
    }

    /// Cached matcher for `pattern`, building it on first use
    pub fn matcher(&self, pattern: &Pattern) -> Result<Arc<B::Matcher>> {
        let key = pattern.id();
        let cached = self
            .cache
            .read()
            .get(&key)
            .map(|entry| Arc::clone(&entry.matcher));
        if let Some(matcher) = cached {
            debug!(pattern = %pattern, "cache hit");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(matcher);
        }

        debug!(pattern = %pattern, "cache miss, building matcher");
        let tree = parse(pattern.as_bytes())?;
        let program = Program::generate(&tree);

        self.compilations.fetch_add(1, Ordering::Relaxed);
        let built = match self.backend.build(&program) {
            Ok(matcher) => Arc::new(matcher),
            Err(err) => {
                if let RegexError::Conversion { message, .. } = &err {
                    warn!(
                        pattern = %pattern,
                        dialect = %program.dialect,
                        %message,
                        "std::regex rejected converted pattern"
                    );
                }
                return Err(err);
            }
        };

        let mut cache = self.cache.write();
        let entry = cache.entry(key).or_insert_with(|| Entry {
            _pattern: pattern.clone(),
            matcher: Arc::clone(&built),
        });
        if !Arc::ptr_eq(&entry.matcher, &built) {
            debug!(pattern = %pattern, "concurrent build lost the race, dropping it");
        }
        Ok(Arc::clone(&entry.matcher))
    }

    /// Whether a matcher for `pattern` is cached
    pub fn is_cached(&self, pattern: &Pattern) -> bool {
        self.cache.read().contains_key(&pattern.id())
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.read().len(),
            compilations: self.compilations.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

impl<B: Backend + fmt::Debug> fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend)
            .field("stats", &self.stats())
            .finish()
    }
}
