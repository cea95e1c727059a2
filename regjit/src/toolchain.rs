//! Native build and load boundary
//!
//! [`Toolchain`] turns a generated [`Program`] into a shared library by
//! running an external C++ compiler; [`NativeMatcher`] opens that library,
//! binds the exported entry points and checks that `std::regex` accepted the
//! pattern. Both sit behind the [`Backend`] and [`Matcher`] traits, which is
//! the seam the engine is written against.

use crate::config::ToolchainConfig;
use crate::error::{RegexError, Result};
use crate::program::{MATCHES_SYMBOL, PREPARE_SYMBOL, Program};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

/// Something that can decide whether an input fully matches a pattern
pub trait Matcher: Send + Sync {
    /// Whether the whole of `input` matches
    fn is_match(&self, input: &[u8]) -> bool;
}

/// Turns a generated program into a ready-to-call [`Matcher`]
pub trait Backend: Send + Sync {
    /// Matcher produced by this backend
    type Matcher: Matcher;

    /// Build and load `program`
    fn build(&self, program: &Program) -> Result<Self::Matcher>;
}

/// A compiled shared library sitting in its own build directory
#[derive(Debug)]
pub struct Artifact {
    library: PathBuf,
    // Removed when the artifact (or the matcher owning it) is dropped
    dir: TempDir,
}

impl Artifact {
    /// Path of the shared library
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Build directory holding the source and the library
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// External C++ compiler driver
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    config: ToolchainConfig,
}

impl Toolchain {
    /// Create a toolchain from a configuration
    pub fn new(config: ToolchainConfig) -> Self {
        Toolchain { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    fn build_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("regjit-");
        let dir = match &self.config.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Arguments passed to the compiler for one build
    pub fn arguments(&self, source: &Path, library: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec![
            self.config.standard.flag().into(),
            "-O2".into(),
            "-shared".into(),
            "-fPIC".into(),
        ];
        args.extend(self.config.flags.iter().map(Into::into));
        args.push("-o".into());
        args.push(library.into());
        args.push(source.into());
        args
    }

    /// Compile `source` into a shared library
    ///
    /// Any failure is reported with the complete source attached. The
    /// compiler is run exactly once per call.
    pub fn compile(&self, source: &str) -> Result<Artifact> {
        let dir = self.build_dir()?;
        let source_path = dir.path().join("pattern.cpp");
        std::fs::write(&source_path, source)?;
        let library = dir.path().join(libloading::library_filename("regjit_pattern"));

        let failure = |reason: String| RegexError::Toolchain {
            reason,
            source_code: source.to_string(),
        };

        debug!(
            compiler = %self.config.compiler.display(),
            standard = %self.config.standard,
            dir = %dir.path().display(),
            "invoking C++ compiler"
        );
        let started = Instant::now();
        let output = Command::new(&self.config.compiler)
            .args(self.arguments(&source_path, &library))
            .current_dir(dir.path())
            .output()
            .map_err(|e| {
                failure(format!(
                    "could not run '{}': {}",
                    self.config.compiler.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(failure(format!(
                "{} exited with {}\n{}",
                self.config.compiler.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            )));
        }
        if !library.is_file() {
            return Err(failure(format!(
                "compiler reported success but produced no artifact at {}",
                library.display()
            )));
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            library = %library.display(),
            "compiled pattern library"
        );
        Ok(Artifact { library, dir })
    }
}

type PrepareFn = unsafe extern "C" fn(*mut c_char, usize) -> c_int;
type MatchesFn = unsafe extern "C" fn(*const c_char, usize) -> c_int;

/// Size of the buffer receiving the `std::regex` error message
const MESSAGE_CAPACITY: usize = 512;

/// A loaded pattern library
///
/// The library stays mapped for as long as this value lives; the bound entry
/// point is only called through `&self`.
pub struct NativeMatcher {
    matches: MatchesFn,
    // Field order matters: the library is closed before its directory goes
    library: libloading::Library,
    artifact: Artifact,
}

impl std::fmt::Debug for NativeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeMatcher")
            .field("library", &self.artifact.library)
            .finish_non_exhaustive()
    }
}

impl NativeMatcher {
    /// Open `artifact`, bind its entry points and construct the pattern
    ///
    /// `dialect` is only used for the error report when `std::regex` rejects
    /// the pattern.
    pub fn load(artifact: Artifact, dialect: &str) -> Result<Self> {
        let load_error = |message: String| RegexError::Load {
            path: artifact.library.clone(),
            message,
        };

        // SAFETY: the library was generated from our own template; its only
        // static initializers are those of the C++ runtime.
        let library = unsafe { libloading::Library::new(&artifact.library) }
            .map_err(|e| load_error(e.to_string()))?;

        // SAFETY: the signatures match the `extern "C"` declarations in the
        // program template.
        let (prepare, matches) = unsafe {
            let prepare: libloading::Symbol<PrepareFn> = library
                .get(PREPARE_SYMBOL.as_bytes())
                .map_err(|e| load_error(format!("symbol '{}': {}", PREPARE_SYMBOL, e)))?;
            let matches: libloading::Symbol<MatchesFn> = library
                .get(MATCHES_SYMBOL.as_bytes())
                .map_err(|e| load_error(format!("symbol '{}': {}", MATCHES_SYMBOL, e)))?;
            (*prepare, *matches)
        };

        let mut message = [0 as c_char; MESSAGE_CAPACITY];
        // SAFETY: the buffer is writable for MESSAGE_CAPACITY bytes and the
        // callee always NUL-terminates within that capacity.
        let accepted = unsafe { prepare(message.as_mut_ptr(), MESSAGE_CAPACITY) };
        if accepted == 0 {
            // SAFETY: see above, the buffer holds a NUL-terminated string
            let message = unsafe { CStr::from_ptr(message.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            return Err(RegexError::Conversion {
                dialect: dialect.to_string(),
                message,
            });
        }

        debug!(library = %artifact.library.display(), "pattern library loaded");
        Ok(NativeMatcher {
            matches,
            library,
            artifact,
        })
    }

    /// Path of the loaded library
    pub fn library_path(&self) -> &Path {
        self.artifact.library()
    }

    /// The open library handle
    pub fn library(&self) -> &libloading::Library {
        &self.library
    }
}

impl Matcher for NativeMatcher {
    fn is_match(&self, input: &[u8]) -> bool {
        // SAFETY: `matches` points into `self.library`, which is still open;
        // the callee only reads `input.len()` bytes and catches C++ exceptions.
        unsafe { (self.matches)(input.as_ptr().cast::<c_char>(), input.len()) != 0 }
    }
}

/// Production backend: compile with [`Toolchain`], load as [`NativeMatcher`]
#[derive(Debug, Clone, Default)]
pub struct NativeBackend {
    toolchain: Toolchain,
}

impl NativeBackend {
    /// Create a backend that compiles with the given configuration
    pub fn new(config: ToolchainConfig) -> Self {
        NativeBackend {
            toolchain: Toolchain::new(config),
        }
    }

    /// The toolchain in use
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }
}

impl Backend for NativeBackend {
    type Matcher = NativeMatcher;

    fn build(&self, program: &Program) -> Result<NativeMatcher> {
        let artifact = self.toolchain.compile(&program.source)?;
        NativeMatcher::load(artifact, &program.dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguageVersion;

    #[test]
    fn test_arguments_layout() {
        let toolchain = Toolchain::new(
            ToolchainConfig::new()
                .with_standard(LanguageVersion::Cpp20)
                .with_flag("-g"),
        );
        let args = toolchain.arguments(Path::new("p.cpp"), Path::new("libp.so"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-std=c++20", "-O2", "-shared", "-fPIC", "-g", "-o", "libp.so", "p.cpp"]
        );
    }

    #[test]
    fn test_missing_compiler_is_toolchain_error_with_source() {
        let work = tempfile::tempdir().unwrap();
        let toolchain = Toolchain::new(
            ToolchainConfig::new()
                .with_compiler("regjit-no-such-compiler")
                .with_work_dir(work.path()),
        );
        let err = toolchain.compile("int x;").unwrap_err();
        match err {
            RegexError::Toolchain {
                reason,
                source_code,
            } => {
                assert!(reason.contains("regjit-no-such-compiler"));
                assert_eq!(source_code, "int x;");
            }
            other => panic!("expected toolchain error, got {other:?}"),
        }
    }

    #[test]
    fn test_failing_compiler_is_toolchain_error() {
        // `false` exits non-zero without producing anything
        if Command::new("false").status().is_err() {
            return;
        }
        let toolchain = Toolchain::new(ToolchainConfig::new().with_compiler("false"));
        let err = toolchain.compile("int x;").unwrap_err();
        assert!(matches!(err, RegexError::Toolchain { .. }));
        assert!(err.to_string().ends_with("int x;"));
    }

    #[test]
    fn test_successful_exit_without_artifact_is_toolchain_error() {
        if Command::new("true").status().is_err() {
            return;
        }
        let toolchain = Toolchain::new(ToolchainConfig::new().with_compiler("true"));
        let err = toolchain.compile("int x;").unwrap_err();
        match err {
            RegexError::Toolchain { reason, .. } => {
                assert!(reason.contains("produced no artifact"));
            }
            other => panic!("expected toolchain error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_dir_is_created_under_work_dir() {
        let work = tempfile::tempdir().unwrap();
        let nested = work.path().join("a").join("b");
        let toolchain = Toolchain::new(ToolchainConfig::new().with_work_dir(&nested));
        let dir = toolchain.build_dir().unwrap();
        assert!(dir.path().starts_with(&nested));
    }

    #[test]
    fn test_load_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            library: dir.path().join("libmissing.so"),
            dir,
        };
        let err = NativeMatcher::load(artifact, "a").unwrap_err();
        assert!(matches!(err, RegexError::Load { .. }));
    }
}
