use clap::{Parser, Subcommand};
use colored::Colorize;
use regjit::{Engine, LanguageVersion, Pattern, RegexError, ToolchainConfig, to_dialect, to_dialect_debug};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regjit")]
#[command(about = "Regjit - full-match regexes compiled to native std::regex matchers")]
#[command(version)]
struct Cli {
    /// C++ compiler driver (default: $REGJIT_CXX, $CXX, then c++)
    #[arg(long, global = true)]
    cxx: Option<PathBuf>,
    /// C++ language standard: 11, 14, 17 or 20
    #[arg(long = "std", global = true)]
    standard: Option<LanguageVersion>,
    /// Log compiler invocations and cache activity
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a pattern to the std::regex dialect
    Convert {
        /// The pattern to convert
        pattern: String,
        /// Show AST debug output
        #[arg(short, long)]
        debug: bool,
    },
    /// Print the C++ program generated for a pattern
    Source {
        /// The pattern
        pattern: String,
    },
    /// Check whether each input fully matches the pattern
    Match {
        /// The regex pattern
        pattern: String,
        /// Inputs to test
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Time compilation and repeated matching of one input
    Bench {
        /// The regex pattern
        pattern: String,
        /// The input string
        input: String,
        /// Number of cached calls to time
        #[arg(short = 'n', long, default_value_t = 1000)]
        iterations: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match toolchain_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    match cli.command {
        Commands::Convert { pattern, debug } => cmd_convert(&pattern, debug),
        Commands::Source { pattern } => cmd_source(&pattern),
        Commands::Match { pattern, inputs } => cmd_match(config, &pattern, &inputs),
        Commands::Bench {
            pattern,
            input,
            iterations,
        } => cmd_bench(config, &pattern, &input, iterations),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "regjit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn toolchain_config(cli: &Cli) -> regjit::Result<ToolchainConfig> {
    let mut config = ToolchainConfig::from_env()?;
    if let Some(cxx) = &cli.cxx {
        config = config.with_compiler(cxx);
    }
    if let Some(standard) = cli.standard {
        config = config.with_standard(standard);
    }
    Ok(config)
}

fn fail(e: RegexError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), e);
    std::process::exit(1);
}

fn cmd_convert(pattern: &str, debug: bool) {
    println!("{}", "Converting pattern...".bold());
    println!("  Input:  {}", pattern.cyan());
    println!();

    if debug {
        match to_dialect_debug(pattern.as_bytes()) {
            Ok(result) => result.report(),
            Err(e) => fail(e),
        }
    } else {
        match to_dialect(pattern.as_bytes()) {
            Ok(dialect) => {
                println!("{}", "Output:".bold());
                println!("  {}", dialect.green());
            }
            Err(e) => fail(e),
        }
    }
}

fn cmd_source(pattern: &str) {
    match to_dialect_debug(pattern.as_bytes()) {
        Ok(result) => print!("{}", result.source),
        Err(e) => fail(e),
    }
}

fn cmd_match(config: ToolchainConfig, pattern: &str, inputs: &[String]) {
    let engine = Engine::native(config);
    let pattern = Pattern::new(pattern);

    let mut all_matched = true;
    for input in inputs {
        match engine.matches(&pattern, input.as_bytes()) {
            Ok(true) => println!("{} {}", "true ".green(), input.escape_debug()),
            Ok(false) => {
                all_matched = false;
                println!("{} {}", "false".red(), input.escape_debug());
            }
            Err(e) => fail(e),
        }
    }

    std::process::exit(if all_matched { 0 } else { 1 });
}

fn cmd_bench(config: ToolchainConfig, pattern: &str, input: &str, iterations: u32) {
    let engine = Engine::native(config);
    let pattern = Pattern::new(pattern);

    println!("{}", "Benchmarking pattern...".bold());
    println!("  Pattern: {}", pattern.to_string().cyan());
    println!("  Input:   {}", input.escape_debug().to_string().yellow());
    println!();

    let started = Instant::now();
    let first = match engine.matches(&pattern, input.as_bytes()) {
        Ok(result) => result,
        Err(e) => fail(e),
    };
    let compile = started.elapsed();

    let started = Instant::now();
    for _ in 0..iterations {
        if let Err(e) = engine.matches(&pattern, input.as_bytes()) {
            fail(e);
        }
    }
    let cached = started.elapsed();

    let result = if first {
        "true".green()
    } else {
        "false".red()
    };
    println!("  Result:        {}", result);
    println!("  First call:    {:?}", compile);
    if iterations > 0 {
        println!("  Cached calls:  {:?} each", cached / iterations);
    }
    let stats = engine.stats();
    println!(
        "  Cache:         {} entr{}, {} compilation(s), {} hit(s)",
        stats.entries,
        if stats.entries == 1 { "y" } else { "ies" },
        stats.compilations,
        stats.hits
    );
}
