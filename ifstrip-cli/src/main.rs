#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # ifstrip CLI
//!
//! A command-line interface for the ifstrip conditional directive stripper.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use ifstrip::{
    DirectiveError, Expression, LineEnding, ParseError, TrailingText, UndefineConfig, Undefiner,
    UnknownDirectives,
};
use log::{LevelFilter, debug, info};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Exit codes for different error conditions
mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const IO_ERROR: i32 = 2;
    pub const TRANSFORM_ERROR: i32 = 3;
    pub const ARGUMENT_ERROR: i32 = 4;
}

/// Command-line interface for ifstrip
#[derive(Parser)]
#[command(
    name = "ifstrip",
    version,
    author,
    about = "Strip #if/#elif/#else/#endif blocks for a set of defined symbols",
    long_about = "ifstrip removes conditional compilation directives from source files, keeping only the branches whose guard expressions hold for the symbols you define. Everything else is copied byte for byte.",
    after_help = "EXAMPLES:
  # Keep the NET45 branches of a file
  $ ifstrip Widget.cs -D NET45 -o Widget.net45.cs

  # Several symbols, repeated or comma separated
  $ ifstrip Widget.cs -D DEBUG,TRACE -D NETSTANDARD2_0

  # Read from stdin and write to stdout
  $ cat Widget.cs | ifstrip - -D RELEASE

  # Only validate the directives
  $ ifstrip Widget.cs --check

  # See how a guard is parsed and what it evaluates to
  $ ifstrip --explain '!DEBUG && (NET45 || NET47)' -D NET47"
)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Input file to process (use '-' for stdin)
    #[arg(
        required_unless_present = "explain",
        help = "Input source file to process (use '-' for stdin)"
    )]
    input: Option<PathBuf>,

    /// Output file (use '-' for stdout, default: stdout)
    #[arg(
        short = 'o',
        long,
        help = "Output file (use '-' for stdout, default: stdout)"
    )]
    output: Option<PathBuf>,

    /// Defined symbols
    #[arg(
        short = 'D',
        long = "define",
        value_name = "SYMBOL",
        value_delimiter = ',',
        help = "Define a symbol (repeatable, or a comma separated list)"
    )]
    symbols: Vec<String>,

    /// JSON configuration file
    #[cfg(feature = "json")]
    #[arg(
        long,
        value_name = "FILE",
        help = "Read symbols and options from a JSON file (flags take precedence)"
    )]
    config: Option<PathBuf>,

    /// Line terminator convention
    #[arg(long, value_enum, help = "Line terminator convention [default: auto]")]
    line_ending: Option<LineEndingValue>,

    /// Reject text after #else and #endif
    #[arg(long, help = "Fail on text after #else or #endif instead of ignoring it")]
    strict_trailing_text: bool,

    /// Copy unknown directives through
    #[arg(
        long,
        help = "Copy unknown directives such as #region or #pragma through unchanged"
    )]
    pass_unknown_directives: bool,

    /// Maximum nesting depth
    #[arg(
        long,
        value_name = "N",
        help = "Maximum directive and expression nesting depth [default: 128]"
    )]
    nesting_limit: Option<usize>,

    /// Validate only
    #[arg(long, help = "Validate the input without writing any output")]
    check: bool,

    /// Explain an expression
    #[arg(
        long,
        value_name = "EXPR",
        conflicts_with_all = ["check", "dry_run"],
        help = "Print the parsed form of a guard expression and its value, then exit"
    )]
    explain: Option<String>,

    /// Output in JSON format
    #[arg(long, help = "Output the result in JSON format")]
    #[cfg(feature = "json")]
    json: bool,

    /// Increase log verbosity
    #[arg(
        short = 'v',
        long,
        action = ArgAction::Count,
        help = "Increase verbosity (-v debug, -vv trace; RUST_LOG overrides)"
    )]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short = 'q', long, help = "Suppress non-error output (quiet mode)")]
    quiet: bool,

    /// Show what would happen without processing
    #[arg(
        short = 'n',
        long,
        help = "Show what would happen without actually processing"
    )]
    dry_run: bool,

    /// Disable colored output
    #[arg(long, conflicts_with = "force_color", help = "Disable colored output")]
    no_color: bool,

    /// Force colored output
    #[arg(long, help = "Force colored output even when not a terminal")]
    force_color: bool,
}

/// Line ending values for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LineEndingValue {
    Auto,
    Lf,
    #[clap(name = "crlf")]
    CrLf,
    Cr,
}

impl From<LineEndingValue> for LineEnding {
    fn from(value: LineEndingValue) -> Self {
        match value {
            LineEndingValue::Auto => LineEnding::Auto,
            LineEndingValue::Lf => LineEnding::Lf,
            LineEndingValue::CrLf => LineEnding::CrLf,
            LineEndingValue::Cr => LineEnding::Cr,
        }
    }
}

/// Contents of a `--config` file
#[cfg(feature = "json")]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct FileConfig {
    symbols: Vec<String>,
    #[serde(flatten)]
    options: UndefineConfig,
}

/// Invalid combination of arguments
#[derive(Debug)]
struct ArgumentError(String);

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ArgumentError {}

/// Everything a run needs once arguments and config file are merged
struct Settings {
    config: UndefineConfig,
    symbols: BTreeSet<String>,
}

/// Main application entry point
fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    configure_colors(&cli);

    std::process::exit(match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            determine_exit_code(&e)
        }
    });
}

/// Install the logger: `-q` keeps errors only, `-v`/`-vv` raise the level,
/// and `RUST_LOG` overrides both.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn configure_colors(cli: &Cli) {
    if cli.no_color {
        colored::control::set_override(false);
    } else if cli.force_color {
        colored::control::set_override(true);
    } else if !atty::is(atty::Stream::Stderr) {
        colored::control::set_override(false);
    }
}

/// Determine the appropriate exit code based on the error
fn determine_exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<std::io::Error>().is_some() {
        exit_code::IO_ERROR
    } else if error.downcast_ref::<DirectiveError>().is_some()
        || error.downcast_ref::<ParseError>().is_some()
    {
        exit_code::TRANSFORM_ERROR
    } else if error.downcast_ref::<ArgumentError>().is_some() {
        exit_code::ARGUMENT_ERROR
    } else {
        exit_code::GENERAL_ERROR
    }
}

/// Run the main application logic
fn run(cli: &Cli) -> Result<i32> {
    validate_args(cli)?;
    let settings = load_settings(cli)?;

    if let Some(expression) = &cli.explain {
        explain(cli, expression, &settings)?;
        return Ok(exit_code::SUCCESS);
    }

    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| ArgumentError("an input file is required".to_string()))?;

    if cli.dry_run {
        show_dry_run_info(cli, input, &settings);
        return Ok(exit_code::SUCCESS);
    }

    let input_content = read_input(input)?;

    let start_time = Instant::now();
    let processed_output = Undefiner::with_config(&settings.config)
        .process(&input_content, &settings.symbols)
        .with_context(|| format!("Failed to process {}", format_input(input)))?;
    let processing_time = start_time.elapsed();
    let removed_bytes = input_content.len() - processed_output.len();

    if cli.check {
        info!("{} is valid", format_input(input));
        return Ok(exit_code::SUCCESS);
    }

    write_output(cli, input, &settings, &processed_output, removed_bytes, processing_time)?;

    if cli.verbose > 0 && !cli.quiet {
        show_verbose_info(&settings, removed_bytes, processing_time);
        let output_display = cli
            .output
            .as_deref()
            .map_or("stdout".to_string(), format_output);
        eprintln!(
            "{} Stripped {} -> {output_display}",
            "✓".green(),
            format_input(input)
        );
    }

    Ok(exit_code::SUCCESS)
}

/// Validate command-line arguments
fn validate_args(cli: &Cli) -> Result<()> {
    // Check that input and output are not the same file
    if let (Some(input), Some(output)) = (&cli.input, &cli.output)
        && !is_stdio(output)
        && !is_stdio(input)
        && let (Ok(input), Ok(output)) = (std::fs::canonicalize(input), std::fs::canonicalize(output))
        && input == output
    {
        return Err(ArgumentError(format!(
            "Input and output files cannot be the same: {}",
            output.display()
        ))
        .into());
    }

    if cli.nesting_limit == Some(0) {
        return Err(ArgumentError("Nesting limit must be greater than 0".to_string()).into());
    }

    if let Some(symbol) = cli.symbols.iter().find(|s| !is_symbol(s)) {
        return Err(ArgumentError(format!("Invalid symbol name: {symbol:?}")).into());
    }

    Ok(())
}

/// A `-D` value must parse to exactly itself as a bare symbol
fn is_symbol(name: &str) -> bool {
    matches!(ifstrip::parse_expression(name), Ok(Expression::Symbol(parsed)) if parsed == name)
}

/// Merge the config file (if any) with command-line flags; flags win
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut config = UndefineConfig::new();
    let mut symbols = BTreeSet::new();

    #[cfg(feature = "json")]
    if let Some(path) = &cli.config {
        let file = read_config_file(path)?;
        debug!("loaded {} symbols from {}", file.symbols.len(), path.display());
        config = file.options;
        symbols.extend(file.symbols);
    }

    if let Some(line_ending) = cli.line_ending {
        config.line_ending = line_ending.into();
    }
    if cli.strict_trailing_text {
        config.trailing_text = TrailingText::Reject;
    }
    if cli.pass_unknown_directives {
        config.unknown_directives = UnknownDirectives::PassThrough;
    }
    if let Some(limit) = cli.nesting_limit {
        config.nesting_limit = limit;
    }
    symbols.extend(cli.symbols.iter().cloned());

    debug!("symbols: {symbols:?}");
    debug!("config: {config:?}");
    Ok(Settings { config, symbols })
}

#[cfg(feature = "json")]
fn read_config_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| ArgumentError(format!("Invalid config file {}: {e}", path.display())).into())
}

/// Print the canonical form of a guard and its value
fn explain(cli: &Cli, expression: &str, settings: &Settings) -> Result<()> {
    let parsed = ifstrip::parse_expression(expression)?;
    let value = parsed.evaluate(&settings.symbols);

    #[cfg(feature = "json")]
    if cli.json {
        let result = serde_json::json!({
            "expression": expression,
            "canonical": parsed.to_string(),
            "value": value,
            "symbols": settings.symbols,
            "referenced_symbols": parsed.symbols(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if cli.quiet {
        println!("{value}");
    } else {
        println!("{parsed}");
        println!("{value}");
    }
    Ok(())
}

/// Show dry run information
fn show_dry_run_info(cli: &Cli, input: &Path, settings: &Settings) {
    let output_display = cli
        .output
        .as_deref()
        .map_or("stdout".to_string(), format_output);

    eprintln!(
        "Dry run: would strip {} -> {output_display}",
        format_input(input)
    );
    eprintln!("Symbols: {}", format_symbols(&settings.symbols));
    eprintln!("Line ending: {:?}", settings.config.line_ending);
    eprintln!("Trailing text: {:?}", settings.config.trailing_text);
    eprintln!("Unknown directives: {:?}", settings.config.unknown_directives);
    eprintln!("Nesting limit: {}", settings.config.nesting_limit);

    if cli.check {
        eprintln!("Mode: check only");
    }

    #[cfg(feature = "json")]
    if cli.json {
        eprintln!("Output format: JSON");
    }
}

/// Read input from file or stdin
fn read_input(input_path: &Path) -> Result<String> {
    if is_stdio(input_path) {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input file: {}", input_path.display()))
    }
}

/// Write output to file or stdout
#[cfg_attr(not(feature = "json"), allow(unused_variables))]
fn write_output(
    cli: &Cli,
    input: &Path,
    settings: &Settings,
    content: &str,
    removed_bytes: usize,
    processing_time: Duration,
) -> Result<()> {
    #[cfg(feature = "json")]
    if cli.json {
        return write_json_output(cli, input, settings, content, removed_bytes, processing_time);
    }

    match &cli.output {
        Some(output_path) if !is_stdio(output_path) => {
            std::fs::write(output_path, content).with_context(|| {
                format!("Failed to write to output file: {}", output_path.display())
            })?;
        }
        _ => print!("{content}"),
    }

    Ok(())
}

/// Write JSON output
#[cfg(feature = "json")]
fn write_json_output(
    cli: &Cli,
    input: &Path,
    settings: &Settings,
    content: &str,
    removed_bytes: usize,
    processing_time: Duration,
) -> Result<()> {
    use serde_json::json;

    let result = json!({
        "success": true,
        "output": content,
        "input_file": format_input(input),
        "output_file": cli.output.as_deref().map(format_output),
        "symbols": settings.symbols,
        "removed_bytes": removed_bytes,
        "processing_time_ms": processing_time.as_secs_f64() * 1000.0,
    });

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Show verbose information
fn show_verbose_info(settings: &Settings, removed_bytes: usize, processing_time: Duration) {
    eprintln!("Symbols: {}", format_symbols(&settings.symbols));
    eprintln!("Removed: {removed_bytes} bytes");
    eprintln!("Processing time: {processing_time:?}");
}

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

/// Format input path for display
fn format_input(path: &Path) -> String {
    if is_stdio(path) {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

/// Format output path for display
fn format_output(path: &Path) -> String {
    if is_stdio(path) {
        "stdout".to_string()
    } else {
        path.display().to_string()
    }
}

fn format_symbols(symbols: &BTreeSet<String>) -> String {
    if symbols.is_empty() {
        "(none)".to_string()
    } else {
        symbols.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_names() {
        assert!(is_symbol("NET45"));
        assert!(is_symbol("_private"));
        assert!(!is_symbol(""));
        assert!(!is_symbol("4NET"));
        assert!(!is_symbol("A B"));
        assert!(!is_symbol(" A"));
        assert!(!is_symbol("(A)"));
        assert!(!is_symbol("!A"));
        assert!(!is_symbol("A||B"));
        assert!(!is_symbol("A$"));
    }

    #[test]
    fn defines_accept_comma_lists() {
        let cli = Cli::try_parse_from(["ifstrip", "in.cs", "-D", "A,B", "-D", "C"]).unwrap();
        assert_eq!(cli.symbols, vec!["A", "B", "C"]);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ifstrip",
            "in.cs",
            "--line-ending",
            "crlf",
            "--strict-trailing-text",
            "--nesting-limit",
            "7",
        ])
        .unwrap();
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.config.line_ending, LineEnding::CrLf);
        assert_eq!(settings.config.trailing_text, TrailingText::Reject);
        assert_eq!(settings.config.nesting_limit, 7);
        assert_eq!(settings.config.unknown_directives, UnknownDirectives::Reject);
    }

    #[test]
    fn explain_needs_no_input() {
        assert!(Cli::try_parse_from(["ifstrip", "--explain", "A"]).is_ok());
        assert!(Cli::try_parse_from(["ifstrip", "-D", "A"]).is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let directive: anyhow::Error = DirectiveError::MissingEndIf {
            line: 1,
            text: "#if A".to_string(),
        }
        .into();
        assert_eq!(determine_exit_code(&directive), exit_code::TRANSFORM_ERROR);

        let argument: anyhow::Error = ArgumentError("bad".to_string()).into();
        assert_eq!(determine_exit_code(&argument), exit_code::ARGUMENT_ERROR);

        let io: anyhow::Error = std::io::Error::other("gone").into();
        assert_eq!(determine_exit_code(&io), exit_code::IO_ERROR);
        assert_eq!(
            determine_exit_code(&anyhow::anyhow!("other")),
            exit_code::GENERAL_ERROR
        );
    }
}
