//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use usfm_ast::{Document, NodeKind};
use usfm_core::{has_alignment_markup, parse, remove_alignment_markup};

use crate::config::{Settings, CONFIG_CANDIDATES};

/// Path meaning stdin for input and stdout for output
const STDIO_PATH: &str = "-";

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "usfm-strip")]
#[command(author, version, about = "Remove word alignment from USFM scripture files", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove alignment markup from USFM files or directories
    Strip {
        /// Input files or directories (`-` reads stdin and writes stdout)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Report chapter and verse counts and whether alignment is present
    Check {
        /// Input USFM file (`-` for stdin)
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Dump the parsed document tree as JSON
    Parse {
        /// Input USFM file (`-` for stdin)
        input: PathBuf,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Strip {
            inputs,
            output,
            config,
        } => {
            strip_command(&inputs, output.as_deref(), config.as_deref())?;
        }
        Commands::Check { input, format } => {
            check_command(&input, format)?;
        }
        Commands::Parse { input } => {
            parse_command(&input)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` adds further directives
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // Another subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Result of a batch strip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripSummary {
    /// Files written
    pub converted: usize,
    /// Files that could not be parsed
    pub failed: usize,
}

/// A source file and its path relative to the input it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceFile {
    path: PathBuf,
    relative: PathBuf,
}

/// Execute the strip command
///
/// Each file is converted independently; a file that fails to parse is
/// reported and skipped, and the command fails once all files are done.
pub fn strip_command(
    inputs: &[PathBuf],
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<StripSummary> {
    if let [input] = inputs {
        if input.as_os_str() == STDIO_PATH {
            return strip_stdio();
        }
    }

    let mut settings = load_settings(config_path)?;
    if let Some(dir) = output {
        settings.output.directory = dir.to_path_buf();
    }

    println!("usfm-strip v{}", usfm_core::VERSION);

    let sources = collect_sources(inputs, &settings.input.extension)?;
    if sources.is_empty() {
        anyhow::bail!(
            "No .{} files found in: {}",
            settings.input.extension,
            display_paths(inputs)
        );
    }
    println!("  Found {} files", sources.len());

    let mut destinations = HashSet::new();
    let mut summary = StripSummary::default();

    for source in &sources {
        let destination = settings.output.destination(&source.relative);
        if !destinations.insert(destination.clone()) {
            anyhow::bail!(
                "Two inputs map to the same output file: {}",
                destination.display()
            );
        }

        let text = fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read input file: {}", source.path.display()))?;

        let stripped = match remove_alignment_markup(&text) {
            Ok(stripped) => stripped,
            Err(e) => {
                warn!(file = %source.path.display(), error = %e, "skipping file");
                eprintln!("  Failed: {}: {}", source.path.display(), e);
                summary.failed += 1;
                continue;
            }
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
        fs::write(&destination, stripped)
            .with_context(|| format!("Failed to write output file: {}", destination.display()))?;
        println!("  Created: {}", destination.display());
        summary.converted += 1;
    }

    println!();
    println!(
        "Stripped {} of {} files into {}",
        summary.converted,
        sources.len(),
        settings.output.directory.display()
    );

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} files could not be converted",
            summary.failed,
            sources.len()
        );
    }

    Ok(summary)
}

fn strip_stdio() -> Result<StripSummary> {
    let text = read_input(Path::new(STDIO_PATH))?;
    let stripped = remove_alignment_markup(&text).context("Failed to convert stdin")?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(stripped.as_bytes())
        .context("Failed to write stdout")?;
    stdout.flush().context("Failed to write stdout")?;

    Ok(StripSummary {
        converted: 1,
        failed: 0,
    })
}

/// Expand inputs into the files to convert
///
/// Directories are searched recursively for `*.<extension>`; files given
/// directly are taken whatever their extension.
fn collect_sources(inputs: &[PathBuf], extension: &str) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let pattern = input.join(format!("**/*.{extension}")).display().to_string();
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
                match entry {
                    Ok(path) if path.is_file() => {
                        let relative = path.strip_prefix(input).unwrap_or(&path).to_path_buf();
                        sources.push(SourceFile { path, relative });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("Warning: Could not read {}", e);
                    }
                }
            }
        } else if input.is_file() {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| input.clone());
            sources.push(SourceFile {
                path: input.clone(),
                relative,
            });
        } else {
            anyhow::bail!("Input not found: {}", input.display());
        }
    }

    debug!(count = sources.len(), "collected input files");
    Ok(sources)
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Report produced by the check command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub file: String,
    pub headers: usize,
    pub chapters: usize,
    pub verses: usize,
    /// Aligned `\w` words
    pub words: usize,
    /// Alignment milestones, nested ones counted separately
    pub milestones: usize,
    pub aligned: bool,
}

impl CheckReport {
    pub fn from_document(file: &Path, doc: &Document) -> Self {
        Self {
            file: file.display().to_string(),
            headers: doc.headers.len(),
            chapters: doc.chapter_count(),
            verses: doc.verse_count(),
            words: doc.count_kind(NodeKind::Word),
            milestones: doc.count_kind(NodeKind::Milestone),
            aligned: has_alignment_markup(doc),
        }
    }
}

/// Execute the check command
pub fn check_command(input: &Path, format: OutputFormat) -> Result<CheckReport> {
    let text = read_input(input)?;
    let doc = parse(&text).with_context(|| format!("Failed to parse: {}", input.display()))?;
    let report = CheckReport::from_document(input, &doc);

    match format {
        OutputFormat::Text => {
            println!("usfm-strip v{}", usfm_core::VERSION);
            println!("Checking: {}", input.display());
            println!("  Headers: {}", report.headers);
            println!("  Chapters: {}", report.chapters);
            println!("  Verses: {}", report.verses);
            if report.aligned {
                println!(
                    "  Alignment markup: {} words in {} milestones",
                    report.words, report.milestones
                );
            } else {
                println!("✓ No alignment markup found");
            }
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    Ok(report)
}

/// Execute the parse command
pub fn parse_command(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let doc = parse(&text).with_context(|| format!("Failed to parse: {}", input.display()))?;
    let json = serde_json::to_string_pretty(&doc).context("Failed to serialize document")?;
    println!("{}", json);
    Ok(())
}

/// Read a file, or stdin for `-`
fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == STDIO_PATH {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))
}

fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(path)
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                let path = Path::new(candidate);
                if path.exists() {
                    info!(config = candidate, "using config file");
                    return Settings::load(path);
                }
            }
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_strip() {
        let args = vec!["usfm-strip", "strip", "GEN.usfm", "EXO.usfm", "--output", "out"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Strip {
                inputs,
                output,
                config,
            } => {
                assert_eq!(
                    inputs,
                    vec![PathBuf::from("GEN.usfm"), PathBuf::from("EXO.usfm")]
                );
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(config.is_none());
            }
            _ => panic!("Expected Strip command"),
        }
    }

    #[test]
    fn test_cli_parse_strip_requires_input() {
        let args = vec!["usfm-strip", "strip"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_parse_strip_config() {
        let args = vec!["usfm-strip", "strip", "books/", "-c", "usfm-strip.toml"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Strip { config, output, .. } => {
                assert_eq!(config, Some(PathBuf::from("usfm-strip.toml")));
                assert!(output.is_none());
            }
            _ => panic!("Expected Strip command"),
        }
    }

    #[test]
    fn test_cli_parse_check_default_format() {
        let args = vec!["usfm-strip", "check", "GEN.usfm"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Check { input, format } => {
                assert_eq!(input, PathBuf::from("GEN.usfm"));
                assert!(matches!(format, OutputFormat::Text));
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_check_json() {
        let args = vec!["usfm-strip", "check", "-", "--format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Check { input, format } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_verbose_global() {
        let args = vec!["usfm-strip", "parse", "GEN.usfm", "--verbose"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Parse { .. }));
    }

    #[test]
    fn test_display_paths() {
        let paths = vec![PathBuf::from("a"), PathBuf::from("b/c")];
        assert_eq!(display_paths(&paths), "a, b/c");
    }
}
