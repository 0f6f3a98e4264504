//! usfm-strip CLI - Command-line interface library
//!
//! This library provides the CLI functionality for usfm-strip:
//! - Strip: Remove word alignment from USFM files and directories
//! - Check: Report chapter/verse counts and whether alignment is present
//! - Parse: Dump the parsed document tree as JSON
//!
//! # Library Usage
//!
//! ```ignore
//! use usfm_cli::{run_cli, strip_command, check_command, OutputFormat};
//!
//! // Run the full CLI
//! run_cli()?;
//!
//! // Or use individual commands programmatically
//! strip_command(&[PathBuf::from("books/")], Some(Path::new("out")), None)?;
//! check_command(Path::new("01-GEN.usfm"), OutputFormat::Json)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Strip every .usfm file below books/ into unaligned/
//! usfm-strip strip books/
//!
//! # Strip one file into a chosen directory
//! usfm-strip strip 01-GEN.usfm --output plain/
//!
//! # Filter stdin to stdout
//! usfm-strip strip - < 01-GEN.usfm > GEN.usfm
//!
//! # Check a file
//! usfm-strip check 01-GEN.usfm --format json
//! ```

pub mod app;
pub mod config;

// Re-export main entry point and types
pub use app::{check_command, parse_command, strip_command};
pub use app::{run_cli, CheckReport, OutputFormat, StripSummary};
pub use config::Settings;
