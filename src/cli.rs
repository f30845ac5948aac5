// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Unlike tools built around subcommands, wayscan is flag-driven: you point
// it at a target (a domain OR a file of URLs) and tune the scan with flags.
// clap's ArgGroup handles the "exactly one of -u / -l" rule for us.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{ArgGroup, Parser, ValueEnum};

// Upper bound for -d; anything slower than an hour between requests is a
// typo, not a scan
const MAX_BASE_DELAY_SECS: f64 = 3600.0;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "wayscan",
    version = "0.1.0",
    about = "Find archived files for a domain via the Wayback Machine",
    long_about = "wayscan pulls a domain's historical URLs from the Internet Archive's CDX \
                  index (or reads them from a file), filters them by file extension, and \
                  verifies which ones still have a live snapshot in the Wayback Machine.",
    after_help = "Examples:\n\
                  \x20   wayscan -u example.com\n\
                  \x20   wayscan -u example.com -e all\n\
                  \x20   wayscan -u example.com -e custom -c .pdf,.doc,.txt\n\
                  \x20   wayscan -l urls.txt -o found.txt\n\
                  \x20   wayscan -u example.com -e none -v -d 1"
)]
// The group says: the user must pass exactly one of --url or --list
// 'required = true' = one is mandatory, 'multiple = false' = not both
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .multiple(false)
        .args(["url", "list"]),
))]
pub struct Cli {
    /// Target domain (e.g., example.com)
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// File containing a list of URLs, one per line
    #[arg(short = 'l', long)]
    pub list: Option<String>,

    /// Extension set to filter URLs with
    ///
    /// 'default' = common document/archive extensions
    /// 'all'     = the exhaustive set (configs, backups, VCS leftovers, ...)
    /// 'custom'  = your own comma-separated list via -c
    /// 'none'    = no filtering, verify every URL
    #[arg(short = 'e', long, value_enum, default_value_t = ExtensionMode::Default)]
    pub extensions: ExtensionMode,

    /// Custom extensions (comma-separated, e.g., .pdf,.doc,.txt)
    ///
    /// Only meaningful together with '-e custom'
    #[arg(short = 'c', long)]
    pub custom: Option<String>,

    /// Number of concurrent verification workers
    #[arg(short = 't', long, default_value_t = 10)]
    pub threads: usize,

    /// Output file for found URLs (prints to console if omitted)
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Enable verbose per-URL progress output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Base delay between requests, in seconds
    ///
    /// This is the starting point for the adaptive rate limiter; it grows
    /// on its own if the archive starts throttling us
    #[arg(short = 'd', long, default_value_t = 0.0)]
    pub delay: f64,
}

impl Cli {
    /// Converts the -d flag into a Duration.
    ///
    /// The flag parses as a bare f64, which accepts values that
    /// Duration::from_secs_f64 panics on (inf, NaN, anything too large
    /// for a Duration). Bad values are a configuration error: report
    /// them and abort before any network activity.
    pub fn base_delay(&self) -> Result<Duration> {
        if !self.delay.is_finite() || self.delay < 0.0 || self.delay > MAX_BASE_DELAY_SECS {
            return Err(anyhow!(
                "Invalid delay '{}': expected seconds between 0 and {}",
                self.delay,
                MAX_BASE_DELAY_SECS
            ));
        }
        Ok(Duration::from_secs_f64(self.delay))
    }
}

// Which built-in (or user-supplied) extension set to filter with
//
// ValueEnum lets clap parse the variant names directly from the command
// line, so '-e all' just works and '--help' lists the choices
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionMode {
    /// Common document and archive extensions
    Default,
    /// The exhaustive set, including config and backup patterns
    All,
    /// User-supplied comma-separated list (requires -c)
    Custom,
    /// No filtering - verify every discovered URL
    None,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Option<String> for --url and --list?
//    - Each flag on its own is optional; the ArgGroup enforces that
//      exactly one of the two is present
//    - After parsing succeeds, exactly one of the two Options is Some
//
// 2. What is ValueEnum?
//    - A clap derive that turns an enum into a set of CLI choices
//    - clap handles parsing, validation, and the help text for us
//    - Like argparse's choices=[...] in Python, but type-safe
//
// 3. What is default_value_t?
//    - Supplies a default using a value of the field's actual type
//    - default_value (without _t) takes a string and parses it instead
//
// 4. Why f64 for the delay?
//    - Sub-second delays like 0.5 are useful for gentle rate limiting
//    - We convert it to a Duration once, at startup
// -----------------------------------------------------------------------------
