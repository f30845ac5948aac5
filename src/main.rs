// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Resolve the extension set (configuration errors abort right here,
//    before any network activity)
// 3. Get candidate URLs - from the Wayback CDX index or from a file
// 4. Run the concurrent verification scan
// 5. Write the found URLs to a file, or print them
// 6. Exit with proper code (0 = success, 1 = error)
//
// Rust concepts used:
// - async/await: Because we make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - Arc: Shared ownership of the verifier across tasks
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;          // src/cli.rs - command-line parsing
mod extensions;   // src/extensions.rs - extension sets and the suffix matcher
mod scanner;      // src/scanner/ - the verification pipeline
mod sources;      // src/sources/ - where candidate URLs come from

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;

use cli::Cli;
use scanner::{IdentityRotator, RateLimiter, RetryPolicy, SnapshotVerifier, WaybackApi};

// The #[tokio::main] attribute transforms our async main into a real main
// function: it creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    print_banner();

    // Run our application logic and capture the exit code
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // Configuration problems and unexpected errors both land here
            eprintln!("[!] Error: {}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// The main application logic
async fn run() -> Result<()> {
    // Parse command-line arguments into our Cli struct
    // This automatically handles --help, --version, and the
    // "exactly one of -u / -l" rule
    let cli = Cli::parse();

    // Resolve the extension set first: choosing '-e custom' without '-c'
    // is a configuration error and we want to fail before touching the
    // network
    let extension_set = extensions::resolve(cli.extensions, cli.custom.as_deref())?;

    // Same story for the delay flag: 'inf' and friends parse as f64 but
    // make no sense as a Duration
    let base_delay = cli.base_delay()?;

    println!("[*] Starting wayscan");
    println!("[*] Using {} workers", cli.threads);

    if cli.verbose {
        if cli.delay > 0.0 {
            println!("[*] Base delay: {} seconds", cli.delay);
        }
        if let Some(output) = &cli.output {
            println!("[*] Results will be saved to: {}", output);
        }
    }

    // One shared HTTP client for discovery and verification alike.
    // The 10 second timeout applies to every request; the connection pool
    // is reused across all workers.
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // Get the candidate URLs from whichever source the user picked
    let urls = match (&cli.list, &cli.url) {
        (Some(path), _) => {
            // A missing list file aborts the run (configuration error)
            let urls = sources::load_urls(path)?;
            if cli.verbose {
                println!("[+] Loaded {} URLs from {}", urls.len(), path);
            }
            urls
        }
        (None, Some(domain)) => {
            // Discovery failure degrades gracefully: report it and scan
            // an empty list rather than aborting
            match sources::fetch_domain_urls(&client, domain).await {
                Ok(urls) => {
                    if cli.verbose {
                        println!("[+] Successfully retrieved {} URLs", urls.len());
                    }
                    urls
                }
                Err(e) => {
                    eprintln!("[!] Error fetching URLs: {}", e);
                    Vec::new()
                }
            }
        }
        (None, None) => unreachable!("clap's target group requires -u or -l"),
    };

    if cli.verbose {
        println!("[*] Total URLs to process: {}", urls.len());
    }

    // Wire up the verification pipeline. These three Arcs are the only
    // shared mutable state in the program: the identity cursor, the rate
    // state, and (inside run_scan) the found set.
    let identities = Arc::new(IdentityRotator::new());
    let limiter = Arc::new(RateLimiter::new(base_delay));
    let verifier = Arc::new(SnapshotVerifier::new(
        WaybackApi::new(client),
        identities,
        limiter,
        RetryPolicy::default(),
        cli.verbose,
    ));

    // Each task gets its own Arc handle on the verifier
    let verify = move |url: String| {
        let verifier = Arc::clone(&verifier);
        async move { verifier.verify(&url).await }
    };

    let found = scanner::run_scan(urls, &extension_set, cli.threads, verify).await;

    println!("\nTotal files found: {}", found.len());

    // Write results to the output file, or list them on the console
    if let Some(path) = &cli.output {
        let mut contents = String::new();
        for url in &found {
            contents.push_str(url);
            contents.push('\n');
        }
        std::fs::write(path, contents)?;
        println!("Results saved to {}", path);
    } else if !found.is_empty() {
        println!("\nFound URLs:");
        for url in &found {
            println!("{}", url);
        }
    }

    Ok(())
}

// Prints the startup banner
fn print_banner() {
    let banner = r#"
__      ____ _ _   _ ___  ___ __ _ _ __
\ \ /\ / / _` | | | / __|/ __/ _` | '_ \
 \ V  V / (_| | |_| \__ \ (_| (_| | | | |
  \_/\_/ \__,_|\__, |___/\___\__,_|_| |_| v0.1.0
               |___/   Wayback Archive Scanner
"#;
    println!("{}", banner);
}
