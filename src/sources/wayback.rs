// src/sources/wayback.rs
// =============================================================================
// This module discovers candidate URLs through the Internet Archive's CDX
// index.
//
// The CDX endpoint returns, as plain text, one original URL per line for
// everything the archive has ever captured under the domain:
//   - url=*.{domain}/*     matches the domain and all subdomains
//   - output=txt&fl=original   gives just the original URLs, plain text
//   - collapse=urlkey      collapses repeat captures of the same URL
//
// Discovery failure is not fatal to the program: the caller reports it and
// proceeds with an empty candidate list (see main.rs).
//
// Rust concepts:
// - async functions: For network I/O
// - Result: For error handling
// - Iterator chains: lines() -> trim -> filter -> collect
// =============================================================================

use anyhow::{anyhow, Result};
use reqwest::Client;

// Builds the CDX search URL for a domain.
// Split out from the fetch so the query shape is testable without I/O.
fn index_url(domain: &str) -> String {
    format!(
        "https://web.archive.org/cdx/search/cdx?url=*.{}/*&output=txt&fl=original&collapse=urlkey",
        domain
    )
}

// Fetches every archived URL the CDX index knows for a domain
//
// Parameters:
//   client: the shared reqwest client (carries the request timeout)
//   domain: bare domain like "example.com"
//
// Returns: Vec of original URLs, blank lines dropped; Err if the index is
// unreachable or answers non-2xx
pub async fn fetch_domain_urls(client: &Client, domain: &str) -> Result<Vec<String>> {
    let response = client.get(index_url(domain)).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "CDX index answered HTTP {} for {}",
            response.status(),
            domain
        ));
    }

    let body = response.text().await?;

    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
