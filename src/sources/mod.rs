// src/sources/mod.rs
// =============================================================================
// This module handles where candidate URLs come from.
//
// Two sources, mutually exclusive on the command line:
// - wayback: Query the Internet Archive's CDX index for every URL it has
//   ever captured under a domain
// - file: Read a newline-delimited URL list the user prepared
//
// Either way the output is the same: an opaque Vec<String> of candidates
// for the scanner. We never parse or normalize the URLs - the archive is
// the authority on what it captured.
// =============================================================================

mod file;
mod wayback;

// Re-export the loader functions
pub use file::load_urls;
pub use wayback::fetch_domain_urls;
