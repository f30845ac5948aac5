// src/sources/file.rs
// =============================================================================
// This module loads a user-supplied URL list from disk.
//
// Format: one URL per line, nothing else. Blank lines are skipped so a
// trailing newline (or sloppy editing) doesn't produce empty candidates.
//
// A missing or unreadable file is a configuration error - the caller
// aborts before any network activity, unlike discovery failures which
// degrade gracefully.
// =============================================================================

use anyhow::{anyhow, Result};

// Reads a newline-delimited URL list
//
// Returns: Vec of URLs with surrounding whitespace trimmed and blank
// lines dropped; Err with the path in the message if the read fails
pub fn load_urls(path: &str) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read URL list '{}': {}", path, e))?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
