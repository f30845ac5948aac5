// src/extensions.rs
// =============================================================================
// This module holds the built-in extension sets and the suffix matcher that
// decides which discovered URLs are worth verifying.
//
// Matching rules:
// - Comparison is case-insensitive ("x.PDF" matches ".pdf")
// - A URL matches if it *ends with* one of the patterns (exact suffix,
//   so "report.pdf.bak" does NOT match ".pdf")
// - Patterns are checked in list order and we stop at the first hit
// - The special set [""] (one empty string) means "no filtering at all"
//
// Rust concepts:
// - &'static str: String literals baked into the binary
// - Slices (&[T]): Borrowed views into arrays/vectors
// - Iterators: any() short-circuits just like a manual loop with break
// =============================================================================

use anyhow::{anyhow, Result};

use crate::cli::ExtensionMode;

/// Common document, archive and data-file extensions - the default filter.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".xls", ".xml", ".xlsx", ".json", ".pdf", ".sql", ".doc", ".docx", ".pptx", ".txt",
    ".zip", ".tar.gz", ".tgz", ".bak", ".7z", ".rar", ".log", ".cache", ".secret", ".db",
    ".backup", ".yml", ".gz", ".config", ".csv", ".yaml", ".md", ".md5", ".exe", ".dll",
    ".bin", ".ini", ".bat", ".sh", ".tar", ".deb", ".rpm", ".iso", ".img", ".apk", ".msi",
    ".dmg", ".tmp", ".crt", ".pem", ".key", ".pub", ".asc",
];

/// The exhaustive set: server configs, editor leftovers, VCS directories,
/// database dumps and everything in DEFAULT_EXTENSIONS.
pub const ALL_EXTENSIONS: &[&str] = &[
    ".env", ".htaccess", ".htpasswd", ".conf", ".inc", ".config", ".settings", ".ini", ".cfg",
    ".properties", ".toml", "web.config", "robots.txt", "sitemap.xml", "crossdomain.xml",
    ".well-known", ".bak", ".backup", ".old", ".save", ".orig", ".temp", ".tmp", ".swp", ".swo",
    "~", ".copy", "._old", ".draft", "*-BACKUP-*", "*-backup-*", ".php~", ".php.bak", ".php.old",
    ".php.swp", ".phps", ".asp~", ".aspx~", ".jsp~", ".jsx~", ".js~", ".vue~", ".rb~", ".py~",
    ".go~", ".java~", ".class", ".git", ".svn", ".hg", ".idea", ".vscode", "node_modules/",
    "vendor/", ".sqlite", ".sqlite3", ".mdb", ".sql", ".mysql", ".pgsql", ".mongodb", ".redis",
    ".frm", ".ibd", ".myd", ".myi", ".dbf",
    // ...plus everything from the default set
    ".xls", ".xml", ".xlsx", ".json", ".pdf", ".doc", ".docx", ".pptx", ".txt",
    ".zip", ".tar.gz", ".tgz", ".7z", ".rar", ".log", ".cache", ".secret", ".db",
    ".yml", ".gz", ".csv", ".yaml", ".md", ".md5", ".exe", ".dll",
    ".bin", ".bat", ".sh", ".tar", ".deb", ".rpm", ".iso", ".img", ".apk", ".msi",
    ".dmg", ".crt", ".pem", ".key", ".pub", ".asc",
];

// Resolves the CLI extension mode into the active extension set
//
// Parameters:
//   mode: which set the user picked (-e flag)
//   custom: the raw -c value, if any
//
// Returns:
//   Ok(Vec<String>) with the patterns to match against
//   Err if mode is Custom but no -c list was supplied (configuration error,
//   caught before any network activity happens)
//
// The None mode returns vec![""] - the "verify everything" sentinel that
// matches() treats specially.
pub fn resolve(mode: ExtensionMode, custom: Option<&str>) -> Result<Vec<String>> {
    match mode {
        ExtensionMode::Default => Ok(DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()),
        ExtensionMode::All => Ok(ALL_EXTENSIONS.iter().map(|s| s.to_string()).collect()),
        ExtensionMode::None => Ok(vec![String::new()]),
        ExtensionMode::Custom => {
            let list = custom
                .ok_or_else(|| anyhow!("Custom extensions required with -c flag"))?;
            Ok(list.split(',').map(|ext| ext.trim().to_string()).collect())
        }
    }
}

// Returns true when the extension set is the "no filtering" sentinel
pub fn is_no_filter(extensions: &[String]) -> bool {
    extensions.len() == 1 && extensions[0].is_empty()
}

// Checks whether a URL matches the extension set
//
// The sentinel set accepts every URL (even empty or malformed strings -
// we never parse the URL, it's an opaque suffix test). Otherwise the URL
// matches if its lowercase form ends with the lowercase form of any
// pattern, first match wins.
pub fn matches(url: &str, extensions: &[String]) -> bool {
    if is_no_filter(extensions) {
        return true;
    }

    let url_lower = url.to_lowercase();
    extensions
        .iter()
        .any(|ext| url_lower.ends_with(&ext.to_lowercase()))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why &[&str] for the constants but Vec<String> at runtime?
//    - The built-in lists are known at compile time, so string literals
//      in a static slice cost nothing
//    - The custom list comes from user input at runtime and must be owned,
//      so resolve() normalizes everything to Vec<String>
//
// 2. What does any() do?
//    - Runs the closure for each item until one returns true
//    - Short-circuits on the first hit, like a loop with break
//    - Returns false for an empty iterator
//
// 3. Why lowercase both sides?
//    - Archived URLs preserve whatever casing the original site used
//    - "REPORT.PDF" is the same file as "report.pdf" for our purposes
// -----------------------------------------------------------------------------
