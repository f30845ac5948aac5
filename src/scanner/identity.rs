// src/scanner/identity.rs
// =============================================================================
// This module rotates the User-Agent header we present to the archive.
//
// Why rotate at all?
// - The availability API rate-limits aggressively, and a single identity
//   hammering it gets throttled sooner
// - Cycling through a pool of realistic browser identities spreads the
//   requests across several apparent clients
//
// The rotator is one of exactly three pieces of shared mutable state in the
// whole program (the others are the rate limiter and the found set). All of
// them live behind a Mutex and are handed to workers as explicit Arc
// handles - no globals.
//
// Rust concepts:
// - Mutex: Mutual exclusion for the shared cursor
// - Wrapping arithmetic via the modulo operator
// =============================================================================

use std::sync::Mutex;

// A small pool of realistic desktop browser identities.
// Must stay non-empty: next() indexes into it unconditionally.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
];

// Hands out identities round-robin, with wraparound
//
// The cursor advances by one per call, modulo the pool size, so N calls
// return exactly N identities in pool order no matter how many workers
// are calling concurrently.
pub struct IdentityRotator {
    pool: Vec<String>,
    cursor: Mutex<usize>,
}

impl IdentityRotator {
    /// Creates a rotator over the built-in User-Agent pool.
    pub fn new() -> Self {
        Self::with_pool(USER_AGENTS.iter().map(|s| s.to_string()).collect())
    }

    /// Creates a rotator over a caller-supplied pool (used by tests).
    ///
    /// The pool must be non-empty; this is a programming error rather than
    /// a runtime condition, hence the assert.
    pub fn with_pool(pool: Vec<String>) -> Self {
        assert!(!pool.is_empty(), "identity pool must not be empty");
        IdentityRotator {
            pool,
            cursor: Mutex::new(0),
        }
    }

    /// Returns the next identity and advances the shared cursor.
    ///
    /// Thread-safe; the lock is held only for the cursor bump, never
    /// across any I/O.
    pub fn next(&self) -> String {
        let mut cursor = self.cursor.lock().unwrap();
        let identity = self.pool[*cursor].clone();
        *cursor = (*cursor + 1) % self.pool.len();
        identity
    }

    /// Number of identities in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }
}

impl Default for IdentityRotator {
    fn default() -> Self {
        IdentityRotator::new()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why std::sync::Mutex and not tokio::sync::Mutex?
//    - The critical section is a single index increment - nanoseconds
//    - We never hold the lock across an .await point
//    - For that pattern the std Mutex is the right (and cheaper) tool
//
// 2. Why does next() return String instead of &str?
//    - Returning a borrow would keep the MutexGuard alive at the caller,
//      or tie the lifetime to &self in awkward ways
//    - Cloning a short header string per request is negligible next to
//      the network round-trip it decorates
//
// 3. Why .unwrap() on lock()?
//    - lock() only fails if another thread panicked while holding the
//      lock (poisoning); at that point the scan is already broken and
//      propagating the panic is the honest move
// -----------------------------------------------------------------------------
