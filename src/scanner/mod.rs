// src/scanner/mod.rs
// =============================================================================
// This module contains the verification pipeline - the heart of wayscan.
//
// Submodules:
// - identity: Rotates the User-Agent we present to the archive
// - rate: Shared adaptive rate limiting and the retry/backoff policy
// - verify: Checks a single URL against the availability API, with retries
// - orchestrate: Fans URLs out across a bounded pool and gathers results
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

// Declare submodules (tells Rust to include these files)
mod identity;
mod orchestrate;
mod rate;
mod verify;

// Re-export public items from submodules
// This lets users write `scanner::run_scan()` instead of
// `scanner::orchestrate::run_scan()`
pub use identity::IdentityRotator;
pub use orchestrate::run_scan;
pub use rate::{RateLimiter, RetryPolicy};
pub use verify::{SnapshotVerifier, WaybackApi};
