// src/scanner/verify.rs
// =============================================================================
// This module answers one question per URL: does the Wayback Machine hold a
// live snapshot of it?
//
// Key functionality:
// - One GET per attempt against the availability API, with the candidate
//   URL percent-encoded as a query parameter
// - Bounded retries with exponential backoff and jitter
// - HTTP 429 feeds the shared rate limiter so the *whole pool* slows down,
//   and honors the server's Retry-After hint when present
// - Every attempt presents a freshly rotated User-Agent
// - Fails closed: whatever goes wrong, verify() returns false and nothing
//   escapes its boundary
//
// The actual HTTP call sits behind the AvailabilityProbe trait so tests can
// swap in a fake transport and drive the retry loop deterministically.
//
// Rust concepts:
// - Trait objects vs generics: SnapshotVerifier<P> is generic (static
//   dispatch), with BoxFuture keeping the trait object-safe and Send
// - Enums as outcome types instead of stringly-typed errors
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use super::identity::IdentityRotator;
use super::rate::{jitter, RateLimiter, RetryPolicy};

/// The Wayback Machine availability endpoint.
const AVAILABILITY_ENDPOINT: &str = "https://archive.org/wayback/available";

// What a single probe attempt observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The API reported at least one archived snapshot.
    Archived,
    /// The API answered, but no snapshot exists.
    NotArchived,
    /// HTTP 429, optionally with the server's Retry-After hint.
    Throttled(Option<Duration>),
}

// Why a probe attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Timeout or connection-level failure - worth retrying.
    Transient(String),
    /// Anything else (unexpected status, malformed body) - give up on
    /// this URL immediately.
    Fatal(String),
}

// One attempt against the availability API
//
// BoxFuture (from the futures crate) keeps the returned future nameable
// and Send, which is what lets the orchestrator spawn verification tasks
// onto the runtime's worker threads.
pub trait AvailabilityProbe: Send + Sync {
    fn probe<'a>(
        &'a self,
        url: &'a str,
        user_agent: &'a str,
    ) -> BoxFuture<'a, Result<ProbeOutcome, ProbeError>>;
}

// The availability API's response body. We only care whether
// 'archived_snapshots' holds anything - the API returns {} when there is
// no snapshot and an object with a 'closest' entry when there is one.
#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: serde_json::Value,
}

impl AvailabilityResponse {
    // True iff archived_snapshots is a non-empty object.
    // null, absent, or {} all mean "no snapshot".
    fn has_snapshot(&self) -> bool {
        self.archived_snapshots
            .as_object()
            .is_some_and(|snapshots| !snapshots.is_empty())
    }
}

/// The real probe: talks HTTP to archive.org.
pub struct WaybackApi {
    client: Client,
    endpoint: String,
}

impl WaybackApi {
    /// Wraps a shared reqwest client (the client carries the 10s timeout
    /// and the connection pool).
    pub fn new(client: Client) -> Self {
        WaybackApi::with_endpoint(client, AVAILABILITY_ENDPOINT.to_string())
    }

    // Tests point this at a local server; production always uses the
    // archive.org endpoint via new().
    fn with_endpoint(client: Client, endpoint: String) -> Self {
        WaybackApi { client, endpoint }
    }
}

impl AvailabilityProbe for WaybackApi {
    fn probe<'a>(
        &'a self,
        url: &'a str,
        user_agent: &'a str,
    ) -> BoxFuture<'a, Result<ProbeOutcome, ProbeError>> {
        Box::pin(async move {
            // .query() percent-encodes the candidate URL for us.
            // Accept-Encoding is reqwest's job: with the gzip/deflate
            // features enabled it advertises them AND decompresses the
            // body - advertising by hand would get us compressed bytes
            // that .json() can't parse
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("url", url)])
                .header(header::USER_AGENT, user_agent)
                .header(header::ACCEPT, "application/json")
                .header(header::CONNECTION, "keep-alive")
                .send()
                .await
                .map_err(classify_transport_error)?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Ok(ProbeOutcome::Throttled(parse_retry_after(&response)));
            }

            if !status.is_success() {
                return Err(ProbeError::Fatal(format!("HTTP {}", status)));
            }

            let body: AvailabilityResponse = response
                .json()
                .await
                .map_err(|e| ProbeError::Fatal(format!("invalid response body: {}", e)))?;

            if body.has_snapshot() {
                Ok(ProbeOutcome::Archived)
            } else {
                Ok(ProbeOutcome::NotArchived)
            }
        })
    }
}

// Sorts reqwest errors into retry-worthy vs terminal
//
// Timeouts and connection failures are transient (the archive hiccups a
// lot under load); everything else is treated as non-transient
fn classify_transport_error(error: reqwest::Error) -> ProbeError {
    if error.is_timeout() || error.is_connect() {
        ProbeError::Transient(error.to_string())
    } else {
        ProbeError::Fatal(error.to_string())
    }
}

// Reads a Retry-After header given as integer seconds.
// (The HTTP-date form exists too, but the archive sends seconds.)
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// Verifies URLs through a probe, owning the retry loop and the shared
// rate-limiting cooperation
//
// Generic over the probe so tests can inject a fake; production code uses
// SnapshotVerifier<WaybackApi>.
pub struct SnapshotVerifier<P> {
    api: P,
    identities: Arc<IdentityRotator>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    verbose: bool,
}

impl<P: AvailabilityProbe> SnapshotVerifier<P> {
    pub fn new(
        api: P,
        identities: Arc<IdentityRotator>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
        verbose: bool,
    ) -> Self {
        SnapshotVerifier {
            api,
            identities,
            limiter,
            policy,
            verbose,
        }
    }

    /// Checks whether a live snapshot exists for `url`.
    ///
    /// Fails closed: exhausted retries, transport trouble, or anything
    /// unexpected all come back as false. Per attempt:
    ///
    /// 1. Sleep for the shared delay plus jitter (pool-wide throttling
    ///    without a central scheduler)
    /// 2. Probe with a freshly rotated identity
    /// 3. A definitive answer feeds record_success() and returns
    /// 4. 429 feeds record_throttled(), then waits out the server's
    ///    Retry-After hint (or exponential backoff) plus jitter
    /// 5. Transient transport errors wait out the backoff and retry
    /// 6. Fatal errors return false immediately - no retry
    pub async fn verify(&self, url: &str) -> bool {
        if self.verbose {
            println!("[*] Verifying snapshot for: {}", url);
        }

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.limiter.current_delay() + jitter()).await;

            let identity = self.identities.next();

            match self.api.probe(url, &identity).await {
                Ok(ProbeOutcome::Archived) => {
                    self.limiter.record_success();
                    if self.verbose {
                        println!("[+] Snapshot found for: {}", url);
                    }
                    return true;
                }
                Ok(ProbeOutcome::NotArchived) => {
                    self.limiter.record_success();
                    if self.verbose {
                        println!("[-] No snapshot found for: {}", url);
                    }
                    return false;
                }
                Ok(ProbeOutcome::Throttled(retry_after)) => {
                    self.limiter.record_throttled();
                    if self.verbose {
                        println!("[-] Throttled on {} (attempt {})", url, attempt);
                    }
                    // No point sleeping out a backoff when no attempt
                    // remains to spend it on
                    if attempt < self.policy.max_attempts {
                        let wait = retry_after.unwrap_or_else(|| self.policy.backoff(attempt));
                        tokio::time::sleep(wait + jitter()).await;
                    }
                }
                Err(ProbeError::Transient(reason)) => {
                    if self.verbose {
                        println!(
                            "[-] Transient error on {} (attempt {}): {}",
                            url, attempt, reason
                        );
                    }
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.backoff(attempt) + jitter()).await;
                    }
                }
                Err(ProbeError::Fatal(reason)) => {
                    eprintln!("[!] Error verifying snapshot for {}: {}", url, reason);
                    return false;
                }
            }
        }

        if self.verbose {
            println!("[-] Gave up on {} after {} attempts", url, self.policy.max_attempts);
        }
        false
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait for one HTTP call?
//    - It's the seam between "decide what to do" (the retry loop) and
//      "talk to the network" (reqwest)
//    - Tests implement AvailabilityProbe with canned outcomes and get a
//      fully deterministic retry loop, no sockets involved
//
// 2. What is BoxFuture?
//    - Pin<Box<dyn Future + Send>> - a heap-allocated future with an
//      explicit Send bound
//    - Plain 'async fn' in a trait can't promise Send to generic callers
//      on stable Rust, so we box instead
//
// 3. Why does a 2xx with no snapshot still call record_success()?
//    - "Success" here means "the API answered without throttling us"
//    - The rate limiter only cares about pressure, not whether the
//      snapshot exists
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // A probe that replays a scripted sequence of outcomes, recording how
    // many attempts reached it.
    struct ScriptedProbe {
        script: Mutex<Vec<Result<ProbeOutcome, ProbeError>>>,
        attempts: Mutex<u32>,
    }

    impl ScriptedProbe {
        fn new(mut script: Vec<Result<ProbeOutcome, ProbeError>>) -> Self {
            // pop() takes from the back, so store the script reversed
            script.reverse();
            ScriptedProbe {
                script: Mutex::new(script),
                attempts: Mutex::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            *self.attempts.lock().unwrap()
        }
    }

    impl AvailabilityProbe for ScriptedProbe {
        fn probe<'a>(
            &'a self,
            _url: &'a str,
            _user_agent: &'a str,
        ) -> BoxFuture<'a, Result<ProbeOutcome, ProbeError>> {
            Box::pin(async move {
                *self.attempts.lock().unwrap() += 1;
                self.script
                    .lock()
                    .unwrap()
                    .pop()
                    .expect("probe called more times than scripted")
            })
        }
    }

    fn verifier_with(
        script: Vec<Result<ProbeOutcome, ProbeError>>,
        limiter: Arc<RateLimiter>,
    ) -> SnapshotVerifier<ScriptedProbe> {
        SnapshotVerifier::new(
            ScriptedProbe::new(script),
            Arc::new(IdentityRotator::new()),
            limiter,
            RetryPolicy::default(),
            false,
        )
    }

    // start_paused = true gives us a fake clock: every sleep in the retry
    // loop completes instantly, so these tests run in milliseconds.

    #[tokio::test(start_paused = true)]
    async fn test_archived_on_first_attempt() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let verifier = verifier_with(vec![Ok(ProbeOutcome::Archived)], Arc::clone(&limiter));

        assert!(verifier.verify("https://example.com/a.pdf").await);
        assert_eq!(verifier.api.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_archived_is_false_without_retry() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let verifier = verifier_with(vec![Ok(ProbeOutcome::NotArchived)], Arc::clone(&limiter));

        assert!(!verifier.verify("https://example.com/a.pdf").await);
        assert_eq!(verifier.api.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_every_attempt_fails_closed() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let script = (0..5)
            .map(|_| Err(ProbeError::Transient("timed out".to_string())))
            .collect();
        let verifier = verifier_with(script, Arc::clone(&limiter));

        let started = tokio::time::Instant::now();

        // Exhausts all attempts, returns false, never panics or escapes
        assert!(!verifier.verify("https://example.com/a.pdf").await);
        assert_eq!(verifier.api.attempts(), 5);

        // The paused clock advances by exactly the slept durations:
        // backoffs for attempts 1-4 (1+2+4+8 = 15s) plus up to 9s of
        // jitter. The 10s backoff after the final attempt must be
        // skipped - there is no attempt left to spend it on - so the
        // total stays strictly under 25s.
        assert!(started.elapsed() < Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_then_archived_recovers() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let verifier = verifier_with(
            vec![
                Ok(ProbeOutcome::Throttled(None)),
                Ok(ProbeOutcome::Throttled(Some(Duration::from_secs(2)))),
                Ok(ProbeOutcome::Archived),
            ],
            Arc::clone(&limiter),
        );

        assert!(verifier.verify("https://example.com/a.pdf").await);
        assert_eq!(verifier.api.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_gives_up_immediately() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let verifier = verifier_with(
            vec![Err(ProbeError::Fatal("HTTP 500".to_string()))],
            Arc::clone(&limiter),
        );

        assert!(!verifier.verify("https://example.com/a.pdf").await);
        // No retry after a fatal error
        assert_eq!(verifier.api.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_throttling_raises_shared_delay() {
        let limiter = Arc::new(RateLimiter::new(Duration::ZERO));
        let script = (0..5)
            .map(|_| Ok(ProbeOutcome::Throttled(None)))
            .collect();
        let verifier = verifier_with(script, Arc::clone(&limiter));

        let started = tokio::time::Instant::now();

        assert!(!verifier.verify("https://example.com/a.pdf").await);
        // 5 consecutive 429s crossed the threshold (3), so the shared
        // delay must have grown - but never past the 5s ceiling
        assert!(limiter.current_delay() >= Duration::from_secs(1));
        assert!(limiter.current_delay() <= Duration::from_secs(5));

        // As with transient errors, the 429 on the final attempt must
        // not sleep out a backoff nobody will use. Worst case with the
        // skip: pre-request shared delays 0+0+0+1+2 = 3s (the delay only
        // starts growing at the third consecutive 429), backoffs
        // 1+2+4+8 = 15s, and under 9s of jitter - strictly below 27s.
        // Sleeping the final 10s backoff would push the total to 28s or
        // more.
        assert!(started.elapsed() < Duration::from_secs(28));
    }

    // --- Real-probe tests -----------------------------------------------
    // These exercise WaybackApi itself (headers, status handling, body
    // decoding) against a one-shot HTTP server on a loopback socket. No
    // paused clock here: the I/O is real, just local.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Serves exactly one connection with a canned response, returning the
    // endpoint URL to point the probe at.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the request headers before answering
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn test_client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    // gzip of: {"archived_snapshots": {"closest": {"available": true,
    // "url": "http://web.archive.org/web/20200101000000/http://example.com/a.pdf"}}}
    const GZIPPED_AVAILABILITY: &[u8] = &[
        0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0x2d, 0x8c, 0xc1, 0x0a,
        0x83, 0x30, 0x10, 0x44, 0x7f, 0x45, 0xf6, 0x5c, 0xb2, 0xa9, 0x47, 0x7f, 0xa6, 0xac,
        0x71, 0x6b, 0x84, 0xb5, 0x09, 0xd9, 0xd5, 0x16, 0x24, 0xff, 0xde, 0x28, 0xce, 0xbb,
        0xcc, 0x83, 0x61, 0x0e, 0xa0, 0x12, 0xe2, 0xb2, 0xf3, 0xf4, 0xd2, 0x0f, 0x65, 0x8d,
        0xc9, 0x14, 0x86, 0xee, 0x80, 0x20, 0x49, 0x59, 0xed, 0xea, 0xb4, 0xd3, 0x22, 0x34,
        0x0a, 0x37, 0xb3, 0xb2, 0xf1, 0xa3, 0x83, 0xad, 0x48, 0x13, 0x88, 0x66, 0x79, 0x40,
        0xfc, 0xf2, 0xe8, 0xee, 0x1f, 0x97, 0xca, 0x7c, 0x3a, 0xf6, 0xbe, 0xf7, 0xfe, 0xd9,
        0xb8, 0x82, 0xf7, 0x92, 0x7f, 0xb4, 0x66, 0x61, 0x17, 0xd2, 0x8a, 0xe4, 0xf2, 0xf4,
        0x86, 0x5a, 0xeb, 0x1f, 0x77, 0xb4, 0xcd, 0xdb, 0x85, 0x00, 0x00, 0x00,
    ];

    #[tokio::test]
    async fn test_real_probe_decodes_gzipped_body() {
        // The archive normally compresses its JSON answers; the probe
        // must come back with the decompressed verdict, not a decode
        // error
        let mut response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Encoding: gzip\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            GZIPPED_AVAILABILITY.len()
        )
        .into_bytes();
        response.extend_from_slice(GZIPPED_AVAILABILITY);

        let endpoint = serve_once(response).await;
        let api = WaybackApi::with_endpoint(test_client(), endpoint);

        let outcome = api.probe("http://example.com/a.pdf", "test-agent").await;
        assert_eq!(outcome, Ok(ProbeOutcome::Archived));
    }

    #[tokio::test]
    async fn test_real_probe_plain_empty_snapshots() {
        let body = r#"{"archived_snapshots": {}}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            body.len(),
            body
        )
        .into_bytes();

        let endpoint = serve_once(response).await;
        let api = WaybackApi::with_endpoint(test_client(), endpoint);

        let outcome = api.probe("http://example.com/a.pdf", "test-agent").await;
        assert_eq!(outcome, Ok(ProbeOutcome::NotArchived));
    }

    #[tokio::test]
    async fn test_real_probe_429_carries_retry_after() {
        let response = b"HTTP/1.1 429 Too Many Requests\r\n\
                         Retry-After: 7\r\n\
                         Content-Length: 0\r\n\
                         Connection: close\r\n\r\n"
            .to_vec();

        let endpoint = serve_once(response).await;
        let api = WaybackApi::with_endpoint(test_client(), endpoint);

        let outcome = api.probe("http://example.com/a.pdf", "test-agent").await;
        assert_eq!(
            outcome,
            Ok(ProbeOutcome::Throttled(Some(Duration::from_secs(7))))
        );
    }

    #[tokio::test]
    async fn test_real_probe_unexpected_status_is_fatal() {
        let response = b"HTTP/1.1 500 Internal Server Error\r\n\
                         Content-Length: 0\r\n\
                         Connection: close\r\n\r\n"
            .to_vec();

        let endpoint = serve_once(response).await;
        let api = WaybackApi::with_endpoint(test_client(), endpoint);

        let outcome = api.probe("http://example.com/a.pdf", "test-agent").await;
        assert!(matches!(outcome, Err(ProbeError::Fatal(_))));
    }

    #[test]
    fn test_has_snapshot_truthiness() {
        let parse = |json: &str| -> AvailabilityResponse { serde_json::from_str(json).unwrap() };

        // Populated object -> snapshot exists
        assert!(parse(
            r#"{"archived_snapshots": {"closest": {"available": true, "url": "x"}}}"#
        )
        .has_snapshot());

        // Empty object, null, or absent -> no snapshot
        assert!(!parse(r#"{"archived_snapshots": {}}"#).has_snapshot());
        assert!(!parse(r#"{"archived_snapshots": null}"#).has_snapshot());
        assert!(!parse(r#"{}"#).has_snapshot());
    }
}
