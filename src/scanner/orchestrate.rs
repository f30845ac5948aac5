// src/scanner/orchestrate.rs
// =============================================================================
// This module fans the candidate URLs out across a bounded pool of
// verification tasks and gathers the positives into the found set.
//
// How it works:
// 1. Filter the candidates by extension first - URLs that don't match
//    never cost a network call
// 2. Spawn one verification task per matching URL, at most `concurrency`
//    in flight at a time (buffer_unordered only pulls more work from the
//    stream as tasks finish)
// 3. Positive verifications append to a mutex-guarded Vec and print a
//    progress line
// 4. Return once every task has completed - one URL failing (which the
//    verifier already reduced to `false`) never cancels the others
//
// The found set keeps insertion-as-completed order, which is
// nondeterministic under concurrency. Callers who need a stable order
// should sort.
//
// Rust concepts:
// - Generic closures: the verifier is injected as Fn(String) -> Future,
//   so tests drive the orchestrator with a mock and no network
// - Arc<Mutex<Vec>>: the classic shared-aggregation pattern
// =============================================================================

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};

use crate::extensions;

// Runs the scan: filter, fan out, aggregate
//
// Parameters:
//   urls: candidate URLs (duplicates are verified independently)
//   extension_set: patterns from extensions::resolve() (may be the
//                  no-filter sentinel)
//   concurrency: maximum verification tasks in flight
//   verify: the verification function; must resolve to a plain bool
//
// Returns: the URLs confirmed to have a live snapshot, in completion order
pub async fn run_scan<F, Fut>(
    urls: Vec<String>,
    extension_set: &[String],
    concurrency: usize,
    verify: F,
) -> Vec<String>
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let found = Arc::new(Mutex::new(Vec::new()));

    // Extension filtering happens before any task exists, so skipped URLs
    // are completely free
    let candidates: Vec<String> = urls
        .into_iter()
        .filter(|url| extensions::matches(url, extension_set))
        .collect();

    let tasks = candidates.into_iter().map(|url| {
        let verify = verify.clone();
        let found = Arc::clone(&found);
        async move {
            if verify(url.clone()).await {
                // Lock only around the append + progress line; the
                // network wait above happens outside it
                let mut found = found.lock().unwrap();
                found.push(url.clone());
                println!("[+] Found: {}", url);
            }
        }
    });

    // tokio::spawn gives each task a real slot on the runtime's worker
    // threads; buffer_unordered caps how many are alive at once and joins
    // them as they finish, in whatever order that happens
    stream::iter(tasks)
        .map(|task| tokio::spawn(task))
        .buffer_unordered(concurrency.max(1))
        .for_each(|joined| async {
            // A JoinError only happens if a task panicked; the scan keeps
            // going for the remaining URLs either way
            if let Err(e) = joined {
                eprintln!("[!] Verification task failed: {}", e);
            }
        })
        .await;

    // All tasks are done; we are the only Arc holder left
    Arc::try_unwrap(found)
        .expect("verification tasks still hold the found set")
        .into_inner()
        .unwrap()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn + buffer_unordered instead of buffer_unordered alone?
//    - buffer_unordered by itself polls the futures inside one task,
//      which is concurrency but not parallelism
//    - Spawning puts each verification on the multi-threaded runtime;
//      buffer_unordered then acts purely as the pool-size limiter,
//      because it only pulls (and thus spawns) a new task when one of
//      the `concurrency` in-flight slots frees up
//
// 2. Why Arc<Mutex<Vec>> instead of collecting task results?
//    - The found set is shared, append-only state that tasks write the
//      moment they succeed, which is also where the progress line
//      belongs
//    - Collecting (url, bool) pairs would work too; this shape keeps the
//      "append under the lock" behavior explicit and testable
//
// 3. What does Arc::try_unwrap do?
//    - Takes the value back out of the Arc once no clones remain
//    - Every task clone was dropped when the task finished, so after the
//      join this cannot fail
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn set(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_found_set_matches_mock_backend() {
        // Mock backend: anything with "found" in the URL is archived
        let verify = |url: String| async move { url.contains("found") };

        let mut found = run_scan(
            urls(&["a/found.pdf", "a/missing.pdf", "a/found.zip"]),
            &crate::extensions::DEFAULT_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            10,
            verify,
        )
        .await;

        // Completion order is nondeterministic, so compare sorted
        found.sort();
        assert_eq!(found, urls(&["a/found.pdf", "a/found.zip"]));
    }

    #[tokio::test]
    async fn test_non_matching_urls_cost_no_verification() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_verify = Arc::clone(&calls);
        let verify = move |_url: String| {
            let calls = Arc::clone(&calls_in_verify);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        };

        let found = run_scan(
            urls(&["a.pdf", "b.html", "c.jpg", "d.PDF"]),
            &set(&[".pdf"]),
            4,
            verify,
        )
        .await;

        // Only the two .pdf URLs (case-insensitive) reached the verifier
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_no_filter_sentinel_verifies_everything() {
        let verify = |_url: String| async move { true };

        let found = run_scan(
            urls(&["plain", "no-extension", ""]),
            &set(&[""]),
            2,
            verify,
        )
        .await;

        assert_eq!(found.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_fifty_concurrent_appends_lose_nothing() {
        // Classic lost-update regression: 50 tasks succeed at once and
        // every single URL must land in the found set
        let input: Vec<String> = (0..50).map(|i| format!("site/file-{}.pdf", i)).collect();
        let verify = |_url: String| async move {
            // A tiny yield makes the tasks genuinely overlap
            tokio::task::yield_now().await;
            true
        };

        let found = run_scan(input.clone(), &set(&[".pdf"]), 50, verify).await;

        assert_eq!(found.len(), 50);
        let mut sorted = found;
        sorted.sort();
        let mut expected = input;
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[tokio::test]
    async fn test_failures_do_not_cancel_other_urls() {
        // Half the URLs "fail" (verify false); the rest must still land
        let verify = |url: String| async move { !url.contains("bad") };

        let mut found = run_scan(
            urls(&["good-1.pdf", "bad-1.pdf", "good-2.pdf", "bad-2.pdf"]),
            &set(&[".pdf"]),
            2,
            verify,
        )
        .await;

        found.sort();
        assert_eq!(found, urls(&["good-1.pdf", "good-2.pdf"]));
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_set() {
        let verify = |_url: String| async move { true };
        let found = run_scan(Vec::new(), &set(&[".pdf"]), 10, verify).await;
        assert!(found.is_empty());
    }
}
