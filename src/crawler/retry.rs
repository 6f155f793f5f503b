//! Bounded retries for network operations
//!
//! Attempts run back to back with no delay. The failures worth retrying here
//! come from flaky servers and auth gateways, not from congestion.

use std::fmt::Display;
use std::future::Future;

/// Runs `operation` until it succeeds or `max_attempts` attempts have failed
///
/// The operation receives the zero-based attempt number. When every attempt
/// fails, the error of the final attempt is returned. A budget of zero is
/// treated as one attempt.
///
/// # Example
///
/// ```
/// use sturdywcdl::crawler::retry;
///
/// # #[tokio::main]
/// # async fn main() {
/// let result: Result<u32, String> = retry(|attempt| async move {
///     if attempt < 2 { Err(format!("attempt {} failed", attempt)) } else { Ok(7) }
/// }, 10).await;
/// assert_eq!(result, Ok(7));
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(mut operation: F, max_attempts: usize) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                tracing::debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                if attempt >= attempts {
                    return Err(e);
                }
            }
        }
    }
}
