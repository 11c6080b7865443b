use std::future::Future;
use std::time::Duration;

use crate::utils::{log_cloudflare_event, ExportError, ExportResult};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Run `attempt` until it yields a value that `accept` approves.
///
/// `attempt` is called up to `policy.max_attempts` times, with `policy.delay`
/// between calls but not after the last one. Every failed attempt is logged
/// under `operation`. When all attempts fail, the last error is returned; an
/// `Ok` value rejected by `accept` surfaces as [`ExportError::Rejected`].
pub async fn retry<T, F, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
    accept: P,
) -> ExportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ExportResult<T>>,
    P: Fn(&T) -> bool,
{
    let mut last_error = None;

    for n in 1..=policy.max_attempts {
        match attempt().await {
            Ok(value) if accept(&value) => return Ok(value),
            Ok(_) => {
                log_cloudflare_event(
                    operation,
                    false,
                    Some(&format!("attempt {}/{} rejected", n, policy.max_attempts)),
                );
                last_error = Some(ExportError::Rejected(operation.to_string()));
            }
            Err(e) => {
                log_cloudflare_event(
                    operation,
                    false,
                    Some(&format!("attempt {}/{} failed: {}", n, policy.max_attempts, e)),
                );
                last_error = Some(e);
            }
        }

        if n < policy.max_attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| ExportError::Rejected(operation.to_string())))
}
