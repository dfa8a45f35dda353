use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Retries a fallible async operation with linear back-off.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// No retries, no waiting.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let wait = self.backoff * attempt;
                    log::warn!(
                        "{} failed (attempt {}/{}): {:#}; retrying in {:?}",
                        label,
                        attempt,
                        self.max_retries + 1,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    return Err(e.context(format!("{} failed after {} attempts", label, attempt + 1)))
                }
            }
        }
    }
}
