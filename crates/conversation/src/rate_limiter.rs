use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Hand-rolled token bucket. Summarizer calls go out to a real LLM provider
/// and are rare enough, and the policy simple enough, that a dependency
/// isn't worth pulling in for it.
pub struct TokenBucket {
    state: Mutex<State>,
    capacity: f64,
    refill_per_sec: f64,
}

struct State {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `refill_per_sec` tokens trickle in per second, up to `capacity`
    /// tokens banked. Starts full.
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            state: Mutex::new(State {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_per_sec,
        }
    }

    /// Default policy: burst of 5, sustained ~0.83 req/s (roughly one
    /// request every 1.2 seconds).
    pub fn default_policy() -> Self {
        Self::new(5.0, 0.83)
    }

    fn refill(&self, state: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    /// Blocks until one token is available, then consumes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64(deficit / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_capacity_is_available_immediately() {
        let bucket = TokenBucket::new(3.0, 1.0);
        for _ in 0..3 {
            tokio::time::timeout(Duration::from_millis(10), bucket.acquire())
                .await
                .expect("burst tokens should not block");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_bucket_waits_for_refill() {
        let bucket = TokenBucket::new(1.0, 1.0);
        bucket.acquire().await;

        let acquire = tokio::spawn(async move {
            bucket.acquire().await;
        });
        tokio::time::sleep(Duration::from_millis(1100)).await;
        acquire.await.unwrap();
    }
}
