use crate::error::{ConversationError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Exponential backoff delay before retry attempt `attempt` (0-indexed:
/// the wait before the *second* HTTP call is `attempt == 0`).
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.pow(attempt)
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Sleep for `delay`, returning `Cancelled` if `cancellation` fires first.
pub async fn sleep_or_cancel(delay: Duration, cancellation: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = cancellation.cancelled() => Err(ConversationError::Cancelled),
    }
}
