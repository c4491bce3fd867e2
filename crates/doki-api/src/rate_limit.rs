//! Fixed-window request limiter applied as axum middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Allows up to `max_per_sec` requests in each wall-clock second.
/// A limit of zero disables limiting.
///
/// The window (low 32 bits of the epoch second) and the count share one
/// atomic word, so a window reset and an increment can never interleave.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    /// `window << 32 | count`
    state: Arc<AtomicU64>,
}

const COUNT_MASK: u64 = 0xFFFF_FFFF;

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            state: Arc::new(AtomicU64::new(0)),
        }
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Take a permit for the window starting at `now`.
    fn try_acquire_at(&self, now: u64) -> bool {
        if self.max_per_sec == 0 {
            return true;
        }

        let limit = self.max_per_sec.min(COUNT_MASK);
        let window = now & COUNT_MASK;
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let next = if current >> 32 != window {
                (window << 32) | 1
            } else if current & COUNT_MASK < limit {
                current + 1
            } else {
                return false;
            };

            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Self::now_secs())
    }
}

pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        ApiError::TooManyRequests.into_response()
    }
}
