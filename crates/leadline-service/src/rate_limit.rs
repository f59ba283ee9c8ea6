//! Fixed-window rate limiting for mutation actions. Windows are keyed by
//! (action, client identity) in a process-wide concurrent map; nothing
//! survives a restart. Expired windows reset lazily on next access, and a
//! periodic sweep drops stale keys so the map stays bounded under many
//! distinct clients.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use leadline_core::errors::ActionError;

/// Client identity when no forwarded-address header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The 11th request within one window fails with the seconds left until
/// the window resets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub retry_after_secs: u64,
}

impl From<RateLimitExceeded> for ActionError {
    fn from(e: RateLimitExceeded) -> Self {
        ActionError::RateLimited { retry_after_secs: e.retry_after_secs }
    }
}

struct Window {
    count: u32,
    reset_at: Instant,
}

pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
    capacity: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self { windows: DashMap::new(), window, capacity }
    }

    /// Count one request against the (action, client) window.
    pub fn enforce(&self, action: &str, client_key: &str) -> Result<(), RateLimitExceeded> {
        let key = format!("{action}:{client_key}");
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key)
            .or_insert_with(|| Window { count: 0, reset_at: now + self.window });

        if now >= entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return Ok(());
        }
        if entry.count >= self.capacity {
            let remaining = entry.reset_at.duration_since(now);
            return Err(RateLimitExceeded {
                retry_after_secs: (remaining.as_millis() as u64).div_ceil(1000),
            });
        }
        entry.count += 1;
        Ok(())
    }

    /// Drop windows whose reset instant has passed. Never changes what
    /// `enforce` would decide; it only bounds the map.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, w| w.reset_at > now);
        before - self.windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Periodically sweep expired rate-limit windows.
pub fn start_sweep_task(
    limiter: Arc<RateLimiter>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_expired();
            if removed > 0 {
                debug!(removed, "expired rate-limit windows swept");
            }
        }
    })
}

/// Client identity from a forwarded-address header: the first
/// comma-separated entry, or `"unknown"` when absent or blank.
pub fn client_key(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
