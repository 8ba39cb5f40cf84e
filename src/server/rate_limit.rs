//! Per-client fixed-window request counter.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Expired windows are swept once this many clients are tracked.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// At most `max` requests per client in each `window`, counted from the
/// client's first request in that window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max: max.max(1),
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request from `client` at `now`.
    pub fn check(&self, client: IpAddr, now: Instant) -> Decision {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if clients.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max {
            let retry_after = self.window.saturating_sub(now.saturating_duration_since(entry.started));
            // Round up so clients never retry a fraction of a second early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            return Decision::Limited {
                retry_after: Duration::from_secs(secs.max(1)),
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max - entry.count,
        }
    }

    /// Clients currently tracked.
    pub fn tracked(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
