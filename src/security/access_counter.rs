//! Per-IP hit counting with bounded memory.
//!
//! Hits accumulate in a window that is discarded wholesale once it is older
//! than the TTL. The reset is checked on each [`AccessCounter::log_access`]
//! rather than by a background timer. The live window is swapped atomically,
//! so readers never block writers and there is no global lock.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

const MILLIS_PER_MINUTE: u64 = 60_000;

struct Window {
    started: Instant,
    /// Milliseconds from `started` to the latest hit, plus one; 0 means no hit yet.
    last_added_ms: AtomicU64,
    hits: DashMap<IpAddr, u32>,
}

impl Window {
    fn new(started: Instant) -> Self {
        Self {
            started,
            last_added_ms: AtomicU64::new(0),
            hits: DashMap::new(),
        }
    }

    fn add(&self, ip: IpAddr, now: Instant) {
        {
            let mut hits = self.hits.entry(ip).or_insert(0);
            *hits = hits.saturating_add(1);
        }
        let elapsed = now.saturating_duration_since(self.started).as_millis() as u64;
        self.last_added_ms
            .fetch_max(elapsed.saturating_add(1), Ordering::Relaxed);
    }

    fn rate(&self, ip: IpAddr) -> u32 {
        let last_added = self.last_added_ms.load(Ordering::Relaxed);
        if last_added == 0 {
            return 0;
        }

        let Some(hits) = self.hits.get(&ip).map(|h| *h) else {
            return 0;
        };

        let minutes = ((last_added - 1) / MILLIS_PER_MINUTE).max(1);
        (u64::from(hits) / minutes) as u32
    }
}

pub struct AccessCounter {
    window: ArcSwap<Window>,
    ttl: Duration,
}

impl AccessCounter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            window: ArcSwap::from_pointee(Window::new(Instant::now())),
            ttl,
        }
    }

    /// Records one hit for `ip`, resetting the table first if it has expired.
    pub fn log_access(&self, ip: IpAddr) {
        let now = Instant::now();
        self.window_for(now).add(ip, now);
    }

    /// Approximate requests per minute for `ip` since the table was last reset.
    ///
    /// Returns 0 when `ip` has no hits in the current table.
    pub fn hits_per_minute(&self, ip: IpAddr) -> u32 {
        self.window.load().rate(ip)
    }

    /// Records a hit and returns the resulting rate, both against the same
    /// table even if another task resets it in between.
    pub fn hit(&self, ip: IpAddr) -> u32 {
        let now = Instant::now();
        let window = self.window_for(now);
        window.add(ip, now);
        window.rate(ip)
    }

    /// Discards the table once it is older than the TTL.
    pub fn check_recycle(&self) {
        self.window_for(Instant::now());
    }

    /// Number of distinct addresses in the current table.
    pub fn tracked(&self) -> usize {
        self.window.load().hits.len()
    }

    fn window_for(&self, now: Instant) -> Arc<Window> {
        let current = self.window.load_full();
        if now.saturating_duration_since(current.started) <= self.ttl {
            return current;
        }

        let fresh = Arc::new(Window::new(now));
        let previous = self.window.compare_and_swap(&current, Arc::clone(&fresh));
        if Arc::ptr_eq(&*previous, &current) {
            tracing::debug!(
                discarded = current.hits.len(),
                "Access counter table recycled"
            );
            fresh
        } else {
            // Another task recycled first.
            self.window.load_full()
        }
    }
}

impl Default for AccessCounter {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
