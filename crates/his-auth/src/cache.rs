//! Memo of the last successful remote session validation.
//!
//! Only a positive result is ever stored, together with the token it was
//! observed for. A lookup for any other token, or after the window has
//! elapsed, is a miss.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required a remote call.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug)]
struct CachedValidation {
    token: String,
    validated_at: Instant,
}

#[derive(Debug)]
pub struct ValidationCache {
    window: Duration,
    entry: Option<CachedValidation>,
    stats: CacheStats,
}

impl ValidationCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entry: None,
            stats: CacheStats::default(),
        }
    }

    /// Returns true if `token` was validated less than one window ago.
    pub fn is_fresh(&mut self, token: &str) -> bool {
        let fresh = self
            .entry
            .as_ref()
            .is_some_and(|e| e.token == token && e.validated_at.elapsed() < self.window);
        if fresh {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        fresh
    }

    /// Stores a positive validation observed just now.
    pub fn record_valid(&mut self, token: &str) {
        self.entry = Some(CachedValidation {
            token: token.to_owned(),
            validated_at: Instant::now(),
        });
    }

    /// Forgets the stored validation.
    pub fn reset(&mut self) {
        self.entry = None;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
