//! Deterministic keep-initial-then-every-N sampler (spec.md §4.7).
//!
//! No teacher equivalent — `LoggerState` carried an unused
//! `sample_rate: Option<f64>` field and nothing read it. Built fresh,
//! following the same "plain struct behind `ArcSwap`, atomics for the
//! mutable counters" shape as the rest of the replaceable logger state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::level::Level;

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    pub enabled: bool,
    pub initial: u64,
    pub thereafter: u64,
    pub tick: Duration,
}

impl Default for SamplingConfig {
    fn default() -> SamplingConfig {
        SamplingConfig { enabled: false, initial: 0, thereafter: 0, tick: Duration::from_secs(1) }
    }
}

struct StreamCounter {
    tick_start: Instant,
    seen: u64,
}

/// Per-(level, call-site-digest) counters, keyed the way spec.md §4.7
/// describes ("keyed by level and (optionally) by call-site message
/// digest"). A new tick window resets counters for that key.
pub struct SamplerState {
    config: SamplingConfig,
    counters: Mutex<AHashMap<(Level, u64), StreamCounter>>,
    total_seen: AtomicU64,
    total_emitted: AtomicU64,
}

impl SamplerState {
    pub fn new(config: SamplingConfig) -> SamplerState {
        SamplerState {
            config,
            counters: Mutex::new(AHashMap::new()),
            total_seen: AtomicU64::new(0),
            total_emitted: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Decide whether a record at `level` with call-site digest `site`
    /// should be emitted.
    pub fn should_emit(&self, level: Level, site: u64) -> bool {
        self.total_seen.fetch_add(1, Ordering::Relaxed);
        if !self.config.enabled {
            self.total_emitted.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        let mut counters = self.counters.lock();
        let now = Instant::now();
        let entry = counters
            .entry((level, site))
            .or_insert_with(|| StreamCounter { tick_start: now, seen: 0 });

        if now.duration_since(entry.tick_start) >= self.config.tick {
            entry.tick_start = now;
            entry.seen = 0;
        }

        entry.seen += 1;
        let emit = if entry.seen <= self.config.initial {
            true
        } else if self.config.thereafter == 0 {
            false
        } else {
            (entry.seen - self.config.initial) % self.config.thereafter == 0
        };

        if emit {
            self.total_emitted.fetch_add(1, Ordering::Relaxed);
        }
        emit
    }
}

/// A stable digest of a call-site message, used as the sampler's secondary
/// key. Plain FNV-style fold; does not need to be cryptographic.
pub fn site_digest(message: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in message.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
