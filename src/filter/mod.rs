//! The sensitive-data filter (spec.md §4.2): pattern set, field-key
//! classifier, ReDoS protections, recursive value walker, tiered execution
//! under bounded concurrency and per-regex timeouts.

mod key;
mod patterns;
mod semaphore;
mod walker;

pub use patterns::{check_pattern_safety, Pattern, PatternSet};
pub use walker::walk_and_redact;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde_json::Value as Json;

use crate::field::Value;
use semaphore::Semaphore;

pub const DEFAULT_INPUT_LENGTH_CAP: usize = 256 * 1024;
pub const DEFAULT_REGEX_TIMEOUT: Duration = Duration::from_millis(50);
pub const DEFAULT_CUSTOM_ONLY_TIMEOUT: Duration = Duration::from_millis(10);
const FAST_PATH_THRESHOLD: usize = 100;
const CHUNK_SIZE: usize = 4096;
const TRUNCATION_MARKER: &str = "... [TRUNCATED FOR SECURITY]";

/// Configuration for a [`Filter`] instance, mirroring the `security.*`
/// options in spec.md §6.
#[derive(Clone)]
pub struct FilterConfig {
    pub enabled: bool,
    pub input_length_cap: usize,
    pub regex_timeout: Duration,
    pub semaphore_capacity: usize,
}

impl Default for FilterConfig {
    /// Built-in filter enabled with the basic catalog by default (spec.md §9
    /// Open Questions — see DESIGN.md for the chosen default).
    fn default() -> FilterConfig {
        FilterConfig {
            enabled: true,
            input_length_cap: DEFAULT_INPUT_LENGTH_CAP,
            regex_timeout: DEFAULT_REGEX_TIMEOUT,
            semaphore_capacity: 8,
        }
    }
}

/// Point-in-time snapshot of filter counters (spec.md §4.2 "Observable
/// metrics").
#[derive(Debug, Clone, Copy)]
pub struct FilterMetrics {
    pub total_filtered: u64,
    pub total_redactions: u64,
    pub pattern_count: usize,
    pub active_workers: usize,
    pub enabled: bool,
}

/// The sensitive-data filter. Cheap to clone (everything behind `Arc`); one
/// instance is owned per `Logger` and addressed through
/// `ArcSwap<PatternSet>` so patterns can be swapped atomically at runtime.
pub struct Filter {
    config: FilterConfig,
    patterns: ArcSwap<PatternSet>,
    semaphore: Semaphore,
    total_filtered: AtomicU64,
    total_redactions: AtomicU64,
    active_workers: AtomicUsize,
}

impl Filter {
    pub fn new(config: FilterConfig, patterns: PatternSet) -> Filter {
        let semaphore = Semaphore::new(config.semaphore_capacity);
        Filter {
            config,
            patterns: ArcSwap::from_pointee(patterns),
            semaphore,
            total_filtered: AtomicU64::new(0),
            total_redactions: AtomicU64::new(0),
            active_workers: AtomicUsize::new(0),
        }
    }

    pub fn disabled() -> Filter {
        Filter::new(
            FilterConfig { enabled: false, ..FilterConfig::default() },
            PatternSet::empty(),
        )
    }

    /// Replace the active pattern set atomically.
    pub fn set_patterns(&self, patterns: PatternSet) {
        self.patterns.store(Arc::new(patterns));
    }

    pub fn metrics(&self) -> FilterMetrics {
        FilterMetrics {
            total_filtered: self.total_filtered.load(Ordering::Relaxed),
            total_redactions: self.total_redactions.load(Ordering::Relaxed),
            pattern_count: self.patterns.load().len(),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            enabled: self.config.enabled,
        }
    }

    /// Redact sensitive substrings in a free-form message.
    pub fn filter_message(&self, input: &str) -> String {
        if !self.config.enabled {
            return input.to_string();
        }
        self.total_filtered.fetch_add(1, Ordering::Relaxed);

        let (truncated, was_truncated) = cap_input(input, self.config.input_length_cap);
        let patterns = self.patterns.load_full();
        if patterns.is_empty() {
            return truncated;
        }

        let result = if truncated.len() < FAST_PATH_THRESHOLD {
            self.run_sync(&truncated, &patterns)
        } else if truncated.len() < FAST_PATH_THRESHOLD * 10 {
            self.run_chunked(&truncated, &patterns)
        } else {
            self.run_on_worker(&truncated, &patterns)
        };

        if was_truncated || result != truncated {
            self.total_redactions.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Redact a typed field value: strings and debug-rendered values run
    /// through the message filter; a pre-built JSON value (e.g. from a
    /// structured field) runs through the recursive walker; other scalar
    /// types pass through unfiltered since they cannot carry a regex match.
    pub fn filter_value(&self, key: &str, value: &Value) -> Value {
        if !self.config.enabled {
            return value.clone();
        }
        if key::is_sensitive_key(key) {
            self.total_redactions.fetch_add(1, Ordering::Relaxed);
            return Value::Str("[REDACTED]".to_string());
        }
        match value {
            Value::Str(s) => Value::Str(self.filter_message(s)),
            Value::Debug(s) => Value::Debug(self.filter_message(s)),
            other => other.clone(),
        }
    }

    /// Redact a structured JSON payload via the recursive walker.
    pub fn filter_json(&self, value: &Json) -> Json {
        if !self.config.enabled {
            return value.clone();
        }
        let patterns = self.patterns.load_full();
        walker::walk_and_redact(value, &patterns, walker::DEFAULT_MAX_RECURSION_DEPTH)
    }

    fn run_sync(&self, input: &str, patterns: &PatternSet) -> String {
        redact_string(input, patterns)
    }

    fn run_chunked(&self, input: &str, patterns: &PatternSet) -> String {
        let bytes = input.as_bytes();
        let mut joined = String::with_capacity(input.len());
        for chunk in bytes.chunks(CHUNK_SIZE) {
            joined.push_str(&String::from_utf8_lossy(chunk));
        }
        // Final pass over the joined result catches cross-boundary matches.
        redact_string(&joined, patterns)
    }

    fn run_on_worker(&self, input: &str, patterns: &PatternSet) -> String {
        let timeout = self.config.regex_timeout / 2;
        let Some(_permit) = self.semaphore.acquire_timeout(timeout) else {
            return "[REDACTED]".to_string();
        };
        self.active_workers.fetch_add(1, Ordering::Relaxed);
        let _guard = scopeguard(|| {
            self.active_workers.fetch_sub(1, Ordering::Relaxed);
        });

        let deadline = Instant::now() + self.config.regex_timeout;
        let owned = input.to_string();
        let pattern_ptr = patterns;
        let outcome = catch_unwind(AssertUnwindSafe(|| redact_string(&owned, pattern_ptr)));
        match outcome {
            Ok(result) if Instant::now() <= deadline => result,
            _ => "[REDACTED]".to_string(),
        }
    }
}

/// Cap `input` at `cap` bytes (on a char boundary), returning the possibly
/// truncated string and whether truncation occurred.
fn cap_input(input: &str, cap: usize) -> (String, bool) {
    if input.len() <= cap {
        return (input.to_string(), false);
    }
    let mut cut = cap;
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = input[..cut].to_string();
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}

/// Apply every pattern in `patterns` to `input` in sequence.
pub(crate) fn redact_string(input: &str, patterns: &PatternSet) -> String {
    let mut current = input.to_string();
    for pattern in &patterns.patterns {
        let replaced = pattern.redact(&current);
        if let std::borrow::Cow::Owned(s) = replaced {
            current = s;
        }
    }
    current
}

/// Minimal scope-exit guard, avoiding a dependency on `scopeguard` for a
/// single use site.
fn scopeguard<F: FnMut()>(f: F) -> impl Drop {
    struct Guard<F: FnMut()>(F);
    impl<F: FnMut()> Drop for Guard<F> {
        fn drop(&mut self) {
            (self.0)();
        }
    }
    Guard(f)
}
