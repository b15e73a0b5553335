//! Process-wide default logger (spec.md §4.1 "Global default logger").
//!
//! No teacher equivalent by this shape — the teacher's `PyLogger` was itself
//! the process-wide singleton a Python module bound to. Here the singleton
//! is opt-in: most callers construct and own a `Logger` directly, but
//! library code that wants a drop-in ambient logger can reach for
//! `default_logger()`, following the same lazy-`ArcSwap`-behind-`OnceCell`
//! shape already used for `filter`/`extractors`/`hooks` inside `Logger`
//! itself.

use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use crate::config::Config;
use crate::logger::Logger;

static DEFAULT_LOGGER: Lazy<ArcSwap<Logger>> = Lazy::new(|| {
    let logger = Logger::create(Config::default()).expect("default Config always validates");
    ArcSwap::from_pointee(logger)
});

/// The process-wide default logger, lazily created from [`Config::default`]
/// on first access.
pub fn default_logger() -> Arc<Logger> {
    DEFAULT_LOGGER.load_full()
}

/// Replace the process-wide default logger. Does not close the previous
/// one; callers that need a clean handoff should `close()` the old `Arc`
/// themselves once they are sure no other holder is still using it.
pub fn set_default_logger(logger: Arc<Logger>) {
    DEFAULT_LOGGER.store(logger);
}
