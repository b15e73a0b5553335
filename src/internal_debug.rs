//! Opt-in internal debug trace (SPEC_FULL.md §2 "Ambient internal
//! diagnostics"), grounded on the teacher's `utils::debug` module. Logs the
//! logger's own lifecycle events — a sink added, a rotation firing, a
//! filter timing out — to stderr or a side file. Diagnostic-only: never
//! touches the record pipeline and is always a no-op unless explicitly
//! enabled.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;

static ENABLED: AtomicBool = AtomicBool::new(false);
static SINK: OnceLock<Mutex<Box<dyn Write + Send>>> = OnceLock::new();

/// Enable internal tracing to stderr.
pub fn enable() {
    ENABLED.store(true, Ordering::Release);
}

/// Enable internal tracing to a caller-supplied sink (e.g. a side file)
/// instead of stderr.
pub fn enable_to(sink: Box<dyn Write + Send>) {
    let _ = SINK.set(Mutex::new(sink));
    ENABLED.store(true, Ordering::Release);
}

pub fn disable() {
    ENABLED.store(false, Ordering::Release);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
}

/// Emit one trace line if tracing is enabled. Cheap no-op check on the
/// common (disabled) path; never panics even if the sink write fails.
pub fn trace(event: &str, detail: &str) {
    if !is_enabled() {
        return;
    }
    let line = format!("corelog[internal]: {event}: {detail}\n");
    match SINK.get() {
        Some(sink) => {
            let _ = sink.lock().write_all(line.as_bytes());
        }
        None => {
            let _ = std::io::stderr().write_all(line.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Default)]
    struct CapturingSink(std::sync::Arc<StdMutex<Vec<u8>>>);

    impl Write for CapturingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn disabled_by_default() {
        assert!(!is_enabled());
    }

    #[test]
    fn toggle_round_trips() {
        enable();
        assert!(is_enabled());
        disable();
        assert!(!is_enabled());
    }
}
