//! Writer trait and the multi-writer fan-out (spec.md §4.3).

pub mod buffered;
pub mod file;

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Default cap on the number of writers a logger may hold (spec.md §5).
pub const DEFAULT_MAX_WRITER_COUNT: usize = 100;

/// A byte sink a `Logger` can fan formatted records out to. Grounded on the
/// teacher's `Box<dyn Write + Send>` writer handles (`config/state.rs`,
/// `backend/file.rs`), generalized into a named trait so `MultiWriter` can
/// hold many of them and identify duplicates/removals by name.
pub trait LogWriter: Send + Sync {
    /// Unique identity used for duplicate detection and `RemoveWriter`.
    fn id(&self) -> &str;
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
    /// Idempotent close. Process-standard streams (stdout/stderr) should
    /// override this to a no-op — they are never closed (spec.md §3
    /// Lifecycle).
    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Wraps any `io::Write + Send + Sync` type as a named [`LogWriter`]. Used
/// for stdout/stderr/in-memory buffers (test sinks).
pub struct SimpleWriter<W> {
    id: String,
    inner: Mutex<W>,
    closeable: bool,
}

impl<W: io::Write + Send + Sync> SimpleWriter<W> {
    pub fn new(id: impl Into<String>, inner: W, closeable: bool) -> SimpleWriter<W> {
        SimpleWriter { id: id.into(), inner: Mutex::new(inner), closeable }
    }
}

impl<W: io::Write + Send + Sync> LogWriter for SimpleWriter<W> {
    fn id(&self) -> &str {
        &self.id
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }

    fn close(&self) -> io::Result<()> {
        if self.closeable {
            self.inner.lock().flush()
        } else {
            Ok(())
        }
    }
}

/// Error aggregating the per-sink failures of a fan-out write (spec.md
/// §4.3).
#[derive(Debug)]
pub struct FanOutError {
    pub failed: Vec<(String, io::Error)>,
}

impl std::fmt::Display for FanOutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fan-out write failed for sinks: ")?;
        for (i, (id, err)) in self.failed.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FanOutError {}

/// Result of a fan-out write: bytes considered written plus an optional
/// aggregated error enumerating failed sinks (spec.md §4.3).
pub struct FanOutResult {
    pub bytes_written: usize,
    pub error: Option<FanOutError>,
}

/// Atomic fan-out over an immutable sequence of writers. Mutation
/// (`add`/`remove`) rebuilds the slice under a mutex and publishes a new
/// `Arc` via `ArcSwap`; readers perform a single lock-free load per call —
/// the generalization of the teacher's single-slot `Arc<Mutex<Box<dyn Write
/// + Send>>>` handle (it had no fan-out of its own) into the
/// `flexi_logger`-style `MultiWriter` shape.
pub struct MultiWriter {
    writers: ArcSwap<Vec<Arc<dyn LogWriter>>>,
    publish_lock: Mutex<()>,
    max_writers: AtomicUsize,
}

impl MultiWriter {
    pub fn new(max_writers: usize) -> MultiWriter {
        MultiWriter {
            writers: ArcSwap::from_pointee(Vec::new()),
            publish_lock: Mutex::new(()),
            max_writers: AtomicUsize::new(max_writers),
        }
    }

    pub fn count(&self) -> usize {
        self.writers.load().len()
    }

    pub fn max_writers(&self) -> usize {
        self.max_writers.load(AtomicOrdering::Relaxed)
    }

    /// Replace the writer cap, e.g. from `SetSecurityConfig`. Does not evict
    /// writers already present even if the new cap is lower than the current
    /// count; it only governs future `add` calls.
    pub fn set_max_writers(&self, max_writers: usize) {
        self.max_writers.store(max_writers, AtomicOrdering::Relaxed);
    }

    /// Add a writer. Duplicate ids are a no-op; exceeding `max_writers`
    /// returns `MaxWritersExceeded`.
    pub fn add(&self, writer: Arc<dyn LogWriter>) -> Result<()> {
        let _guard = self.publish_lock.lock();
        let current = self.writers.load();
        if current.iter().any(|w| w.id() == writer.id()) {
            return Ok(());
        }
        let cap = self.max_writers();
        if current.len() >= cap {
            return Err(Error::MaxWritersExceeded { cap });
        }
        let mut next: Vec<Arc<dyn LogWriter>> = current.as_ref().clone();
        next.push(writer);
        self.writers.store(Arc::new(next));
        Ok(())
    }

    /// Remove a writer by id. Returns `WriterNotFound` if absent.
    pub fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.publish_lock.lock();
        let current = self.writers.load();
        if !current.iter().any(|w| w.id() == id) {
            return Err(Error::WriterNotFound);
        }
        let next: Vec<Arc<dyn LogWriter>> =
            current.iter().filter(|w| w.id() != id).cloned().collect();
        self.writers.store(Arc::new(next));
        Ok(())
    }

    /// Write `buf` to every sink. Zero sinks is a no-op success; one sink is
    /// a direct pass-through; many sinks aggregate per-sink errors. Short
    /// writes are treated as errors for that sink.
    pub fn write(&self, buf: &[u8]) -> FanOutResult {
        let writers = self.writers.load();
        if writers.is_empty() {
            return FanOutResult { bytes_written: buf.len(), error: None };
        }
        if writers.len() == 1 {
            return match writers[0].write(buf) {
                Ok(n) if n == buf.len() => FanOutResult { bytes_written: n, error: None },
                Ok(n) => FanOutResult {
                    bytes_written: 0,
                    error: Some(FanOutError {
                        failed: vec![(
                            writers[0].id().to_string(),
                            io::Error::new(io::ErrorKind::WriteZero, format!("short write: {n}/{}", buf.len())),
                        )],
                    }),
                },
                Err(e) => FanOutResult {
                    bytes_written: 0,
                    error: Some(FanOutError { failed: vec![(writers[0].id().to_string(), e)] }),
                },
            };
        }

        let mut failed = Vec::new();
        let mut any_success = false;
        for writer in writers.iter() {
            match writer.write(buf) {
                Ok(n) if n == buf.len() => any_success = true,
                Ok(n) => failed.push((
                    writer.id().to_string(),
                    io::Error::new(io::ErrorKind::WriteZero, format!("short write: {n}/{}", buf.len())),
                )),
                Err(e) => failed.push((writer.id().to_string(), e)),
            }
        }

        let error = if failed.is_empty() { None } else { Some(FanOutError { failed }) };
        FanOutResult { bytes_written: if any_success { buf.len() } else { 0 }, error }
    }

    /// Flush every sink that supports it, aggregating errors the same way
    /// as `write`.
    pub fn flush(&self) -> Option<FanOutError> {
        let writers = self.writers.load();
        let failed: Vec<_> = writers
            .iter()
            .filter_map(|w| w.flush().err().map(|e| (w.id().to_string(), e)))
            .collect();
        if failed.is_empty() {
            None
        } else {
            Some(FanOutError { failed })
        }
    }

    /// Close every owned writer, idempotently, aggregating errors.
    pub fn close_all(&self) -> Option<FanOutError> {
        let writers = self.writers.load();
        let failed: Vec<_> = writers
            .iter()
            .filter_map(|w| w.close().err().map(|e| (w.id().to_string(), e)))
            .collect();
        if failed.is_empty() {
            None
        } else {
            Some(FanOutError { failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct VecWriter {
        id: String,
        buf: StdMutex<Vec<u8>>,
    }

    impl LogWriter for VecWriter {
        fn id(&self) -> &str {
            &self.id
        }
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            self.buf.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn zero_sinks_is_noop_success() {
        let mw = MultiWriter::new(DEFAULT_MAX_WRITER_COUNT);
        let result = mw.write(b"hello");
        assert_eq!(result.bytes_written, 5);
        assert!(result.error.is_none());
    }

    #[test]
    fn single_sink_fast_path() {
        let mw = MultiWriter::new(DEFAULT_MAX_WRITER_COUNT);
        mw.add(Arc::new(VecWriter { id: "a".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        let result = mw.write(b"hi");
        assert_eq!(result.bytes_written, 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn duplicate_add_is_noop() {
        let mw = MultiWriter::new(DEFAULT_MAX_WRITER_COUNT);
        let w = Arc::new(VecWriter { id: "a".into(), buf: StdMutex::new(Vec::new()) });
        mw.add(w.clone()).unwrap();
        mw.add(w).unwrap();
        assert_eq!(mw.count(), 1);
    }

    #[test]
    fn remove_missing_writer_errors() {
        let mw = MultiWriter::new(DEFAULT_MAX_WRITER_COUNT);
        assert_eq!(mw.remove("missing"), Err(Error::WriterNotFound));
    }

    #[test]
    fn writer_cap_is_enforced() {
        let mw = MultiWriter::new(1);
        mw.add(Arc::new(VecWriter { id: "a".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        let err = mw.add(Arc::new(VecWriter { id: "b".into(), buf: StdMutex::new(Vec::new()) }));
        assert_eq!(err, Err(Error::MaxWritersExceeded { cap: 1 }));
    }

    #[test]
    fn set_max_writers_governs_future_adds_only() {
        let mw = MultiWriter::new(1);
        mw.add(Arc::new(VecWriter { id: "a".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        mw.set_max_writers(2);
        mw.add(Arc::new(VecWriter { id: "b".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        assert_eq!(mw.count(), 2);
    }

    #[test]
    fn many_sinks_succeed_if_any_succeeds() {
        let mw = MultiWriter::new(DEFAULT_MAX_WRITER_COUNT);
        mw.add(Arc::new(VecWriter { id: "a".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        mw.add(Arc::new(VecWriter { id: "b".into(), buf: StdMutex::new(Vec::new()) })).unwrap();
        let result = mw.write(b"data");
        assert_eq!(result.bytes_written, 4);
        assert!(result.error.is_none());
    }
}
