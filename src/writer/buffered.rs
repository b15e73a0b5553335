//! Size/time-triggered buffered writer (spec.md §4.4).
//!
//! Grounded on the teacher's `backend/async.rs`
//! (`start_async_writer_if_needed`, `flush_buffer`): a background thread
//! drains queued writes on a `crossbeam_channel` with both a size trigger
//! and a periodic timeout-driven flush. The teacher wired this to one
//! process-global file writer; here it is generalized into a reusable
//! `BufferedWriter<W>` any sink can be wrapped in.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::writer::LogWriter;

pub const MIN_BUFFER_SIZE: usize = 1024;
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_AUTO_FLUSH_DIVISOR: usize = 2;
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

enum Msg {
    Activity,
    Shutdown,
}

/// Wraps `inner` with a fixed-size buffer, a synchronous size-triggered
/// flush, and a background deadline-triggered flush.
pub struct BufferedWriter {
    id: String,
    inner: Arc<dyn LogWriter>,
    buffer: Mutex<Vec<u8>>,
    buffer_size: usize,
    flush_threshold: usize,
    closed: AtomicBool,
    sender: Sender<Msg>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BufferedWriter {
    pub fn new(inner: Arc<dyn LogWriter>, buffer_size: usize) -> Result<Arc<BufferedWriter>> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&buffer_size) {
            return Err(Error::BufferSizeTooLarge { requested: buffer_size, max: MAX_BUFFER_SIZE });
        }
        let (sender, receiver) = bounded::<Msg>(4096);
        let id = format!("buffered:{}", inner.id());
        let writer = Arc::new(BufferedWriter {
            id,
            inner,
            buffer: Mutex::new(Vec::with_capacity(buffer_size)),
            buffer_size,
            flush_threshold: buffer_size / DEFAULT_AUTO_FLUSH_DIVISOR,
            closed: AtomicBool::new(false),
            sender,
            handle: Mutex::new(None),
        });
        let handle = spawn_flush_task(Arc::downgrade(&writer), receiver);
        *writer.handle.lock() = Some(handle);
        Ok(writer)
    }

    fn flush_locked(&self, buffer: &mut Vec<u8>) -> io::Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.inner.write(buffer)?;
        buffer.clear();
        Ok(())
    }
}

impl LogWriter for BufferedWriter {
    fn id(&self) -> &str {
        &self.id
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock();
        buffer.extend_from_slice(buf);
        if buffer.len() >= self.flush_threshold {
            self.flush_locked(&mut buffer)?;
        } else {
            let _ = self.sender.try_send(Msg::Activity);
        }
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        let mut buffer = self.buffer.lock();
        self.flush_locked(&mut buffer)
    }

    /// Idempotent: cancels the background task, flushes once, closes the
    /// underlying sink.
    fn close(&self) -> io::Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let flush_result = self.flush();
        if let Some(handle) = self.handle.lock().take() {
            let _ = self.sender.send(Msg::Shutdown);
            let _ = handle.join();
        }
        let close_result = self.inner.close();
        flush_result.and(close_result)
    }
}

/// Background deadline-triggered flush (spec.md §4.4): wakes on write
/// activity or every `AutoFlushInterval`, and flushes the writer's own
/// buffer — not just `inner` — once it has sat idle beyond that interval.
/// Holds only a [`Weak`] reference so the writer is never kept alive by its
/// own background thread; `Close` drops the writer out from under it by
/// sending `Shutdown` and joining before the last strong ref could vanish.
fn spawn_flush_task(writer: Weak<BufferedWriter>, receiver: Receiver<Msg>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut last_activity = Instant::now();
        loop {
            match receiver.recv_timeout(DEFAULT_FLUSH_INTERVAL) {
                Ok(Msg::Activity) => {
                    last_activity = Instant::now();
                }
                Ok(Msg::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if last_activity.elapsed() >= DEFAULT_FLUSH_INTERVAL {
                        let Some(writer) = writer.upgrade() else { break };
                        let _ = writer.flush();
                        last_activity = Instant::now();
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SimpleWriter;
    use std::io::Cursor;

    fn fresh_writer() -> (Arc<dyn LogWriter>, Arc<BufferedWriter>) {
        let inner: Arc<dyn LogWriter> = Arc::new(SimpleWriter::new("sink", Cursor::new(Vec::new()), true));
        let buffered = BufferedWriter::new(inner.clone(), MIN_BUFFER_SIZE).unwrap();
        (inner, buffered)
    }

    #[test]
    fn rejects_out_of_range_buffer_sizes() {
        let inner: Arc<dyn LogWriter> = Arc::new(SimpleWriter::new("sink", Cursor::new(Vec::new()), true));
        assert!(BufferedWriter::new(inner.clone(), 10).is_err());
        assert!(BufferedWriter::new(inner, MAX_BUFFER_SIZE + 1).is_err());
    }

    #[test]
    fn explicit_flush_drains_buffer() {
        let (_, buffered) = fresh_writer();
        buffered.write(b"hello").unwrap();
        buffered.flush().unwrap();
        assert!(buffered.buffer.lock().is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let (_, buffered) = fresh_writer();
        buffered.write(b"data").unwrap();
        buffered.close().unwrap();
        buffered.close().unwrap();
    }

    struct SharedVecWriter(Arc<Mutex<Vec<u8>>>);
    impl LogWriter for SharedVecWriter {
        fn id(&self) -> &str {
            "shared"
        }
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn idle_background_task_flushes_sub_threshold_writes() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let inner: Arc<dyn LogWriter> = Arc::new(SharedVecWriter(captured.clone()));
        let buffered = BufferedWriter::new(inner, MIN_BUFFER_SIZE).unwrap();

        buffered.write(b"tiny").unwrap();
        assert!(captured.lock().is_empty());

        std::thread::sleep(DEFAULT_FLUSH_INTERVAL * 3);
        assert_eq!(&*captured.lock(), b"tiny");
    }
}
