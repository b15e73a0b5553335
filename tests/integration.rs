//! End-to-end scenarios exercised through the public API only.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use corelog::{
    Compression, Config, Error, FatalConfig, Field, FileConfig, Format, FormatterOptions, Level,
    LogWriter, Logger, SamplingConfig, SecurityConfig, Value,
};

#[derive(Clone, Default)]
struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    fn contents(&self) -> String {
        String::from_utf8(self.buf.lock().unwrap().clone()).unwrap()
    }
}

impl LogWriter for CaptureWriter {
    fn id(&self) -> &str {
        "capture"
    }
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
}

fn config_for(writer: Arc<dyn LogWriter>) -> Config {
    Config {
        outputs: vec![writer],
        security: SecurityConfig { filter_enabled: false, ..SecurityConfig::default() },
        ..Config::default()
    }
}

/// Scenario 1 (spec.md §8): simple text log.
#[test]
fn simple_text_log() {
    let sink = CaptureWriter::default();
    let config = Config {
        formatter: FormatterOptions { include_time: false, include_level: true, ..FormatterOptions::default() },
        ..config_for(Arc::new(sink.clone()))
    };
    let logger = Logger::create(config).unwrap();
    logger.info("hello world");
    assert_eq!(sink.contents(), "INFO hello world\n");
}

/// Scenario 2 (spec.md §8): structured JSON with redaction.
#[test]
fn structured_json_with_redaction() {
    let sink = CaptureWriter::default();
    let config = Config {
        formatter: FormatterOptions { format: Format::Json, include_time: false, ..FormatterOptions::default() },
        security: SecurityConfig::default(),
        outputs: vec![Arc::new(sink.clone())],
        ..Config::default()
    };
    let logger = Logger::create(config).unwrap();
    logger.info_with("auth", [Field::string("user", "john"), Field::string("password", "s3cret")]);

    let parsed: serde_json::Value = serde_json::from_str(sink.contents().trim_end()).unwrap();
    assert_eq!(parsed["level"], "INFO");
    assert_eq!(parsed["message"], "auth");
    assert_eq!(parsed["fields"]["user"], "john");
    assert_eq!(parsed["fields"]["password"], "[REDACTED]");
}

/// Scenario 3 (spec.md §8): size-based rotation with pruned backups.
#[test]
fn rotation_prunes_to_max_backups() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = Config {
        file: Some(FileConfig {
            path: path.clone(),
            max_size: 1024 * 1024,
            max_backups: 2,
            max_age: None,
            compression: Compression::None,
        }),
        outputs: vec![],
        security: SecurityConfig { filter_enabled: false, ..SecurityConfig::default() },
        ..Config::default()
    };
    let logger = Logger::create(config).unwrap();

    let line = "x".repeat(1024);
    for _ in 0..(2560) {
        logger.info(line.clone());
    }
    logger.close().unwrap();

    let live_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    assert!(live_size <= 1024 * 1024 + 2048);
    assert!(path.with_file_name("app.log.1").exists() || path.with_file_name("app.log.2").exists());
    assert!(!path.with_file_name("app.log.3").exists());
}

/// Scenario 4 (spec.md §8): ReDoS-safe filtering on a large adversarial input.
#[test]
fn redos_input_completes_quickly() {
    let sink = CaptureWriter::default();
    let config = Config {
        formatter: FormatterOptions { include_time: false, ..FormatterOptions::default() },
        security: SecurityConfig::default(),
        outputs: vec![Arc::new(sink.clone())],
        ..Config::default()
    };
    let logger = Logger::create(config).unwrap();
    let input = format!("{}!", "a".repeat(200 * 1024));

    let start = Instant::now();
    logger.info(input);
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    assert!(!sink.contents().is_empty());
}

/// Scenario 5 (spec.md §8): concurrent writer mutation and logging never panics.
#[test]
fn concurrent_writer_mutation_and_logging() {
    let config = config_for(Arc::new(CaptureWriter::default()));
    let logger = Arc::new(Logger::create(config).unwrap());
    let stop_at = Instant::now() + Duration::from_secs(1);

    std::thread::scope(|scope| {
        for i in 0..100 {
            let logger = logger.clone();
            scope.spawn(move || {
                while Instant::now() < stop_at {
                    if i % 2 == 0 {
                        let _ = logger.add_writer(Arc::new(CaptureWriter::default()));
                    } else {
                        logger.info("concurrent");
                    }
                }
            });
        }
    });

    let count = logger.writer_count();
    assert!(count <= corelog::DEFAULT_MAX_WRITER_COUNT);
}

/// Scenario 6 (spec.md §8): Fatal with a blocking sink still terminates within
/// the bounded deadline.
#[test]
fn fatal_with_blocking_sink_terminates_within_deadline() {
    struct BlockingWriter;
    impl LogWriter for BlockingWriter {
        fn id(&self) -> &str {
            "blocking"
        }
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn close(&self) -> io::Result<()> {
            std::thread::sleep(Duration::from_secs(10));
            Ok(())
        }
    }

    let terminated = Arc::new(AtomicBool::new(false));
    let terminated_clone = terminated.clone();
    let config = Config {
        fatal: FatalConfig {
            flush_timeout: Duration::from_millis(200),
            terminator: Arc::new(move |_code| terminated_clone.store(true, Ordering::SeqCst)),
        },
        outputs: vec![Arc::new(BlockingWriter)],
        security: SecurityConfig { filter_enabled: false, ..SecurityConfig::default() },
        ..Config::default()
    };
    let logger = Arc::new(Logger::create(config).unwrap());

    let start = Instant::now();
    logger.fatal("bye");
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");
    assert!(terminated.load(Ordering::SeqCst));
}

/// Scenario 7 (spec.md §8): sampling keeps exactly 9 of 25 identical records.
#[test]
fn sampling_keeps_nine_of_twenty_five() {
    let sink = CaptureWriter::default();
    let logger = Logger::create(config_for(Arc::new(sink.clone()))).unwrap();
    logger
        .set_sampling(SamplingConfig {
            enabled: true,
            initial: 5,
            thereafter: 5,
            tick: Duration::from_secs(3600),
        })
        .unwrap();

    for _ in 0..25 {
        logger.info("same message");
    }

    assert_eq!(sink.contents().lines().count(), 9);
}

/// Scenario 8 (spec.md §8): path traversal is rejected at construction.
#[test]
fn path_traversal_rejected_at_construction() {
    let config = Config {
        file: Some(FileConfig {
            path: "../../etc/passwd".into(),
            max_size: 1024,
            max_backups: 1,
            max_age: None,
            compression: Compression::None,
        }),
        ..Config::default()
    };
    let result = Logger::create(config);
    assert!(matches!(result, Err(Error::PathTraversal(_))));
}

/// `Level::Fatal` is always admitted, and a closed logger silently drops
/// further emits instead of erroring.
#[test]
fn closed_logger_drops_further_emits() {
    let sink = CaptureWriter::default();
    let logger = Logger::create(config_for(Arc::new(sink.clone()))).unwrap();
    logger.close().unwrap();
    assert!(logger.is_closed());

    logger.info("after close");
    assert!(sink.contents().is_empty());

    assert_eq!(logger.set_level(Level::Debug), Err(Error::LoggerClosed));
}

/// `WithField`/`WithFields` preset fields are merged ahead of explicit ones.
#[test]
fn entry_preset_fields_are_merged_ahead_of_explicit() {
    let sink = CaptureWriter::default();
    let config = Config {
        formatter: FormatterOptions { include_time: false, ..FormatterOptions::default() },
        ..config_for(Arc::new(sink.clone()))
    };
    let logger = Logger::create(config).unwrap();

    logger
        .with_field("request_id", Value::Str("r-42".to_string()))
        .log_with(Level::Info, "handled", [Field::string("status", "ok")]);

    let line = sink.contents();
    assert!(line.contains("request_id=r-42"));
    assert!(line.contains("status=ok"));
    assert!(line.find("request_id").unwrap() < line.find("status").unwrap());
}
