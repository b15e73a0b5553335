//! The logger orchestrator (spec.md §4.1): owns level, writers, extractors,
//! hooks, sampler, filter, and formatter, and implements the public logging
//! API and lifecycle state machine.
//!
//! Grounded on the teacher's `PyLogger` (`logger.rs`) + `backend::logging`
//! (`log_message`) for the pipeline shape — level gate, field merge, write —
//! generalized from a single process-wide `RwLock<LoggerState>` singleton
//! into an independently constructible `Logger` whose replaceable state
//! lives behind `ArcSwap`/`ArcSwapOption` per spec.md §5, since `corelog`
//! supports many concurrent logger instances rather than one PyO3 module
//! singleton.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::Utc;
use smallvec::smallvec;

use crate::config::{Config, FatalConfig, FieldValidationConfig, FilterCatalog, SecurityConfig, WriteErrorHandler};
use crate::context::{Context, ContextExtractor, ExtractorList};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::field::{Field, FieldVec};
use crate::filter::{Filter, FilterConfig, PatternSet};
use crate::format::{self, FormatterOptions, TimestampCache};
use crate::hooks::{Hook, HookEvent, HookRegistry};
use crate::internal_debug;
use crate::level::Level;
use crate::record::{Caller, Record};
use crate::sampler::{self, SamplerState, SamplingConfig};
use crate::sanitize;
use crate::writer::file::FileWriter;
use crate::writer::{FanOutError, LogWriter, MultiWriter};

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

type LevelResolverFn = dyn Fn(&Context) -> Level + Send + Sync;

/// The logger state machine and record-assembly pipeline (spec.md §4.1).
pub struct Logger {
    level: AtomicU8,
    level_resolver: ArcSwapOption<LevelResolverFn>,
    state: AtomicU8,
    writers: MultiWriter,
    filter: ArcSwap<Filter>,
    security: ArcSwap<SecurityConfig>,
    /// Shared via `Arc` so the file sink's `OnRotate` callback (wired at
    /// `create` time) can observe hook registry replacements made later
    /// through `set_hooks`/`add_hook`.
    hooks: Arc<ArcSwap<HookRegistry>>,
    extractors: ArcSwap<ExtractorList>,
    sampler: ArcSwap<SamplerState>,
    formatter: FormatterOptions,
    timestamp_cache: TimestampCache,
    fatal: FatalConfig,
    write_error_handler: WriteErrorHandler,
    field_validation: FieldValidationConfig,
}

fn build_pattern_set(security: &SecurityConfig) -> Result<PatternSet> {
    let mut set = match security.filter_catalog {
        FilterCatalog::Empty => PatternSet::empty(),
        FilterCatalog::Basic => PatternSet::basic(),
        FilterCatalog::Full => PatternSet::full(),
    };
    if !security.custom_patterns.is_empty() {
        let custom = PatternSet::custom(&security.custom_patterns)?;
        set.patterns.extend(custom.patterns);
    }
    Ok(set)
}

fn synthetic_record(level: Level, message: &str) -> Record {
    Record { timestamp: Utc::now(), level, message: message.to_string(), fields: smallvec![], caller: None }
}

impl Logger {
    /// Validate `config`, open any configured file sink, install the
    /// multi-writer and filter, and return a ready-to-use logger (spec.md
    /// §4.1 "Create(config)").
    pub fn create(config: Config) -> Result<Logger> {
        config.validate()?;

        let hooks = Arc::new(ArcSwap::from_pointee(config.hooks.clone()));
        let writers = MultiWriter::new(config.security.max_writers);
        for writer in &config.outputs {
            writers.add(writer.clone())?;
        }
        if let Some(file_cfg) = &config.file {
            let file_writer = FileWriter::open(file_cfg.clone())?;
            let hooks_for_rotate = hooks.clone();
            file_writer.set_on_rotate(Arc::new(move || {
                let record = synthetic_record(Level::Info, "rotation");
                for err in hooks_for_rotate.load().run_collect_errors(HookEvent::OnRotate, &record) {
                    eprintln!("corelog: OnRotate hook failed: {err}");
                }
            }));
            writers.add(file_writer)?;
        }

        let pattern_set = build_pattern_set(&config.security)?;
        let filter_config = FilterConfig {
            enabled: config.security.filter_enabled,
            input_length_cap: config.security.filter_input_cap,
            regex_timeout: config.security.filter_timeout,
            semaphore_capacity: config.security.filter_semaphore_capacity,
        };

        Ok(Logger {
            level: AtomicU8::new(config.level as u8),
            level_resolver: ArcSwapOption::from(None),
            state: AtomicU8::new(STATE_OPEN),
            writers,
            filter: ArcSwap::from_pointee(Filter::new(filter_config, pattern_set)),
            security: ArcSwap::from_pointee(config.security),
            hooks,
            extractors: ArcSwap::from_pointee(config.extractors),
            sampler: ArcSwap::from_pointee(SamplerState::new(config.sampling)),
            formatter: config.formatter,
            timestamp_cache: TimestampCache::new(),
            fatal: config.fatal,
            write_error_handler: config.write_error_handler,
            field_validation: config.field_validation,
        })
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.state.load(Ordering::Acquire) != STATE_OPEN {
            return Err(Error::LoggerClosed);
        }
        Ok(())
    }

    fn effective_level(&self, ctx: Option<&Context>) -> Level {
        if let Some(resolver) = self.level_resolver.load_full()
            && let Some(ctx) = ctx
        {
            return resolver(ctx);
        }
        Level::from_u8(self.level.load(Ordering::Acquire))
    }

    fn report_error(&self, sink: &str, err: &str) {
        (self.write_error_handler)(sink, err);
        let record = synthetic_record(Level::Error, err);
        for hook_err in self.hooks.load().run_collect_errors(HookEvent::OnError, &record) {
            eprintln!("corelog: OnError hook failed: {hook_err}");
        }
    }

    /// Pipeline steps 1-2 (spec.md §4.1): level gate, then sampler. Captures
    /// the call site via `#[track_caller]` propagation before handing off to
    /// [`Self::assemble_and_emit`] for the remaining steps.
    #[track_caller]
    fn dispatch(&self, level: Level, message: String, preset: &[Field], explicit: FieldVec, ctx: Option<&Context>) {
        if self.state.load(Ordering::Acquire) != STATE_OPEN {
            return;
        }
        let floor = self.effective_level(ctx);
        if !level.admits(floor) {
            return;
        }

        let sampler = self.sampler.load_full();
        let site = sampler::site_digest(&message);
        if !sampler.should_emit(level, site) {
            return;
        }

        let caller = if self.formatter.include_caller {
            let loc = std::panic::Location::caller();
            Some(Caller { file: loc.file().to_string(), line: loc.line() })
        } else {
            None
        };

        self.assemble_and_emit(level, message, preset, explicit, ctx, caller);
    }

    /// Pipeline steps 3-9 (spec.md §4.1): field merge, sanitize, filter,
    /// `BeforeLog`, format, fan-out, `AfterLog`.
    fn assemble_and_emit(
        &self,
        level: Level,
        message: String,
        preset: &[Field],
        explicit: FieldVec,
        ctx: Option<&Context>,
        caller: Option<Caller>,
    ) {
        let extractors = self.extractors.load_full();
        let mut fields: FieldVec = extractors.extract(ctx);
        fields.extend(preset.iter().cloned());
        fields.extend(explicit);

        let security = self.security.load_full();
        let sanitized_message = sanitize::sanitize_message(&message, security.max_message_size);

        let filter = self.filter.load_full();
        let filtered_fields: FieldVec = fields
            .into_iter()
            .map(|f| {
                let key = sanitize::sanitize_field_key(&f.key);
                let value = filter.filter_value(&key, &f.value);
                Field::new(key, value)
            })
            .collect();

        let record =
            Record { timestamp: Utc::now(), level, message: sanitized_message, fields: filtered_fields, caller };

        for err in self.hooks.load().run_collect_errors(HookEvent::OnFilter, &record) {
            self.report_error("on_filter_hook", &err);
        }

        if let Err(err) = self.hooks.load().run(HookEvent::BeforeLog, &record) {
            internal_debug::trace("before_log_aborted", &err);
            return;
        }

        let formatted = format::format_record(&record, &self.formatter, &self.timestamp_cache);
        let result = self.writers.write(formatted.as_bytes());
        if let Some(err) = result.error {
            self.report_error("fan_out", &err.to_string());
        }

        for err in self.hooks.load().run_collect_errors(HookEvent::AfterLog, &record) {
            self.report_error("after_log_hook", &err);
        }
    }

    // -- Generic logging API (spec.md §4.1) --------------------------------

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.dispatch(level, message.into(), &[], smallvec![], None);
    }

    #[track_caller]
    pub fn logf(&self, level: Level, args: std::fmt::Arguments<'_>) {
        self.dispatch(level, args.to_string(), &[], smallvec![], None);
    }

    #[track_caller]
    pub fn log_with(&self, level: Level, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.dispatch(level, message.into(), &[], fields.into_iter().collect(), None);
    }

    #[track_caller]
    pub fn log_ctx(&self, ctx: &Context, level: Level, message: impl Into<String>) {
        self.dispatch(level, message.into(), &[], smallvec![], Some(ctx));
    }

    #[track_caller]
    pub fn logf_ctx(&self, ctx: &Context, level: Level, args: std::fmt::Arguments<'_>) {
        self.dispatch(level, args.to_string(), &[], smallvec![], Some(ctx));
    }

    #[track_caller]
    pub fn log_with_ctx(
        &self,
        ctx: &Context,
        level: Level,
        message: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) {
        self.dispatch(level, message.into(), &[], fields.into_iter().collect(), Some(ctx));
    }

    /// Used by [`Entry`] to emit with preset fields merged ahead of explicit
    /// ones (spec.md §4.1 "Entry model").
    #[track_caller]
    pub(crate) fn log_with_preset(&self, level: Level, message: String, preset: &[Field], explicit: FieldVec) {
        self.dispatch(level, message, preset, explicit, None);
    }

    // -- Per-level convenience wrappers ------------------------------------

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn debug_with(&self, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.log_with(Level::Debug, message, fields);
    }
    #[track_caller]
    pub fn info_with(&self, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.log_with(Level::Info, message, fields);
    }
    #[track_caller]
    pub fn warn_with(&self, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.log_with(Level::Warn, message, fields);
    }
    #[track_caller]
    pub fn error_with(&self, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.log_with(Level::Error, message, fields);
    }

    /// Record at `Fatal`, then attempt a bounded-timeout `Close` and
    /// unconditionally invoke the terminator (spec.md §4.1 "Fatal
    /// semantics"). Takes `Arc<Self>` since the bounded close races against
    /// a background thread that must be able to outlive this call.
    #[track_caller]
    pub fn fatal(self: &Arc<Logger>, message: impl Into<String>) {
        self.log(Level::Fatal, message);
        self.terminate_after_close();
    }

    #[track_caller]
    pub fn fatal_with(self: &Arc<Logger>, message: impl Into<String>, fields: impl IntoIterator<Item = Field>) {
        self.log_with(Level::Fatal, message, fields);
        self.terminate_after_close();
    }

    fn terminate_after_close(self: &Arc<Logger>) {
        let deadline = self.fatal.flush_timeout;
        let logger = Arc::clone(self);
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = logger.close();
            let _ = tx.send(());
        });
        if rx.recv_timeout(deadline).is_err() {
            eprintln!("corelog: Close did not complete within fatal_flush_timeout ({deadline:?}); terminating anyway");
        }
        (self.fatal.terminator)(1);
    }

    // -- Entry (preset-field) pattern ---------------------------------------

    pub fn with_field(&self, key: impl Into<String>, value: crate::field::Value) -> Entry<'_> {
        Entry::new(self, smallvec![Field::new(key, value)])
    }

    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Entry<'_> {
        Entry::new(self, fields.into_iter().collect())
    }

    // -- Level predicates and management ------------------------------------

    pub fn is_level_enabled(&self, level: Level) -> bool {
        level.admits(self.effective_level(None))
    }
    pub fn is_debug_enabled(&self) -> bool {
        self.is_level_enabled(Level::Debug)
    }
    pub fn is_info_enabled(&self) -> bool {
        self.is_level_enabled(Level::Info)
    }
    pub fn is_warn_enabled(&self) -> bool {
        self.is_level_enabled(Level::Warn)
    }
    pub fn is_error_enabled(&self) -> bool {
        self.is_level_enabled(Level::Error)
    }
    pub fn is_fatal_enabled(&self) -> bool {
        true
    }

    pub fn get_level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: Level) -> Result<()> {
        self.ensure_mutable()?;
        self.level.store(level as u8, Ordering::Release);
        Ok(())
    }

    pub fn set_level_resolver(&self, resolver: impl Fn(&Context) -> Level + Send + Sync + 'static) -> Result<()> {
        self.ensure_mutable()?;
        self.level_resolver.store(Some(Arc::new(resolver)));
        Ok(())
    }

    pub fn clear_level_resolver(&self) -> Result<()> {
        self.ensure_mutable()?;
        self.level_resolver.store(None);
        Ok(())
    }

    // -- Writer management (spec.md §4.1 "Writer management") --------------

    pub fn add_writer(&self, writer: Arc<dyn LogWriter>) -> Result<()> {
        self.ensure_mutable()?;
        self.writers.add(writer)
    }

    pub fn remove_writer(&self, id: &str) -> Result<()> {
        self.ensure_mutable()?;
        self.writers.remove(id)
    }

    pub fn writer_count(&self) -> usize {
        self.writers.count()
    }

    // -- Hooks ---------------------------------------------------------------

    pub fn add_hook(&self, event: HookEvent, hook: Hook) -> Result<()> {
        self.ensure_mutable()?;
        let current = self.hooks.load_full();
        self.hooks.store(Arc::new(current.add(event, hook)));
        Ok(())
    }

    pub fn set_hooks(&self, registry: HookRegistry) -> Result<()> {
        self.ensure_mutable()?;
        self.hooks.store(Arc::new(registry));
        Ok(())
    }

    // -- Context extractors ---------------------------------------------------

    pub fn add_context_extractor(&self, extractor: ContextExtractor) -> Result<()> {
        self.ensure_mutable()?;
        let current = self.extractors.load_full();
        self.extractors.store(Arc::new(current.push(extractor)));
        Ok(())
    }

    pub fn set_context_extractors(&self, extractors: ExtractorList) -> Result<()> {
        self.ensure_mutable()?;
        self.extractors.store(Arc::new(extractors));
        Ok(())
    }

    // -- Sampling --------------------------------------------------------------

    pub fn set_sampling(&self, config: SamplingConfig) -> Result<()> {
        self.ensure_mutable()?;
        self.sampler.store(Arc::new(SamplerState::new(config)));
        Ok(())
    }

    // -- Security / filter -------------------------------------------------------

    pub fn set_security_config(&self, security: SecurityConfig) -> Result<()> {
        self.ensure_mutable()?;
        let pattern_set = build_pattern_set(&security)?;
        let filter_config = FilterConfig {
            enabled: security.filter_enabled,
            input_length_cap: security.filter_input_cap,
            regex_timeout: security.filter_timeout,
            semaphore_capacity: security.filter_semaphore_capacity,
        };
        self.writers.set_max_writers(security.max_writers);
        self.filter.store(Arc::new(Filter::new(filter_config, pattern_set)));
        self.security.store(Arc::new(security));
        Ok(())
    }

    pub fn get_security_config(&self) -> SecurityConfig {
        (*self.security.load_full()).clone()
    }

    pub fn field_validation_config(&self) -> &FieldValidationConfig {
        &self.field_validation
    }

    // -- Lifecycle ---------------------------------------------------------------

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    pub fn flush(&self) -> std::result::Result<(), FanOutError> {
        match self.writers.flush() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Idempotent drain-and-close (spec.md §4.1 "Lifecycle",
    /// `Open→Closing→Closed`). A call that loses the `Open→Closing`
    /// transition race is a no-op success — the logger is already being (or
    /// has been) closed.
    pub fn close(&self) -> std::result::Result<(), FanOutError> {
        if self.state.compare_exchange(STATE_OPEN, STATE_CLOSING, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Ok(());
        }

        let record = synthetic_record(Level::Info, "close");
        for err in self.hooks.load().run_collect_errors(HookEvent::OnClose, &record) {
            (self.write_error_handler)("on_close_hook", &err);
        }

        let flush_err = self.writers.flush();
        if let Some(err) = &flush_err {
            (self.write_error_handler)("flush", &err.to_string());
        }
        let close_err = self.writers.close_all();
        self.state.store(STATE_CLOSED, Ordering::Release);

        match (flush_err, close_err) {
            (None, None) => Ok(()),
            (Some(mut f), Some(c)) => {
                f.failed.extend(c.failed);
                Err(f)
            }
            (Some(f), None) => Err(f),
            (None, Some(c)) => Err(c),
        }
    }
}
