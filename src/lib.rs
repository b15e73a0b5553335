//! `corelog`: a structured, concurrent logging core.
//!
//! A `Logger` is constructed from a [`Config`], fans formatted records out to
//! any number of [`LogWriter`] sinks, and applies sensitive-data redaction,
//! sanitization, sampling, and lifecycle hooks on the way. See
//! [`Logger::create`] for the entry point.

mod config;
mod context;
mod entry;
mod error;
mod field;
mod filter;
mod format;
mod global;
mod hooks;
mod internal_debug;
mod level;
mod logger;
mod record;
mod sampler;
mod sanitize;
mod writer;

pub use config::{
    Config, FatalConfig, FieldValidationConfig, FieldValidationMode, FilterCatalog, NamingConvention,
    SecurityConfig, WriteErrorHandler,
};
pub use context::{Context, ContextExtractor, ExtractorList};
pub use entry::Entry;
pub use error::{Error, Result};
pub use field::{Field, FieldVec, Value};
pub use filter::{Filter, FilterConfig, FilterMetrics, Pattern, PatternSet};
pub use format::{Format, FormatterOptions, JsonFieldNames, JsonOptions};
pub use global::{default_logger, set_default_logger};
pub use hooks::{Hook, HookEvent, HookRegistry};
pub use level::Level;
pub use logger::Logger;
pub use record::{Caller, Record};
pub use sampler::SamplingConfig;
pub use writer::buffered::BufferedWriter;
pub use writer::file::{Compression, FileConfig, FileWriter};
pub use writer::{FanOutError, FanOutResult, LogWriter, MultiWriter, SimpleWriter, DEFAULT_MAX_WRITER_COUNT};

pub use internal_debug as debug;
