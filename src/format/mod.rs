//! Text and JSON record encoders (spec.md §4.6).

pub mod json;
pub mod text;
mod timestamp_cache;

pub use json::{JsonFieldNames, JsonOptions};
pub use timestamp_cache::TimestampCache;

use crate::record::Record;

/// Which wire shape a logger emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(Format::Text),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Shared decoration options (spec.md §3 Config, §6 configuration surface).
#[derive(Clone)]
pub struct FormatterOptions {
    pub format: Format,
    pub time_format: String,
    pub include_time: bool,
    pub include_level: bool,
    pub include_caller: bool,
    pub full_path: bool,
    pub caller_depth: usize,
    pub json: JsonOptions,
}

impl Default for FormatterOptions {
    fn default() -> FormatterOptions {
        FormatterOptions {
            format: Format::Text,
            time_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            include_time: true,
            include_level: true,
            include_caller: false,
            full_path: false,
            caller_depth: 3,
            json: JsonOptions::default(),
        }
    }
}

/// Encode `record` into a single line (including its trailing newline) per
/// the configured format.
pub fn format_record(record: &Record, options: &FormatterOptions, cache: &TimestampCache) -> String {
    match options.format {
        Format::Text => text::format_text(record, options, cache),
        Format::Json => json::format_json(record, options),
    }
}
