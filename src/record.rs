//! A transient, per-call log record (spec.md §3).
//!
//! Built on the stack for every logging call and never held past the end of
//! the pipeline: formatted into bytes and handed to the `MultiWriter`, then
//! dropped.

use chrono::{DateTime, Utc};

use crate::field::FieldVec;
use crate::level::Level;

/// An optional call-site frame, captured at a fixed depth (default 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl Caller {
    /// Apply the "full path vs basename" formatter preference.
    pub fn display(&self, full_path: bool) -> String {
        if full_path {
            format!("{}:{}", self.file, self.line)
        } else {
            let base = self
                .file
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or(&self.file);
            format!("{base}:{}", self.line)
        }
    }
}

/// A fully assembled record, ready for formatting. Every field has already
/// passed the sanitizer and the sensitive-data filter by the time a `Record`
/// is constructed.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: FieldVec,
    pub caller: Option<Caller>,
}
