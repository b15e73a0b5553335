//! The entry (preset-field) pattern (spec.md §4.1, §9 "Entry pattern").
//!
//! An `Entry` is an immutable value carrying a reference to its owning
//! `Logger` plus a vector of preset fields. Chaining via `with_field`/
//! `with_fields` never mutates the original entry; it returns a new one with
//! the extra fields appended. No teacher equivalent — this is the Rust-native
//! replacement for the PyO3 bound kwargs-merging logic in `backend/logging.rs`.

use smallvec::smallvec;

use crate::field::{Field, FieldVec, Value};
use crate::level::Level;
use crate::logger::Logger;

/// Preset fields chained onto a logger. Merging order (spec.md §5): entry
/// presets are applied before call-site explicit fields, so explicit fields
/// win on key collision in JSON mode.
#[derive(Clone)]
pub struct Entry<'a> {
    logger: &'a Logger,
    preset: FieldVec,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(logger: &'a Logger, preset: FieldVec) -> Self {
        Entry { logger, preset }
    }

    /// Return a new entry with one more preset field appended.
    pub fn with_field(&self, key: impl Into<String>, value: Value) -> Entry<'a> {
        let mut preset = self.preset.clone();
        preset.push(Field::new(key, value));
        Entry::new(self.logger, preset)
    }

    /// Return a new entry with several more preset fields appended.
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Entry<'a> {
        let mut preset = self.preset.clone();
        preset.extend(fields);
        Entry::new(self.logger, preset)
    }

    pub fn preset_fields(&self) -> &[Field] {
        &self.preset
    }

    /// Emit a record through the owning logger with this entry's preset
    /// fields merged ahead of the explicit ones.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.logger
            .log_with_preset(level, message.into(), &self.preset, smallvec![]);
    }

    pub fn log_with(
        &self,
        level: Level,
        message: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) {
        let explicit: FieldVec = fields.into_iter().collect();
        self.logger
            .log_with_preset(level, message.into(), &self.preset, explicit);
    }
}
