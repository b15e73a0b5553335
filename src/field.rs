//! The field value model: `{key, value}` pairs with a typed value union.
//!
//! Grounded on the teacher's plain `(String, String)` pairs
//! (`backend::filtering::filter_caller_info`, `format::json::dict_to_pairs`),
//! generalized into a real tagged union per spec.md §3 — the teacher
//! stringified every value immediately because it bridged from Python, but
//! `corelog` keeps values typed until the formatter needs them so JSON output
//! preserves numeric/bool types instead of quoting everything.

use std::time::Duration;

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

/// A single field value. Deliberately a flat enum rather than a trait object:
/// the hot path (one log call) allocates at most one of these per field and
/// inlining across a fixed enum is cheaper than a vtable dispatch per field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    I64(i64),
    U64(u64),
    I32(i32),
    U32(u32),
    I16(i16),
    U16(u16),
    I8(i8),
    U8(u8),
    F64(f64),
    F32(f32),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Best-effort catch-all for values formatted via `Debug`.
    Debug(String),
}

impl Value {
    /// Render the value as a display string, used by the text formatter and
    /// by the filter's recursive walker when it needs to inspect a value as
    /// a string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::I64(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::I8(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Duration(v) => format!("{v:?}"),
            Value::Time(v) => v.to_rfc3339(),
            Value::Debug(v) => v.clone(),
        }
    }

    /// Render as a `serde_json::Value`, preserving the original type.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::I64(v) => serde_json::Value::from(*v),
            Value::U64(v) => serde_json::Value::from(*v),
            Value::I32(v) => serde_json::Value::from(*v),
            Value::U32(v) => serde_json::Value::from(*v),
            Value::I16(v) => serde_json::Value::from(*v),
            Value::U16(v) => serde_json::Value::from(*v),
            Value::I8(v) => serde_json::Value::from(*v),
            Value::U8(v) => serde_json::Value::from(*v),
            Value::F64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F32(v) => serde_json::Number::from_f64(*v as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Duration(v) => serde_json::Value::String(format!("{v:?}")),
            Value::Time(v) => serde_json::Value::String(v.to_rfc3339()),
            Value::Debug(v) => serde_json::Value::String(v.clone()),
        }
    }
}

/// A `{key, value}` pair. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Field { key: key.into(), value }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(key, Value::Str(value.into()))
    }

    pub fn i64(key: impl Into<String>, value: i64) -> Self {
        Field::new(key, Value::I64(value))
    }

    pub fn u64(key: impl Into<String>, value: u64) -> Self {
        Field::new(key, Value::U64(value))
    }

    pub fn i32(key: impl Into<String>, value: i32) -> Self {
        Field::new(key, Value::I32(value))
    }

    pub fn u32(key: impl Into<String>, value: u32) -> Self {
        Field::new(key, Value::U32(value))
    }

    pub fn f64(key: impl Into<String>, value: f64) -> Self {
        Field::new(key, Value::F64(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Field::new(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Field::new(key, Value::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Field::new(key, Value::Time(value))
    }

    pub fn debug(key: impl Into<String>, value: impl std::fmt::Debug) -> Self {
        Field::new(key, Value::Debug(format!("{value:?}")))
    }
}

/// Most records carry a handful of fields; `SmallVec` keeps that common case
/// off the heap, matching the stack-friendly collections the teacher favors
/// elsewhere (`smallvec`, `ahash`).
pub type FieldVec = SmallVec<[Field; 8]>;

/// Merge `extra` into `base` with JSON last-write-wins-by-key semantics,
/// preserving `base`'s relative order for keys it already has and appending
/// new keys in `extra`'s order. Used only by the JSON formatter path; the
/// text formatter instead preserves duplicates per spec.md's explicit
/// "do not unify" instruction (see Open Questions in SPEC_FULL.md).
pub fn merge_last_write_wins(base: &[Field], extra: &[Field]) -> FieldVec {
    let mut out: FieldVec = base.iter().cloned().collect();
    for field in extra {
        if let Some(existing) = out.iter_mut().find(|f| f.key == field.key) {
            existing.value = field.value.clone();
        } else {
            out.push(field.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_string_renders_each_variant() {
        assert_eq!(Value::Str("x".into()).to_display_string(), "x");
        assert_eq!(Value::I64(-5).to_display_string(), "-5");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
    }

    #[test]
    fn json_preserves_numeric_type() {
        assert_eq!(Value::I64(42).to_json(), serde_json::json!(42));
        assert_eq!(Value::Bool(false).to_json(), serde_json::json!(false));
    }

    #[test]
    fn merge_last_write_wins_overrides_by_key() {
        let base = vec![Field::string("user", "a"), Field::string("role", "admin")];
        let extra = vec![Field::string("user", "b")];
        let merged = merge_last_write_wins(&base, &extra);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].value.to_display_string(), "b");
        assert_eq!(merged[1].value.to_display_string(), "admin");
    }

    #[test]
    fn merge_last_write_wins_appends_new_keys() {
        let base = vec![Field::string("a", "1")];
        let extra = vec![Field::string("b", "2")];
        let merged = merge_last_write_wins(&base, &extra);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].key, "b");
    }
}
