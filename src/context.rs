//! Context extractors (spec.md §4.9): pure functions from a request-scoped
//! context bag to fields, fanned in ahead of entry-preset and call-site
//! fields (spec.md §5 ordering).
//!
//! No teacher equivalent; the three default extractors mirror the
//! typed-or-string request-context fields structured loggers elsewhere in
//! the corpus pull (the spec's own "backward compatibility path" language
//! for `trace_id`/`span_id`/`request_id`).

use std::sync::Arc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::field::{Field, Value};

/// A minimal context bag: string-keyed, string-or-typed values. Callers
/// build one per request/task and pass it to the `*Ctx` logging methods.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: AHashMap<String, Value>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Context {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// `SmallVec<[Field; 4]>` covers the common case (most extractors emit 0-2
/// fields) without heap allocation.
pub type ContextExtractor = Arc<dyn Fn(&Context) -> SmallVec<[Field; 4]> + Send + Sync>;

/// Ordered list of extractors, run in order; results are concatenated in
/// extractor order ahead of entry-preset fields (spec.md §5).
#[derive(Clone, Default)]
pub struct ExtractorList {
    extractors: Vec<ContextExtractor>,
}

impl ExtractorList {
    pub fn new() -> ExtractorList {
        ExtractorList::default()
    }

    pub fn push(&self, extractor: ContextExtractor) -> ExtractorList {
        let mut next = self.extractors.clone();
        next.push(extractor);
        ExtractorList { extractors: next }
    }

    pub fn extract(&self, ctx: Option<&Context>) -> SmallVec<[Field; 8]> {
        let mut out: SmallVec<[Field; 8]> = SmallVec::new();
        let Some(ctx) = ctx else { return out };
        for extractor in &self.extractors {
            out.extend(extractor(ctx));
        }
        out
    }
}

fn string_field_extractor(key: &'static str) -> ContextExtractor {
    Arc::new(move |ctx: &Context| {
        let mut out = SmallVec::new();
        if let Some(value) = ctx.get(key) {
            out.push(Field::new(key, value.clone()));
        }
        out
    })
}

/// The three default extractors named in spec.md §4.9.
pub fn default_extractors() -> ExtractorList {
    ExtractorList::new()
        .push(string_field_extractor("trace_id"))
        .push(string_field_extractor("span_id"))
        .push(string_field_extractor("request_id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_context_yields_no_fields() {
        let extractors = default_extractors();
        assert!(extractors.extract(None).is_empty());
    }

    #[test]
    fn extracts_present_keys_in_order() {
        let extractors = default_extractors();
        let ctx = Context::new()
            .with("request_id", Value::Str("req-1".to_string()))
            .with("trace_id", Value::Str("trace-1".to_string()));
        let fields = extractors.extract(Some(&ctx));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, "trace_id");
        assert_eq!(fields[1].key, "request_id");
    }
}
