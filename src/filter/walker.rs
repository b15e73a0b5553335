//! Recursive value walker for structured payloads (spec.md §4.2, §9
//! "Recursive value filter with cycle detection").
//!
//! Operates on `serde_json::Value` as the "arbitrary value" representation —
//! maps, arrays, and scalars all arrive here once a field's `Debug`/JSON
//! rendering is available. No teacher equivalent; new for this crate.
//!
//! `serde_json::Value` is an owned tree, so a literal circular reference is
//! structurally impossible the way it is in a reference-counted object graph
//! in other ecosystems — there is nothing for a pointer-identity visited-set
//! to catch. This walker still enforces `MaxRecursionDepth` and treats depth
//! overflow as the spec's `[MAX_DEPTH_EXCEEDED]` sentinel; see DESIGN.md for
//! the cycle-detection open question.

use serde_json::Value as Json;

use super::redact_string;
use super::patterns::PatternSet;

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 100;

/// Walk `value` redacting string leaves and replacing any map entry whose
/// key is independently classified sensitive, honoring `depth_limit`.
pub fn walk_and_redact(value: &Json, patterns: &PatternSet, depth_limit: usize) -> Json {
    walk(value, patterns, depth_limit, 0)
}

fn walk(value: &Json, patterns: &PatternSet, depth_limit: usize, depth: usize) -> Json {
    if depth >= depth_limit {
        return Json::String("[MAX_DEPTH_EXCEEDED]".to_string());
    }
    match value {
        Json::String(s) => Json::String(redact_string(s, patterns)),
        Json::Array(items) => Json::Array(
            items.iter().map(|v| walk(v, patterns, depth_limit, depth + 1)).collect(),
        ),
        Json::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let redacted = if super::key::is_sensitive_key(k) {
                    Json::String("[REDACTED]".to_string())
                } else {
                    walk(v, patterns, depth_limit, depth + 1)
                };
                out.insert(k.clone(), redacted);
            }
            Json::Object(out)
        }
        other => other.clone(),
    }
}
