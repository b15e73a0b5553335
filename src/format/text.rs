//! Text encoder: `[timestamp] LEVEL [caller] message key1=value1 key2=value2`
//! (spec.md §4.6). Generalizes the teacher's `format_with_template`
//! placeholder substitution into the fixed shape the spec prescribes,
//! reusing its chrono-pattern-conversion helper for the timestamp layout.

use super::{FormatterOptions, TimestampCache};
use crate::record::Record;

/// Fields are appended in call order, duplicates preserved — the text-mode
/// counterpart to JSON's last-write-wins merge (spec.md §9 Open Questions).
pub fn format_text(record: &Record, options: &FormatterOptions, cache: &TimestampCache) -> String {
    let mut out = String::new();

    if options.include_time {
        out.push('[');
        out.push_str(&cache.format(record.timestamp, &options.time_format));
        out.push_str("] ");
    }
    if options.include_level {
        out.push_str(record.level.as_str());
        out.push(' ');
    }
    if options.include_caller
        && let Some(caller) = &record.caller
    {
        out.push('[');
        out.push_str(&caller.display(options.full_path));
        out.push_str("] ");
    }

    out.push_str(&record.message);

    for field in &record.fields {
        out.push(' ');
        out.push_str(&field.key);
        out.push('=');
        out.push_str(&field.value.to_display_string());
    }

    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::level::Level;
    use chrono::Utc;
    use smallvec::smallvec;

    fn base_record() -> Record {
        Record {
            timestamp: Utc::now(),
            level: Level::Info,
            message: "hello world".to_string(),
            fields: smallvec![],
            caller: None,
        }
    }

    #[test]
    fn minimal_decoration_matches_scenario_one() {
        let options = FormatterOptions {
            include_time: false,
            include_level: true,
            include_caller: false,
            ..FormatterOptions::default()
        };
        let cache = TimestampCache::new();
        let out = format_text(&base_record(), &options, &cache);
        assert_eq!(out, "INFO hello world\n");
    }

    #[test]
    fn appends_fields_preserving_order_and_duplicates() {
        let mut record = base_record();
        record.fields = smallvec![Field::string("a", "1"), Field::string("a", "2")];
        let options = FormatterOptions { include_time: false, ..FormatterOptions::default() };
        let cache = TimestampCache::new();
        let out = format_text(&record, &options, &cache);
        assert_eq!(out, "INFO hello world a=1 a=2\n");
    }
}
