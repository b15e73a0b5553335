//! JSON encoder (spec.md §4.6). Generalizes the teacher's `JsonRecord`
//! struct (`format/json.rs`) — which had fixed field names and a
//! Python-dict-derived `fields` blob — into a configurable-field-name
//! object built over the typed [`crate::field::Value`] union, so numeric
//! and boolean fields stay typed instead of being stringified.

use serde_json::{Map, Value as Json};

use super::FormatterOptions;
use crate::field::merge_last_write_wins;
use crate::record::Record;

/// Configurable JSON top-level key names (spec.md §6 `json.field_names`).
#[derive(Clone)]
pub struct JsonFieldNames {
    pub timestamp: String,
    pub level: String,
    pub caller: String,
    pub message: String,
    pub fields: String,
}

impl Default for JsonFieldNames {
    fn default() -> JsonFieldNames {
        JsonFieldNames {
            timestamp: "timestamp".to_string(),
            level: "level".to_string(),
            caller: "caller".to_string(),
            message: "message".to_string(),
            fields: "fields".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct JsonOptions {
    pub pretty: bool,
    pub indent: usize,
    pub field_names: JsonFieldNames,
}

impl Default for JsonOptions {
    fn default() -> JsonOptions {
        JsonOptions { pretty: false, indent: 2, field_names: JsonFieldNames::default() }
    }
}

/// JSON mode applies last-write-wins-by-key field merging (spec.md §9 Open
/// Questions) before encoding — the opposite of text mode, which preserves
/// duplicates.
pub fn format_json(record: &Record, options: &FormatterOptions) -> String {
    let names = &options.json.field_names;
    let mut object = Map::new();

    if options.include_time {
        object.insert(names.timestamp.clone(), Json::String(record.timestamp.to_rfc3339()));
    }
    if options.include_level {
        object.insert(names.level.clone(), Json::String(record.level.as_str().to_string()));
    }
    if options.include_caller
        && let Some(caller) = &record.caller
    {
        object.insert(names.caller.clone(), Json::String(caller.display(options.full_path)));
    }
    object.insert(names.message.clone(), Json::String(record.message.clone()));

    let merged = merge_last_write_wins(&[], &record.fields);
    let mut fields_obj = Map::with_capacity(merged.len());
    for field in &merged {
        fields_obj.insert(field.key.clone(), field.value.to_json());
    }
    object.insert(names.fields.clone(), Json::Object(fields_obj));

    let value = Json::Object(object);
    let mut rendered = if options.json.pretty {
        let indent = " ".repeat(options.json.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&value, &mut serializer).expect("json value always serializes");
        String::from_utf8(buf).expect("json output is always valid utf-8")
    } else {
        value.to_string()
    };
    rendered.push('\n');
    rendered
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
            message: "auth".to_string(),
            fields: smallvec![Field::string("user", "john"), Field::string("password", "[REDACTED]")],
            caller: None,
        }
    }

    #[test]
    fn matches_structured_json_scenario() {
        let options = FormatterOptions { include_time: false, ..FormatterOptions::default() };
        let out = format_json(&base_record(), &options);
        let parsed: Json = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["message"], "auth");
        assert_eq!(parsed["fields"]["user"], "john");
        assert_eq!(parsed["fields"]["password"], "[REDACTED]");
    }

    #[test]
    fn last_write_wins_by_key_in_json_mode() {
        let mut record = base_record();
        record.fields = smallvec![Field::string("a", "1"), Field::string("a", "2")];
        let options = FormatterOptions { include_time: false, ..FormatterOptions::default() };
        let out = format_json(&record, &options);
        let parsed: Json = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["fields"]["a"], "2");
    }

    #[test]
    fn pretty_print_adds_newlines() {
        let options = FormatterOptions {
            include_time: false,
            json: JsonOptions { pretty: true, ..JsonOptions::default() },
            ..FormatterOptions::default()
        };
        let out = format_json(&base_record(), &options);
        assert!(out.contains('\n'));
    }
}
