//! Message and field-key sanitization (spec.md §6). Always on, independent
//! of the sensitive-data filter in [`crate::filter`] — this pass exists to
//! stop log injection and terminal escape-sequence abuse, not to redact
//! secrets.
//!
//! No direct teacher equivalent (the teacher trusted Python-side strings);
//! grounded on the same "defensive pass before anything touches a sink"
//! posture as the teacher's path-validation functions in `backend/file.rs`.

/// Default cap on message size before truncation (5 MiB, spec.md §5).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 5 * 1024 * 1024;

const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// Sanitize a log message: escape newlines, strip control bytes and ANSI
/// escape introducers, strip zero-width/bidi formatting code points and the
/// BOM, then enforce `max_message_size`.
pub fn sanitize_message(input: &str, max_message_size: usize) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push(c),
            '\u{1B}' => {
                // ESC-introduced sequences: CSI, OSC, DCS, APC, PM, SOS.
                skip_ansi_escape(&mut chars);
            }
            c if (c as u32) < 0x20 => {}
            '\u{7F}' => {}
            c if is_zero_width_or_bidi(c) => {}
            '\u{FEFF}' => {}
            c => out.push(c),
        }
    }

    if out.len() > max_message_size {
        let mut cut = max_message_size.min(out.len());
        while cut > 0 && !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str(TRUNCATION_MARKER);
    }

    out
}

/// Consume the body of a single ANSI escape sequence after the ESC byte has
/// already been taken. Handles CSI (`ESC [ ... final-byte`), OSC/DCS/APC/PM/
/// SOS (`ESC x ... (BEL | ESC \)`), and bare two-byte sequences.
fn skip_ansi_escape(chars: &mut std::iter::Peekable<std::str::Chars>) {
    match chars.peek().copied() {
        Some('[') => {
            chars.next();
            for c in chars.by_ref() {
                if ('\u{40}'..='\u{7E}').contains(&c) {
                    break;
                }
            }
        }
        Some(']') | Some('P') | Some('_') | Some('^') | Some('X') => {
            chars.next();
            loop {
                match chars.next() {
                    None => break,
                    Some('\u{07}') => break,
                    Some('\u{1B}') => {
                        if chars.peek() == Some(&'\\') {
                            chars.next();
                        }
                        break;
                    }
                    _ => {}
                }
            }
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}

fn is_zero_width_or_bidi(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}

/// Sanitize a field key per spec.md §6: up to 256 characters, allowed set
/// `[A-Za-z0-9_.-]`, everything else stripped, empty result becomes
/// `invalid_key`.
pub fn sanitize_field_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(256)
        .collect();
    if cleaned.is_empty() {
        "invalid_key".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_and_carriage_returns() {
        let out = sanitize_message("line1\nline2\r\n", DEFAULT_MAX_MESSAGE_SIZE);
        assert!(!out.contains('\n'));
        assert!(out.contains("\\n"));
    }

    #[test]
    fn strips_control_bytes_but_keeps_tab() {
        let out = sanitize_message("a\u{0007}b\tc\u{007F}d", DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(out, "ab\tcd");
    }

    #[test]
    fn strips_csi_escape_sequence() {
        let out = sanitize_message("\u{1B}[31mred\u{1B}[0m", DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(out, "red");
    }

    #[test]
    fn strips_osc_escape_sequence() {
        let out = sanitize_message("\u{1B}]0;title\u{07}rest", DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(out, "rest");
    }

    #[test]
    fn truncates_oversized_message() {
        let input = "a".repeat(100);
        let out = sanitize_message(&input, 10);
        assert!(out.ends_with("... [TRUNCATED]"));
        assert!(out.len() < input.len());
    }

    #[test]
    fn strips_zero_width_and_bom() {
        let out = sanitize_message("a\u{200B}b\u{FEFF}c", DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(out, "abc");
    }

    #[test]
    fn field_key_strips_disallowed_characters() {
        assert_eq!(sanitize_field_key("user name!"), "username");
        assert_eq!(sanitize_field_key("user_password.v1-2"), "user_password.v1-2");
    }

    #[test]
    fn field_key_empty_result_becomes_invalid_key() {
        assert_eq!(sanitize_field_key("!!!"), "invalid_key");
    }

    #[test]
    fn field_key_caps_at_256_characters() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_field_key(&long).len(), 256);
    }
}
