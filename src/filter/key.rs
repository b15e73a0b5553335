//! Field-key sensitivity classifier (spec.md §4.2).
//!
//! Generalizes the teacher's `backend::filtering::filter_caller_info`, which
//! matched field keys exactly against a small fixed allow-list; here the
//! match is against a much larger keyword set and also supports substring
//! matching for compound keys (`user_password`).

/// Exact-match keywords covering credentials, API keys, secrets, PII,
/// contact info, and database-connection terms. Compound keys match via
/// substring (e.g. `user_password` contains `password`).
const SENSITIVE_KEYWORDS: &[&str] = &[
    "password", "passwd", "pwd", "secret", "token", "api_key", "apikey", "api-key", "credential",
    "credentials", "auth", "authorization", "private_key", "privatekey", "ssn", "social_security",
    "credit_card", "creditcard", "card_number", "cvv", "pin", "access_key", "secret_key",
    "client_secret", "refresh_token", "session_id", "cookie", "email", "phone", "phone_number",
    "address", "date_of_birth", "dob", "passport", "license_number",
];

/// Short ambiguous tokens that must match the *whole* key, never as a
/// substring, to avoid redacting ordinary fields like `hostname` or
/// `sourceurl`.
const SHORT_EXACT_ONLY: &[&str] = &["db", "url", "uri", "host", "dsn", "conn"];

/// True if `key` should be treated as sensitive and its value unconditionally
/// redacted regardless of content. Case-insensitive; keys ≤64 bytes use a
/// stack-allocated lowercasing path (spec.md §4.2).
pub fn is_sensitive_key(key: &str) -> bool {
    if key.len() <= 64 {
        let mut buf = [0u8; 64];
        let bytes = key.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            buf[i] = b.to_ascii_lowercase();
        }
        let lower = std::str::from_utf8(&buf[..bytes.len()]).unwrap_or(key);
        classify_lower(lower)
    } else {
        classify_lower(&key.to_ascii_lowercase())
    }
}

fn classify_lower(lower: &str) -> bool {
    if SHORT_EXACT_ONLY.iter().any(|&k| lower == k) {
        return true;
    }
    SENSITIVE_KEYWORDS.iter().any(|&k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_keyword_matches() {
        assert!(is_sensitive_key("password"));
        assert!(is_sensitive_key("PASSWORD"));
    }

    #[test]
    fn compound_key_matches_by_substring() {
        assert!(is_sensitive_key("user_password"));
        assert!(is_sensitive_key("db_secret_key"));
    }

    #[test]
    fn short_ambiguous_tokens_require_exact_match() {
        assert!(is_sensitive_key("url"));
        assert!(!is_sensitive_key("sourceurl"));
        assert!(!is_sensitive_key("hostname"));
    }

    #[test]
    fn ordinary_keys_are_not_sensitive() {
        assert!(!is_sensitive_key("user_id"));
        assert!(!is_sensitive_key("request_id"));
    }
}
