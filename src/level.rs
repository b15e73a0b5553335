//! Log levels and the gate predicate that admits or drops a record.
//!
//! Grounded on the teacher's `utils::levels` (`to_level`/`to_filter`/
//! `level_to_str`), generalized from a thin wrapper around
//! `tracing::Level`/`LevelFilter` into a standalone total order since
//! `corelog` does not sit on top of the `tracing` ecosystem.

use std::fmt;

/// Total order `Debug < Info < Warn < Error < Fatal`. `Fatal` always passes
/// the level gate regardless of the configured floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Level {
    /// Parse a level name, case-insensitively. Accepts the common aliases
    /// seen across the corpus (`warn`/`warning`, `err`/`error`).
    pub fn parse(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "err" => Some(Level::Error),
            "fatal" | "critical" => Some(Level::Fatal),
            _ => None,
        }
    }

    /// Upper-case string representation used by both formatters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Whether a record at `self` passes a gate floored at `floor`.
    /// `Fatal` always passes, independent of `floor`.
    #[inline]
    pub fn admits(self, floor: Level) -> bool {
        self == Level::Fatal || self >= floor
    }

    /// Decode a level from its `#[repr(u8)]` discriminant, as stored in an
    /// `AtomicU8` on the hot path. Out-of-range values fall back to `Info`.
    #[inline]
    pub fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            _ => Level::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_aliases() {
        assert_eq!(Level::parse("WARN"), Some(Level::Warn));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("err"), Some(Level::Error));
        assert_eq!(Level::parse("critical"), Some(Level::Fatal));
        assert_eq!(Level::parse("nonsense"), None);
    }

    #[test]
    fn ordering_matches_spec() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn fatal_always_admitted() {
        assert!(Level::Fatal.admits(Level::Fatal));
        assert!(Level::Fatal.admits(Level::Error));
    }

    #[test]
    fn from_u8_round_trips_known_discriminants() {
        assert_eq!(Level::from_u8(Level::Debug as u8), Level::Debug);
        assert_eq!(Level::from_u8(Level::Fatal as u8), Level::Fatal);
    }

    #[test]
    fn gate_respects_floor() {
        assert!(!Level::Debug.admits(Level::Info));
        assert!(Level::Info.admits(Level::Info));
        assert!(Level::Warn.admits(Level::Info));
    }
}
