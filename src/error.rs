//! Stable error taxonomy (spec.md §6). Hand-written `Display`/`Error` impls
//! in the manner of the teacher's `utils::error::LoglyError` — the teacher
//! never reached for a derive-macro error crate, and a from-scratch enum
//! keeps every variant name identical to the spec's stable identifiers.

use std::fmt;

/// Stable, spec-named error identifiers. Variant names are load-bearing:
/// callers match on them, so they are not renamed for Rust naming taste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NilConfig,
    NilWriter,
    NilFilter,
    NilHook,
    NilExtractor,
    LoggerClosed,
    WriterNotFound,
    InvalidLevel(String),
    InvalidFormat(String),
    MaxWritersExceeded { cap: usize },
    EmptyFilePath,
    PathTooLong { len: usize, max: usize },
    PathTraversal(String),
    NullByte,
    InvalidPath(String),
    SymlinkNotAllowed(String),
    MaxSizeExceeded { requested: u64, max: u64 },
    MaxBackupsExceeded { requested: usize, max: usize },
    BufferSizeTooLarge { requested: usize, max: usize },
    InvalidPattern(String),
    PatternTooLong { len: usize, max: usize },
    ReDoSPattern(String),
    EmptyPattern,
    PatternFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NilConfig => write!(f, "NilConfig: configuration must not be nil"),
            Error::NilWriter => write!(f, "NilWriter: writer must not be nil"),
            Error::NilFilter => write!(f, "NilFilter: filter must not be nil"),
            Error::NilHook => write!(f, "NilHook: hook must not be nil"),
            Error::NilExtractor => write!(f, "NilExtractor: context extractor must not be nil"),
            Error::LoggerClosed => write!(f, "LoggerClosed: logger has been closed"),
            Error::WriterNotFound => write!(f, "WriterNotFound: no writer matched for removal"),
            Error::InvalidLevel(l) => write!(f, "InvalidLevel: '{l}' is not a recognized level"),
            Error::InvalidFormat(fmt_name) => {
                write!(f, "InvalidFormat: '{fmt_name}' is not 'text' or 'json'")
            }
            Error::MaxWritersExceeded { cap } => {
                write!(f, "MaxWritersExceeded: writer cap of {cap} reached")
            }
            Error::EmptyFilePath => write!(f, "EmptyFilePath: file path must not be empty"),
            Error::PathTooLong { len, max } => {
                write!(f, "PathTooLong: path length {len} exceeds max {max}")
            }
            Error::PathTraversal(p) => {
                write!(f, "PathTraversal: path '{p}' contains '..' segments")
            }
            Error::NullByte => write!(f, "NullByte: path contains an embedded NUL byte"),
            Error::InvalidPath(p) => write!(f, "InvalidPath: '{p}' is not a usable path"),
            Error::SymlinkNotAllowed(p) => {
                write!(f, "SymlinkNotAllowed: '{p}' resolves to a symlink or hardlink")
            }
            Error::MaxSizeExceeded { requested, max } => write!(
                f,
                "MaxSizeExceeded: requested size {requested} exceeds max {max}"
            ),
            Error::MaxBackupsExceeded { requested, max } => write!(
                f,
                "MaxBackupsExceeded: requested backup count {requested} exceeds max {max}"
            ),
            Error::BufferSizeTooLarge { requested, max } => write!(
                f,
                "BufferSizeTooLarge: requested buffer {requested} exceeds max {max}"
            ),
            Error::InvalidPattern(p) => write!(f, "InvalidPattern: '{p}' failed to compile"),
            Error::PatternTooLong { len, max } => {
                write!(f, "PatternTooLong: pattern length {len} exceeds max {max}")
            }
            Error::ReDoSPattern(p) => {
                write!(f, "ReDoSPattern: '{p}' contains a catastrophic-backtracking shape")
            }
            Error::EmptyPattern => write!(f, "EmptyPattern: pattern must not be empty"),
            Error::PatternFailed(p) => write!(f, "PatternFailed: pattern '{p}' failed at runtime"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
