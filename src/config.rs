//! Immutable logger configuration (spec.md §3 Config, §6 configuration
//! surface). `Config::validate` centralizes the checks `Logger::create` must
//! run before opening any sink, grounded on the teacher's
//! `utils::validation` + `utils::error` pairing (`validate_sink_config`,
//! `validate_rotation`).

use std::sync::Arc;
use std::time::Duration;

use crate::context::ExtractorList;
use crate::error::{Error, Result};
use crate::format::FormatterOptions;
use crate::hooks::HookRegistry;
use crate::level::Level;
use crate::sampler::SamplingConfig;
use crate::writer::file::FileConfig;
use crate::writer::{LogWriter, SimpleWriter};

/// Which built-in redaction catalog a logger starts with (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCatalog {
    /// No built-in patterns; only `custom_patterns` (if any) apply.
    Empty,
    Basic,
    Full,
}

/// Security-layer configuration (spec.md §3 "Security state", §6
/// `security.*`). Swapped atomically as a whole via `Logger::set_security_config`.
#[derive(Clone)]
pub struct SecurityConfig {
    pub max_message_size: usize,
    pub max_writers: usize,
    pub filter_enabled: bool,
    pub filter_catalog: FilterCatalog,
    /// Additional caller-supplied patterns, `(source, has_capturing_prefix)`.
    pub custom_patterns: Vec<(String, bool)>,
    pub filter_input_cap: usize,
    pub filter_timeout: Duration,
    pub filter_semaphore_capacity: usize,
}

impl Default for SecurityConfig {
    /// The built-in filter ships enabled with the basic catalog (spec.md §9
    /// Open Questions names two competing defaults across the corpus; see
    /// DESIGN.md for why this crate picked "basic-on by default").
    fn default() -> SecurityConfig {
        SecurityConfig {
            max_message_size: crate::sanitize::DEFAULT_MAX_MESSAGE_SIZE,
            max_writers: crate::writer::DEFAULT_MAX_WRITER_COUNT,
            filter_enabled: true,
            filter_catalog: FilterCatalog::Basic,
            custom_patterns: Vec::new(),
            filter_input_cap: crate::filter::DEFAULT_INPUT_LENGTH_CAP,
            filter_timeout: crate::filter::DEFAULT_REGEX_TIMEOUT,
            filter_semaphore_capacity: 8,
        }
    }
}

/// Fatal-path behavior: how long `Fatal` waits for `Close` to drain before
/// giving up, and what runs afterward (spec.md §4.1 "Fatal semantics").
#[derive(Clone)]
pub struct FatalConfig {
    pub flush_timeout: Duration,
    pub terminator: Arc<dyn Fn(i32) + Send + Sync>,
}

impl Default for FatalConfig {
    fn default() -> FatalConfig {
        FatalConfig {
            flush_timeout: Duration::from_secs(5),
            terminator: Arc::new(|code| std::process::exit(code)),
        }
    }
}

/// Field-key naming-convention checks. Spec.md §1 places these "out of
/// scope" as an external collaborator; `corelog` stores the setting on
/// `Config` for callers to introspect but does not enforce it (see
/// DESIGN.md "Out of scope").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValidationMode {
    Off,
    Warn,
    Enforce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    SnakeCase,
    CamelCase,
    Any,
}

#[derive(Clone)]
pub struct FieldValidationConfig {
    pub mode: FieldValidationMode,
    pub convention: NamingConvention,
    pub allow_common_abbrev: bool,
}

impl Default for FieldValidationConfig {
    fn default() -> FieldValidationConfig {
        FieldValidationConfig {
            mode: FieldValidationMode::Off,
            convention: NamingConvention::Any,
            allow_common_abbrev: true,
        }
    }
}

/// A write-error handler: called with a human-readable sink identifier and
/// the underlying error whenever emit-path writes fail (spec.md §7). Never
/// invoked on the hot path's happy case.
pub type WriteErrorHandler = Arc<dyn Fn(&str, &str) + Send + Sync>;

fn default_write_error_handler() -> WriteErrorHandler {
    Arc::new(|sink, err| eprintln!("corelog: write error on sink '{sink}': {err}"))
}

/// Immutable logger configuration snapshot (spec.md §3 Config). Cloned into
/// the `Logger` at construction time; thereafter individual pieces are
/// replaced through the logger's own atomic setters rather than by mutating
/// this struct.
#[derive(Clone)]
pub struct Config {
    pub level: Level,
    pub formatter: FormatterOptions,
    pub outputs: Vec<Arc<dyn LogWriter>>,
    pub file: Option<FileConfig>,
    pub security: SecurityConfig,
    pub hooks: HookRegistry,
    pub extractors: ExtractorList,
    pub sampling: SamplingConfig,
    pub fatal: FatalConfig,
    pub field_validation: FieldValidationConfig,
    pub write_error_handler: WriteErrorHandler,
}

impl Default for Config {
    /// A single stdout sink, text format, Info floor — the same sensible
    /// starting point the teacher's `configure()` installs before any
    /// `add()` call.
    fn default() -> Config {
        let stdout: Arc<dyn LogWriter> = Arc::new(SimpleWriter::new("stdout", std::io::stdout(), false));
        Config {
            level: Level::Info,
            formatter: FormatterOptions::default(),
            outputs: vec![stdout],
            file: None,
            security: SecurityConfig::default(),
            hooks: HookRegistry::new(),
            extractors: ExtractorList::new(),
            sampling: SamplingConfig::default(),
            fatal: FatalConfig::default(),
            field_validation: FieldValidationConfig::default(),
            write_error_handler: default_write_error_handler(),
        }
    }
}

impl Config {
    /// Checks `Logger::create` must pass before opening any sink (spec.md
    /// §4.1 "Create(config)"). Path safety and the file-size ceiling are
    /// validated here too (ahead of ever touching the filesystem);
    /// `FileWriter::open` re-validates the path since it is also callable on
    /// its own.
    pub fn validate(&self) -> Result<()> {
        if self.security.max_writers > crate::writer::DEFAULT_MAX_WRITER_COUNT {
            return Err(Error::MaxWritersExceeded { cap: crate::writer::DEFAULT_MAX_WRITER_COUNT });
        }
        if self.security.max_message_size == 0 {
            return Err(Error::InvalidPattern("max_message_size must be positive".to_string()));
        }
        if let Some(file) = &self.file {
            if file.max_backups > crate::writer::file::MAX_BACKUP_COUNT {
                return Err(Error::MaxBackupsExceeded {
                    requested: file.max_backups,
                    max: crate::writer::file::MAX_BACKUP_COUNT,
                });
            }
            crate::writer::file::validate_path(&file.path)?;
        }
        Ok(())
    }
}

/// Parse a human-friendly size string (`"10MB"`, `"1G"`, bare digits as
/// bytes) into a byte count. Grounded on the teacher's
/// `backend::rotation::parse_size_limit`: same accepted units (`B`, `KB`/`K`,
/// `MB`/`M`, `GB`/`G`, `TB`/`T`, case-insensitive, optional whitespace), kept
/// as a hand-rolled parser rather than wiring the `byte-unit` dependency the
/// teacher declared but never used for this either (dropped from
/// `Cargo.toml`; see DESIGN.md).
pub fn parse_size(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::InvalidPattern("empty size string".to_string()));
    }
    let mut num_end = 0;
    for (i, c) in s.char_indices() {
        if !c.is_ascii_digit() {
            break;
        }
        num_end = i + c.len_utf8();
    }
    if num_end == 0 {
        return Err(Error::InvalidPattern(format!("'{s}' has no numeric prefix")));
    }
    let num_str = &s[..num_end];
    let unit = s[num_end..].trim().to_ascii_uppercase();
    let multiplier: u64 = match unit.as_str() {
        "B" | "" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        "TB" | "T" => 1024u64 * 1024 * 1024 * 1024,
        _ => return Err(Error::InvalidPattern(format!("'{unit}' is not a recognized size unit"))),
    };
    let count: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidPattern(format!("'{num_str}' is not a valid integer")))?;
    Ok(count.saturating_mul(multiplier))
}
