//! Module settings - JSON file plus environment overrides.
//!
//! Tries multiple locations for the settings file in order:
//! 1. MAXS_SMSSEND_CONFIG env var
//! 2. ~/.maxs/smssend.json
//!
//! A missing file is not an error; every field has a default.
//!
//! CHANGELOG:
//! - 06/02/2026 - Request code counters persisted in the module database,
//!   offsets computed in i64
//! - 04/02/2026 - Request code allocation moved here from the tracker
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::db::connection::Database;
use crate::sms::tracker::EventKind;

/// Root directory for all module state (~/.maxs).
pub fn maxs_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".maxs")
}

/// Default settings file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("MAXS_SMSSEND_CONFIG") {
        return PathBuf::from(expand(&path));
    }
    maxs_home().join("smssend.json")
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

fn default_sent_base() -> i32 {
    1000
}

fn default_delivered_base() -> i32 {
    5000
}

fn default_span() -> i32 {
    4000
}

fn default_database_path() -> String {
    maxs_home().join("smssend.db").to_string_lossy().to_string()
}

fn default_contacts_path() -> String {
    maxs_home().join("contacts.json").to_string_lossy().to_string()
}

fn default_socket_path() -> String {
    "~/.maxs/smssend.sock".to_string()
}

fn default_gateway_program() -> String {
    "maxs-sms-gateway".to_string()
}

fn default_clipboard_program() -> String {
    if cfg!(target_os = "macos") {
        "pbpaste".to_string()
    } else {
        "xclip".to_string()
    }
}

fn default_clipboard_args() -> Vec<String> {
    if cfg!(target_os = "macos") {
        Vec::new()
    } else {
        vec!["-selection".into(), "clipboard".into(), "-o".into()]
    }
}

/// Persistent module settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Track and report per-part "sent" events
    #[serde(default)]
    pub notify_sent: bool,
    /// Track and report per-part "delivered" events
    #[serde(default)]
    pub notify_delivered: bool,
    #[serde(default = "default_sent_base")]
    pub sent_request_code_base: i32,
    #[serde(default = "default_delivered_base")]
    pub delivered_request_code_base: i32,
    /// Size of each request code range before it wraps back to its base
    #[serde(default = "default_span")]
    pub request_code_span: i32,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_contacts_path")]
    pub contacts_path: String,
    #[serde(default = "default_gateway_program")]
    pub gateway_program: String,
    #[serde(default)]
    pub gateway_args: Vec<String>,
    #[serde(default = "default_clipboard_program")]
    pub clipboard_program: String,
    #[serde(default = "default_clipboard_args")]
    pub clipboard_args: Vec<String>,
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify_sent: false,
            notify_delivered: false,
            sent_request_code_base: default_sent_base(),
            delivered_request_code_base: default_delivered_base(),
            request_code_span: default_span(),
            database_path: default_database_path(),
            contacts_path: default_contacts_path(),
            gateway_program: default_gateway_program(),
            gateway_args: Vec::new(),
            clipboard_program: default_clipboard_program(),
            clipboard_args: default_clipboard_args(),
            socket_path: default_socket_path(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(?path, "settings file missing, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings JSON: {:?}", path))
    }

    /// Load from the default location and apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let mut settings = Self::load(default_config_path())?;
        settings.apply_env();
        Ok(settings)
    }

    /// Apply MAXS_* environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("MAXS_NOTIFY_SENT") {
            self.notify_sent = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("MAXS_NOTIFY_DELIVERED") {
            self.notify_delivered = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("MAXS_CONTACTS_PATH") {
            self.contacts_path = v;
        }
        if let Ok(v) = std::env::var("MAXS_DATABASE_PATH") {
            self.database_path = v;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(expand(&self.database_path))
    }

    pub fn contacts_path(&self) -> PathBuf {
        PathBuf::from(expand(&self.contacts_path))
    }

    pub fn socket_path(&self) -> String {
        expand(&self.socket_path)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ============================================================================
// Dispatch configuration
// ============================================================================

/// Read-only configuration consumed by the dispatch flow.
pub trait DispatchConfig: Send + Sync {
    fn notify_sent_enabled(&self) -> bool;
    fn notify_delivered_enabled(&self) -> bool;

    /// Allocate `part_count` consecutive request codes for `kind` and return
    /// the first one.
    fn request_code_base(&self, kind: EventKind, part_count: usize) -> i32;
}

/// Reserve `count` offsets inside `0..span` starting at `offset`.
///
/// Returns `(start, next)`. Restarts at 0 when the block would leave the span
/// or the stored offset is out of range.
fn advance_offset(offset: i64, count: usize, span: i64) -> (i64, i64) {
    let span = span.max(1);
    let count = i64::try_from(count).unwrap_or(i64::MAX).min(span);
    let start = if offset < 0 || offset > span - count {
        0
    } else {
        offset
    };
    (start, start + count)
}

/// Wrapping request code counter for one event kind.
#[derive(Debug)]
struct CodeRange {
    counter: &'static str,
    base: i32,
    span: i64,
    next: i64,
}

impl CodeRange {
    fn new(counter: &'static str, base: i32, span: i32) -> Self {
        // Keep base + span - 1 inside i32
        let room = i64::from(i32::MAX) - i64::from(base) + 1;
        Self {
            counter,
            base,
            span: i64::from(span).min(room).max(1),
            next: 0,
        }
    }

    fn code(&self, offset: i64) -> i32 {
        self.base.saturating_add(i32::try_from(offset).unwrap_or(i32::MAX))
    }

    fn allocate(&mut self, count: usize) -> i32 {
        let (start, next) = advance_offset(self.next, count, self.span);
        self.next = next;
        self.code(start)
    }

    /// Allocate from the persisted counter so codes keep advancing across
    /// processes sharing the database.
    fn allocate_in(&self, db: &Database, count: usize) -> Result<i32> {
        let span = self.span;
        let start =
            db.advance_counter(self.counter, |offset| advance_offset(offset, count, span))?;
        Ok(self.code(start))
    }
}

/// `DispatchConfig` backed by loaded settings.
pub struct RuntimeConfig {
    notify_sent: bool,
    notify_delivered: bool,
    sent_codes: Mutex<CodeRange>,
    delivered_codes: Mutex<CodeRange>,
    counters: Option<Database>,
}

impl RuntimeConfig {
    pub fn new(settings: &Settings) -> Self {
        Self {
            notify_sent: settings.notify_sent,
            notify_delivered: settings.notify_delivered,
            sent_codes: Mutex::new(CodeRange::new(
                "request_code_sent",
                settings.sent_request_code_base,
                settings.request_code_span,
            )),
            delivered_codes: Mutex::new(CodeRange::new(
                "request_code_delivered",
                settings.delivered_request_code_base,
                settings.request_code_span,
            )),
            counters: None,
        }
    }

    /// Keep request code counters in the module database. Without it every
    /// process starts again at the base.
    pub fn with_database(mut self, db: Database) -> Self {
        self.counters = Some(db);
        self
    }
}

impl DispatchConfig for RuntimeConfig {
    fn notify_sent_enabled(&self) -> bool {
        self.notify_sent
    }

    fn notify_delivered_enabled(&self) -> bool {
        self.notify_delivered
    }

    fn request_code_base(&self, kind: EventKind, part_count: usize) -> i32 {
        let range = match kind {
            EventKind::Sent => &self.sent_codes,
            EventKind::Delivered => &self.delivered_codes,
        };
        let mut range = range.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(db) = &self.counters {
            match range.allocate_in(db, part_count) {
                Ok(code) => return code,
                Err(e) => {
                    tracing::warn!(%kind, "request code counter unavailable: {:#}", e);
                }
            }
        }
        range.allocate(part_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("nope.json")).unwrap();
        assert!(!settings.notify_sent);
        assert!(!settings.notify_delivered);
        assert_eq!(settings.sent_request_code_base, 1000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"notify_delivered": true, "gateway_args": ["--modem", "1"]}}"#).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.notify_delivered);
        assert!(!settings.notify_sent);
        assert_eq!(settings.gateway_args, vec!["--modem", "1"]);
        assert_eq!(settings.delivered_request_code_base, 5000);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(Settings::load(file.path()).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_request_codes_advance_per_kind() {
        let config = RuntimeConfig::new(&Settings::default());
        assert_eq!(config.request_code_base(EventKind::Sent, 3), 1000);
        assert_eq!(config.request_code_base(EventKind::Sent, 1), 1003);
        assert_eq!(config.request_code_base(EventKind::Delivered, 2), 5000);
        assert_eq!(config.request_code_base(EventKind::Delivered, 2), 5002);
    }

    #[test]
    fn test_request_codes_wrap_at_span() {
        let settings = Settings {
            sent_request_code_base: 10,
            request_code_span: 5,
            ..Settings::default()
        };
        let config = RuntimeConfig::new(&settings);
        assert_eq!(config.request_code_base(EventKind::Sent, 3), 10);
        // 13 + 3 would leave the range
        assert_eq!(config.request_code_base(EventKind::Sent, 3), 10);
        assert_eq!(config.request_code_base(EventKind::Sent, 2), 13);
    }

    #[test]
    fn test_request_codes_persist_across_configs() {
        let db = Database::open_in_memory().unwrap();
        let settings = Settings::default();

        let first = RuntimeConfig::new(&settings).with_database(db.clone());
        assert_eq!(first.request_code_base(EventKind::Sent, 2), 1000);
        assert_eq!(first.request_code_base(EventKind::Delivered, 1), 5000);

        // A later run over the same database continues the sequence
        let second = RuntimeConfig::new(&settings).with_database(db);
        assert_eq!(second.request_code_base(EventKind::Sent, 1), 1002);
        assert_eq!(second.request_code_base(EventKind::Delivered, 1), 5001);
    }

    #[test]
    fn test_persisted_request_codes_wrap_at_span() {
        let db = Database::open_in_memory().unwrap();
        let settings = Settings {
            sent_request_code_base: 10,
            request_code_span: 5,
            ..Settings::default()
        };
        let config = RuntimeConfig::new(&settings).with_database(db.clone());
        assert_eq!(config.request_code_base(EventKind::Sent, 3), 10);
        assert_eq!(config.request_code_base(EventKind::Sent, 3), 10);
        assert_eq!(config.request_code_base(EventKind::Sent, 2), 13);

        // Span shrunk since the counter was stored
        let narrower = Settings {
            request_code_span: 2,
            ..settings
        };
        let config = RuntimeConfig::new(&narrower).with_database(db);
        assert_eq!(config.request_code_base(EventKind::Sent, 1), 10);
    }

    #[test]
    fn test_request_codes_near_i32_limits() {
        let settings = Settings {
            sent_request_code_base: i32::MAX - 10,
            delivered_request_code_base: i32::MIN,
            request_code_span: i32::MAX,
            ..Settings::default()
        };
        let config = RuntimeConfig::new(&settings);

        // Span clipped so the last code is i32::MAX
        assert_eq!(config.request_code_base(EventKind::Sent, 8), i32::MAX - 10);
        assert_eq!(config.request_code_base(EventKind::Sent, 3), i32::MAX - 2);
        assert_eq!(config.request_code_base(EventKind::Sent, 1), i32::MAX - 10);

        assert_eq!(config.request_code_base(EventKind::Delivered, usize::MAX), i32::MIN);
        assert_eq!(config.request_code_base(EventKind::Delivered, 1), i32::MIN);
    }

    #[test]
    fn test_advance_offset() {
        assert_eq!(advance_offset(0, 3, 10), (0, 3));
        assert_eq!(advance_offset(8, 3, 10), (0, 3));
        assert_eq!(advance_offset(7, 3, 10), (7, 10));
        assert_eq!(advance_offset(-4, 1, 10), (0, 1));
        assert_eq!(advance_offset(i64::MAX, usize::MAX, i64::MAX), (0, i64::MAX));
        assert_eq!(advance_offset(0, 5, 0), (0, 1));
    }
}
