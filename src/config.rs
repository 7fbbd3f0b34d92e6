//! Runtime settings read from the environment.

use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

pub const MODEL_PATH_ENV: &str = "HOLOMED_MODEL_PATH";
pub const REQUIRE_MANIFEST_ENV: &str = "HOLOMED_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "HOLOMED_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HOLOMED_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "HOLOMED_SANITIZE_MAX_BYTES";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "holomed.log";

/// Where log output goes.
///
/// Writing logs to the terminal corrupts the TUI, so `Auto` picks a file for
/// interactive sessions and stdout otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "file" => Some(Self::File),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }

    /// Resolve `Auto` against whether stdout is a terminal.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding `encoder.json`, `model.json` and `manifest.json`.
    pub model_path: PathBuf,

    /// Refuse to load artifacts that have no manifest.
    pub require_manifest: bool,

    pub log_mode: LogMode,
    pub log_file: PathBuf,

    /// Per-line cap for the log sanitizer.
    pub sanitize_max_bytes: usize,

    /// Variables that were set but not understood, as (name, raw value).
    ///
    /// Settings are read before logging exists, so these are reported
    /// afterwards by [`Settings::report_ignored`].
    pub ignored: Vec<(&'static str, String)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            // Release builds only load verified artifacts unless told otherwise.
            require_manifest: !cfg!(debug_assertions),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
            ignored: Vec::new(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults.
    ///
    /// Unrecognized values keep the default and are recorded in `ignored`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut ignored = Vec::new();

        let parsed = |name: &'static str| -> Option<String> {
            lookup(name).filter(|v| !v.trim().is_empty())
        };

        let require_manifest = match parsed(REQUIRE_MANIFEST_ENV) {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                ignored.push((REQUIRE_MANIFEST_ENV, raw));
                defaults.require_manifest
            }),
            None => defaults.require_manifest,
        };

        let log_mode = match parsed(LOG_MODE_ENV) {
            Some(raw) => LogMode::parse(&raw).unwrap_or_else(|| {
                ignored.push((LOG_MODE_ENV, raw));
                defaults.log_mode
            }),
            None => defaults.log_mode,
        };

        let sanitize_max_bytes = match parsed(SANITIZE_MAX_BYTES_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(v) if v > 0 => v,
                _ => {
                    ignored.push((SANITIZE_MAX_BYTES_ENV, raw));
                    defaults.sanitize_max_bytes
                }
            },
            None => defaults.sanitize_max_bytes,
        };

        Self {
            model_path: parsed(MODEL_PATH_ENV).map_or(defaults.model_path, PathBuf::from),
            require_manifest,
            log_mode,
            log_file: parsed(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from),
            sanitize_max_bytes,
            ignored,
        }
    }

    /// Warn about every ignored variable. Call once logging is installed.
    pub fn report_ignored(&self) {
        for (name, raw) in &self.ignored {
            tracing::warn!("Ignoring unrecognized {}={:?}", name, raw);
        }
    }
}
