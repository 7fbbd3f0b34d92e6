//! Log sanitization utilities for PII filtering.
//!
//! Survey answers are health information. This module scrubs formatted log
//! output of:
//! - Survey answers logged as `key=value` pairs (any of the 22 columns)
//! - UUIDs
//! - Email addresses and phone numbers
//!
//! Sanitizing strings is a fallback. Call sites should not format answers into
//! log messages in the first place.
//!
//! `sanitize()` caps its input size. The log writer takes its cap from
//! `Settings::sanitize_max_bytes`.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::SurveyField;

/// Compiled patterns for PII detection and sanitization.
static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call.
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// A compiled PII pattern with its replacement text.
struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    // Ensure we don't panic on UTF-8 boundaries.
    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Alternation of every survey column name, for `key=value` redaction.
fn survey_key_alternation() -> String {
    SurveyField::ALL
        .iter()
        .map(|f| regex::escape(f.key()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Initialize PII patterns (called once at startup).
fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        let rules: Vec<(String, &'static str)> = vec![
            // Survey answers: `key=value`, `key: value` and `"key":"value"`
            (
                format!(
                    r#"\b(?P<field>{})\b"?\s*[:=]\s*"?[\w.+\-]+"?"#,
                    survey_key_alternation()
                ),
                "${field}=[REDACTED-ANSWER]",
            ),
            // UUIDs (assessment and session identifiers)
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
                    .to_string(),
                "[REDACTED-UUID]",
            ),
            // Email patterns (bounded labels; case-insensitive)
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b"
                    .to_string(),
                "[REDACTED-EMAIL]",
            ),
            // Phone patterns
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b".to_string(),
                "[REDACTED-PHONE]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| p.as_str())).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(&pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Sanitize a string by replacing PII patterns.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

/// Like [`sanitize`], with an explicit size cap.
#[must_use]
pub fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in &patterns.set.matches(prefix) {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains potential PII.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, DEFAULT_SANITIZE_MAX_BYTES);
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }

    /// Cap each sanitized line at `max_bytes`. Zero keeps the current cap.
    #[must_use]
    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        if max_bytes > 0 {
            self.max_bytes = max_bytes;
        }
        self
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_bytes: self.max_bytes,
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let line_str = String::from_utf8_lossy(&line);
            let sanitized = sanitize_with_limit(&line_str, self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter writing one huge line must not buffer without bound.
        let hard_cap = self.max_bytes.saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let s = String::from_utf8_lossy(&self.buffer).to_string();
            let sanitized = sanitize_with_limit(&s, self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let s = String::from_utf8_lossy(&self.buffer);
            let sanitized = sanitize_with_limit(&s, self.max_bytes);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}
