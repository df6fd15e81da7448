//! Audit trail of registrar calls. Every call the client makes is recorded
//! with its request, the raw and decoded response, and any error. Entries are
//! masked before they reach a sink, so no sink ever sees the account
//! credentials.

use log::{debug, info, warn};

use crate::method::Method;

pub mod sqlite;

/// Replacement text for masked secrets.
pub const MASK: &str = "********";

/// Log target used by `LogAudit`.
pub const AUDIT_TARGET: &str = "nameam::audit";

/// One recorded registrar call, already masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// The endpoint path of the operation, e.g. `/client/domains`.
    pub action: String,
    pub method: Method,
    /// The request envelope as JSON text.
    pub request: String,
    /// The raw operation response body, if a response was received.
    pub response: Option<String>,
    /// The decoded response re-serialized as JSON, if decoding succeeded.
    pub decoded: Option<String>,
    /// The error that ended the call, if any.
    pub error: Option<String>,
}

/// A sink for audit entries.
pub trait AuditLog {
    /// Record one call. Sinks must not fail the call they record, so
    /// errors are handled (logged) by the sink itself.
    fn record(&self, entry: &AuditEntry);
}

impl<R> AuditLog for Option<R>
where
    R: AuditLog,
{
    fn record(&self, entry: &AuditEntry) {
        if let Some(sink) = self.as_ref() {
            sink.record(entry)
        }
    }
}

impl<R> AuditLog for &R
where
    R: AuditLog + ?Sized,
{
    fn record(&self, entry: &AuditEntry) {
        (**self).record(entry)
    }
}

impl<R> AuditLog for Box<R>
where
    R: AuditLog + ?Sized,
{
    fn record(&self, entry: &AuditEntry) {
        (**self).record(entry)
    }
}

/// Writes audit entries to the `log` facade under `AUDIT_TARGET`: a one-line
/// summary at info level, the request and response bodies at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudit;

impl AuditLog for LogAudit {
    fn record(&self, entry: &AuditEntry) {
        match &entry.error {
            Some(error) => warn!(
                target: AUDIT_TARGET,
                "{} {} failed: {}", entry.method, entry.action, error
            ),
            None => info!(target: AUDIT_TARGET, "{} {} ok", entry.method, entry.action),
        }
        debug!(target: AUDIT_TARGET, "request: {}", entry.request);
        if let Some(response) = &entry.response {
            debug!(target: AUDIT_TARGET, "response: {response}");
        }
        if let Some(decoded) = &entry.decoded {
            debug!(target: AUDIT_TARGET, "decoded: {decoded}");
        }
    }
}

/// Replaces every occurrence of a set of secrets in text with `MASK`.
///
/// Secrets are matched both literally and in their JSON-escaped form, since
/// logged requests embed serialized payloads inside JSON strings.
#[derive(Debug, Clone, Default)]
pub struct Masker {
    patterns: Vec<String>,
}

impl Masker {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = Vec::new();
        for secret in secrets {
            let secret = secret.as_ref();
            if secret.is_empty() {
                continue;
            }
            patterns.push(secret.to_owned());
            if let Ok(quoted) = serde_json::to_string(secret) {
                let escaped = &quoted[1..quoted.len() - 1];
                if escaped != secret {
                    patterns.push(escaped.to_owned());
                }
            }
        }
        // Longest first, so a serialized payload is masked as a whole before
        // the credentials inside it are.
        patterns.sort_by(|a, b| b.len().cmp(&a.len()));
        patterns.dedup();
        Self { patterns }
    }

    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_owned();
        for pattern in &self.patterns {
            if masked.contains(pattern.as_str()) {
                masked = masked.replace(pattern.as_str(), MASK);
            }
        }
        masked
    }
}
