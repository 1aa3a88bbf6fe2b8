//! Diagnostic sink threaded through every comparison call.
//!
//! The comparison core never logs through a global logger. Callers pass a
//! `&dyn DiagnosticSink`; the CLI uses [`TracingSink`], tests usually use
//! [`RecordingSink`] to assert on the emitted trail.

use serde::Serialize;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

pub trait DiagnosticSink {
    fn emit(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) {
        self.emit(Severity::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Severity::Warning, message);
    }
}

/// Forwards diagnostics to `tracing` events under the `tabcmp` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "tabcmp", "{message}"),
            Severity::Info => tracing::info!(target: "tabcmp", "{message}"),
            Severity::Warning => tracing::warn!(target: "tabcmp", "{message}"),
        }
    }
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.severity == severity)
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.message.contains(needle))
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries.into_inner()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, severity: Severity, message: &str) {
        self.entries.borrow_mut().push(Diagnostic {
            severity,
            message: message.to_string(),
        });
    }
}

/// Fans one diagnostic out to two sinks.
pub struct Tee<'a> {
    first: &'a dyn DiagnosticSink,
    second: &'a dyn DiagnosticSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn DiagnosticSink, second: &'a dyn DiagnosticSink) -> Self {
        Self { first, second }
    }
}

impl DiagnosticSink for Tee<'_> {
    fn emit(&self, severity: Severity, message: &str) {
        self.first.emit(severity, message);
        self.second.emit(severity, message);
    }
}
