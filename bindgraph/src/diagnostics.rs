//! Diagnostics collected during an analysis run, with their severity,
//! location and the declaration that caused them.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::options::LogLevel;
use crate::symbols::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A message produced by the analysis, optionally anchored to an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Element>,
    /// Qualified name of the declaration that caused the message.
    pub declaration: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            declaration: None,
        }
    }

    pub fn at(mut self, location: Element) -> Self {
        self.location = Some(location);
        self
    }

    pub fn declared_by(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Ordered diagnostic sink.
///
/// Any recorded error rejects the analysis. Warnings below the configured
/// log level are dropped.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    rejected: bool,
    log_level: LogLevel,
}

impl Diagnostics {
    pub fn new(log_level: LogLevel) -> Self {
        Self {
            entries: Vec::new(),
            rejected: false,
            log_level,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.rejected = true,
            Severity::Warning if !self.log_level.is_visible(LogLevel::Info) => {
                trace!(message = %diagnostic.message, "warning suppressed");
                return;
            }
            Severity::Warning => {}
        }
        debug!(
            severity = %diagnostic.severity,
            location = ?diagnostic.location,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn has_error(&self) -> bool {
        self.rejected
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
